use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::models::Config;

/// Headlines returned per query
pub const MAX_HEADLINES: usize = 5;

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    articles: Option<Vec<Article>>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
}

/// Anything that can list recent headlines for a ticker or query
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn latest_headlines(&self, query: &str) -> Result<Vec<String>>;
}

/// NewsAPI headline client
pub struct NewsClient {
    client: Client,
    base_url: Url,
    api_key: String,
    language: String,
}

impl NewsClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs.max(1)))
            .user_agent("rust-screener/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.news_api_url)?,
            api_key: config.require_news_api_key()?.to_string(),
            language: config.news_language.clone(),
        })
    }
}

#[async_trait]
impl HeadlineSource for NewsClient {
    /// Newest headlines mentioning `query`, at most `MAX_HEADLINES`
    async fn latest_headlines(&self, query: &str) -> Result<Vec<String>> {
        let mut url = self.base_url.join("v2/everything")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("sortBy", "publishedAt")
            .append_pair("language", &self.language)
            .append_pair("apiKey", &self.api_key);

        debug!("Requesting headlines for {}", query);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("News request failed with status {}: {}", status, error_text));
        }

        let body: EverythingResponse = response.json().await?;
        let headlines: Vec<String> = body
            .articles
            .unwrap_or_default()
            .into_iter()
            .filter_map(|article| article.title)
            .take(MAX_HEADLINES)
            .collect();

        debug!("Retrieved {} headlines for {}", headlines.len(), query);
        Ok(headlines)
    }
}
