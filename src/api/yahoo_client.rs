use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, StatusCode};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{ApiRateLimiter, FundamentalsProvider};
use crate::error::ProviderError;
use crate::models::{Config, TickerMetrics};

/// quoteSummary modules that together carry every field the screener reads.
/// Earlier modules win when a field appears in more than one.
const QUOTE_SUMMARY_MODULES: [&str; 3] = ["summaryDetail", "defaultKeyStatistics", "financialData"];

/// Yahoo Finance fundamentals client
pub struct YahooClient {
    client: Client,
    base_url: Url,
    rate_limiter: ApiRateLimiter,
}

impl YahooClient {
    /// Create a new Yahoo client
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs.max(1)))
            .user_agent("rust-screener/1.0")
            .build()?;

        let base_url = Url::parse(&config.yahoo_base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("YAHOO_BASE_URL is not a base URL: {}", base_url));
        }

        Ok(Self {
            client,
            base_url,
            rate_limiter: ApiRateLimiter::new(config.rate_limit_per_minute),
        })
    }

    fn quote_summary_url(&self, ticker: &str) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Malformed(format!("unusable base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(&["v10", "finance", "quoteSummary", ticker]);
        url.query_pairs_mut()
            .append_pair("modules", &QUOTE_SUMMARY_MODULES.join(","));
        Ok(url)
    }
}

#[async_trait]
impl FundamentalsProvider for YahooClient {
    async fn get_metrics(&self, ticker: &str) -> Result<TickerMetrics, ProviderError> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(ProviderError::UnknownTicker(ticker));
        }

        let url = self.quote_summary_url(&ticker)?;

        self.rate_limiter.wait().await;

        debug!("Making request to: {}", url);

        let response = self.client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::UnknownTicker(ticker));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status: status.as_u16(), body });
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Malformed(format!("invalid JSON for {}: {}", ticker, e)))?;

        let metrics = parse_quote_summary(&ticker, &json)?;
        debug!("Retrieved fundamentals for {}", ticker);
        Ok(metrics)
    }
}

/// Flatten a quoteSummary response into `TickerMetrics`
pub(crate) fn parse_quote_summary(ticker: &str, json: &Value) -> Result<TickerMetrics, ProviderError> {
    let summary = json
        .get("quoteSummary")
        .ok_or_else(|| ProviderError::Malformed("missing quoteSummary".to_string()))?;

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("no description");
        debug!("quoteSummary error for {}: {}", ticker, description);
        return Err(ProviderError::UnknownTicker(ticker.to_string()));
    }

    let result = summary
        .get("result")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .and_then(Value::as_object)
        .ok_or_else(|| ProviderError::Malformed(format!("no quoteSummary result for {}", ticker)))?;

    let fields = flatten_modules(result);
    let field = |name: &str| fields.get(name).copied();

    Ok(TickerMetrics {
        ticker: ticker.to_string(),
        trailing_pe: field("trailingPE"),
        peg_ratio: field("pegRatio"),
        return_on_equity: field("returnOnEquity"),
        current_ratio: field("currentRatio"),
        debt_to_equity: field("debtToEquity"),
        price_to_sales: field("priceToSalesTrailing12Months"),
        price_to_book: field("priceToBook"),
        return_on_assets: field("returnOnAssets"),
        previous_close: field("previousClose"),
        trailing_eps: field("trailingEps"),
        book_value: field("bookValue"),
        free_cashflow: field("freeCashflow"),
        shares_outstanding: field("sharesOutstanding"),
    })
}

fn flatten_modules(result: &Map<String, Value>) -> HashMap<&str, f64> {
    let mut fields = HashMap::new();
    for module in QUOTE_SUMMARY_MODULES {
        if let Some(values) = result.get(module).and_then(Value::as_object) {
            for (key, value) in values {
                if let Some(number) = numeric_value(value) {
                    fields.entry(key.as_str()).or_insert(number);
                }
            }
        }
    }
    fields
}

/// Yahoo wraps numbers as `{"raw": 1.2, "fmt": "1.20"}`; `{}` and null mean absent
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Object(object) => object.get("raw").and_then(Value::as_f64),
        _ => None,
    }
}
