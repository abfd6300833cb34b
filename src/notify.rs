//! Weekly undervalued-stock digest and favorites news delivery

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info};

use crate::favorites::FavoritesStore;
use crate::models::{ScreeningResult, UserId};
use crate::news::HeadlineSource;

pub const DIGEST_HEADER: &str = "📉 Undervalued stocks this week:";
pub const DIGEST_EMPTY: &str = "No qualifying stocks found this week.";

/// Headlines sent per favorite ticker
pub const NEWS_PER_TICKER: usize = 3;

/// Outbound message channel to a user (chat bot, email, ...)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, user: UserId, text: &str) -> Result<()>;
}

/// Writes messages to the log instead of delivering them
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, user: UserId, text: &str) -> Result<()> {
        info!("✉️  [{}] {}", user, text);
        Ok(())
    }
}

/// Messages making up one digest: a header then one message per stock,
/// or a single "nothing found" message
pub fn digest_messages(results: &[ScreeningResult]) -> Vec<String> {
    if results.is_empty() {
        return vec![DIGEST_EMPTY.to_string()];
    }

    std::iter::once(DIGEST_HEADER.to_string())
        .chain(results.iter().map(ToString::to_string))
        .collect()
}

/// Send the digest to every user with favorites. A failed delivery is
/// logged and the remaining users still receive theirs.
/// Returns the number of users fully notified.
pub async fn send_weekly_digest(
    store: &dyn FavoritesStore,
    notifier: &dyn Notifier,
    results: &[ScreeningResult],
) -> usize {
    let messages = digest_messages(results);
    let users = store.users();
    let mut notified = 0;

    'users: for user in &users {
        for message in &messages {
            if let Err(e) = notifier.send(*user, message).await {
                error!("Failed to send weekly digest to {}: {}", user, e);
                continue 'users;
            }
        }
        notified += 1;
    }

    info!("📬 Weekly digest sent to {} of {} users", notified, users.len());
    notified
}

/// Messages for one ticker's news: one per headline, or a "no news" notice
pub fn news_messages(ticker: &str, headlines: &[String]) -> Vec<String> {
    if headlines.is_empty() {
        return vec![format!("No news for {}", ticker)];
    }

    headlines
        .iter()
        .take(NEWS_PER_TICKER)
        .map(|headline| format!("📰 {}: {}", ticker, headline))
        .collect()
}

/// Send each user the latest headlines for every favorite ticker.
/// A ticker whose news can't be fetched gets an error message and the
/// user's remaining tickers are still covered; a failed delivery skips
/// the rest of that user. Returns the number of users fully served.
pub async fn send_favorite_news(
    store: &dyn FavoritesStore,
    news: &dyn HeadlineSource,
    notifier: &dyn Notifier,
) -> usize {
    let users = store.users();
    let mut served = 0;

    'users: for user in &users {
        for ticker in store.get(*user) {
            let messages = match news.latest_headlines(&ticker).await {
                Ok(headlines) => news_messages(&ticker, &headlines),
                Err(e) => {
                    error!("Failed to fetch news for {}: {}", ticker, e);
                    vec![format!("Could not fetch news for {}.", ticker)]
                }
            };

            for message in &messages {
                if let Err(e) = notifier.send(*user, message).await {
                    error!("Failed to send news to {}: {}", user, e);
                    continue 'users;
                }
            }
        }
        served += 1;
    }

    info!("📰 Favorites news sent to {} of {} users", served, users.len());
    served
}
