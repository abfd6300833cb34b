use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use crate::error::ProviderError;
use crate::models::TickerMetrics;

pub mod yahoo_client;
pub use yahoo_client::YahooClient;

/// Evenly spaced request pacing for API clients
pub struct ApiRateLimiter {
    limiter: DefaultDirectRateLimiter,
}

impl ApiRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let delay_ms = if requests_per_minute > 0 {
            (60_000 / requests_per_minute as u64).max(1)
        } else {
            1000 // Default 1 second delay
        };

        let quota = Quota::with_period(Duration::from_millis(delay_ms))
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::MIN);

        Self {
            limiter: RateLimiter::direct(quota),
        }
    }

    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

/// Source of per-ticker fundamental data
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    async fn get_metrics(&self, ticker: &str) -> Result<TickerMetrics, ProviderError>;
}
