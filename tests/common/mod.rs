//! Common test utilities and helpers

use async_trait::async_trait;
use rust_screener::{error::ProviderError, models::TickerMetrics, FundamentalsProvider};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Test data utilities
pub mod test_data {
    use super::*;
    use serde_json::{json, Value};

    /// Metrics that clear every threshold: Graham Number sqrt(2250) ~ 47.43,
    /// price 30, margin of safety ~36.8%, P/FCF 3
    pub fn qualifying_metrics(ticker: &str) -> TickerMetrics {
        TickerMetrics {
            ticker: ticker.to_string(),
            trailing_pe: Some(12.0),
            peg_ratio: Some(0.8),
            return_on_equity: Some(0.15),
            current_ratio: Some(2.0),
            debt_to_equity: Some(0.3),
            price_to_sales: Some(0.7),
            price_to_book: Some(1.5),
            return_on_assets: Some(0.25),
            previous_close: Some(30.0),
            trailing_eps: Some(5.0),
            book_value: Some(20.0),
            free_cashflow: Some(1_000_000.0),
            shares_outstanding: Some(100_000.0),
        }
    }

    /// quoteSummary body carrying `metrics` in Yahoo's `{raw, fmt}` shape
    pub fn quote_summary_body(metrics: &TickerMetrics) -> Value {
        let wrap = |value: Option<f64>| match value {
            Some(raw) => json!({ "raw": raw, "fmt": format!("{:.2}", raw) }),
            None => json!({}),
        };

        json!({
            "quoteSummary": {
                "result": [{
                    "summaryDetail": {
                        "previousClose": wrap(metrics.previous_close),
                        "trailingPE": wrap(metrics.trailing_pe),
                        "priceToSalesTrailing12Months": wrap(metrics.price_to_sales)
                    },
                    "defaultKeyStatistics": {
                        "pegRatio": wrap(metrics.peg_ratio),
                        "priceToBook": wrap(metrics.price_to_book),
                        "trailingEps": wrap(metrics.trailing_eps),
                        "bookValue": wrap(metrics.book_value),
                        "sharesOutstanding": wrap(metrics.shares_outstanding)
                    },
                    "financialData": {
                        "returnOnEquity": wrap(metrics.return_on_equity),
                        "currentRatio": wrap(metrics.current_ratio),
                        "debtToEquity": wrap(metrics.debt_to_equity),
                        "returnOnAssets": wrap(metrics.return_on_assets),
                        "freeCashflow": wrap(metrics.free_cashflow)
                    }
                }],
                "error": null
            }
        })
    }
}

/// In-memory provider: unknown tickers fail, optional delay per call
#[derive(Default)]
pub struct StubProvider {
    metrics: HashMap<String, TickerMetrics>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metrics: TickerMetrics) -> Self {
        self.metrics.insert(metrics.ticker.clone(), metrics);
        self
    }

    pub fn with_delay(mut self, ticker: &str, delay: Duration) -> Self {
        self.delays.insert(ticker.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FundamentalsProvider for StubProvider {
    async fn get_metrics(&self, ticker: &str) -> Result<TickerMetrics, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(ticker) {
            tokio::time::sleep(*delay).await;
        }
        self.metrics
            .get(ticker)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownTicker(ticker.to_string()))
    }
}

/// Logging utilities for tests
pub mod logging {
    use tracing::info;

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }
}
