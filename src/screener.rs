//! Graham-style undervalued stock screener
//!
//! Fetches fundamentals ticker by ticker, derives Graham Number based
//! ratios and keeps the tickers that clear every valuation threshold.
//! Per-ticker failures are logged and skipped; a batch never fails.

use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::FundamentalsProvider;
use crate::error::ProviderError;
use crate::models::{
    DerivedRatios, FailedTicker, ScreeningCriteria, ScreeningResult, ScreeningRun, TickerMetrics,
};

/// Graham's fair value multiplier (P/E 15 x P/B 1.5)
const GRAHAM_MULTIPLIER: f64 = 22.5;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

impl DerivedRatios {
    pub fn from_metrics(metrics: &TickerMetrics) -> Self {
        let price = metrics.previous_close;

        let graham_number = match (metrics.trailing_eps, metrics.book_value) {
            (Some(eps), Some(book)) if eps >= 0.0 && book >= 0.0 => {
                Some((GRAHAM_MULTIPLIER * eps * book).sqrt())
            }
            _ => None,
        };

        let graham_ratio = match (price, graham_number) {
            (Some(price), Some(graham)) if graham != 0.0 => Some(price / graham),
            _ => None,
        };

        let earnings_yield = metrics
            .trailing_pe
            .filter(|pe| *pe != 0.0)
            .map(|pe| 1.0 / pe);

        // Only meaningful when the price sits below the Graham Number
        let margin_of_safety = match (price, graham_number, graham_ratio) {
            (Some(price), Some(graham), Some(ratio)) if ratio < 1.0 => {
                Some((graham - price) / graham)
            }
            _ => None,
        };

        let shares = metrics.shares_outstanding.unwrap_or(1.0);
        let price_to_free_cash_flow = match (price, metrics.free_cashflow) {
            (Some(price), Some(fcf)) if fcf != 0.0 => Some(price * shares / fcf),
            _ => None,
        };

        Self {
            graham_number,
            graham_ratio,
            earnings_yield,
            margin_of_safety,
            price_to_free_cash_flow,
        }
    }
}

impl ScreeningCriteria {
    /// True iff every threshold holds. A missing value fails its test.
    pub fn passes(&self, metrics: &TickerMetrics, ratios: &DerivedRatios) -> bool {
        let at_least = |value: Option<f64>, min: f64| value.map_or(false, |v| v >= min);
        let above = |value: Option<f64>, min: f64| value.map_or(false, |v| v > min);
        let below = |value: Option<f64>, max: f64| value.map_or(false, |v| v < max);

        at_least(ratios.margin_of_safety, self.min_margin_of_safety)
            && below(metrics.peg_ratio, self.max_peg_ratio)
            && at_least(metrics.return_on_equity, self.min_return_on_equity)
            && at_least(metrics.current_ratio, self.min_current_ratio)
            && below(metrics.debt_to_equity, self.max_debt_to_equity)
            && above(ratios.earnings_yield, self.min_earnings_yield)
            && below(metrics.trailing_pe, self.max_pe_ratio)
            && below(metrics.price_to_sales, self.max_price_to_sales)
            && below(metrics.price_to_book, self.max_price_to_book)
            && above(metrics.return_on_assets, self.min_roic)
            && below(ratios.price_to_free_cash_flow, self.max_price_to_fcf)
            && below(ratios.graham_ratio, self.max_graham_ratio)
    }
}

/// Round to two decimal places using the exact decimal value of `value`,
/// so 2.675 (stored as 2.67499..) becomes 2.67
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Render a fraction as a percentage with one decimal, e.g. 0.301 -> "30.1%"
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

pub struct ValuationScreener<P> {
    provider: P,
    criteria: ScreeningCriteria,
    fetch_timeout: Duration,
}

impl<P: FundamentalsProvider> ValuationScreener<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            criteria: ScreeningCriteria::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_criteria(mut self, criteria: ScreeningCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn criteria(&self) -> &ScreeningCriteria {
        &self.criteria
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Screen `tickers` and return the undervalued ones in input order
    pub async fn screen(&self, tickers: &[String]) -> Vec<ScreeningResult> {
        self.screen_run(tickers).await.results
    }

    /// Screen `tickers`, also reporting which fetches succeeded or failed
    pub async fn screen_run(&self, tickers: &[String]) -> ScreeningRun {
        let started_at = Utc::now();
        info!("🔍 Screening {} tickers for undervalued stocks", tickers.len());

        let mut results = Vec::new();
        let mut fetched = Vec::new();
        let mut failed = Vec::new();

        for ticker in tickers {
            match self.fetch(ticker).await {
                Ok(mut metrics) => {
                    metrics.ticker = ticker.clone();
                    fetched.push(ticker.clone());
                    if let Some(result) = self.evaluate(&metrics) {
                        debug!("✅ {} qualifies", ticker);
                        results.push(result);
                    }
                }
                Err(e) => {
                    warn!("❌ Skipping {}: {}", ticker, e);
                    failed.push(FailedTicker {
                        ticker: ticker.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "🎯 {} of {} tickers passed ({} fetched, {} failed)",
            results.len(),
            tickers.len(),
            fetched.len(),
            failed.len()
        );

        ScreeningRun {
            results,
            fetched,
            failed,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Apply the valuation filter to one ticker's metrics
    pub fn evaluate(&self, metrics: &TickerMetrics) -> Option<ScreeningResult> {
        let ratios = DerivedRatios::from_metrics(metrics);
        if !self.criteria.passes(metrics, &ratios) {
            return None;
        }

        // passes() guarantees every value below is present
        Some(ScreeningResult {
            ticker: metrics.ticker.clone(),
            pe_ratio: round2(metrics.trailing_pe?),
            peg_ratio: round2(metrics.peg_ratio?),
            return_on_equity: round2(metrics.return_on_equity?),
            current_ratio: round2(metrics.current_ratio?),
            debt_to_equity: round2(metrics.debt_to_equity?),
            price_to_sales: round2(metrics.price_to_sales?),
            price_to_book: round2(metrics.price_to_book?),
            roic: round2(metrics.return_on_assets?),
            price_to_fcf: round2(ratios.price_to_free_cash_flow?),
            graham_ratio: round2(ratios.graham_ratio?),
            margin_of_safety: format_percent(ratios.margin_of_safety?),
        })
    }

    async fn fetch(&self, ticker: &str) -> Result<TickerMetrics, ProviderError> {
        match tokio::time::timeout(self.fetch_timeout, self.provider.get_metrics(ticker)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                ticker: ticker.to_string(),
                timeout: self.fetch_timeout,
            }),
        }
    }
}
