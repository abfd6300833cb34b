use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::universe::DEFAULT_TICKERS;

/// Telegram-style numeric user identity
pub type UserId = i64;

/// Fundamental snapshot for one ticker as reported by the data provider.
/// Providers may omit any field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerMetrics {
    pub ticker: String,
    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    /// As reported by the provider. Yahoo reports a percentage (45.3 means
    /// 0.453); the value is compared against the threshold unscaled.
    pub debt_to_equity: Option<f64>,
    #[serde(rename = "priceToSalesTrailing12Months")]
    pub price_to_sales: Option<f64>,
    pub price_to_book: Option<f64>,
    /// Stands in for ROIC
    pub return_on_assets: Option<f64>,
    pub previous_close: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub book_value: Option<f64>,
    pub free_cashflow: Option<f64>,
    pub shares_outstanding: Option<f64>,
}

impl TickerMetrics {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }
}

/// Ratios derived from `TickerMetrics`. `None` means the ratio's
/// preconditions were not met.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedRatios {
    pub graham_number: Option<f64>,
    pub graham_ratio: Option<f64>,
    pub earnings_yield: Option<f64>,
    pub margin_of_safety: Option<f64>,
    pub price_to_free_cash_flow: Option<f64>,
}

/// Thresholds for the undervalued-stock filter. The comparison used for
/// each threshold is fixed by the screener; only the numbers live here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningCriteria {
    /// margin of safety >= value
    pub min_margin_of_safety: f64,
    /// PEG < value
    pub max_peg_ratio: f64,
    /// ROE >= value
    pub min_return_on_equity: f64,
    /// current ratio >= value
    pub min_current_ratio: f64,
    /// D/E < value
    pub max_debt_to_equity: f64,
    /// earnings yield > value
    pub min_earnings_yield: f64,
    /// P/E < value
    pub max_pe_ratio: f64,
    /// P/S < value
    pub max_price_to_sales: f64,
    /// P/B < value
    pub max_price_to_book: f64,
    /// ROIC (ROA proxy) > value
    pub min_roic: f64,
    /// P/FCF < value
    pub max_price_to_fcf: f64,
    /// Graham ratio < value
    pub max_graham_ratio: f64,
}

impl Default for ScreeningCriteria {
    fn default() -> Self {
        Self {
            min_margin_of_safety: 0.30,
            max_peg_ratio: 1.0,
            min_return_on_equity: 0.10,
            min_current_ratio: 1.5,
            max_debt_to_equity: 0.5,
            min_earnings_yield: 0.03,
            max_pe_ratio: 15.0,
            max_price_to_sales: 1.0,
            max_price_to_book: 2.0,
            min_roic: 0.20,
            max_price_to_fcf: 5.0,
            max_graham_ratio: 1.0,
        }
    }
}

/// One qualifying ticker with its headline ratios, rounded for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub ticker: String,
    pub pe_ratio: f64,
    pub peg_ratio: f64,
    pub return_on_equity: f64,
    pub current_ratio: f64,
    pub debt_to_equity: f64,
    pub price_to_sales: f64,
    pub price_to_book: f64,
    pub roic: f64,
    pub price_to_fcf: f64,
    pub graham_ratio: f64,
    /// Percentage string, e.g. "30.1%"
    pub margin_of_safety: String,
}

impl fmt::Display for ScreeningResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} — P/E: {}, PEG: {}, ROE: {}, Current Ratio: {}, D/E: {}, P/S: {}, P/B: {}, \
             ROIC: {}, P/FCF: {}, Graham Ratio: {}, Margin of Safety: {}",
            self.ticker,
            self.pe_ratio,
            self.peg_ratio,
            self.return_on_equity,
            self.current_ratio,
            self.debt_to_equity,
            self.price_to_sales,
            self.price_to_book,
            self.roic,
            self.price_to_fcf,
            self.graham_ratio,
            self.margin_of_safety,
        )
    }
}

/// Ticker whose metrics could not be fetched during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedTicker {
    pub ticker: String,
    pub error: String,
}

/// Full outcome of one screening batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningRun {
    pub results: Vec<ScreeningResult>,
    /// Tickers whose metrics were fetched, in input order
    pub fetched: Vec<String>,
    pub failed: Vec<FailedTicker>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScreeningRun {
    /// True when tickers were requested but none could be fetched,
    /// i.e. an empty result says nothing about valuations.
    pub fn is_outage(&self) -> bool {
        self.fetched.is_empty() && !self.failed.is_empty()
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub yahoo_base_url: String,
    pub news_api_key: Option<String>,
    pub news_api_url: String,
    pub news_language: String,
    pub fetch_timeout_secs: u64,
    pub rate_limit_per_minute: u32,
    pub screen_tickers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            yahoo_base_url: "https://query2.finance.yahoo.com".to_string(),
            news_api_key: None,
            news_api_url: "https://newsapi.org".to_string(),
            news_language: "en".to_string(),
            fetch_timeout_secs: 5,
            rate_limit_per_minute: 120,
            screen_tickers: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let defaults = Config::default();

        Ok(Config {
            yahoo_base_url: std::env::var("YAHOO_BASE_URL")
                .unwrap_or(defaults.yahoo_base_url),
            news_api_key: std::env::var("NEWS_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            news_api_url: std::env::var("NEWS_API_URL")
                .unwrap_or(defaults.news_api_url),
            news_language: std::env::var("NEWS_LANGUAGE")
                .unwrap_or(defaults.news_language),
            fetch_timeout_secs: parse_timeout_secs(
                std::env::var("FETCH_TIMEOUT_SECS").ok().as_deref(),
                defaults.fetch_timeout_secs,
            ),
            rate_limit_per_minute: std::env::var("RATE_LIMIT_PER_MINUTE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rate_limit_per_minute),
            screen_tickers: std::env::var("SCREEN_TICKERS")
                .ok()
                .map(|list| crate::universe::parse_ticker_list(&list))
                .filter(|tickers| !tickers.is_empty())
                .unwrap_or(defaults.screen_tickers),
        })
    }

    /// Require the NewsAPI key, which only the news commands need
    pub fn require_news_api_key(&self) -> anyhow::Result<&str> {
        self.news_api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("NEWS_API_KEY environment variable required"))
    }
}

/// A zero timeout would fail every fetch, so it falls back to the default too
fn parse_timeout_secs(value: Option<&str>, default: u64) -> u64 {
    value
        .and_then(|v| v.trim().parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}
