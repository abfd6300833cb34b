use std::time::Duration;
use thiserror::Error;

/// Failure to obtain metrics for a single ticker. The screener recovers
/// from every variant by skipping the ticker.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no response for {ticker} within {timeout:?}")]
    Timeout { ticker: String, timeout: Duration },
}
