use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Tickers screened when nothing else is configured
pub const DEFAULT_TICKERS: [&str; 5] = ["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"];

fn normalize(ticker: &str) -> Option<String> {
    let ticker = ticker.trim().to_uppercase();
    (!ticker.is_empty()).then_some(ticker)
}

fn push_unique(tickers: &mut Vec<String>, seen: &mut HashSet<String>, ticker: String) {
    if seen.insert(ticker.clone()) {
        tickers.push(ticker);
    }
}

/// Parse a comma or whitespace separated ticker list, keeping first occurrences
pub fn parse_ticker_list(list: &str) -> Vec<String> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();
    for ticker in list.split(|c: char| c == ',' || c.is_whitespace()).filter_map(normalize) {
        push_unique(&mut tickers, &mut seen, ticker);
    }
    tickers
}

/// Load tickers from a constituents CSV. Reads the `Symbol` (or `Ticker`)
/// column when present, the first column otherwise.
pub fn load_universe_csv(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| anyhow!("Failed to open universe file {}: {}", path.display(), e))?;

    let column = reader
        .headers()?
        .iter()
        .position(|h| {
            let h = h.trim();
            h.eq_ignore_ascii_case("symbol") || h.eq_ignore_ascii_case("ticker")
        })
        .unwrap_or(0);

    let mut tickers = Vec::new();
    let mut seen = HashSet::new();
    for record in reader.records() {
        let record = record?;
        if let Some(ticker) = record.get(column).and_then(normalize) {
            push_unique(&mut tickers, &mut seen, ticker);
        }
    }

    info!("📋 Loaded {} tickers from {}", tickers.len(), path.display());
    Ok(tickers)
}
