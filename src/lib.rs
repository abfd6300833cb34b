pub mod api;
pub mod error;
pub mod favorites;
pub mod models;
pub mod news;
pub mod notify;
pub mod screener;
pub mod universe;

pub use api::{FundamentalsProvider, YahooClient};
pub use error::ProviderError;
pub use screener::ValuationScreener;
