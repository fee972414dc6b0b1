use async_trait::async_trait;
use midas_core::Price;
use thiserror::Error;

/// Market-data failures. Every variant means the current tick has no usable
/// price; callers skip rather than deliver a partial signal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("market data unavailable: {0}")]
    Unavailable(String),

    #[error("market data malformed: {0}")]
    Malformed(String),
}

/// Port for the market-data fetcher
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Current price for the given symbol
    async fn price_of(&self, symbol: &str) -> Result<Price, MarketError>;
}
