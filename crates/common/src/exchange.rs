use async_trait::async_trait;

use crate::{Action, Candle, MarketInfo, Result};

/// Read-only access to exchange market data.
///
/// `ExchangeMarketData` in `crates/engine` implements this over the Upbit and
/// Binance REST APIs; tests substitute in-memory providers.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// All markets currently listed on the exchange.
    async fn list_markets(&self) -> Result<Vec<MarketInfo>>;

    /// The latest `count` candles for `market`, newest first.
    ///
    /// `category_path` selects the granularity, e.g. `/candles/minutes/15`.
    async fn candles(&self, market: &str, category_path: &str, count: usize) -> Result<Vec<Candle>>;

    /// Quoted price of `symbol` (e.g. "BTCUSDT") on the cross-reference
    /// exchange, as the exchange formats it.
    async fn cross_asset_price(&self, symbol: &str) -> Result<String>;
}

/// Delivery channel for cycle reports.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish the actions of one cycle as a single report.
    async fn publish_batch(&self, actions: &[Action]) -> Result<()>;

    /// Publish a free-form lifecycle message.
    async fn notify(&self, message: &str) -> Result<()>;
}
