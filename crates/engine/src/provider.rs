use async_trait::async_trait;

use common::{Candle, MarketDataProvider, MarketInfo, Result};

use crate::binance::BinanceClient;
use crate::upbit::UpbitClient;

/// Live market data: candles and listings from Upbit, cross prices from Binance.
pub struct ExchangeMarketData {
    upbit: UpbitClient,
    binance: BinanceClient,
}

impl ExchangeMarketData {
    pub fn new(upbit: UpbitClient, binance: BinanceClient) -> Self {
        Self { upbit, binance }
    }

    /// Build both clients from their base URLs.
    pub fn from_urls(upbit_url: &str, binance_url: &str) -> Result<Self> {
        Ok(Self::new(UpbitClient::new(upbit_url)?, BinanceClient::new(binance_url)?))
    }
}

#[async_trait]
impl MarketDataProvider for ExchangeMarketData {
    async fn list_markets(&self) -> Result<Vec<MarketInfo>> {
        self.upbit.list_markets().await
    }

    async fn candles(&self, market: &str, category_path: &str, count: usize) -> Result<Vec<Candle>> {
        self.upbit.candles(market, category_path, count).await
    }

    async fn cross_asset_price(&self, symbol: &str) -> Result<String> {
        self.binance.ticker_price(symbol).await
    }
}
