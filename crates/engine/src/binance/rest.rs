use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Error, Result};

/// Public (unsigned) REST client for Binance spot tickers.
///
/// Only used to quote the cross-reference price that accompanies each report.
pub struct BinanceClient {
    base_url: String,
    http: Client,
}

impl BinanceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Last traded price for `symbol` (e.g. "BTCUSDT"), exactly as Binance formats it.
    pub async fn ticker_price(&self, symbol: &str) -> Result<String> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        debug!(symbol, "Fetching Binance ticker");

        let resp = self
            .http
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Exchange(format!("Binance HTTP {status}: {body}")));
        }

        let ticker: PriceTicker = serde_json::from_str(&body)?;
        if ticker.price.parse::<f64>().is_err() {
            return Err(Error::Exchange(format!(
                "Binance returned non-numeric price '{}' for {symbol}",
                ticker.price
            )));
        }
        Ok(ticker.price)
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PriceTicker {
    price: String,
}
