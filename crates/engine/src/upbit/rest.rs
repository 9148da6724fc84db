use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{Candle, Error, MarketInfo, Result};

/// Public quotation REST client for Upbit. No authentication is needed for
/// market listings or candles.
pub struct UpbitClient {
    base_url: String,
    http: Client,
}

impl UpbitClient {
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

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Exchange(format!("Upbit HTTP {status}: {body}")));
        }
        Ok(body)
    }

    /// Every market listed on Upbit.
    pub async fn list_markets(&self) -> Result<Vec<MarketInfo>> {
        let body = self.get("/market/all", &[]).await?;
        let markets: Vec<MarketResponse> = serde_json::from_str(&body)?;
        debug!(count = markets.len(), "Fetched Upbit market list");
        Ok(markets
            .into_iter()
            .map(|m| MarketInfo {
                market: m.market,
                local_name: m.korean_name,
                english_name: m.english_name,
            })
            .collect())
    }

    /// Latest `count` candles for `market` at `path` (e.g. `/candles/minutes/15`), newest first.
    pub async fn candles(&self, market: &str, path: &str, count: usize) -> Result<Vec<Candle>> {
        let query = [("market", market.to_string()), ("count", count.to_string())];
        let body = self.get(path, &query).await?;
        let raw: Vec<CandleResponse> = serde_json::from_str(&body)?;

        let candles = raw
            .into_iter()
            .map(|c| {
                let timestamp = DateTime::<Utc>::from_timestamp_millis(c.timestamp).ok_or_else(|| {
                    Error::Exchange(format!("candle timestamp {} out of range", c.timestamp))
                })?;
                Ok(Candle {
                    market: c.market,
                    open: c.opening_price,
                    high: c.high_price,
                    low: c.low_price,
                    trade_price: c.trade_price,
                    timestamp,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(market, path, count = candles.len(), "Fetched Upbit candles");
        Ok(candles)
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct MarketResponse {
    market: String,
    korean_name: String,
    english_name: String,
}

#[derive(Deserialize)]
struct CandleResponse {
    market: String,
    opening_price: f64,
    high_price: f64,
    low_price: f64,
    trade_price: f64,
    timestamp: i64,
}
