use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use common::Signal;

/// Latest signal per market, shared between the cycle and the read surfaces.
#[derive(Clone, Default)]
pub struct SignalBook {
    inner: Arc<RwLock<HashMap<String, Signal>>>,
}

impl SignalBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, signal: Signal) {
        self.inner.write().await.insert(signal.market.clone(), signal);
    }

    pub async fn get(&self, market: &str) -> Option<Signal> {
        self.inner.read().await.get(market).cloned()
    }

    /// All latest signals, sorted by market.
    pub async fn all(&self) -> Vec<Signal> {
        let mut signals: Vec<Signal> = self.inner.read().await.values().cloned().collect();
        signals.sort_by(|a, b| a.market.cmp(&b.market));
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_only_the_latest_signal_per_market() {
        let book = SignalBook::new();
        book.record(Signal::hold("KRW-ETH", 1.0, "first", "s")).await;
        book.record(Signal::hold("KRW-BTC", 2.0, "only", "s")).await;
        book.record(Signal::hold("KRW-ETH", 3.0, "second", "s")).await;

        assert_eq!(book.get("KRW-ETH").await.unwrap().description, "second");
        assert!(book.get("KRW-XRP").await.is_none());

        let markets: Vec<String> = book.all().await.into_iter().map(|s| s.market).collect();
        assert_eq!(markets, vec!["KRW-BTC", "KRW-ETH"]);
    }
}
