use std::time::Duration;

use serde::{Deserialize, Serialize};

use common::{Error, Result};
use strategy::StrategyConfig;

/// Upbit refuses candle requests above this count.
pub const MAX_CANDLE_COUNT: usize = 200;

const MINUTE_UNITS: [u32; 8] = [1, 3, 5, 10, 15, 30, 60, 240];

/// Trading config file (TOML).
///
/// Example `config/trading.toml`:
/// ```toml
/// markets = ["BTC", "ETH", "XRP"]
/// quote_currency = "KRW"
/// analysis_interval_minutes = 15
/// order_amount = 100000.0
///
/// [candle]
/// category = "minutes"
/// unit = 15
///
/// [strategy]
/// name = "moving-average-cycle"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TradingConfig {
    /// Base symbols; the quote currency prefix is applied by the engine.
    pub markets: Vec<String>,
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,
    pub analysis_interval_minutes: u64,
    /// Quote-currency notional spent per BUY.
    pub order_amount: f64,
    /// Quote asset for the cross-exchange price shown in reports. Empty disables it.
    #[serde(default = "default_cross_asset_quote")]
    pub cross_asset_quote: String,
    pub candle: CandleConfig,
    pub strategy: StrategyConfig,
}

fn default_quote_currency() -> String {
    "KRW".to_string()
}

fn default_cross_asset_quote() -> String {
    "USDT".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleCategory {
    Minutes,
    Days,
    Weeks,
    Months,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CandleConfig {
    pub category: CandleCategory,
    /// Minute bucket size; only used with `category = "minutes"`.
    #[serde(default)]
    pub unit: Option<u32>,
}

impl CandleConfig {
    /// Exchange path for this granularity, e.g. `/candles/minutes/15`.
    pub fn api_path(&self) -> Result<String> {
        match self.category {
            CandleCategory::Minutes => match self.unit {
                Some(unit) if MINUTE_UNITS.contains(&unit) => Ok(format!("/candles/minutes/{unit}")),
                other => Err(Error::Config(format!(
                    "minute candles need unit in {MINUTE_UNITS:?}, got {other:?}"
                ))),
            },
            CandleCategory::Days => Ok("/candles/days".to_string()),
            CandleCategory::Weeks => Ok("/candles/weeks".to_string()),
            CandleCategory::Months => Ok("/candles/months".to_string()),
        }
    }
}

impl TradingConfig {
    /// Load and validate the trading config from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read trading config at '{path}': {e}")))?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("Invalid trading config at '{path}': {e}")))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let cfg: TradingConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.markets.iter().all(|m| m.trim().is_empty()) {
            return Err(Error::Config("markets must not be empty".into()));
        }
        if self.quote_currency.trim().is_empty() {
            return Err(Error::Config("quote_currency must not be empty".into()));
        }
        if self.analysis_interval_minutes == 0 {
            return Err(Error::Config("analysis_interval_minutes must be at least 1".into()));
        }
        if !(self.order_amount.is_finite() && self.order_amount > 0.0) {
            return Err(Error::Config(format!(
                "order_amount must be positive, got {}",
                self.order_amount
            )));
        }
        self.candle.api_path()?;
        if let Some(count) = strategy::registry::required_candle_count(&self.strategy) {
            if count > MAX_CANDLE_COUNT {
                return Err(Error::Config(format!(
                    "strategy needs {count} candles per request, exchange limit is {MAX_CANDLE_COUNT}"
                )));
            }
        }
        Ok(())
    }

    pub fn analysis_interval(&self) -> Duration {
        Duration::from_secs(self.analysis_interval_minutes * 60)
    }

    /// Configured base symbols qualified with the quote currency, de-duplicated
    /// in configuration order: `["BTC"]` becomes `["KRW-BTC"]`.
    pub fn qualified_markets(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.markets
            .iter()
            .map(|m| m.trim().to_uppercase())
            .filter(|m| !m.is_empty())
            .map(|m| format!("{}-{}", self.quote_currency.trim().to_uppercase(), m))
            .filter(|m| seen.insert(m.clone()))
            .collect()
    }

    /// Cross-reference symbol for `market`, e.g. "KRW-BTC" -> "BTCUSDT".
    pub fn cross_asset_symbol(&self, market: &str) -> Option<String> {
        let quote = self.cross_asset_quote.trim();
        if quote.is_empty() {
            return None;
        }
        Some(format!("{}{}", common::base_asset(market), quote.to_uppercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        markets = ["btc", "ETH", "BTC", " "]
        analysis_interval_minutes = 15
        order_amount = 100000.0

        [candle]
        category = "minutes"
        unit = 15

        [strategy]
        name = "moving-average-cycle"

        [strategy.moving_average_cycle]
        short_period = 5
        medium_period = 20
        long_period = 60
    "#;

    #[test]
    fn parses_sample_with_defaults() {
        let cfg = TradingConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(cfg.quote_currency, "KRW");
        assert_eq!(cfg.cross_asset_quote, "USDT");
        assert_eq!(cfg.strategy.moving_average_cycle.long_period, 60);
        assert_eq!(cfg.strategy.moving_average_cross.long_period, 20);
        assert_eq!(cfg.analysis_interval(), Duration::from_secs(900));
    }

    #[test]
    fn markets_are_qualified_and_deduplicated() {
        let cfg = TradingConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(cfg.qualified_markets(), vec!["KRW-BTC", "KRW-ETH"]);
        assert_eq!(cfg.cross_asset_symbol("KRW-ETH").as_deref(), Some("ETHUSDT"));
    }

    #[test]
    fn candle_paths_follow_category() {
        let minutes = CandleConfig { category: CandleCategory::Minutes, unit: Some(240) };
        assert_eq!(minutes.api_path().unwrap(), "/candles/minutes/240");
        let days = CandleConfig { category: CandleCategory::Days, unit: None };
        assert_eq!(days.api_path().unwrap(), "/candles/days");
        let bad = CandleConfig { category: CandleCategory::Minutes, unit: Some(7) };
        assert!(matches!(bad.api_path(), Err(Error::Config(_))));
        let missing = CandleConfig { category: CandleCategory::Minutes, unit: None };
        assert!(missing.api_path().is_err());
    }

    #[test]
    fn rejects_unusable_values() {
        let zero_interval = SAMPLE.replace("analysis_interval_minutes = 15", "analysis_interval_minutes = 0");
        assert!(TradingConfig::from_toml(&zero_interval).is_err());

        let negative_amount = SAMPLE.replace("order_amount = 100000.0", "order_amount = -1.0");
        assert!(TradingConfig::from_toml(&negative_amount).is_err());

        let too_long = SAMPLE.replace("long_period = 60", "long_period = 250");
        assert!(TradingConfig::from_toml(&too_long).is_err());

        let no_markets = SAMPLE.replace(r#"["btc", "ETH", "BTC", " "]"#, "[]");
        assert!(TradingConfig::from_toml(&no_markets).is_err());
    }

    #[test]
    fn empty_cross_quote_disables_enrichment() {
        let mut cfg = TradingConfig::from_toml(SAMPLE).unwrap();
        cfg.cross_asset_quote = String::new();
        assert_eq!(cfg.cross_asset_symbol("KRW-BTC"), None);
    }
}
