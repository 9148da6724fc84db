use tracing::warn;
use url::Url;

use crate::{Error, Result};

pub const DEFAULT_UPBIT_API_URL: &str = "https://api.upbit.com/v1";
pub const DEFAULT_BINANCE_API_URL: &str = "https://api.binance.com";

/// Process-level settings loaded from environment variables at startup.
///
/// Trading parameters (markets, strategy, periods) live in the trading config
/// file named by `trading_config_path`.
#[derive(Debug, Clone)]
pub struct Config {
    // Exchanges
    pub upbit_api_url: String,
    pub binance_api_url: String,

    // Telegram. Notifications are disabled unless both are set.
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<i64>,

    // Query API
    pub api_port: u16,

    pub trading_config_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let upbit_api_url = var("UPBIT_API_URL")
            .unwrap_or_else(|| DEFAULT_UPBIT_API_URL.to_string());
        let binance_api_url = var("BINANCE_API_URL")
            .unwrap_or_else(|| DEFAULT_BINANCE_API_URL.to_string());
        check_url("UPBIT_API_URL", &upbit_api_url)?;
        check_url("BINANCE_API_URL", &binance_api_url)?;

        let telegram_chat_id = var("TELEGRAM_CHAT_ID")
            .map(|v| {
                v.trim().parse::<i64>().map_err(|_| {
                    Error::Config(format!("TELEGRAM_CHAT_ID is not numeric: '{}'", v.trim()))
                })
            })
            .transpose()?;
        let telegram_token = var("TELEGRAM_TOKEN");
        if telegram_token.is_some() != telegram_chat_id.is_some() {
            warn!("Only one of TELEGRAM_TOKEN / TELEGRAM_CHAT_ID is set; notifications disabled");
        }

        let api_port = match var("API_PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("API_PORT is not a valid port: '{v}'")))?,
            None => 3000,
        };

        Ok(Config {
            upbit_api_url: upbit_api_url.trim_end_matches('/').to_string(),
            binance_api_url: binance_api_url.trim_end_matches('/').to_string(),
            telegram_token,
            telegram_chat_id,
            api_port,
            trading_config_path: var("TRADING_CONFIG_PATH")
                .unwrap_or_else(|| "config/trading.toml".to_string()),
        })
    }

    /// Token and chat id, when Telegram delivery is fully configured.
    pub fn telegram(&self) -> Option<(&str, i64)> {
        match (&self.telegram_token, self.telegram_chat_id) {
            (Some(token), Some(chat_id)) => Some((token.as_str(), chat_id)),
            _ => None,
        }
    }
}

fn check_url(key: &str, value: &str) -> Result<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| Error::Config(format!("{key} is not a valid URL ('{value}'): {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.upbit_api_url, DEFAULT_UPBIT_API_URL);
        assert_eq!(cfg.binance_api_url, DEFAULT_BINANCE_API_URL);
        assert_eq!(cfg.api_port, 3000);
        assert_eq!(cfg.trading_config_path, "config/trading.toml");
        assert!(cfg.telegram().is_none());
    }

    #[test]
    fn telegram_requires_token_and_chat_id() {
        let cfg = Config::from_lookup(lookup(&[("TELEGRAM_TOKEN", "abc")])).unwrap();
        assert!(cfg.telegram().is_none());

        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_TOKEN", "abc"),
            ("TELEGRAM_CHAT_ID", "-100123"),
        ]))
        .unwrap();
        assert_eq!(cfg.telegram(), Some(("abc", -100123)));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("TELEGRAM_CHAT_ID", "chat")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("API_PORT", "99999")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("UPBIT_API_URL", "not a url")])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_urls() {
        let cfg = Config::from_lookup(lookup(&[("UPBIT_API_URL", "http://localhost:9000/v1/")]))
            .unwrap();
        assert_eq!(cfg.upbit_api_url, "http://localhost:9000/v1");
    }
}
