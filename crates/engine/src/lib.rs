pub mod binance;
pub mod config;
pub mod cycle;
pub mod lifecycle;
pub mod provider;
pub mod signals;
pub mod upbit;

pub use binance::BinanceClient;
pub use config::{CandleCategory, CandleConfig, TradingConfig};
pub use cycle::{Cycle, CycleReport};
pub use lifecycle::{Engine, EngineHandle, StatsSnapshot};
pub use provider::ExchangeMarketData;
pub use signals::SignalBook;
pub use upbit::UpbitClient;
