use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLC candle as delivered by the exchange.
///
/// Candle sets are ordered newest-first: index 0 is the most recent candle and
/// strategies address older candles by offset from the head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub market: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Last trade price of the candle (the close for finished candles).
    pub trade_price: f64,
    pub timestamp: DateTime<Utc>,
}

/// An entry of the exchange's market list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Exchange market identifier, e.g. "KRW-BTC".
    pub market: String,
    pub local_name: String,
    pub english_name: String,
}

/// Decision emitted by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalType::Buy => write!(f, "BUY"),
            SignalType::Sell => write!(f, "SELL"),
            SignalType::Hold => write!(f, "HOLD"),
        }
    }
}

/// Market-cycle phase derived from the ordering of three moving averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageNumber {
    /// Two or more averages are tied.
    Stage0,
    /// short > medium > long
    Stage1,
    /// medium > short > long
    Stage2,
    /// medium > long > short
    Stage3,
    /// long > medium > short
    Stage4,
    /// long > short > medium
    Stage5,
    /// short > long > medium
    Stage6,
}

impl StageNumber {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn is_determined(self) -> bool {
        self != StageNumber::Stage0
    }
}

impl std::fmt::Display for StageNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "STAGE_{}", self.value())
    }
}

/// Direction of travel between two consecutive stage observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StageDir {
    /// First observation for a market.
    None,
    Maintain,
    Normal,
    Reverse,
}

impl std::fmt::Display for StageDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageDir::None => write!(f, "NONE"),
            StageDir::Maintain => write!(f, "MAINTAIN"),
            StageDir::Normal => write!(f, "NORMAL"),
            StageDir::Reverse => write!(f, "REVERSE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub number: StageNumber,
    pub dir: StageDir,
    pub description: String,
}

/// Output of one strategy evaluation for one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "type")]
    pub kind: SignalType,
    pub market: String,
    pub current_price: f64,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub strategy_name: String,
    /// Only the cycle strategy attaches a stage.
    pub stage: Option<Stage>,
}

impl Signal {
    pub fn hold(
        market: impl Into<String>,
        current_price: f64,
        description: impl Into<String>,
        strategy_name: impl Into<String>,
    ) -> Self {
        Self {
            kind: SignalType::Hold,
            market: market.into(),
            current_price,
            timestamp: Utc::now(),
            description: description.into(),
            strategy_name: strategy_name.into(),
            stage: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    None,
    Open,
}

impl std::fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionStatus::None => write!(f, "NONE"),
            PositionStatus::Open => write!(f, "OPEN"),
        }
    }
}

/// A simulated holding in the paper ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub status: PositionStatus,
    pub market: String,
    pub quantity: f64,
    pub entry_price: f64,
    /// Realized profit in quote currency. Only set on the snapshot returned
    /// when a position is closed.
    pub profit: f64,
}

impl Position {
    /// Placeholder for a market without an open position.
    pub fn none(market: impl Into<String>) -> Self {
        Self {
            status: PositionStatus::None,
            market: market.into(),
            quantity: 0.0,
            entry_price: 0.0,
            profit: 0.0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }
}

/// Per-market line of the batch report published after every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub market: String,
    pub signal: Signal,
    pub position: Position,
    /// Price of the same asset on the cross-reference exchange, as quoted.
    pub cross_asset_price: Option<String>,
}

/// Current state of the scheduling engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    #[default]
    Idle,
    Scheduled,
    CycleRunning,
    Stopped,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Scheduled => write!(f, "scheduled"),
            EngineState::CycleRunning => write!(f, "cycle_running"),
            EngineState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Commands sent to the engine via the command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    /// Run a cycle now, outside the timer.
    RunNow,
    /// Stop scheduling; an in-flight cycle is allowed to finish.
    Stop,
}

/// Splits "KRW-BTC" into its base asset "BTC". Identifiers without a quote
/// prefix are returned unchanged.
pub fn base_asset(market: &str) -> &str {
    market.split_once('-').map(|(_, base)| base).unwrap_or(market)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_asset_strips_quote_prefix() {
        assert_eq!(base_asset("KRW-BTC"), "BTC");
        assert_eq!(base_asset("ETH"), "ETH");
    }

    #[test]
    fn stage_numbers_order_numerically() {
        assert!(StageNumber::Stage6 > StageNumber::Stage1);
        assert_eq!(StageNumber::Stage4.value(), 4);
        assert_eq!(StageNumber::Stage4.to_string(), "STAGE_4");
    }

    #[test]
    fn signal_serializes_kind_as_type() {
        let signal = Signal::hold("KRW-BTC", 1.0, "waiting", "test");
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["type"], "HOLD");
        assert!(json["stage"].is_null());
    }
}
