use serde::{Deserialize, Serialize};

/// `[strategy]` table of the trading config file.
///
/// ```toml
/// [strategy]
/// name = "moving-average-cycle"
/// stage_direction = "linear"
///
/// [strategy.moving_average_cross]
/// short_period = 5
/// long_period = 20
///
/// [strategy.moving_average_cycle]
/// short_period = 5
/// medium_period = 20
/// long_period = 40
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Strategy identifier: "moving-average-cross" or "moving-average-cycle".
    pub name: String,
    #[serde(default)]
    pub moving_average_cross: CrossParams,
    #[serde(default)]
    pub moving_average_cycle: CycleParams,
    /// How consecutive cycle stages are compared.
    #[serde(default)]
    pub stage_direction: DirectionMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CrossParams {
    pub short_period: usize,
    pub long_period: usize,
}

impl CrossParams {
    /// One candle beyond the long window, so the previous long MA exists too.
    pub fn required_candle_count(&self) -> usize {
        self.long_period + 1
    }
}

impl Default for CrossParams {
    fn default() -> Self {
        Self {
            short_period: 5,
            long_period: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CycleParams {
    pub short_period: usize,
    pub medium_period: usize,
    pub long_period: usize,
}

impl CycleParams {
    pub fn required_candle_count(&self) -> usize {
        self.long_period + 1
    }
}

impl Default for CycleParams {
    fn default() -> Self {
        Self {
            short_period: 5,
            medium_period: 20,
            long_period: 40,
        }
    }
}

/// Comparison rule for deriving a stage direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionMode {
    /// Flat numeric comparison of stage numbers 0..=6.
    #[default]
    Linear,
    /// Stages 1..=6 form a ring, so 6 -> 1 counts as forward travel.
    Cyclic,
}
