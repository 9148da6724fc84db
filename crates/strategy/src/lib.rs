pub mod config;
pub mod cross;
pub mod cycle;
pub mod indicators;
pub mod registry;
pub mod stage;

pub use config::{CrossParams, CycleParams, DirectionMode, StrategyConfig};
pub use cross::CrossStrategy;
pub use cycle::CycleStrategy;
pub use registry::{build_strategy, CROSS_STRATEGY, CYCLE_STRATEGY};
pub use stage::StageTracker;

use common::{Candle, Signal};

/// All strategy implementations must satisfy this trait.
pub trait Strategy: Send + Sync {
    /// Configured name, copied into every emitted signal.
    fn name(&self) -> &str;

    /// Minimum number of candles `analyze` needs to compute anything.
    fn required_candle_count(&self) -> usize;

    /// Evaluate `candles` (newest first) for `market`.
    ///
    /// Never panics on short input: fewer than `required_candle_count()`
    /// candles yields a HOLD signal that says so.
    fn analyze(&self, market: &str, candles: &[Candle]) -> Signal;
}

/// HOLD returned when `candles` is shorter than the strategy's lookback.
pub(crate) fn insufficient_data(strategy: &dyn Strategy, market: &str, candles: &[Candle]) -> Signal {
    let price = candles.first().map(|c| c.trade_price).unwrap_or(0.0);
    Signal::hold(
        market,
        price,
        format!(
            "insufficient candle data: got {}, need {} - holding",
            candles.len(),
            strategy.required_candle_count()
        ),
        strategy.name(),
    )
}
