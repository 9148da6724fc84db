use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use common::{Candle, Signal, SignalType, StageNumber};

use crate::config::CycleParams;
use crate::indicators::MaPair;
use crate::stage::StageTracker;
use crate::{insufficient_data, Strategy};

/// Three-average market-cycle strategy.
///
/// Classifies the ordering of the short, medium and long averages into one of
/// six stages. Stage 1 (stable uptrend) buys and stage 4 (stable downtrend)
/// sells, each only when all three averages moved in the trend's direction
/// since the previous window.
pub struct CycleStrategy {
    name: String,
    params: CycleParams,
    tracker: Arc<StageTracker>,
}

impl CycleStrategy {
    pub fn new(name: impl Into<String>, params: CycleParams, tracker: Arc<StageTracker>) -> Self {
        Self {
            name: name.into(),
            params,
            tracker,
        }
    }

    pub fn tracker(&self) -> &StageTracker {
        &self.tracker
    }
}

/// Stage for the current ordering of the three averages. Any tie is stage 0.
pub fn classify(short: f64, medium: f64, long: f64) -> StageNumber {
    if short > medium && medium > long {
        StageNumber::Stage1
    } else if medium > short && short > long {
        StageNumber::Stage2
    } else if medium > long && long > short {
        StageNumber::Stage3
    } else if long > medium && medium > short {
        StageNumber::Stage4
    } else if long > short && short > medium {
        StageNumber::Stage5
    } else if short > long && long > medium {
        StageNumber::Stage6
    } else {
        StageNumber::Stage0
    }
}

pub fn stage_description(stage: StageNumber) -> &'static str {
    match stage {
        StageNumber::Stage0 => "undetermined stage",
        StageNumber::Stage1 => "stable uptrend, short/medium/long",
        StageNumber::Stage2 => "uptrend ending, medium/short/long",
        StageNumber::Stage3 => "downtrend starting, medium/long/short",
        StageNumber::Stage4 => "stable downtrend, long/medium/short",
        StageNumber::Stage5 => "downtrend ending, long/short/medium",
        StageNumber::Stage6 => "uptrend starting, short/long/medium",
    }
}

impl Strategy for CycleStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_candle_count(&self) -> usize {
        self.params.required_candle_count()
    }

    fn analyze(&self, market: &str, candles: &[Candle]) -> Signal {
        if candles.len() < self.required_candle_count() {
            return insufficient_data(self, market, candles);
        }

        let (Some(short), Some(medium), Some(long)) = (
            MaPair::compute(candles, self.params.short_period),
            MaPair::compute(candles, self.params.medium_period),
            MaPair::compute(candles, self.params.long_period),
        ) else {
            return insufficient_data(self, market, candles);
        };

        debug!(
            market,
            prev_short = short.previous,
            prev_medium = medium.previous,
            prev_long = long.previous,
            short = short.current,
            medium = medium.current,
            long = long.current,
            "Cycle averages"
        );

        let number = classify(short.current, medium.current, long.current);
        let kind = match number {
            StageNumber::Stage1 if short.rising() && medium.rising() && long.rising() => {
                SignalType::Buy
            }
            StageNumber::Stage4 if short.falling() && medium.falling() && long.falling() => {
                SignalType::Sell
            }
            _ => SignalType::Hold,
        };

        let stage = self
            .tracker
            .observe(market, number, stage_description(number));

        let lead = match kind {
            SignalType::Buy => "📈 BUY signal",
            SignalType::Sell => "📉 SELL signal",
            SignalType::Hold => "⏸️ holding",
        };
        let description = format!(
            "{lead} - {} | MA{}: {:.2}, MA{}: {:.2}, MA{}: {:.2}",
            stage.description,
            short.period,
            short.current,
            medium.period,
            medium.current,
            long.period,
            long.current
        );

        Signal {
            kind,
            market: market.to_string(),
            current_price: candles[0].trade_price,
            timestamp: Utc::now(),
            description,
            strategy_name: self.name.clone(),
            stage: Some(stage),
        }
    }
}
