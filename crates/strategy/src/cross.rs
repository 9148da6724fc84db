use chrono::Utc;
use tracing::debug;

use common::{Candle, Signal, SignalType};

use crate::config::CrossParams;
use crate::indicators::MaPair;
use crate::{insufficient_data, Strategy};

/// Two-average crossover.
///
/// BUY on a golden cross (short crosses above long between the previous and
/// the current window), SELL on a dead cross, HOLD otherwise.
#[derive(Debug, Clone)]
pub struct CrossStrategy {
    name: String,
    params: CrossParams,
}

/// Result of comparing two consecutive short/long windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Golden,
    Dead,
    None,
}

impl Crossover {
    pub fn detect(short: &MaPair, long: &MaPair) -> Self {
        if short.previous <= long.previous && short.current > long.current {
            Crossover::Golden
        } else if short.previous >= long.previous && short.current < long.current {
            Crossover::Dead
        } else {
            Crossover::None
        }
    }
}

impl CrossStrategy {
    pub fn new(name: impl Into<String>, params: CrossParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

impl Strategy for CrossStrategy {
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

        let (Some(short), Some(long)) = (
            MaPair::compute(candles, self.params.short_period),
            MaPair::compute(candles, self.params.long_period),
        ) else {
            return insufficient_data(self, market, candles);
        };

        debug!(
            market,
            prev_short = short.previous,
            prev_long = long.previous,
            short = short.current,
            long = long.current,
            "Crossover averages"
        );

        let (kind, description) = match Crossover::detect(&short, &long) {
            Crossover::Golden => (
                SignalType::Buy,
                format!(
                    "golden cross: MA{} {:.2} crossed above MA{} {:.2}",
                    short.period, short.current, long.period, long.current
                ),
            ),
            Crossover::Dead => (
                SignalType::Sell,
                format!(
                    "dead cross: MA{} {:.2} crossed below MA{} {:.2}",
                    short.period, short.current, long.period, long.current
                ),
            ),
            Crossover::None => (SignalType::Hold, "no crossover - holding".to_string()),
        };

        Signal {
            kind,
            market: market.to_string(),
            current_price: candles[0].trade_price,
            timestamp: Utc::now(),
            description,
            strategy_name: self.name.clone(),
            stage: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::candles;

    fn strategy() -> CrossStrategy {
        CrossStrategy::new(
            "moving-average-cross",
            CrossParams {
                short_period: 2,
                long_period: 3,
            },
        )
    }

    #[test]
    fn requires_one_more_candle_than_long_period() {
        assert_eq!(strategy().required_candle_count(), 4);
    }

    #[test]
    fn golden_cross_emits_buy() {
        // previous: short 10 == long 10; current: short 11.5 > long 11
        let signal = strategy().analyze("KRW-BTC", &candles("KRW-BTC", &[13.0, 10.0, 10.0, 10.0]));
        assert_eq!(signal.kind, SignalType::Buy);
        assert!(signal.description.contains("MA2 11.50"));
        assert!(signal.description.contains("MA3 11.00"));
        assert_eq!(signal.current_price, 13.0);
        assert!(signal.stage.is_none());
    }

    #[test]
    fn dead_cross_emits_sell() {
        // previous: short 10 == long 10; current: short 8.5 < long 9
        let signal = strategy().analyze("KRW-BTC", &candles("KRW-BTC", &[7.0, 10.0, 10.0, 10.0]));
        assert_eq!(signal.kind, SignalType::Sell);
        assert!(signal.description.starts_with("dead cross"));
    }

    #[test]
    fn golden_and_dead_cross_are_distinct_for_one_instance() {
        let s = strategy();
        let buy = s.analyze("KRW-BTC", &candles("KRW-BTC", &[13.0, 10.0, 10.0, 10.0]));
        let sell = s.analyze("KRW-BTC", &candles("KRW-BTC", &[7.0, 10.0, 10.0, 10.0]));
        assert_ne!(buy.kind, sell.kind);
    }

    #[test]
    fn sustained_trend_without_cross_holds() {
        // short stays above long in both windows
        let signal = strategy().analyze("KRW-BTC", &candles("KRW-BTC", &[14.0, 13.0, 12.0, 11.0]));
        assert_eq!(signal.kind, SignalType::Hold);
        assert_eq!(signal.description, "no crossover - holding");
    }

    #[test]
    fn short_input_holds() {
        let signal = strategy().analyze("KRW-BTC", &candles("KRW-BTC", &[13.0, 10.0, 10.0]));
        assert_eq!(signal.kind, SignalType::Hold);
        assert!(signal.description.contains("insufficient"));

        let empty = strategy().analyze("KRW-BTC", &[]);
        assert_eq!(empty.kind, SignalType::Hold);
        assert_eq!(empty.current_price, 0.0);
    }

    #[test]
    fn extra_candles_are_ignored() {
        let signal = strategy().analyze(
            "KRW-BTC",
            &candles("KRW-BTC", &[13.0, 10.0, 10.0, 10.0, 500.0, 1.0]),
        );
        assert_eq!(signal.kind, SignalType::Buy);
    }
}
