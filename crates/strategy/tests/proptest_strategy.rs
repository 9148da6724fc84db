use std::sync::Arc;

use chrono::Utc;
use common::{Candle, SignalType};
use proptest::prelude::*;
use strategy::{
    CrossParams, CrossStrategy, CycleParams, CycleStrategy, DirectionMode, StageTracker, Strategy,
};

fn candles(prices: &[f64]) -> Vec<Candle> {
    let now = Utc::now();
    prices
        .iter()
        .map(|&p| Candle {
            market: "KRW-TEST".into(),
            open: p,
            high: p,
            low: p,
            trade_price: p,
            timestamp: now,
        })
        .collect()
}

fn strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(CrossStrategy::new(
            "moving-average-cross",
            CrossParams {
                short_period: 3,
                long_period: 8,
            },
        )),
        Box::new(CycleStrategy::new(
            "moving-average-cycle",
            CycleParams {
                short_period: 3,
                medium_period: 5,
                long_period: 8,
            },
            Arc::new(StageTracker::new(DirectionMode::Linear)),
        )),
    ]
}

proptest! {
    /// Anything shorter than the lookback is a HOLD, never a panic.
    #[test]
    fn short_candle_sets_always_hold(
        prices in prop::collection::vec(0.0001f64..1_000_000.0f64, 0..9usize),
    ) {
        for s in strategies() {
            prop_assert!(prices.len() < s.required_candle_count());
            let signal = s.analyze("KRW-TEST", &candles(&prices));
            prop_assert_eq!(signal.kind, SignalType::Hold);
            prop_assert!(signal.stage.is_none());
        }
    }

    /// Full-length inputs of any positive prices never panic and always name the market.
    #[test]
    fn full_candle_sets_never_panic(
        prices in prop::collection::vec(0.0001f64..1_000_000.0f64, 9..40usize),
    ) {
        for s in strategies() {
            let signal = s.analyze("KRW-TEST", &candles(&prices));
            prop_assert_eq!(signal.market.as_str(), "KRW-TEST");
            prop_assert_eq!(signal.current_price, prices[0]);
        }
    }
}
