use std::sync::Arc;

use tracing::info;

use common::{Error, Result};

use crate::config::{CrossParams, CycleParams, StrategyConfig};
use crate::cross::CrossStrategy;
use crate::cycle::CycleStrategy;
use crate::stage::StageTracker;
use crate::Strategy;

pub const CROSS_STRATEGY: &str = "moving-average-cross";
pub const CYCLE_STRATEGY: &str = "moving-average-cycle";

/// Build the configured strategy.
///
/// Unknown names and unusable periods are construction errors; no strategy is
/// returned in that case.
pub fn build_strategy(cfg: &StrategyConfig) -> Result<Arc<dyn Strategy>> {
    let strategy: Arc<dyn Strategy> = match cfg.name.as_str() {
        CROSS_STRATEGY => {
            check_cross(&cfg.moving_average_cross)?;
            Arc::new(CrossStrategy::new(&cfg.name, cfg.moving_average_cross))
        }
        CYCLE_STRATEGY => {
            check_cycle(&cfg.moving_average_cycle)?;
            let tracker = Arc::new(StageTracker::new(cfg.stage_direction));
            Arc::new(CycleStrategy::new(&cfg.name, cfg.moving_average_cycle, tracker))
        }
        other => return Err(Error::UnknownStrategy(other.to_string())),
    };

    info!(
        name = %strategy.name(),
        required_candles = strategy.required_candle_count(),
        "Strategy constructed"
    );
    Ok(strategy)
}

/// Candles the configured strategy will request per market, if the name is known.
pub fn required_candle_count(cfg: &StrategyConfig) -> Option<usize> {
    match cfg.name.as_str() {
        CROSS_STRATEGY => Some(cfg.moving_average_cross.required_candle_count()),
        CYCLE_STRATEGY => Some(cfg.moving_average_cycle.required_candle_count()),
        _ => None,
    }
}

fn check_cross(p: &CrossParams) -> Result<()> {
    if p.short_period == 0 || p.short_period >= p.long_period {
        return Err(Error::Config(format!(
            "moving_average_cross needs 0 < short_period < long_period, got {} / {}",
            p.short_period, p.long_period
        )));
    }
    Ok(())
}

fn check_cycle(p: &CycleParams) -> Result<()> {
    if p.short_period == 0 || p.short_period >= p.medium_period || p.medium_period >= p.long_period {
        return Err(Error::Config(format!(
            "moving_average_cycle needs 0 < short_period < medium_period < long_period, got {} / {} / {}",
            p.short_period, p.medium_period, p.long_period
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectionMode;

    fn config(name: &str) -> StrategyConfig {
        StrategyConfig {
            name: name.to_string(),
            moving_average_cross: CrossParams::default(),
            moving_average_cycle: CycleParams::default(),
            stage_direction: DirectionMode::Linear,
        }
    }

    #[test]
    fn builds_known_strategies() {
        let cross = build_strategy(&config(CROSS_STRATEGY)).unwrap();
        assert_eq!(cross.name(), CROSS_STRATEGY);
        assert_eq!(cross.required_candle_count(), 21);

        let cycle = build_strategy(&config(CYCLE_STRATEGY)).unwrap();
        assert_eq!(cycle.name(), CYCLE_STRATEGY);
        assert_eq!(cycle.required_candle_count(), 41);
    }

    #[test]
    fn unknown_name_is_a_construction_error() {
        match build_strategy(&config("moving-average-ribbon")) {
            Err(Error::UnknownStrategy(name)) => assert_eq!(name, "moving-average-ribbon"),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(s) => panic!("built '{}' from an unknown name", s.name()),
        }
    }

    #[test]
    fn invalid_periods_are_rejected() {
        let mut cfg = config(CROSS_STRATEGY);
        cfg.moving_average_cross = CrossParams {
            short_period: 20,
            long_period: 5,
        };
        assert!(matches!(build_strategy(&cfg), Err(Error::Config(_))));

        let mut cfg = config(CYCLE_STRATEGY);
        cfg.moving_average_cycle = CycleParams {
            short_period: 0,
            medium_period: 20,
            long_period: 40,
        };
        assert!(matches!(build_strategy(&cfg), Err(Error::Config(_))));
    }

    #[test]
    fn required_candles_match_built_strategy() {
        for name in [CROSS_STRATEGY, CYCLE_STRATEGY] {
            let cfg = config(name);
            let built = build_strategy(&cfg).unwrap();
            assert_eq!(required_candle_count(&cfg), Some(built.required_candle_count()));
        }
        assert_eq!(required_candle_count(&config("nope")), None);
    }
}
