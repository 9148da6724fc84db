use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use common::{Stage, StageDir, StageNumber};

use crate::config::DirectionMode;

/// Remembers the last stage computed for each market.
///
/// `observe` performs the read of the previous stage and the write of the new
/// one under a single lock, so two evaluations of the same market can never
/// interleave between the two.
#[derive(Debug, Default)]
pub struct StageTracker {
    last: Mutex<HashMap<String, Stage>>,
    mode: DirectionMode,
}

impl StageTracker {
    pub fn new(mode: DirectionMode) -> Self {
        Self {
            last: Mutex::new(HashMap::new()),
            mode,
        }
    }

    /// Record `number` as the latest stage for `market` and return the stage
    /// with its direction relative to the previous observation.
    pub fn observe(&self, market: &str, number: StageNumber, description: &str) -> Stage {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = last.get(market).map(|s| s.number);
        let stage = Stage {
            number,
            dir: direction(previous, number, self.mode),
            description: description.to_string(),
        };
        last.insert(market.to_string(), stage.clone());
        stage
    }

    /// Last recorded stage for `market`, if any.
    pub fn last(&self, market: &str) -> Option<Stage> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(market)
            .cloned()
    }
}

/// Direction of travel from `previous` to `next`.
pub fn direction(previous: Option<StageNumber>, next: StageNumber, mode: DirectionMode) -> StageDir {
    let Some(previous) = previous else {
        return StageDir::None;
    };

    let cyclic = mode == DirectionMode::Cyclic && previous.is_determined() && next.is_determined();
    if cyclic {
        // forward distance around the 1..=6 ring; 3 (opposite side) counts as forward
        let forward = (next.value() as i8 - previous.value() as i8).rem_euclid(6);
        return match forward {
            0 => StageDir::Maintain,
            1..=3 => StageDir::Normal,
            _ => StageDir::Reverse,
        };
    }

    match next.cmp(&previous) {
        std::cmp::Ordering::Equal => StageDir::Maintain,
        std::cmp::Ordering::Greater => StageDir::Normal,
        std::cmp::Ordering::Less => StageDir::Reverse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::StageNumber::*;

    #[test]
    fn first_observation_has_no_direction() {
        let tracker = StageTracker::default();
        let stage = tracker.observe("KRW-BTC", Stage1, "up");
        assert_eq!(stage.dir, StageDir::None);
        assert_eq!(tracker.last("KRW-BTC").unwrap().number, Stage1);
    }

    #[test]
    fn markets_are_tracked_independently() {
        let tracker = StageTracker::default();
        tracker.observe("KRW-BTC", Stage1, "up");
        assert_eq!(tracker.observe("KRW-ETH", Stage1, "up").dir, StageDir::None);
        assert_eq!(tracker.observe("KRW-BTC", Stage1, "up").dir, StageDir::Maintain);
    }

    #[test]
    fn linear_mode_compares_flat_numbers() {
        let mode = DirectionMode::Linear;
        assert_eq!(direction(Some(Stage2), Stage2, mode), StageDir::Maintain);
        assert_eq!(direction(Some(Stage1), Stage4, mode), StageDir::Normal);
        assert_eq!(direction(Some(Stage4), Stage1, mode), StageDir::Reverse);
        // wrap-around reads as a reversal on the flat scale
        assert_eq!(direction(Some(Stage6), Stage1, mode), StageDir::Reverse);
        assert_eq!(direction(Some(Stage0), Stage3, mode), StageDir::Normal);
    }

    #[test]
    fn cyclic_mode_wraps_around_the_ring() {
        let mode = DirectionMode::Cyclic;
        assert_eq!(direction(Some(Stage6), Stage1, mode), StageDir::Normal);
        assert_eq!(direction(Some(Stage1), Stage6, mode), StageDir::Reverse);
        assert_eq!(direction(Some(Stage2), Stage5, mode), StageDir::Normal);
        assert_eq!(direction(Some(Stage5), Stage1, mode), StageDir::Normal);
        assert_eq!(direction(Some(Stage3), Stage3, mode), StageDir::Maintain);
        // undetermined stages fall back to the flat rule
        assert_eq!(direction(Some(Stage0), Stage6, mode), StageDir::Normal);
        assert_eq!(direction(Some(Stage6), Stage0, mode), StageDir::Reverse);
    }

    #[test]
    fn tracker_uses_its_mode() {
        let tracker = StageTracker::new(DirectionMode::Cyclic);
        tracker.observe("KRW-BTC", Stage6, "up");
        assert_eq!(tracker.observe("KRW-BTC", Stage1, "up").dir, StageDir::Normal);
    }
}
