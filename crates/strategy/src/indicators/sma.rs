use common::Candle;

/// Simple moving average of `period` trade prices starting `offset` candles
/// back from the head of a newest-first slice.
///
/// Returns `None` when the slice is too short or `period` is zero.
pub fn sma(candles: &[Candle], period: usize, offset: usize) -> Option<f64> {
    if period == 0 || candles.len() < offset + period {
        return None;
    }
    let sum: f64 = candles[offset..offset + period]
        .iter()
        .map(|c| c.trade_price)
        .sum();
    Some(sum / period as f64)
}

/// Current (offset 0) and previous (offset 1) average for one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaPair {
    pub period: usize,
    pub current: f64,
    pub previous: f64,
}

impl MaPair {
    pub fn compute(candles: &[Candle], period: usize) -> Option<Self> {
        Some(Self {
            period,
            current: sma(candles, period, 0)?,
            previous: sma(candles, period, 1)?,
        })
    }

    pub fn rising(&self) -> bool {
        self.current > self.previous
    }

    pub fn falling(&self) -> bool {
        self.current < self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::candles;

    #[test]
    fn sma_averages_from_offset() {
        let data = candles("KRW-BTC", &[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(sma(&data, 2, 0), Some(15.0));
        assert_eq!(sma(&data, 2, 1), Some(25.0));
        assert_eq!(sma(&data, 4, 0), Some(25.0));
    }

    #[test]
    fn sma_returns_none_when_window_overruns() {
        let data = candles("KRW-BTC", &[10.0, 20.0, 30.0]);
        assert_eq!(sma(&data, 3, 1), None);
        assert_eq!(sma(&data, 0, 0), None);
        assert_eq!(sma(&[], 1, 0), None);
    }

    #[test]
    fn ma_pair_reports_direction() {
        // newest first: the average moved from 15 to 25
        let data = candles("KRW-BTC", &[30.0, 20.0, 10.0]);
        let pair = MaPair::compute(&data, 2).unwrap();
        assert_eq!(pair.current, 25.0);
        assert_eq!(pair.previous, 15.0);
        assert!(pair.rising());
        assert!(!pair.falling());
    }
}
