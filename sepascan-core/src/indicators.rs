//! Rolling indicators over a price series.
//!
//! Moving averages are simple trailing means of the close, NaN-padded until
//! the window is fully populated (first valid value at index period-1).
//! The 52-week extremes and the 50-day volume baseline are trailing
//! extremum/mean over at most the last 252/50 bars.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

/// Trading days in a 52-week lookback.
pub const TRADING_DAYS_52W: usize = 252;

/// Window for the average-volume baseline.
pub const VOLUME_BASELINE_WINDOW: usize = 50;

/// Rolling simple moving average of the close. NaN until `period` bars exist.
pub fn sma(bars: &[PriceBar], period: usize) -> Vec<f64> {
    assert!(period >= 1, "SMA period must be >= 1");
    let n = bars.len();
    let mut result = vec![f64::NAN; n];
    if n < period {
        return result;
    }

    let mut sum: f64 = bars.iter().take(period).map(|b| b.close).sum();
    result[period - 1] = sum / period as f64;

    for i in period..n {
        sum = sum - bars[i - period].close + bars[i].close;
        result[i] = sum / period as f64;
    }

    result
}

/// Last defined value of a NaN-padded indicator vector.
pub fn last_value(series: &[f64]) -> Option<f64> {
    series.last().copied().filter(|v| !v.is_nan())
}

/// Derived indicators for one symbol, computed once per run.
///
/// The full MA vectors are retained (not just the latest value) because the
/// funnel and entry-signal detector need slopes and recent history: the
/// one-month MA200 trend check, MA-bounce touch detection, and so on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub ma_10: Vec<f64>,
    pub ma_21: Vec<f64>,
    pub ma_50: Vec<f64>,
    pub ma_150: Vec<f64>,
    pub ma_200: Vec<f64>,
    pub high_52w: Option<f64>,
    pub low_52w: Option<f64>,
    pub avg_volume_50d: Option<f64>,
}

impl IndicatorSet {
    /// Compute all indicators. Empty input yields an all-undefined set.
    pub fn compute(bars: &[PriceBar]) -> Self {
        if bars.is_empty() {
            return Self::default();
        }

        let window = &bars[bars.len().saturating_sub(TRADING_DAYS_52W)..];
        let high_52w = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let low_52w = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);

        let avg_volume_50d = if bars.len() >= VOLUME_BASELINE_WINDOW {
            let tail = &bars[bars.len() - VOLUME_BASELINE_WINDOW..];
            Some(tail.iter().map(|b| b.volume as f64).sum::<f64>() / tail.len() as f64)
        } else {
            None
        };

        Self {
            ma_10: sma(bars, 10),
            ma_21: sma(bars, 21),
            ma_50: sma(bars, 50),
            ma_150: sma(bars, 150),
            ma_200: sma(bars, 200),
            high_52w: Some(high_52w),
            low_52w: Some(low_52w),
            avg_volume_50d,
        }
    }

    /// The full MA vector for a supported period.
    pub fn ma(&self, period: usize) -> Option<&[f64]> {
        match period {
            10 => Some(&self.ma_10),
            21 => Some(&self.ma_21),
            50 => Some(&self.ma_50),
            150 => Some(&self.ma_150),
            200 => Some(&self.ma_200),
            _ => None,
        }
    }

    /// Latest value of an MA, if its window is populated.
    pub fn ma_now(&self, period: usize) -> Option<f64> {
        self.ma(period).and_then(last_value)
    }

    /// Whether an MA is higher now than `span` bars ago. None if either
    /// endpoint is undefined.
    pub fn ma_rising(&self, period: usize, span: usize) -> Option<bool> {
        let series = self.ma(period)?;
        if series.len() <= span {
            return None;
        }
        let now = *series.last()?;
        let then = series[series.len() - 1 - span];
        if now.is_nan() || then.is_nan() {
            return None;
        }
        Some(now > then)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_bars;

    #[test]
    fn sma_5_basic() {
        let bars = test_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = sma(&bars, 5);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().take(4).enumerate() {
            assert!(v.is_nan(), "expected NaN at index {i}");
        }
        assert!((result[4] - 12.0).abs() < 1e-10);
        assert!((result[5] - 13.0).abs() < 1e-10);
        assert!((result[6] - 14.0).abs() < 1e-10);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = test_bars(&[100.0, 200.0, 300.0]);
        let result = sma(&bars, 1);
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = test_bars(&[10.0, 11.0]);
        let result = sma(&bars, 5);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn indicator_set_empty_input() {
        let set = IndicatorSet::compute(&[]);
        assert!(set.high_52w.is_none());
        assert!(set.low_52w.is_none());
        assert!(set.avg_volume_50d.is_none());
        assert!(set.ma_now(50).is_none());
    }

    #[test]
    fn indicator_set_short_series_has_extremes_but_no_long_ma() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let set = IndicatorSet::compute(&test_bars(&closes));
        // 52w extremes use all available bars when fewer than 252 exist
        assert!(set.high_52w.is_some());
        assert!(set.low_52w.is_some());
        assert!(set.ma_now(10).is_some());
        assert!(set.ma_now(50).is_none());
        assert!(set.avg_volume_50d.is_none());
    }

    #[test]
    fn ma_rising_detects_slope() {
        let closes: Vec<f64> = (0..260).map(|i| 100.0 + i as f64 * 0.5).collect();
        let set = IndicatorSet::compute(&test_bars(&closes));
        assert_eq!(set.ma_rising(200, 21), Some(true));

        let falling: Vec<f64> = (0..260).map(|i| 300.0 - i as f64 * 0.5).collect();
        let set = IndicatorSet::compute(&test_bars(&falling));
        assert_eq!(set.ma_rising(200, 21), Some(false));
    }

    #[test]
    fn ma_rising_undefined_when_window_unpopulated() {
        let closes: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
        let set = IndicatorSet::compute(&test_bars(&closes));
        assert_eq!(set.ma_rising(200, 21), None);
    }

    #[test]
    fn extremes_use_high_and_low_not_close() {
        let bars = test_bars(&[100.0, 102.0, 101.0]);
        let set = IndicatorSet::compute(&bars);
        // test_bars pads high/low by 1.0 around open/close
        assert!(set.high_52w.unwrap() > 102.0);
        assert!(set.low_52w.unwrap() < 100.0);
    }
}
