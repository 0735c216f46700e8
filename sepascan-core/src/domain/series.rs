//! PriceSeries — one symbol's ordered bars plus derived indicators.

use serde::{Deserialize, Serialize};

use super::bar::PriceBar;
use crate::error::ScreenError;
use crate::indicators::IndicatorSet;

/// Chronologically ordered bars for one symbol, with indicators computed at
/// construction time. Immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
    indicators: IndicatorSet,
}

impl PriceSeries {
    /// Build a series from raw bars.
    ///
    /// Bars are sorted by date; void or insane bars (NaN fields, inverted
    /// high/low) are dropped before indicator computation. Two surviving
    /// bars on the same date are a data defect and an error; an empty
    /// survivor set is an error too.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Result<Self, ScreenError> {
        let symbol = symbol.into();
        bars.retain(|b| b.is_sane());
        bars.sort_by_key(|b| b.date);

        if bars.is_empty() {
            return Err(ScreenError::EmptySeries { symbol });
        }
        for pair in bars.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(ScreenError::DuplicateDate {
                    symbol,
                    date: pair[0].date,
                });
            }
        }

        let indicators = IndicatorSet::compute(&bars);
        Ok(Self {
            symbol,
            bars,
            indicators,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close of the most recent bar.
    pub fn last_close(&self) -> f64 {
        // Construction guarantees at least one bar.
        self.bars[self.bars.len() - 1].close
    }

    /// Percentage below the 52-week high, as a fraction (0.03 = 3% below).
    pub fn pct_off_high(&self) -> Option<f64> {
        let high = self.indicators.high_52w?;
        if high <= 0.0 {
            return None;
        }
        Some((high - self.last_close()) / high)
    }

    /// Percentage above the 52-week low, as a fraction (0.30 = 30% above).
    pub fn pct_above_low(&self) -> Option<f64> {
        let low = self.indicators.low_52w?;
        if low <= 0.0 {
            return None;
        }
        Some((self.last_close() - low) / low)
    }
}
