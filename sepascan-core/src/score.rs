//! Composite scoring and entry-signal classification.
//!
//! The entry signal answers "is this actionable right now": a pivot or a
//! fresh MA bounce is buyable, an extended name is not, regardless of how
//! good the rest of the profile looks. The composite score folds stage, RS,
//! pattern evidence, high proximity and fundamental flags into one 0-100
//! number, then adjusts it multiplicatively by the entry signal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{BounceParams, EntryConfig, ScreenerConfig};
use crate::domain::PriceBar;
use crate::funnel::StageLabel;
use crate::fundamentals::GateFlags;
use crate::indicators::IndicatorSet;
use crate::patterns::PatternEvidence;

/// Actionability classification, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntrySignal {
    PivotPoint,
    PatternSetup,
    Ma50Bounce,
    Ma21Bounce,
    Extended,
    Consolidating,
}

impl fmt::Display for EntrySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntrySignal::PivotPoint => "Pivot Point",
            EntrySignal::PatternSetup => "Pattern Setup",
            EntrySignal::Ma50Bounce => "MA50 Bounce",
            EntrySignal::Ma21Bounce => "MA21 Bounce",
            EntrySignal::Extended => "Extended",
            EntrySignal::Consolidating => "Consolidating",
        };
        f.write_str(s)
    }
}

/// Whether price is stretched too far above its short MAs to chase.
pub fn is_extended(close: f64, indicators: &IndicatorSet, cfg: &EntryConfig) -> bool {
    let above_ma10 = indicators
        .ma_now(10)
        .is_some_and(|ma| ma > 0.0 && close > ma * (1.0 + cfg.extended_above_ma10));
    let above_ma21 = indicators
        .ma_now(21)
        .is_some_and(|ma| ma > 0.0 && close > ma * (1.0 + cfg.extended_above_ma21));
    above_ma10 || above_ma21
}

/// A bounce off one MA: the MA is rising, price touched or slightly pierced
/// it within the recent window, and the rebound has not yet run past the
/// chase limit.
fn ma_bounce(
    bars: &[PriceBar],
    indicators: &IndicatorSet,
    period: usize,
    params: &BounceParams,
    cfg: &EntryConfig,
) -> bool {
    if indicators.ma_rising(period, cfg.ma_trend_span) != Some(true) {
        return false;
    }
    let Some(ma_series) = indicators.ma(period) else {
        return false;
    };
    let Some(ma_now) = indicators.ma_now(period) else {
        return false;
    };
    if ma_now <= 0.0 {
        return false;
    }

    let close = bars[bars.len() - 1].close;
    if close <= ma_now || close > ma_now * (1.0 + params.rebound_limit) {
        return false;
    }

    let window = cfg.bounce_window.min(bars.len());
    let start = bars.len() - window;
    (start..bars.len()).any(|i| {
        let ma = ma_series[i];
        !ma.is_nan() && ma > 0.0 && bars[i].low <= ma * (1.0 + params.touch_tolerance)
    })
}

/// Classify the entry signal for a technically qualified series.
pub fn entry_signal(
    bars: &[PriceBar],
    indicators: &IndicatorSet,
    pattern: &PatternEvidence,
    cfg: &EntryConfig,
) -> EntrySignal {
    if bars.is_empty() {
        return EntrySignal::Consolidating;
    }
    if pattern.in_pivot {
        return EntrySignal::PivotPoint;
    }
    if pattern.vcp_detected {
        return EntrySignal::PatternSetup;
    }
    if ma_bounce(bars, indicators, 50, &cfg.ma50_bounce, cfg) {
        return EntrySignal::Ma50Bounce;
    }
    if ma_bounce(bars, indicators, 21, &cfg.ma21_bounce, cfg) {
        return EntrySignal::Ma21Bounce;
    }
    if is_extended(bars[bars.len() - 1].close, indicators, cfg) {
        return EntrySignal::Extended;
    }
    EntrySignal::Consolidating
}

/// Composite 0-100 score.
///
/// Additive components (stage, RS, pattern, high proximity, fundamental
/// bonuses) sum to at most 100, then the entry-signal multiplier is applied
/// and the result clamped back into [0, 100]. Monotonic in every input
/// holding the others fixed.
pub fn composite_score(
    stage: StageLabel,
    rs_rating: Option<f64>,
    pattern: &PatternEvidence,
    pct_off_high: Option<f64>,
    flags: Option<&GateFlags>,
    signal: EntrySignal,
    cfg: &ScreenerConfig,
) -> f64 {
    let sc = &cfg.score;

    let stage_part = match stage {
        StageLabel::Stage2Uptrend => sc.stage_weight,
        StageLabel::Stage2Developing => sc.stage_weight * sc.developing_stage_credit,
        _ => 0.0,
    };

    let rs_part = rs_rating
        .map(|r| (r / 100.0).clamp(0.0, 1.0) * sc.rs_weight)
        .unwrap_or(0.0);

    let pattern_max = (cfg.pattern.pivot_weight + cfg.pattern.accumulation_weight) as f64;
    let pattern_part = if pattern_max > 0.0 {
        (pattern.pattern_score as f64 / pattern_max).clamp(0.0, 1.0) * sc.pattern_weight
    } else {
        0.0
    };

    // Full bonus at the high, fading to zero at the funnel's distance cap.
    let proximity_part = pct_off_high
        .map(|off| {
            let span = cfg.trend.max_pct_below_high.max(f64::EPSILON);
            (1.0 - off / span).clamp(0.0, 1.0) * sc.high_proximity_weight
        })
        .unwrap_or(0.0);

    let mut bonus = 0.0;
    if let Some(flags) = flags {
        if flags.earnings_acceleration {
            bonus += sc.earnings_accel_bonus;
        }
        if flags.roe_strong {
            bonus += sc.strong_roe_bonus;
        }
    }

    let base = stage_part + rs_part + pattern_part + proximity_part + bonus;

    let multiplier = match signal {
        EntrySignal::PivotPoint => sc.pivot_multiplier,
        EntrySignal::PatternSetup => sc.setup_multiplier,
        EntrySignal::Ma50Bounce | EntrySignal::Ma21Bounce => sc.bounce_multiplier,
        EntrySignal::Extended => sc.extended_multiplier,
        EntrySignal::Consolidating => 1.0,
    };

    (base * multiplier).clamp(0.0, 100.0)
}
