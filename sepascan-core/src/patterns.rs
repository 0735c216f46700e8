//! Structural pattern detection — volatility contraction and accumulation.
//!
//! Heuristics over the trailing price/volume window:
//! - tightening: the short-window high-low range (normalized by mean close)
//!   shrinks relative to the long-window range
//! - volume dry-up: most recent sessions trade below the 50-day baseline
//! - pivot: an ultra-tight multi-day range at the end of the contraction
//! - institutional accumulation: up-day/down-day volume asymmetry plus the
//!   pocket-pivot check
//!
//! Detection only runs near the 52-week high; a stock 20% off its high has
//! no actionable base regardless of how quiet it trades.

use serde::{Deserialize, Serialize};

use crate::config::PatternConfig;
use crate::domain::PriceBar;
use crate::indicators::IndicatorSet;

/// Pattern sub-signals and their weighted aggregate for one symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEvidence {
    pub volatility_tightening: bool,
    pub volume_dry_up: bool,
    pub in_pivot: bool,
    pub vcp_detected: bool,
    pub institutional_accumulation: bool,
    pub pattern_score: u32,
}

/// Run all pattern heuristics over the trailing window.
///
/// Returns the zero evidence when the context gate fails (too far off the
/// 52-week high) or the series is too short for the long window.
pub fn detect(bars: &[PriceBar], indicators: &IndicatorSet, cfg: &PatternConfig) -> PatternEvidence {
    let (Some(high_52w), Some(avg_volume)) = (indicators.high_52w, indicators.avg_volume_50d)
    else {
        return PatternEvidence::default();
    };
    if bars.len() < cfg.long_window || high_52w <= 0.0 || avg_volume <= 0.0 {
        return PatternEvidence::default();
    }

    let close = bars[bars.len() - 1].close;
    if close < high_52w * (1.0 - cfg.max_pct_off_high) {
        return PatternEvidence::default();
    }

    let tightening = is_tightening(bars, cfg);
    let dry_up = volume_dry_up(bars, avg_volume, cfg);
    let vcp_detected = tightening && dry_up;
    let in_pivot = vcp_detected && pivot_range_tight(bars, cfg);
    let accumulation = institutional_accumulation(bars, avg_volume, cfg);

    let mut score = if in_pivot {
        cfg.pivot_weight
    } else if vcp_detected {
        cfg.vcp_weight
    } else {
        0
    };
    if accumulation {
        score += cfg.accumulation_weight;
    }

    PatternEvidence {
        volatility_tightening: tightening,
        volume_dry_up: dry_up,
        in_pivot,
        vcp_detected,
        institutional_accumulation: accumulation,
        pattern_score: score,
    }
}

/// High-low range over the trailing `window` bars, normalized by mean close.
fn range_ratio(bars: &[PriceBar], window: usize) -> Option<f64> {
    if bars.len() < window {
        return None;
    }
    let tail = &bars[bars.len() - window..];
    let high = tail.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = tail.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let mean_close = tail.iter().map(|b| b.close).sum::<f64>() / window as f64;
    if mean_close <= 0.0 {
        return None;
    }
    Some((high - low) / mean_close)
}

fn is_tightening(bars: &[PriceBar], cfg: &PatternConfig) -> bool {
    match (
        range_ratio(bars, cfg.short_window),
        range_ratio(bars, cfg.long_window),
    ) {
        (Some(short), Some(long)) if long > 0.0 => short < cfg.tightening_ratio * long,
        _ => false,
    }
}

fn volume_dry_up(bars: &[PriceBar], avg_volume: f64, cfg: &PatternConfig) -> bool {
    if bars.len() < cfg.dry_up_window {
        return false;
    }
    let quiet_days = bars[bars.len() - cfg.dry_up_window..]
        .iter()
        .filter(|b| (b.volume as f64) < avg_volume)
        .count();
    quiet_days >= cfg.dry_up_min_days
}

fn pivot_range_tight(bars: &[PriceBar], cfg: &PatternConfig) -> bool {
    let close = bars[bars.len() - 1].close;
    if close <= 0.0 || bars.len() < cfg.pivot_window {
        return false;
    }
    let tail = &bars[bars.len() - cfg.pivot_window..];
    let high = tail.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = tail.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    (high - low) / close < cfg.pivot_max_range_pct
}

/// Up/down-day volume asymmetry over the accumulation window.
///
/// Three sub-signals; accumulation holds when at least two fire:
/// 1. more up-days than down-days on above-baseline volume
/// 2. aggregate up-volume exceeds down-volume by the configured margin
/// 3. pocket pivot: the latest bar is an up-day whose volume beats every
///    down-day of the preceding lookback
fn institutional_accumulation(bars: &[PriceBar], avg_volume: f64, cfg: &PatternConfig) -> bool {
    // Need one extra bar for the first day-over-day comparison.
    if bars.len() < cfg.accumulation_window + 1 {
        return false;
    }

    let start = bars.len() - cfg.accumulation_window;
    let mut up_days_heavy = 0u32;
    let mut down_days_heavy = 0u32;
    let mut up_volume = 0.0;
    let mut down_volume = 0.0;

    for i in start..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        let vol = bars[i].volume as f64;
        let heavy = vol > avg_volume;
        if change > 0.0 {
            up_volume += vol;
            if heavy {
                up_days_heavy += 1;
            }
        } else if change < 0.0 {
            down_volume += vol;
            if heavy {
                down_days_heavy += 1;
            }
        }
    }

    let heavy_day_edge = up_days_heavy > down_days_heavy;
    let volume_edge = if down_volume > 0.0 {
        up_volume >= cfg.volume_margin * down_volume
    } else {
        up_volume > 0.0
    };
    let pocket_pivot = has_pocket_pivot(bars, cfg);

    [heavy_day_edge, volume_edge, pocket_pivot]
        .iter()
        .filter(|&&fired| fired)
        .count()
        >= 2
}

/// Up-day whose volume exceeds the maximum down-day volume of the
/// preceding lookback window.
fn has_pocket_pivot(bars: &[PriceBar], cfg: &PatternConfig) -> bool {
    let n = bars.len();
    if n < cfg.pocket_pivot_lookback + 2 {
        return false;
    }
    let last = &bars[n - 1];
    if last.close <= bars[n - 2].close {
        return false;
    }
    let max_down_volume = (n - 1 - cfg.pocket_pivot_lookback..n - 1)
        .filter(|&i| bars[i].close < bars[i - 1].close)
        .map(|i| bars[i].volume)
        .max()
        .unwrap_or(0);
    last.volume > max_down_volume
}
