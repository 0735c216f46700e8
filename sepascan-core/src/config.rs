//! Screener configuration — every threshold in one place.
//!
//! Historical revisions of this screen carried slightly different constants
//! (pattern minimum 4 vs 5, different bounce proximity bands). All of them
//! are tunable here; `Default` pins the values the rest of the crate is
//! tested against. Percentages are fractions (0.25 = 25%) throughout.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ScreenError;

/// Top-level screener configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    pub trend: TrendConfig,
    pub pattern: PatternConfig,
    pub fundamentals: FundamentalConfig,
    pub entry: EntryConfig,
    pub score: ScoreConfig,
}

impl ScreenerConfig {
    /// Parse from a TOML string. Missing sections/fields fall back to defaults.
    pub fn from_toml(content: &str) -> Result<Self, ScreenError> {
        toml::from_str(content).map_err(|e| ScreenError::Config(format!("parse config: {e}")))
    }

    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ScreenError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScreenError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }
}

/// Trend-template thresholds for the funnel's technical gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Minimum bar count before any classification is attempted.
    pub min_history_bars: usize,
    /// Span (bars) over which MA200 must be rising, roughly one month.
    pub ma200_trend_span: usize,
    /// Price must sit at least this far above the 52-week low.
    pub min_pct_above_low: f64,
    /// Price must sit within this distance of the 52-week high.
    pub max_pct_below_high: f64,
    /// Strong-leader exception: within this band of the high...
    pub leader_max_pct_off_high: f64,
    /// ...with at least this RS rating, the 52-week-low floor is waived.
    pub leader_min_rs_rating: f64,
    /// Minimum RS rating; unknown ratings are a hard fail.
    pub min_rs_rating: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_history_bars: 252,
            ma200_trend_span: 21,
            min_pct_above_low: 0.30,
            max_pct_below_high: 0.25,
            leader_max_pct_off_high: 0.05,
            leader_min_rs_rating: 85.0,
            min_rs_rating: 70.0,
        }
    }
}

/// Volatility-contraction and accumulation detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Context gate: detection only runs within this distance of the 52w high.
    pub max_pct_off_high: f64,
    /// Short range window for the tightening comparison.
    pub short_window: usize,
    /// Long range window for the tightening comparison.
    pub long_window: usize,
    /// Short-window range ratio must be below this fraction of the long-window ratio.
    pub tightening_ratio: f64,
    /// Days inspected for volume dry-up.
    pub dry_up_window: usize,
    /// Minimum below-baseline-volume days within the dry-up window.
    pub dry_up_min_days: usize,
    /// Window for the pivot range check.
    pub pivot_window: usize,
    /// Pivot range (high-low over the pivot window) / price ceiling.
    pub pivot_max_range_pct: f64,
    /// Window for the accumulation heuristics.
    pub accumulation_window: usize,
    /// Aggregate up-volume must exceed down-volume by this factor.
    pub volume_margin: f64,
    /// Down-day lookback for the pocket-pivot comparison.
    pub pocket_pivot_lookback: usize,
    /// Score weight when the series sits in a pivot.
    pub pivot_weight: u32,
    /// Score weight for a VCP without a pivot (mutually exclusive with pivot).
    pub vcp_weight: u32,
    /// Additive bonus for institutional accumulation.
    pub accumulation_weight: u32,
    /// Minimum pattern score to clear the funnel's pattern gate.
    pub min_pattern_score: u32,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            max_pct_off_high: 0.15,
            short_window: 10,
            long_window: 50,
            tightening_ratio: 0.6,
            dry_up_window: 10,
            dry_up_min_days: 5,
            pivot_window: 5,
            pivot_max_range_pct: 0.025,
            accumulation_window: 20,
            volume_margin: 1.2,
            pocket_pivot_lookback: 10,
            pivot_weight: 6,
            vcp_weight: 4,
            accumulation_weight: 3,
            min_pattern_score: 5,
        }
    }
}

/// Fundamental gate thresholds. Growth and ROE values are YoY fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalConfig {
    pub min_earnings_growth: f64,
    pub min_revenue_growth: f64,
    /// Exceptional-earnings exception: earnings above this...
    pub exceptional_earnings_growth: f64,
    /// ...allow a lower revenue floor.
    pub exceptional_min_revenue_growth: f64,
    pub min_roe: f64,
    /// ROE at or above this sets the `roe_strong` scoring flag.
    pub strong_roe: f64,
    /// Institutional composite (0-8) must reach this to pass.
    pub min_institutional_score: u8,
    /// Market-cap sweet spot: full band credit inside, half credit within
    /// the outer band, none outside.
    pub mcap_sweet_spot_min: f64,
    pub mcap_sweet_spot_max: f64,
    pub mcap_outer_min: f64,
    pub mcap_outer_max: f64,
    /// Float / shares-outstanding ratio bands (lower = tighter supply).
    pub float_ratio_tight: f64,
    pub float_ratio_loose: f64,
    /// 50-day average dollar volume liquidity floor.
    pub min_dollar_volume: f64,
    /// Shares-outstanding ceiling preference.
    pub max_shares_outstanding: f64,
}

impl Default for FundamentalConfig {
    fn default() -> Self {
        Self {
            min_earnings_growth: 0.25,
            min_revenue_growth: 0.20,
            exceptional_earnings_growth: 0.40,
            exceptional_min_revenue_growth: 0.10,
            min_roe: 0.17,
            strong_roe: 0.25,
            min_institutional_score: 5,
            mcap_sweet_spot_min: 2e9,
            mcap_sweet_spot_max: 50e9,
            mcap_outer_min: 300e6,
            mcap_outer_max: 200e9,
            float_ratio_tight: 0.60,
            float_ratio_loose: 0.85,
            min_dollar_volume: 5e6,
            max_shares_outstanding: 200e6,
        }
    }
}

/// Moving-average bounce parameters for one MA period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BounceParams {
    /// A touch counts when the bar's low comes within this band of the MA
    /// (piercing below always counts).
    pub touch_tolerance: f64,
    /// Rebound must not carry price further than this above the MA.
    pub rebound_limit: f64,
}

impl Default for BounceParams {
    fn default() -> Self {
        Self {
            touch_tolerance: 0.02,
            rebound_limit: 0.06,
        }
    }
}

/// Entry-signal classification parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    /// How many recent bars may contain the MA touch.
    pub bounce_window: usize,
    /// Span over which the bounced MA itself must be rising.
    pub ma_trend_span: usize,
    pub ma50_bounce: BounceParams,
    pub ma21_bounce: BounceParams,
    /// Extended when price is stretched this far above MA10...
    pub extended_above_ma10: f64,
    /// ...or this far above MA21.
    pub extended_above_ma21: f64,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            bounce_window: 5,
            ma_trend_span: 5,
            ma50_bounce: BounceParams {
                touch_tolerance: 0.02,
                rebound_limit: 0.06,
            },
            ma21_bounce: BounceParams {
                touch_tolerance: 0.015,
                rebound_limit: 0.04,
            },
            extended_above_ma10: 0.10,
            extended_above_ma21: 0.15,
        }
    }
}

/// Composite-score weights. Relative ordering matters (stage dominates,
/// then RS, then pattern); the exact numbers are tunable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub stage_weight: f64,
    /// Fraction of the stage weight granted to a developing Stage 2.
    pub developing_stage_credit: f64,
    pub rs_weight: f64,
    pub pattern_weight: f64,
    pub high_proximity_weight: f64,
    pub earnings_accel_bonus: f64,
    pub strong_roe_bonus: f64,
    pub pivot_multiplier: f64,
    pub setup_multiplier: f64,
    pub bounce_multiplier: f64,
    pub extended_multiplier: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            stage_weight: 30.0,
            developing_stage_credit: 0.5,
            rs_weight: 25.0,
            pattern_weight: 20.0,
            high_proximity_weight: 10.0,
            earnings_accel_bonus: 8.0,
            strong_roe_bonus: 7.0,
            pivot_multiplier: 1.10,
            setup_multiplier: 1.05,
            bounce_multiplier: 1.05,
            extended_multiplier: 0.85,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_full_scale() {
        let cfg = ScoreConfig::default();
        let total = cfg.stage_weight
            + cfg.rs_weight
            + cfg.pattern_weight
            + cfg.high_proximity_weight
            + cfg.earnings_accel_bonus
            + cfg.strong_roe_bonus;
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn partial_toml_overrides_one_field() {
        let cfg = ScreenerConfig::from_toml(
            r#"
            [trend]
            min_rs_rating = 80.0

            [pattern]
            min_pattern_score = 4
            "#,
        )
        .unwrap();
        assert_eq!(cfg.trend.min_rs_rating, 80.0);
        assert_eq!(cfg.pattern.min_pattern_score, 4);
        // untouched fields keep defaults
        assert_eq!(cfg.trend.min_history_bars, 252);
        assert_eq!(cfg.fundamentals.min_institutional_score, 5);
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg = ScreenerConfig::from_toml("").unwrap();
        assert_eq!(cfg, ScreenerConfig::default());
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let cfg = ScreenerConfig::default();
        let text = toml::to_string(&cfg).unwrap();
        let back = ScreenerConfig::from_toml(&text).unwrap();
        assert_eq!(cfg, back);
    }
}
