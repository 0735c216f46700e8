//! Flat per-symbol rows for CSV export.

use serde::{Deserialize, Serialize};

use sepascan_core::FunnelResult;

/// One funnel result flattened into a CSV-friendly row.
///
/// Fractions become percentages and nested evidence becomes plain
/// columns so the file opens cleanly in a spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub stage: String,
    pub passes: bool,
    pub composite_score: f64,
    pub rs_rating: Option<f64>,
    pub entry_signal: String,
    pub pattern_score: u32,
    pub vcp_detected: bool,
    pub in_pivot: bool,
    pub institutional_accumulation: bool,
    pub is_extended: bool,
    pub earnings_acceleration: bool,
    pub roe_strong: bool,
    pub current_price: f64,
    pub pct_off_high: Option<f64>,
    pub pct_above_low: Option<f64>,
    pub reason: String,
}

impl From<&FunnelResult> for SymbolReport {
    fn from(r: &FunnelResult) -> Self {
        let flags = r.fundamental_flags.as_ref();
        Self {
            symbol: r.symbol.clone(),
            stage: r.stage.to_string(),
            passes: r.passes,
            composite_score: round2(r.composite_score),
            rs_rating: r.rs_rating,
            entry_signal: r.entry_signal.to_string(),
            pattern_score: r.pattern.pattern_score,
            vcp_detected: r.pattern.vcp_detected,
            in_pivot: r.pattern.in_pivot,
            institutional_accumulation: r.pattern.institutional_accumulation,
            is_extended: r.is_extended,
            earnings_acceleration: flags.map(|f| f.earnings_acceleration).unwrap_or(false),
            roe_strong: flags.map(|f| f.roe_strong).unwrap_or(false),
            current_price: round2(r.current_price),
            pct_off_high: r.pct_off_high.map(|v| round2(v * 100.0)),
            pct_above_low: r.pct_above_low.map(|v| round2(v * 100.0)),
            reason: r.reason.clone(),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
