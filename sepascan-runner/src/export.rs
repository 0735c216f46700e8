//! Reporting and export — CSV tables, the dashboard JSON, and the run
//! artifact bundle.
//!
//! Three export surfaces:
//! - **CSV**: flat per-symbol rows (full batch and passed-only)
//! - **Dashboard JSON**: the summary document a front end renders
//! - **Outcome JSON**: full round-trip serialization with schema versioning
//!
//! Persisted outcomes include a `schema_version` field. Unknown versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::json;

use sepascan_core::config::ScreenerConfig;

use crate::report::SymbolReport;
use crate::screen::{ScreenOutcome, SCHEMA_VERSION};

/// Serialize a `ScreenOutcome` to pretty JSON.
pub fn export_json(outcome: &ScreenOutcome) -> Result<String> {
    serde_json::to_string_pretty(outcome).context("failed to serialize ScreenOutcome to JSON")
}

/// Deserialize a `ScreenOutcome` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ScreenOutcome> {
    let outcome: ScreenOutcome =
        serde_json::from_str(json).context("failed to deserialize ScreenOutcome from JSON")?;
    if outcome.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            outcome.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(outcome)
}

/// Export funnel results as a CSV table, one row per symbol.
///
/// Rows keep the outcome's order, so the file is already sorted by
/// composite score.
pub fn export_results_csv(outcome: &ScreenOutcome) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for result in &outcome.results {
        wtr.serialize(SymbolReport::from(result))
            .with_context(|| format!("failed to write CSV row for {}", result.symbol))?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export only the symbols that cleared every funnel stage.
pub fn export_passed_csv(outcome: &ScreenOutcome) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for result in outcome.passed() {
        wtr.serialize(SymbolReport::from(result))
            .with_context(|| format!("failed to write CSV row for {}", result.symbol))?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Build the dashboard summary document.
///
/// Shape: `timestamp`, `market_date`, a `summary` block with pass-rate
/// figures, the `top_picks` array (best ten by composite score, passed
/// or not, so a thin day still shows candidates), and the
/// `filter_criteria` the run used.
pub fn dashboard_json(outcome: &ScreenOutcome, cfg: &ScreenerConfig) -> Result<String> {
    let total = outcome.summary.total_analyzed;
    let passed = outcome.summary.passed;
    let filter_rate = if total > 0 {
        passed as f64 / total as f64
    } else {
        0.0
    };

    let top_picks: Vec<serde_json::Value> = outcome
        .results
        .iter()
        .take(10)
        .map(|r| {
            json!({
                "symbol": r.symbol,
                "composite_score": (r.composite_score * 100.0).round() / 100.0,
                "stage": r.stage.to_string(),
                "passes": r.passes,
                "rs_rating": r.rs_rating,
                "entry_signal": r.entry_signal.to_string(),
                "pattern_score": r.pattern.pattern_score,
                "current_price": r.current_price,
                "pct_off_high": r.pct_off_high.map(|v| (v * 10000.0).round() / 100.0),
            })
        })
        .collect();

    let doc = json!({
        "timestamp": outcome.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        "market_date": outcome.generated_at.date().to_string(),
        "run_id": outcome.run_id,
        "summary": {
            "total_analyzed": total,
            "passed_filters": passed,
            "filter_rate": (filter_rate * 10000.0).round() / 10000.0,
            "errors": outcome.summary.errors,
            "skipped": outcome.summary.skipped,
        },
        "top_picks": top_picks,
        "filter_criteria": {
            "min_rs_rating": cfg.trend.min_rs_rating,
            "max_pct_below_high": cfg.trend.max_pct_below_high,
            "min_pct_above_low": cfg.trend.min_pct_above_low,
            "min_pattern_score": cfg.pattern.min_pattern_score,
            "min_earnings_growth": cfg.fundamentals.min_earnings_growth,
            "min_revenue_growth": cfg.fundamentals.min_revenue_growth,
            "min_roe": cfg.fundamentals.min_roe,
            "min_institutional_score": cfg.fundamentals.min_institutional_score,
        },
    });

    serde_json::to_string_pretty(&doc).context("failed to serialize dashboard JSON")
}

/// Save the full artifact set for one screen run.
///
/// Creates a directory named `screen_{timestamp}/` under `output_dir`
/// containing:
/// - `outcome.json` — the full `ScreenOutcome`
/// - `results.csv` — every analyzed symbol, sorted by score
/// - `passed.csv` — the symbols that cleared the funnel
/// - `dashboard.json` — the summary document
///
/// Returns the path to the created directory.
pub fn save_artifacts(
    outcome: &ScreenOutcome,
    cfg: &ScreenerConfig,
    output_dir: &Path,
) -> Result<PathBuf> {
    let dirname = format!("screen_{}", outcome.generated_at.format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("outcome.json"), export_json(outcome)?)?;
    std::fs::write(run_dir.join("results.csv"), export_results_csv(outcome)?)?;
    std::fs::write(run_dir.join("passed.csv"), export_passed_csv(outcome)?)?;
    std::fs::write(run_dir.join("dashboard.json"), dashboard_json(outcome, cfg)?)?;

    Ok(run_dir)
}

/// Load a `ScreenOutcome` from an artifact directory's outcome.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<ScreenOutcome> {
    let path = dir.join("outcome.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
