//! Two-phase batch screening pipeline.
//!
//! Phase one computes weighted momentum scores for the whole universe,
//! then converts them into cross-sectional percentile ratings. Phase two
//! runs every symbol through the filter funnel in parallel. The rating
//! barrier between the phases is what makes ratings comparable across
//! the batch.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{Local, NaiveDateTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use sepascan_core::domain::PriceSeries;
use sepascan_core::fundamentals::FundamentalSource;
use sepascan_core::{rs, Funnel, FunnelResult, StageLabel};

use crate::config::{RunConfig, RunId};
use crate::data_loader::SkippedSymbol;

/// Progress sink for long-running screens.
pub trait ScreenProgress: Sync {
    /// A new pipeline phase is starting.
    fn phase(&self, name: &str, count: usize);
    /// One symbol finished the funnel.
    fn symbol_done(&self, symbol: &str, passed: bool);
}

/// Progress sink that reports nothing. Used by tests.
pub struct SilentProgress;

impl ScreenProgress for SilentProgress {
    fn phase(&self, _name: &str, _count: usize) {}
    fn symbol_done(&self, _symbol: &str, _passed: bool) {}
}

/// Progress sink that writes phase transitions and passes to stderr.
pub struct ConsoleProgress;

impl ScreenProgress for ConsoleProgress {
    fn phase(&self, name: &str, count: usize) {
        eprintln!("=== {name} ({count} symbols)");
    }

    fn symbol_done(&self, symbol: &str, passed: bool) {
        if passed {
            eprintln!("  PASS {symbol}");
        }
    }
}

/// Current schema version for persisted screen artifacts.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Aggregate counts over one screen run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScreenSummary {
    pub total_analyzed: usize,
    pub passed: usize,
    pub errors: usize,
    pub skipped: usize,
}

/// Complete output of one screen run, sorted by composite score.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScreenOutcome {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub generated_at: NaiveDateTime,
    pub dataset_hash: String,
    pub results: Vec<FunnelResult>,
    pub skipped: Vec<String>,
    pub summary: ScreenSummary,
}

impl ScreenOutcome {
    /// Results that cleared every funnel stage.
    pub fn passed(&self) -> impl Iterator<Item = &FunnelResult> {
        self.results.iter().filter(|r| r.passes)
    }
}

/// Run the full screen over pre-loaded series.
///
/// Every symbol gets exactly one `FunnelResult`; a panic inside one
/// symbol's evaluation is caught and reported as an error result rather
/// than taking down the batch.
pub fn run_screen(
    series_by_symbol: &HashMap<String, PriceSeries>,
    fundamentals: &dyn FundamentalSource,
    config: &RunConfig,
    dataset_hash: &str,
    skipped: &[SkippedSymbol],
    progress: &dyn ScreenProgress,
) -> ScreenOutcome {
    let n = series_by_symbol.len();

    progress.phase("relative strength", n);
    let scores: HashMap<String, f64> = series_by_symbol
        .par_iter()
        .filter_map(|(symbol, series)| {
            rs::rs_score(series.bars()).map(|score| (symbol.clone(), score))
        })
        .collect();
    let ratings = rs::rs_ratings(&scores);

    progress.phase("funnel", n);
    let funnel = Funnel::new(&config.screener);
    let mut results: Vec<FunnelResult> = series_by_symbol
        .par_iter()
        .map(|(symbol, series)| {
            let rating = ratings.get(symbol).copied();
            let result = catch_unwind(AssertUnwindSafe(|| {
                funnel.evaluate(series, rating, fundamentals)
            }))
            .unwrap_or_else(|_| FunnelResult::error(symbol, "evaluation panicked"));
            progress.symbol_done(symbol, result.passes);
            result
        })
        .collect();

    results.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    let passed = results.iter().filter(|r| r.passes).count();
    let errors = results
        .iter()
        .filter(|r| r.stage == StageLabel::Error)
        .count();

    ScreenOutcome {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        generated_at: Local::now().naive_local(),
        dataset_hash: dataset_hash.to_string(),
        results,
        skipped: skipped
            .iter()
            .map(|s| format!("{}: {}", s.symbol, s.reason))
            .collect(),
        summary: ScreenSummary {
            total_analyzed: n,
            passed,
            errors,
            skipped: skipped.len(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sepascan_core::fundamentals::StaticFundamentals;
    use sepascan_core::synthetic;

    fn series(symbol: &str, bars: Vec<sepascan_core::domain::PriceBar>) -> PriceSeries {
        PriceSeries::new(symbol, bars).unwrap()
    }

    fn universe() -> HashMap<String, PriceSeries> {
        HashMap::from([
            ("LEAD".to_string(), series("LEAD", synthetic::leader_series(300))),
            ("LAG".to_string(), series("LAG", synthetic::laggard_series(300))),
            ("FLAT".to_string(), series("FLAT", synthetic::flat_series(300))),
        ])
    }

    #[test]
    fn every_symbol_gets_a_result() {
        let outcome = run_screen(
            &universe(),
            &StaticFundamentals::default(),
            &RunConfig::default(),
            "testhash",
            &[],
            &SilentProgress,
        );
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.summary.total_analyzed, 3);
        assert_eq!(outcome.dataset_hash, "testhash");
    }

    #[test]
    fn results_are_sorted_by_composite_score() {
        let outcome = run_screen(
            &universe(),
            &StaticFundamentals::default(),
            &RunConfig::default(),
            "testhash",
            &[],
            &SilentProgress,
        );
        for pair in outcome.results.windows(2) {
            assert!(pair[0].composite_score >= pair[1].composite_score);
        }
        assert_eq!(outcome.results[0].symbol, "LEAD");
    }

    #[test]
    fn skipped_symbols_are_carried_into_the_outcome() {
        let skipped = vec![SkippedSymbol {
            symbol: "GONE".to_string(),
            reason: "no cached data and no provider".to_string(),
        }];
        let outcome = run_screen(
            &universe(),
            &StaticFundamentals::default(),
            &RunConfig::default(),
            "testhash",
            &skipped,
            &SilentProgress,
        );
        assert_eq!(outcome.summary.skipped, 1);
        assert!(outcome.skipped[0].contains("GONE"));
    }

    #[test]
    fn run_id_matches_the_config() {
        let config = RunConfig::default();
        let outcome = run_screen(
            &universe(),
            &StaticFundamentals::default(),
            &config,
            "testhash",
            &[],
            &SilentProgress,
        );
        assert_eq!(outcome.run_id, config.run_id());
    }
}
