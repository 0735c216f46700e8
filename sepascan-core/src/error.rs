//! Structured error types for the screening engine.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while building inputs or loading configuration.
///
/// Evaluation itself never fails the batch: per-symbol computation problems
/// degrade to an `Error`-stage funnel result instead.
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("series for '{symbol}' is empty after validation")]
    EmptySeries { symbol: String },

    #[error("series for '{symbol}' has two bars dated {date}")]
    DuplicateDate { symbol: String, date: NaiveDate },

    #[error("config error: {0}")]
    Config(String),
}
