//! Provider traits and the transient/permanent error split.
//!
//! Price history is assumed pre-fetched in bulk by a collaborator; the
//! `PriceProvider` trait only models that boundary so runs can be driven
//! from any source (local files, test fixtures). The fundamental fetch is
//! the one piece of I/O this engine triggers itself, so its error taxonomy
//! distinguishes failures worth retrying from failures that are not.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::PriceSeries;
use crate::fundamentals::FundamentalSnapshot;

/// Structured errors for provider operations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited by provider{}", retry_after_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("required field missing from response: {0}")]
    MissingField(String),
}

fn retry_after_hint(secs: &Option<u64>) -> String {
    match secs {
        Some(s) => format!(" (retry after {s}s)"),
        None => String::new(),
    }
}

impl FetchError {
    /// Transient failures are retried with backoff; permanent ones are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::RateLimited { .. } | FetchError::Network(_) | FetchError::Timeout
        )
    }
}

/// Source of per-symbol price history.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Daily history for a symbol over a trailing lookback, or an error when
    /// the symbol is unavailable. Fewer than 252 returned bars is not an
    /// error here — the funnel classifies that as insufficient data.
    fn history(&self, symbol: &str, lookback_days: u32) -> Result<PriceSeries, FetchError>;
}

/// One successful fundamental lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalFetch {
    pub snapshot: FundamentalSnapshot,
    pub next_earnings_date: Option<NaiveDate>,
}

/// Source of per-symbol fundamental snapshots.
pub trait FundamentalProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the current snapshot for a symbol, with a next-earnings-date
    /// hint when the provider exposes one.
    fn snapshot(&self, symbol: &str) -> Result<FundamentalFetch, FetchError>;
}
