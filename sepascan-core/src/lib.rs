//! SepaScan Core — indicators, relative strength, pattern detection, the
//! screening funnel and its fundamental gate.
//!
//! The crate is organized around a single pipeline:
//! - Domain types (price bars, indicator-augmented series)
//! - Rolling indicators (moving averages, 52-week extremes, volume baseline)
//! - Cross-sectional relative strength (batch-wide percentile ratings)
//! - Structural pattern detection (volatility contraction, accumulation)
//! - The filter funnel: ordered early-exit gates producing a stage label,
//!   pass/reject decision, entry signal and composite score
//! - Fundamentals: snapshot, gate, TTL + earnings-date aware cache, and the
//!   retried fetch path behind the funnel

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod funnel;
pub mod fundamentals;
pub mod indicators;
pub mod patterns;
pub mod rs;
pub mod score;
pub mod synthetic;

pub use config::ScreenerConfig;
pub use error::ScreenError;
pub use funnel::{Funnel, FunnelResult, StageLabel};
pub use score::EntrySignal;
