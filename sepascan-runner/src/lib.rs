//! Batch orchestration for the screening funnel.
//!
//! Wires universe definitions, data loading, the two-phase screen, and
//! artifact export into one pipeline the CLI drives:
//!
//! - [`config`]: run configuration with a content-addressed run id
//! - [`universe`]: sector-organized ticker lists
//! - [`data_loader`]: per-symbol CSV loading with a provider fallback
//! - [`screen`]: RS barrier plus parallel funnel evaluation
//! - [`report`] / [`export`]: flat rows, CSV tables, dashboard JSON

pub mod config;
pub mod data_loader;
pub mod export;
pub mod report;
pub mod screen;
pub mod universe;

pub use config::{ConfigError, RunConfig, RunId};
pub use data_loader::{load_series, LoadError, LoadOptions, LoadedData, SkippedSymbol};
pub use export::{dashboard_json, export_results_csv, save_artifacts};
pub use report::SymbolReport;
pub use screen::{
    run_screen, ConsoleProgress, ScreenOutcome, ScreenProgress, ScreenSummary, SilentProgress,
};
pub use universe::{Universe, UniverseError};
