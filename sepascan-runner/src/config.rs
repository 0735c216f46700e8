//! Serializable screen-run configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sepascan_core::config::ScreenerConfig;

/// Unique identifier for a screen run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {detail}")]
    Read { path: PathBuf, detail: String },
    #[error("parse {path}: {detail}")]
    Parse { path: PathBuf, detail: String },
}

/// Everything needed to reproduce one screen run: the universe, the data
/// window, the cache policy and the full screener threshold set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Symbols to screen, after universe expansion.
    pub universe: Vec<String>,

    /// Calendar-day lookback for price history.
    pub lookback_days: u32,

    /// Fundamental cache location; None keeps the cache in memory.
    pub cache_path: Option<PathBuf>,

    /// Fundamental cache TTL in days.
    pub cache_ttl_days: i64,

    /// Directory for result artifacts.
    pub output_dir: PathBuf,

    /// Screener thresholds.
    pub screener: ScreenerConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            universe: Vec::new(),
            // Two calendar years comfortably covers 252 trading days plus
            // the warm-up the longest moving average needs.
            lookback_days: 730,
            cache_path: Some(PathBuf::from("fundamentals_cache.json")),
            cache_ttl_days: 7,
            output_dir: PathBuf::from("screen_results"),
            screener: ScreenerConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load from a TOML file; missing fields fall back to defaults.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path,
            detail: e.to_string(),
        })
    }

    /// Deterministic content hash for this configuration.
    ///
    /// Two runs with identical configs share a RunId, so their artifacts
    /// are directly comparable.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig serialization failed");
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> RunConfig {
        RunConfig {
            universe: vec!["AAPL".into(), "NVDA".into()],
            ..RunConfig::default()
        }
    }

    #[test]
    fn run_id_is_deterministic() {
        let config = sample_config();
        assert_eq!(config.run_id(), config.run_id());
        assert!(!config.run_id().is_empty());
    }

    #[test]
    fn run_id_changes_with_universe() {
        let a = sample_config();
        let mut b = a.clone();
        b.universe.push("MSFT".into());
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn run_id_changes_with_thresholds() {
        let a = sample_config();
        let mut b = a.clone();
        b.screener.trend.min_rs_rating = 80.0;
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn toml_roundtrip() {
        let config = sample_config();
        let text = toml::to_string(&config).unwrap();
        let back: RunConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn partial_toml_gets_defaults() {
        let config: RunConfig = toml::from_str(
            r#"
            universe = ["AAPL"]
            lookback_days = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.universe, vec!["AAPL".to_string()]);
        assert_eq!(config.lookback_days, 500);
        assert_eq!(config.cache_ttl_days, 7);
    }
}
