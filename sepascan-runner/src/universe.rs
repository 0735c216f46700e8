//! Universe configuration — sector-organized ticker lists.
//!
//! The universe is a TOML file mapping GICS-style sectors to their member
//! tickers. Runs can screen the whole file or a single sector.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read universe file: {0}")]
    Read(String),
    #[error("parse universe TOML: {0}")]
    Parse(String),
    #[error("unknown sector '{0}'")]
    UnknownSector(String),
}

/// The complete universe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Universe {
    pub sectors: BTreeMap<String, Vec<String>>,
}

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| UniverseError::Read(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        toml::from_str(content).map_err(|e| UniverseError::Parse(e.to_string()))
    }

    /// All tickers across all sectors, deduplicated, in sector order.
    pub fn all_tickers(&self) -> Vec<String> {
        let mut seen = std::collections::BTreeSet::new();
        let mut out = Vec::new();
        for tickers in self.sectors.values() {
            for t in tickers {
                if seen.insert(t.as_str()) {
                    out.push(t.clone());
                }
            }
        }
        out
    }

    /// Tickers for a specific sector.
    pub fn sector_tickers(&self, sector: &str) -> Result<&[String], UniverseError> {
        self.sectors
            .get(sector)
            .map(|v| v.as_slice())
            .ok_or_else(|| UniverseError::UnknownSector(sector.to_string()))
    }

    pub fn sector_names(&self) -> Vec<&str> {
        self.sectors.keys().map(|s| s.as_str()).collect()
    }

    pub fn ticker_count(&self) -> usize {
        self.sectors.values().map(|v| v.len()).sum()
    }

    /// Default US growth universe, weighted toward liquid leadership names.
    pub fn default_us() -> Self {
        let mut sectors = BTreeMap::new();

        sectors.insert(
            "Technology".into(),
            to_strings(&[
                "AAPL", "MSFT", "NVDA", "GOOGL", "AMZN", "META", "AVGO", "AMD", "ORCL", "CRM",
                "NOW", "ADBE", "INTU", "QCOM", "AMAT", "KLAC", "LRCX", "ANET", "SMCI", "MU",
            ]),
        );

        sectors.insert(
            "Software".into(),
            to_strings(&[
                "PLTR", "CRWD", "PANW", "SNOW", "DDOG", "NET", "MDB", "ZS", "SHOP", "TEAM",
                "HUBS", "APP",
            ]),
        );

        sectors.insert(
            "Healthcare".into(),
            to_strings(&["LLY", "NVO", "UNH", "REGN", "VRTX", "ISRG", "DXCM", "MRK"]),
        );

        sectors.insert(
            "Finance".into(),
            to_strings(&["V", "MA", "JPM", "GS", "AXP", "BLK", "SCHW", "COIN"]),
        );

        sectors.insert(
            "Consumer".into(),
            to_strings(&[
                "COST", "HD", "NKE", "LULU", "DECK", "MELI", "CMG", "SBUX", "TSLA", "ABNB",
            ]),
        );

        sectors.insert(
            "Industrial".into(),
            to_strings(&["CAT", "DE", "ETN", "PH", "URI", "PWR", "GE"]),
        );

        sectors.insert(
            "Energy".into(),
            to_strings(&["XOM", "CVX", "COP", "EOG", "SLB", "FANG"]),
        );

        Self { sectors }
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, UniverseError> {
        toml::to_string_pretty(self).map_err(|e| UniverseError::Parse(e.to_string()))
    }
}

fn to_strings(tickers: &[&str]) -> Vec<String> {
    tickers.iter().map(|t| t.to_string()).collect()
}
