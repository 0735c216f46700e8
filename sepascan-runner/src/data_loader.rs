//! Price-series loading for the runner.
//!
//! Resolution policy per symbol:
//! 1. If a `{SYMBOL}.csv` exists in the data directory → use it
//! 2. If not cached and a provider is available (and not offline) → fetch
//! 3. Otherwise → skip the symbol with a recorded reason
//!
//! A single symbol's failure never aborts the batch; it lands in the
//! skipped list and the screen continues.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use sepascan_core::data::provider::PriceProvider;
use sepascan_core::domain::{PriceBar, PriceSeries};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read {path}: {detail}")]
    Read { path: String, detail: String },
    #[error("parse CSV for '{symbol}': {detail}")]
    Csv { symbol: String, detail: String },
    #[error("invalid series for '{symbol}': {detail}")]
    Series { symbol: String, detail: String },
}

/// Options controlling how series are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// If true, never make network requests.
    pub offline: bool,
    /// Calendar-day lookback requested from the provider.
    pub lookback_days: u32,
}

/// One symbol the loader could not produce a series for.
#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Result of loading a batch of symbols.
#[derive(Debug)]
pub struct LoadedData {
    pub series: HashMap<String, PriceSeries>,
    pub skipped: Vec<SkippedSymbol>,
    /// BLAKE3 over all loaded bar data, for run fingerprinting.
    pub dataset_hash: String,
}

/// One row of a daily-bar CSV file.
#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl From<CsvBar> for PriceBar {
    fn from(row: CsvBar) -> Self {
        PriceBar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

/// Parse one symbol's CSV file into a validated series.
pub fn load_csv_series(symbol: &str, path: &Path) -> Result<PriceSeries, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| LoadError::Read {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let mut bars = Vec::new();
    for row in reader.deserialize::<CsvBar>() {
        let row = row.map_err(|e| LoadError::Csv {
            symbol: symbol.to_string(),
            detail: e.to_string(),
        })?;
        bars.push(PriceBar::from(row));
    }

    PriceSeries::new(symbol, bars).map_err(|e| LoadError::Series {
        symbol: symbol.to_string(),
        detail: e.to_string(),
    })
}

/// Load series for a set of symbols with the CSV-then-provider policy.
pub fn load_series(
    symbols: &[String],
    data_dir: Option<&Path>,
    provider: Option<&dyn PriceProvider>,
    opts: &LoadOptions,
) -> LoadedData {
    let mut series = HashMap::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        let csv_path = data_dir.map(|dir| dir.join(format!("{symbol}.csv")));

        if let Some(path) = csv_path.as_deref().filter(|p| p.exists()) {
            match load_csv_series(symbol, path) {
                Ok(s) => {
                    series.insert(symbol.clone(), s);
                    continue;
                }
                Err(e) => {
                    skipped.push(SkippedSymbol {
                        symbol: symbol.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            }
        }

        if !opts.offline {
            if let Some(prov) = provider {
                match prov.history(symbol, opts.lookback_days) {
                    Ok(s) => {
                        series.insert(symbol.clone(), s);
                        continue;
                    }
                    Err(e) => {
                        skipped.push(SkippedSymbol {
                            symbol: symbol.clone(),
                            reason: format!("fetch failed: {e}"),
                        });
                        continue;
                    }
                }
            }
        }

        skipped.push(SkippedSymbol {
            symbol: symbol.clone(),
            reason: "no cached data and no provider".to_string(),
        });
    }

    let dataset_hash = hash_dataset(&series);

    LoadedData {
        series,
        skipped,
        dataset_hash,
    }
}

/// BLAKE3 over bar data, keyed in symbol order so the hash is stable.
fn hash_dataset(series: &HashMap<String, PriceSeries>) -> String {
    let mut symbols: Vec<&String> = series.keys().collect();
    symbols.sort();

    let mut hasher = blake3::Hasher::new();
    for symbol in symbols {
        hasher.update(symbol.as_bytes());
        for bar in series[symbol].bars() {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    format!("{}", hasher.finalize().to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, symbol: &str, rows: &[(&str, f64, u64)]) {
        let mut f = std::fs::File::create(dir.join(format!("{symbol}.csv"))).unwrap();
        writeln!(f, "date,open,high,low,close,volume").unwrap();
        for (date, close, volume) in rows {
            writeln!(
                f,
                "{date},{open},{high},{low},{close},{volume}",
                open = close - 0.5,
                high = close + 1.0,
                low = close - 1.0,
            )
            .unwrap();
        }
    }

    #[test]
    fn loads_a_csv_series() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "TEST",
            &[
                ("2025-01-02", 100.0, 1_000_000),
                ("2025-01-03", 101.0, 1_100_000),
                ("2025-01-06", 102.0, 900_000),
            ],
        );

        let loaded = load_series(
            &["TEST".to_string()],
            Some(dir.path()),
            None,
            &LoadOptions {
                offline: true,
                lookback_days: 730,
            },
        );
        assert_eq!(loaded.series.len(), 1);
        assert!(loaded.skipped.is_empty());
        assert_eq!(loaded.series["TEST"].len(), 3);
        assert_eq!(loaded.series["TEST"].last_close(), 102.0);
    }

    #[test]
    fn missing_symbol_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "HAVE", &[("2025-01-02", 100.0, 1_000_000)]);

        let loaded = load_series(
            &["HAVE".to_string(), "MISSING".to_string()],
            Some(dir.path()),
            None,
            &LoadOptions {
                offline: true,
                lookback_days: 730,
            },
        );
        assert_eq!(loaded.series.len(), 1);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].symbol, "MISSING");
    }

    #[test]
    fn malformed_csv_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("BAD.csv"), "date,open\nnot-a-date,xyz\n").unwrap();

        let loaded = load_series(
            &["BAD".to_string()],
            Some(dir.path()),
            None,
            &LoadOptions {
                offline: true,
                lookback_days: 730,
            },
        );
        assert!(loaded.series.is_empty());
        assert_eq!(loaded.skipped.len(), 1);
        assert!(loaded.skipped[0].reason.contains("CSV") || !loaded.skipped[0].reason.is_empty());
    }

    #[test]
    fn dataset_hash_is_order_independent_and_content_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "AAA", &[("2025-01-02", 100.0, 1_000_000)]);
        write_csv(dir.path(), "BBB", &[("2025-01-02", 50.0, 2_000_000)]);
        let opts = LoadOptions {
            offline: true,
            lookback_days: 730,
        };

        let forward = load_series(
            &["AAA".to_string(), "BBB".to_string()],
            Some(dir.path()),
            None,
            &opts,
        );
        let reverse = load_series(
            &["BBB".to_string(), "AAA".to_string()],
            Some(dir.path()),
            None,
            &opts,
        );
        assert_eq!(forward.dataset_hash, reverse.dataset_hash);

        write_csv(dir.path(), "AAA", &[("2025-01-02", 101.0, 1_000_000)]);
        let changed = load_series(
            &["AAA".to_string(), "BBB".to_string()],
            Some(dir.path()),
            None,
            &opts,
        );
        assert_ne!(forward.dataset_hash, changed.dataset_hash);
    }
}
