//! Snapshot cache — TTL- and earnings-date-aware store for fundamentals.
//!
//! The fundamental fetch is the expensive call of a run, so snapshots are
//! kept across runs in a single JSON file: loaded at run start, flushed at
//! run end, and only when something actually changed. An entry is fresh
//! while its TTL holds AND no known earnings report has elapsed — a passed
//! earnings date invalidates the numbers even inside the TTL.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::snapshot::FundamentalSnapshot;

/// Errors from cache persistence.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache read {path}: {detail}")]
    Read { path: PathBuf, detail: String },

    #[error("cache write {path}: {detail}")]
    Write { path: PathBuf, detail: String },
}

/// One cached fundamental lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub data: FundamentalSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_earnings_date: Option<NaiveDate>,
}

impl CacheEntry {
    /// Fresh iff within TTL and today is strictly before any known
    /// next-earnings date.
    pub fn is_fresh(&self, now: NaiveDateTime, ttl: Duration) -> bool {
        if now - self.timestamp >= ttl {
            return false;
        }
        match self.next_earnings_date {
            Some(date) => now.date() < date,
            None => true,
        }
    }
}

/// In-memory snapshot cache with optional file persistence.
///
/// Reads are cheap map lookups; the runner serializes writes by holding the
/// cache behind a mutex. Flushing is atomic (write to .tmp, rename into
/// place) and skipped entirely when nothing changed, so an aborted run never
/// persists partial state it did not complete.
#[derive(Debug)]
pub struct SnapshotCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    path: Option<PathBuf>,
    dirty: bool,
}

impl SnapshotCache {
    /// Cache with no backing file (tests, one-shot runs).
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            path: None,
            dirty: false,
        }
    }

    /// Load from a JSON file; a missing file starts an empty cache.
    ///
    /// A file that no longer parses is quarantined (renamed to
    /// `.json.quarantined`) and the run continues with an empty cache; a
    /// stale snapshot store is never worth aborting a screen over.
    pub fn load(path: impl Into<PathBuf>, ttl: Duration) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| CacheError::Read {
                path: path.clone(),
                detail: e.to_string(),
            })?;
            match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    let quarantine = path.with_extension("json.quarantined");
                    eprintln!(
                        "WARNING: quarantining corrupt cache file {}: {e}",
                        path.display()
                    );
                    let _ = fs::rename(&path, &quarantine);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            entries,
            ttl,
            path: Some(path),
            dirty: false,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A fresh entry, or None if absent or stale.
    pub fn get(&self, symbol: &str, now: NaiveDateTime) -> Option<&CacheEntry> {
        self.entries
            .get(symbol)
            .filter(|entry| entry.is_fresh(now, self.ttl))
    }

    /// The entry regardless of freshness — the degraded fallback when the
    /// provider is exhausted.
    pub fn get_stale(&self, symbol: &str) -> Option<&CacheEntry> {
        self.entries.get(symbol)
    }

    /// Insert or overwrite an entry, marking the cache dirty.
    pub fn insert(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.symbol.clone(), entry);
        self.dirty = true;
    }

    /// Count of entries fresh at `now`.
    pub fn fresh_count(&self, now: NaiveDateTime) -> usize {
        self.entries
            .values()
            .filter(|e| e.is_fresh(now, self.ttl))
            .count()
    }

    /// Persist to the backing file iff something changed since load.
    ///
    /// Returns true when a write happened. No-op for in-memory caches.
    pub fn flush_if_dirty(&mut self) -> Result<bool, CacheError> {
        let Some(path) = self.path.clone() else {
            return Ok(false);
        };
        if !self.dirty {
            return Ok(false);
        }

        let json =
            serde_json::to_string_pretty(&self.entries).map_err(|e| CacheError::Write {
                path: path.clone(),
                detail: e.to_string(),
            })?;

        let tmp_path = tmp_sibling(&path);
        fs::write(&tmp_path, json).map_err(|e| CacheError::Write {
            path: tmp_path.clone(),
            detail: e.to_string(),
        })?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            CacheError::Write {
                path: path.clone(),
                detail: format!("atomic rename failed: {e}"),
            }
        })?;

        self.dirty = false;
        Ok(true)
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "cache.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn entry(symbol: &str, timestamp: NaiveDateTime) -> CacheEntry {
        CacheEntry {
            symbol: symbol.into(),
            timestamp,
            data: FundamentalSnapshot {
                earnings_growth: Some(0.3),
                ..Default::default()
            },
            next_earnings_date: None,
        }
    }

    #[test]
    fn entry_fresh_within_ttl() {
        let e = entry("AAPL", now());
        assert!(e.is_fresh(now(), Duration::days(7)));
        assert!(e.is_fresh(now() + Duration::days(6), Duration::days(7)));
        assert!(!e.is_fresh(now() + Duration::days(7), Duration::days(7)));
    }

    #[test]
    fn elapsed_earnings_date_invalidates_within_ttl() {
        let mut e = entry("AAPL", now());
        e.next_earnings_date = Some(now().date() - Duration::days(1));
        assert!(!e.is_fresh(now(), Duration::days(7)));

        // earnings date today also invalidates (strictly-before rule)
        e.next_earnings_date = Some(now().date());
        assert!(!e.is_fresh(now(), Duration::days(7)));

        e.next_earnings_date = Some(now().date() + Duration::days(3));
        assert!(e.is_fresh(now(), Duration::days(7)));
    }

    #[test]
    fn get_filters_stale_entries_but_get_stale_does_not() {
        let mut cache = SnapshotCache::in_memory(Duration::days(7));
        cache.insert(entry("OLD", now() - Duration::days(30)));
        assert!(cache.get("OLD", now()).is_none());
        assert!(cache.get_stale("OLD").is_some());
    }

    #[test]
    fn flush_roundtrip_and_dirty_tracking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fundamentals.json");

        let mut cache = SnapshotCache::load(&path, Duration::days(7)).unwrap();
        assert!(cache.is_empty());
        // nothing changed → nothing written
        assert!(!cache.flush_if_dirty().unwrap());
        assert!(!path.exists());

        cache.insert(entry("AAPL", now()));
        assert!(cache.flush_if_dirty().unwrap());
        assert!(path.exists());
        // second flush is a no-op
        assert!(!cache.flush_if_dirty().unwrap());

        let reloaded = SnapshotCache::load(&path, Duration::days(7)).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(
            reloaded.get("AAPL", now()).unwrap().data.earnings_growth,
            Some(0.3)
        );
    }

    #[test]
    fn corrupt_file_is_quarantined_and_load_continues_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fundamentals.json");
        std::fs::write(&path, "{ not valid json").unwrap();

        let mut cache = SnapshotCache::load(&path, Duration::days(7)).unwrap();
        assert!(cache.is_empty());
        assert!(!path.exists());
        assert!(dir.path().join("fundamentals.json.quarantined").exists());

        // the empty cache is still usable and flushes to the original path
        cache.insert(entry("AAPL", now()));
        assert!(cache.flush_if_dirty().unwrap());
        let reloaded = SnapshotCache::load(&path, Duration::days(7)).unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn in_memory_cache_never_writes() {
        let mut cache = SnapshotCache::in_memory(Duration::days(7));
        cache.insert(entry("AAPL", now()));
        assert!(!cache.flush_if_dirty().unwrap());
    }
}
