//! The gated fundamental lookup path: cache → provider (with retry) → stale
//! fallback.
//!
//! The funnel consults fundamentals only for symbols that already cleared
//! every technical gate, through the `FundamentalSource` trait. This module
//! provides the production implementation (provider + retry + shared cache)
//! and two simple ones for offline runs and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Local, NaiveDateTime};

use super::cache::{CacheEntry, CacheError, SnapshotCache};
use super::retry::RetryPolicy;
use super::snapshot::FundamentalSnapshot;
use crate::data::provider::FundamentalProvider;

/// Lazily supplies fundamentals to the funnel. `None` means the symbol has
/// no usable fundamentals, which downstream is a hard gate fail.
pub trait FundamentalSource: Sync {
    fn fundamentals(&self, symbol: &str) -> Option<FundamentalSnapshot>;
}

/// Production source: fresh cache hit, else provider fetch with retry, else
/// stale cache entry, else nothing.
///
/// The cache sits behind a mutex: evaluations run concurrently across
/// symbols and the lock is held only around map reads/writes, never across
/// a network call.
pub struct CachedFundamentals<'a> {
    provider: &'a dyn FundamentalProvider,
    cache: Mutex<SnapshotCache>,
    policy: RetryPolicy,
}

impl<'a> CachedFundamentals<'a> {
    pub fn new(provider: &'a dyn FundamentalProvider, cache: SnapshotCache, policy: RetryPolicy) -> Self {
        Self {
            provider,
            cache: Mutex::new(cache),
            policy,
        }
    }

    /// Persist the cache if anything changed this run.
    pub fn flush(&self) -> Result<bool, CacheError> {
        self.cache.lock().expect("cache lock poisoned").flush_if_dirty()
    }

    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl FundamentalSource for CachedFundamentals<'_> {
    fn fundamentals(&self, symbol: &str) -> Option<FundamentalSnapshot> {
        let now = self.now();

        if let Some(entry) = self.cache.lock().expect("cache lock poisoned").get(symbol, now) {
            return Some(entry.data.clone());
        }

        match self.policy.run(|_| self.provider.snapshot(symbol)) {
            Ok(fetch) => {
                let snapshot = fetch.snapshot.clone();
                self.cache
                    .lock()
                    .expect("cache lock poisoned")
                    .insert(CacheEntry {
                        symbol: symbol.to_string(),
                        timestamp: now,
                        data: fetch.snapshot,
                        next_earnings_date: fetch.next_earnings_date,
                    });
                Some(snapshot)
            }
            Err(e) => {
                let cache = self.cache.lock().expect("cache lock poisoned");
                match cache.get_stale(symbol) {
                    Some(entry) => {
                        eprintln!(
                            "WARNING: {symbol}: fundamental fetch failed ({e}), using stale cache entry from {}",
                            entry.timestamp
                        );
                        Some(entry.data.clone())
                    }
                    None => {
                        eprintln!("WARNING: {symbol}: fundamental fetch failed ({e}), no cached fallback");
                        None
                    }
                }
            }
        }
    }
}

/// Offline source: serves cache entries regardless of freshness, never
/// touches the network.
pub struct CacheOnlyFundamentals {
    cache: SnapshotCache,
}

impl CacheOnlyFundamentals {
    pub fn new(cache: SnapshotCache) -> Self {
        Self { cache }
    }
}

impl FundamentalSource for CacheOnlyFundamentals {
    fn fundamentals(&self, symbol: &str) -> Option<FundamentalSnapshot> {
        self.cache.get_stale(symbol).map(|e| e.data.clone())
    }
}

/// Fixed map of snapshots, for tests and fixtures.
#[derive(Debug, Default)]
pub struct StaticFundamentals {
    snapshots: HashMap<String, FundamentalSnapshot>,
}

impl StaticFundamentals {
    pub fn new(snapshots: HashMap<String, FundamentalSnapshot>) -> Self {
        Self { snapshots }
    }

    pub fn with(mut self, symbol: impl Into<String>, snapshot: FundamentalSnapshot) -> Self {
        self.snapshots.insert(symbol.into(), snapshot);
        self
    }
}

impl FundamentalSource for StaticFundamentals {
    fn fundamentals(&self, symbol: &str) -> Option<FundamentalSnapshot> {
        self.snapshots.get(symbol).cloned()
    }
}
