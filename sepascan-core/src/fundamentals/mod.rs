//! Fundamental data: snapshot shape, the pass/fail gate, the on-disk cache
//! and the cached fetch path that feeds the funnel.

pub mod cache;
pub mod fetch;
pub mod gate;
pub mod retry;
pub mod snapshot;

pub use cache::{CacheEntry, CacheError, SnapshotCache};
pub use fetch::{CacheOnlyFundamentals, CachedFundamentals, FundamentalSource, StaticFundamentals};
pub use gate::{GateFlags, GateOutcome};
pub use retry::RetryPolicy;
pub use snapshot::FundamentalSnapshot;
