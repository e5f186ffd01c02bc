//! Session caches with explicit time-to-live.
//!
//! Every cached value carries the timestamp it was stored at. Reads compare
//! that stamp against a [`TtlPolicy`]; expired entries are deleted on the read
//! that discovers them. Nothing here runs in the background.

pub mod detail;
pub mod freshness;
pub mod partition;
pub mod position;
pub mod stats;

pub use detail::DetailCache;
pub use freshness::{Timestamped, TtlPolicy};
pub use partition::{PartitionCache, PartitionCacheEntry};
pub use position::{PositionKey, PositionRecord, PositionStore};
pub use stats::{CacheStats, StatsCounter};
