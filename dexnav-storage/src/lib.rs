//! dexnav Storage - Session Store and Caches
//!
//! Everything here lives for one browsing session at most. The backing
//! [`SessionStore`] may refuse reads and writes at any time (private mode,
//! quota), so the caches on top of it never return storage errors: a failure
//! is logged, counted, and reported as a miss.

pub mod cache;
pub mod session;

pub use cache::{
    CacheStats, DetailCache, PartitionCache, PartitionCacheEntry, PositionKey, PositionRecord,
    PositionStore, StatsCounter, Timestamped, TtlPolicy,
};
pub use session::{MemorySessionStore, SessionStore, UnavailableSessionStore};
