//! Cache usage counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from a fresh entry.
    pub hits: u64,
    /// Reads that found nothing usable, stale or absent.
    pub misses: u64,
    /// Successful writes.
    pub writes: u64,
    /// Entries deleted because a read found them past their TTL.
    pub stale_evictions: u64,
    /// Entries deleted to respect a capacity cap.
    pub capacity_evictions: u64,
    /// Storage calls that failed and were degraded to a miss or no-op.
    pub storage_failures: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Lock-free counters behind [`CacheStats`].
#[derive(Debug, Default)]
pub struct StatsCounter {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    stale_evictions: AtomicU64,
    capacity_evictions: AtomicU64,
    storage_failures: AtomicU64,
}

impl StatsCounter {
    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stale_eviction(&self) {
        self.stale_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn capacity_eviction(&self) {
        self.capacity_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn storage_failure(&self) {
        self.storage_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            stale_evictions: self.stale_evictions.load(Ordering::Relaxed),
            capacity_evictions: self.capacity_evictions.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
        }
    }
}
