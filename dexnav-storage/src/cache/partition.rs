//! Per-partition result cache.
//!
//! Maps a partition id to the item list last fetched for it. Entries live in
//! the session store as JSON under `dexnav:partition:<id>`; at most one entry
//! exists per partition and `put` overwrites unconditionally.

use std::sync::Arc;
use std::time::Duration;

use dexnav_core::{Clock, Item, PartitionId, PartitionRange, StorageError, Timestamp, PARTITION_TTL};
use serde::{Deserialize, Serialize};

use super::freshness::{Timestamped, TtlPolicy};
use super::stats::{CacheStats, StatsCounter};
use crate::session::{read_json, write_json, SessionStore};

const KEY_PREFIX: &str = "dexnav:partition:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionCacheEntry {
    pub partition: PartitionId,
    pub items: Vec<Item>,
    pub fetched_at: Timestamp,
}

impl Timestamped for PartitionCacheEntry {
    fn stamped_at(&self) -> Timestamp {
        self.fetched_at
    }
}

/// Session-scoped partition cache with lazy TTL eviction.
pub struct PartitionCache {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    policy: TtlPolicy,
    stats: StatsCounter,
}

impl PartitionCache {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(store, clock, PARTITION_TTL)
    }

    pub fn with_ttl(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            policy: TtlPolicy::new(ttl),
            stats: StatsCounter::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.policy.ttl()
    }

    /// The fresh entry for `partition`, or `None` when absent or stale.
    ///
    /// A stale entry is deleted as a side effect.
    pub fn get(&self, partition: PartitionId) -> Option<PartitionCacheEntry> {
        let entry = self.lookup(partition);
        if entry.is_some() {
            self.stats.hit();
            tracing::debug!(%partition, "partition cache hit");
        } else {
            self.stats.miss();
            tracing::debug!(%partition, "partition cache miss");
        }
        entry
    }

    /// Same answer as `get(partition).is_some()`, without touching hit/miss counts.
    pub fn is_fresh(&self, partition: PartitionId) -> bool {
        self.lookup(partition).is_some()
    }

    /// Store `items` for `partition`, stamped now. Returns false if the store refused.
    pub fn put(&self, partition: PartitionId, items: Vec<Item>) -> bool {
        let entry = PartitionCacheEntry {
            partition,
            items,
            fetched_at: self.clock.now(),
        };
        match write_json(self.store.as_ref(), &entry_key(partition), &entry) {
            Ok(()) => {
                self.stats.write();
                tracing::debug!(%partition, items = entry.items.len(), "partition cached");
                true
            }
            Err(err) => {
                self.record_failure(partition, &err);
                false
            }
        }
    }

    pub fn clear(&self, partition: PartitionId) {
        if let Err(err) = self.store.remove(&entry_key(partition)) {
            self.record_failure(partition, &err);
        }
    }

    /// Drop every entry in `range`.
    pub fn clear_range(&self, range: PartitionRange) {
        for partition in range.iter() {
            self.clear(partition);
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    fn lookup(&self, partition: PartitionId) -> Option<PartitionCacheEntry> {
        let key = entry_key(partition);
        let entry = match read_json::<PartitionCacheEntry>(self.store.as_ref(), &key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(err) => {
                self.record_failure(partition, &err);
                if matches!(err, StorageError::Corrupt { .. }) {
                    self.discard(partition, &key);
                }
                return None;
            }
        };

        if entry.partition != partition {
            self.discard(partition, &key);
            return None;
        }

        let now = self.clock.now();
        if self.policy.is_fresh(&entry, now) {
            Some(entry)
        } else {
            tracing::debug!(
                %partition,
                age_secs = self.policy.age(&entry, now).as_secs(),
                "evicting stale partition entry"
            );
            self.stats.stale_eviction();
            self.discard(partition, &key);
            None
        }
    }

    fn discard(&self, partition: PartitionId, key: &str) {
        if let Err(err) = self.store.remove(key) {
            self.record_failure(partition, &err);
        }
    }

    fn record_failure(&self, partition: PartitionId, err: &StorageError) {
        self.stats.storage_failure();
        tracing::debug!(%partition, error = %err, "partition cache degraded to miss");
    }
}

fn entry_key(partition: PartitionId) -> String {
    format!("{}{}", KEY_PREFIX, partition)
}
