//! In-memory cache of full-shape items.
//!
//! Lets a detail upgrade skip the network when the complete record was
//! already fetched this session. Partial records are never stored here.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use dexnav_core::{Clock, Item, ItemId, Timestamp, PARTITION_TTL};

use super::freshness::{Timestamped, TtlPolicy};
use super::stats::{CacheStats, StatsCounter};

struct DetailEntry {
    item: Item,
    stored_at: Timestamp,
}

impl Timestamped for DetailEntry {
    fn stamped_at(&self) -> Timestamp {
        self.stored_at
    }
}

pub struct DetailCache {
    entries: RwLock<HashMap<ItemId, DetailEntry>>,
    clock: Arc<dyn Clock>,
    policy: TtlPolicy,
    stats: StatsCounter,
}

impl DetailCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, PARTITION_TTL)
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            policy: TtlPolicy::new(ttl),
            stats: StatsCounter::default(),
        }
    }

    /// The cached full record for `id`, if fresh.
    pub fn get(&self, id: &ItemId) -> Option<Item> {
        let now = self.clock.now();
        let fresh = {
            let Ok(entries) = self.entries.read() else {
                self.stats.storage_failure();
                return None;
            };
            match entries.get(id) {
                Some(entry) if self.policy.is_fresh(entry, now) => Some(entry.item.clone()),
                Some(_) => None,
                None => {
                    self.stats.miss();
                    return None;
                }
            }
        };

        match fresh {
            Some(item) => {
                self.stats.hit();
                Some(item)
            }
            None => {
                self.stats.miss();
                self.stats.stale_eviction();
                if let Ok(mut entries) = self.entries.write() {
                    entries.remove(id);
                }
                None
            }
        }
    }

    /// Cache a full record. Partial records are rejected and return false.
    ///
    /// Expired entries are swept on every write.
    pub fn put(&self, item: Item) -> bool {
        if !item.is_full() {
            return false;
        }
        let Ok(mut entries) = self.entries.write() else {
            self.stats.storage_failure();
            return false;
        };
        let now = self.clock.now();
        let before = entries.len();
        entries.retain(|_, entry| self.policy.is_fresh(entry, now));
        for _ in entries.len()..before {
            self.stats.stale_eviction();
        }
        entries.insert(item.id.clone(), DetailEntry { item, stored_at: now });
        self.stats.write();
        true
    }

    pub fn remove(&self, id: &ItemId) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}
