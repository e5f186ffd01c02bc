//! Scroll position store.
//!
//! Records live in the session store as JSON under `dexnav:scroll:<key>` and
//! follow the same lazy TTL rule as the partition cache. When a capacity is
//! configured, a key index ordered by save time is kept next to the records
//! and the least recently saved keys are dropped first.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dexnav_core::{Clock, PartitionId, ScrollPosition, StorageError, Timestamp, POSITION_TTL};
use serde::{Deserialize, Serialize};

use super::freshness::{Timestamped, TtlPolicy};
use super::stats::{CacheStats, StatsCounter};
use crate::session::{read_json, write_json, SessionStore};

const KEY_PREFIX: &str = "dexnav:scroll:";
const INDEX_KEY: &str = "dexnav:scroll-index";

/// Page identity a scroll position is saved under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionKey(String);

impl PositionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key for a partition listing page, e.g. `gen-3`.
    pub fn for_partition(partition: PartitionId) -> Self {
        Self(format!("gen-{}", partition))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub key: PositionKey,
    pub x: f64,
    pub y: f64,
    pub saved_at: Timestamp,
}

impl PositionRecord {
    pub fn position(&self) -> ScrollPosition {
        ScrollPosition::new(self.x, self.y)
    }
}

impl Timestamped for PositionRecord {
    fn stamped_at(&self) -> Timestamp {
        self.saved_at
    }
}

pub struct PositionStore {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    policy: TtlPolicy,
    max_entries: Option<usize>,
    index_guard: Mutex<()>,
    stats: StatsCounter,
}

impl PositionStore {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(store, clock, POSITION_TTL)
    }

    pub fn with_ttl(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            policy: TtlPolicy::new(ttl),
            max_entries: None,
            index_guard: Mutex::new(()),
            stats: StatsCounter::default(),
        }
    }

    /// Cap the number of saved keys. Zero is treated as unbounded.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = (max_entries > 0).then_some(max_entries);
        self
    }

    /// Write the position for `key`, stamped now. Returns false if the store refused.
    pub fn save(&self, key: &PositionKey, position: ScrollPosition) -> bool {
        let record = PositionRecord {
            key: key.clone(),
            x: position.x,
            y: position.y,
            saved_at: self.clock.now(),
        };
        if let Err(err) = write_json(self.store.as_ref(), &record_key(key), &record) {
            self.record_failure(key, &err);
            return false;
        }
        self.stats.write();
        if let Some(cap) = self.max_entries {
            self.touch_index(key, cap);
        }
        true
    }

    /// The saved position for `key`, or `None` when absent or expired.
    ///
    /// Expired records are deleted.
    pub fn restore(&self, key: &PositionKey) -> Option<ScrollPosition> {
        let storage_key = record_key(key);
        let record = match read_json::<PositionRecord>(self.store.as_ref(), &storage_key) {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.stats.miss();
                return None;
            }
            Err(err) => {
                self.stats.miss();
                self.record_failure(key, &err);
                if matches!(err, StorageError::Corrupt { .. }) {
                    self.clear(key);
                }
                return None;
            }
        };

        if self.policy.is_fresh(&record, self.clock.now()) {
            self.stats.hit();
            Some(record.position())
        } else {
            tracing::debug!(%key, "dropping expired scroll position");
            self.stats.miss();
            self.stats.stale_eviction();
            self.clear(key);
            None
        }
    }

    pub fn clear(&self, key: &PositionKey) {
        if let Err(err) = self.store.remove(&record_key(key)) {
            self.record_failure(key, &err);
        }
        if self.max_entries.is_some() {
            self.remove_from_index(key);
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    fn touch_index(&self, key: &PositionKey, cap: usize) {
        let _guard = self.index_guard.lock().unwrap_or_else(|p| p.into_inner());
        let mut index = self.load_index();
        index.retain(|existing| existing != key);
        index.push(key.clone());

        let overflow = index.len().saturating_sub(cap);
        for evicted in index.drain(..overflow) {
            tracing::debug!(key = %evicted, "evicting scroll position over capacity");
            if let Err(err) = self.store.remove(&record_key(&evicted)) {
                self.record_failure(&evicted, &err);
            }
            self.stats.capacity_eviction();
        }

        if let Err(err) = write_json(self.store.as_ref(), INDEX_KEY, &index) {
            self.record_failure(key, &err);
        }
    }

    fn remove_from_index(&self, key: &PositionKey) {
        let _guard = self.index_guard.lock().unwrap_or_else(|p| p.into_inner());
        let mut index = self.load_index();
        let before = index.len();
        index.retain(|existing| existing != key);
        if index.len() != before {
            if let Err(err) = write_json(self.store.as_ref(), INDEX_KEY, &index) {
                self.record_failure(key, &err);
            }
        }
    }

    fn load_index(&self) -> Vec<PositionKey> {
        match read_json::<Vec<PositionKey>>(self.store.as_ref(), INDEX_KEY) {
            Ok(index) => index.unwrap_or_default(),
            Err(err) => {
                self.stats.storage_failure();
                tracing::debug!(error = %err, "scroll index unreadable, starting fresh");
                Vec::new()
            }
        }
    }

    fn record_failure(&self, key: &PositionKey, err: &StorageError) {
        self.stats.storage_failure();
        tracing::debug!(%key, error = %err, "position store degraded to no-op");
    }
}

fn record_key(key: &PositionKey) -> String {
    format!("{}{}", KEY_PREFIX, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, UnavailableSessionStore};
    use dexnav_core::ManualClock;

    fn store_with_clock() -> (PositionStore, ManualClock, Arc<MemorySessionStore>) {
        let backing = Arc::new(MemorySessionStore::new());
        let clock = ManualClock::starting_now();
        let store = PositionStore::new(backing.clone(), Arc::new(clock.clone()));
        (store, clock, backing)
    }

    #[test]
    fn test_save_restore_round_trip() {
        let (store, _clock, _backing) = store_with_clock();
        let key = PositionKey::new("gen-3");
        assert!(store.save(&key, ScrollPosition::new(120.0, 940.0)));
        assert_eq!(store.restore(&key), Some(ScrollPosition::new(120.0, 940.0)));
    }

    #[test]
    fn test_expired_position_is_absent_and_deleted() {
        let (store, clock, backing) = store_with_clock();
        let key = PositionKey::for_partition(PartitionId::new(3));
        store.save(&key, ScrollPosition::new(0.0, 10.0));
        clock.advance(POSITION_TTL);
        assert_eq!(store.restore(&key), None);
        assert!(backing.is_empty());
    }

    #[test]
    fn test_clear_removes_position() {
        let (store, _clock, _backing) = store_with_clock();
        let key = PositionKey::new("detail-25");
        store.save(&key, ScrollPosition::new(1.0, 2.0));
        store.clear(&key);
        assert_eq!(store.restore(&key), None);
    }

    #[test]
    fn test_partition_key_format() {
        assert_eq!(PositionKey::for_partition(PartitionId::new(3)).as_str(), "gen-3");
    }

    #[test]
    fn test_capacity_evicts_least_recently_saved() {
        let (store, _clock, _backing) = store_with_clock();
        let store = store.with_max_entries(2);
        let a = PositionKey::new("a");
        let b = PositionKey::new("b");
        let c = PositionKey::new("c");

        store.save(&a, ScrollPosition::new(0.0, 1.0));
        store.save(&b, ScrollPosition::new(0.0, 2.0));
        // Re-saving `a` makes `b` the oldest.
        store.save(&a, ScrollPosition::new(0.0, 3.0));
        store.save(&c, ScrollPosition::new(0.0, 4.0));

        assert_eq!(store.restore(&a), Some(ScrollPosition::new(0.0, 3.0)));
        assert_eq!(store.restore(&b), None);
        assert_eq!(store.restore(&c), Some(ScrollPosition::new(0.0, 4.0)));
        assert_eq!(store.stats().capacity_evictions, 1);
    }

    struct ReadOnlyStore(MemorySessionStore);

    impl SessionStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.set(key, value)
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::unavailable("read-only"))
        }
    }

    #[test]
    fn test_failed_delete_of_corrupt_record_is_counted() {
        let backing = Arc::new(ReadOnlyStore(MemorySessionStore::new()));
        backing.set("dexnav:scroll:gen-2", "{").unwrap();
        let store = PositionStore::new(backing, Arc::new(ManualClock::starting_now()));

        assert_eq!(store.restore(&PositionKey::new("gen-2")), None);
        let stats = store.stats();
        assert_eq!(stats.storage_failures, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_unavailable_store_is_silent() {
        let store = PositionStore::new(
            Arc::new(UnavailableSessionStore),
            Arc::new(ManualClock::starting_now()),
        );
        let key = PositionKey::new("gen-1");
        assert!(!store.save(&key, ScrollPosition::new(1.0, 1.0)));
        assert_eq!(store.restore(&key), None);
        assert!(store.stats().storage_failures >= 2);
    }
}
