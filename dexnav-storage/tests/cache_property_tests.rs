use dexnav_core::{Item, ItemId, ManualClock, PartitionId, ScrollPosition, PARTITION_TTL, POSITION_TTL};
use dexnav_storage::{MemorySessionStore, PartitionCache, PositionKey, PositionStore};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn items(partition: u32, count: usize) -> Vec<Item> {
    (0..count)
        .map(|i| Item {
            id: ItemId::new(format!("{}-{}", partition, i)),
            name: format!("item {}", i),
            partition: PartitionId::new(partition),
            kinds: vec!["normal".to_string()],
            sprite_url: None,
            details: None,
        })
        .collect()
}

#[test]
fn scroll_round_trip_then_expiry() {
    let clock = ManualClock::starting_now();
    let store = PositionStore::new(Arc::new(MemorySessionStore::new()), Arc::new(clock.clone()));
    let key = PositionKey::new("gen-3");

    store.save(&key, ScrollPosition::new(120.0, 940.0));
    clock.advance(Duration::from_secs(10 * 60));
    assert_eq!(store.restore(&key), Some(ScrollPosition::new(120.0, 940.0)));

    clock.advance(POSITION_TTL);
    assert_eq!(store.restore(&key), None);
}

proptest! {
    #[test]
    fn partition_get_is_none_exactly_when_not_fresh(
        partition in 1u32..=9,
        count in 0usize..20,
        age_secs in 0u64..(2 * 30 * 60),
    ) {
        let clock = ManualClock::starting_now();
        let cache = PartitionCache::new(Arc::new(MemorySessionStore::new()), Arc::new(clock.clone()));
        let p = PartitionId::new(partition);
        cache.put(p, items(partition, count));

        clock.advance(Duration::from_secs(age_secs));
        let fresh = cache.is_fresh(p);
        prop_assert_eq!(fresh, Duration::from_secs(age_secs) < PARTITION_TTL);

        let got = cache.get(p);
        prop_assert_eq!(got.is_some(), fresh);
        if let Some(entry) = got {
            prop_assert_eq!(entry.items, items(partition, count));
        }
    }

    #[test]
    fn partitions_do_not_interfere(a in 1u32..=9, b in 1u32..=9) {
        prop_assume!(a != b);
        let clock = ManualClock::starting_now();
        let cache = PartitionCache::new(Arc::new(MemorySessionStore::new()), Arc::new(clock));
        cache.put(PartitionId::new(a), items(a, 2));
        prop_assert!(cache.get(PartitionId::new(b)).is_none());
        cache.clear(PartitionId::new(b));
        prop_assert!(cache.get(PartitionId::new(a)).is_some());
    }

    #[test]
    fn position_restore_matches_last_save(
        x in 0u32..10_000,
        y in 0u32..100_000,
        y2 in 0u32..100_000,
    ) {
        let (x, y, y2) = (f64::from(x), f64::from(y), f64::from(y2));
        let clock = ManualClock::starting_now();
        let store = PositionStore::new(Arc::new(MemorySessionStore::new()), Arc::new(clock));
        let key = PositionKey::new("gen-1");
        store.save(&key, ScrollPosition::new(x, y));
        store.save(&key, ScrollPosition::new(x, y2));
        prop_assert_eq!(store.restore(&key), Some(ScrollPosition::new(x, y2)));
    }
}
