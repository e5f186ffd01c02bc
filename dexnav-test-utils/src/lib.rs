//! dexnav Test Utilities
//!
//! Shared test infrastructure for the dexnav workspace:
//! - A scripted in-memory catalog source with latency and failure injection
//! - Fake browser history and viewport
//! - A session store that can be switched off mid-test
//! - Item fixtures and proptest generators

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dexnav_core::{
    CatalogSource, FetchShape, History, Item, ItemDetails, ItemId, Location, PartitionId,
    PopEvent, ScrollPosition, Stat, StorageError, TransportError, Viewport,
};
use dexnav_storage::{MemorySessionStore, SessionStore};
use proptest::prelude::*;

// Re-export core types for convenience
pub use dexnav_core::{BuildMode, ManualClock, PartitionRange};

// ============================================================================
// FIXTURES
// ============================================================================

/// A full-shape item with deterministic details.
pub fn full_item(id: &str, partition: u32) -> Item {
    let seed = id.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
    Item {
        id: ItemId::new(id),
        name: format!("specimen-{}", id),
        partition: PartitionId::new(partition),
        kinds: vec!["normal".to_string()],
        sprite_url: Some(format!("https://sprites.example/{}.png", id)),
        details: Some(ItemDetails {
            height: 1 + seed % 30,
            weight: 10 + seed % 900,
            abilities: vec!["run-away".to_string()],
            stats: vec![
                Stat {
                    name: "hp".to_string(),
                    base: (20 + seed % 200) as u16,
                },
                Stat {
                    name: "speed".to_string(),
                    base: (5 + seed % 150) as u16,
                },
            ],
            flavor_text: Some(format!("Entry {}.", id)),
        }),
    }
}

/// A catalog of `per_partition` items for every partition in `range`.
///
/// Item ids are sequential across partitions starting at "1".
pub fn catalog_fixture(range: PartitionRange, per_partition: usize) -> Vec<Item> {
    let mut next = 1usize;
    let mut items = Vec::new();
    for partition in range.iter() {
        for _ in 0..per_partition {
            items.push(full_item(&next.to_string(), partition.value()));
            next += 1;
        }
    }
    items
}

fn shaped(item: &Item, shape: FetchShape) -> Item {
    match shape {
        FetchShape::Full => item.clone(),
        FetchShape::Partial => item.to_partial(),
    }
}

// ============================================================================
// MOCK CATALOG SOURCE
// ============================================================================

/// One recorded call against [`MockCatalogSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    List {
        partition: PartitionId,
        shape: FetchShape,
    },
    Detail {
        id: ItemId,
        shape: FetchShape,
    },
}

/// In-memory catalog with scripted latency and failures.
///
/// Latency uses `tokio::time::sleep`, so tests running on paused time see
/// exact, deterministic completion instants.
pub struct MockCatalogSource {
    items: Vec<Item>,
    list_delay: Duration,
    partial_delay: Duration,
    full_delay: Duration,
    failing_partitions: Mutex<HashSet<PartitionId>>,
    failing_details: Mutex<HashSet<(ItemId, FetchShape)>>,
    calls: Mutex<Vec<SourceCall>>,
}

impl MockCatalogSource {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            list_delay: Duration::ZERO,
            partial_delay: Duration::ZERO,
            full_delay: Duration::ZERO,
            failing_partitions: Mutex::new(HashSet::new()),
            failing_details: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Nine partitions of three items each.
    pub fn standard() -> Self {
        Self::new(catalog_fixture(PartitionRange::new(1, 9), 3))
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    pub fn with_detail_delays(mut self, partial: Duration, full: Duration) -> Self {
        self.partial_delay = partial;
        self.full_delay = full;
        self
    }

    pub fn fail_partition(&self, partition: PartitionId) {
        lock(&self.failing_partitions).insert(partition);
    }

    pub fn heal_partition(&self, partition: PartitionId) {
        lock(&self.failing_partitions).remove(&partition);
    }

    pub fn fail_detail(&self, id: &ItemId, shape: FetchShape) {
        lock(&self.failing_details).insert((id.clone(), shape));
    }

    pub fn heal_detail(&self, id: &ItemId, shape: FetchShape) {
        lock(&self.failing_details).remove(&(id.clone(), shape));
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        lock(&self.calls).clone()
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn detail_calls(&self, id: &str, shape: FetchShape) -> usize {
        let id = ItemId::new(id);
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, SourceCall::Detail { id: i, shape: s } if *i == id && *s == shape))
            .count()
    }

    pub fn list_calls(&self, partition: u32) -> usize {
        let partition = PartitionId::new(partition);
        lock(&self.calls)
            .iter()
            .filter(|call| matches!(call, SourceCall::List { partition: p, .. } if *p == partition))
            .count()
    }

    /// Items of `partition` in the requested shape, as the source would return them.
    pub fn expected_list(&self, partition: u32, shape: FetchShape) -> Vec<Item> {
        self.items
            .iter()
            .filter(|item| item.partition == PartitionId::new(partition))
            .map(|item| shaped(item, shape))
            .collect()
    }

    pub fn expected_detail(&self, id: &str, shape: FetchShape) -> Option<Item> {
        self.items
            .iter()
            .find(|item| item.id.as_str() == id)
            .map(|item| shaped(item, shape))
    }

    async fn wait(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    async fn fetch_list(
        &self,
        partition: PartitionId,
        shape: FetchShape,
    ) -> Result<Vec<Item>, TransportError> {
        lock(&self.calls).push(SourceCall::List { partition, shape });
        Self::wait(self.list_delay).await;

        if lock(&self.failing_partitions).contains(&partition) {
            return Err(TransportError::unreachable(format!(
                "scripted failure for partition {}",
                partition
            )));
        }
        let items = self.expected_list(partition.value(), shape);
        if items.is_empty() {
            return Err(TransportError::not_found(format!("generation {}", partition)));
        }
        Ok(items)
    }

    async fn fetch_detail(&self, id: &ItemId, shape: FetchShape) -> Result<Item, TransportError> {
        lock(&self.calls).push(SourceCall::Detail {
            id: id.clone(),
            shape,
        });
        let delay = match shape {
            FetchShape::Partial => self.partial_delay,
            FetchShape::Full => self.full_delay,
        };
        Self::wait(delay).await;

        if lock(&self.failing_details).contains(&(id.clone(), shape)) {
            return Err(TransportError::unreachable(format!(
                "scripted failure for item {} ({})",
                id, shape
            )));
        }
        self.expected_detail(id.as_str(), shape)
            .ok_or_else(|| TransportError::not_found(format!("item {}", id)))
    }
}

// ============================================================================
// FAKE HISTORY
// ============================================================================

/// Browser history stack with back/forward support.
pub struct FakeHistory {
    state: Mutex<HistoryState>,
    pushes: AtomicUsize,
}

struct HistoryState {
    entries: Vec<Location>,
    cursor: usize,
}

impl FakeHistory {
    pub fn new(initial: &str) -> Self {
        let location = Location::parse(initial).unwrap_or_else(|e| panic!("bad url {}: {}", initial, e));
        Self {
            state: Mutex::new(HistoryState {
                entries: vec![location],
                cursor: 0,
            }),
            pushes: AtomicUsize::new(0),
        }
    }

    /// Move back one entry, returning the pop event the browser would emit.
    pub fn back(&self) -> Option<PopEvent> {
        let mut state = lock(&self.state);
        if state.cursor == 0 {
            return None;
        }
        let previous = state.entries[state.cursor].clone();
        state.cursor -= 1;
        Some(PopEvent { previous })
    }

    pub fn forward(&self) -> Option<PopEvent> {
        let mut state = lock(&self.state);
        if state.cursor + 1 >= state.entries.len() {
            return None;
        }
        let previous = state.entries[state.cursor].clone();
        state.cursor += 1;
        Some(PopEvent { previous })
    }

    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }
}

impl History for FakeHistory {
    fn location(&self) -> Location {
        let state = lock(&self.state);
        state.entries[state.cursor].clone()
    }

    fn push(&self, location: Location) {
        let mut state = lock(&self.state);
        let keep = state.cursor + 1;
        state.entries.truncate(keep);
        state.entries.push(location);
        state.cursor = state.entries.len() - 1;
        self.pushes.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// VIEWPORT
// ============================================================================

/// Viewport that records every scroll it is asked to perform.
#[derive(Default)]
pub struct RecordingViewport {
    scrolls: Mutex<Vec<ScrollPosition>>,
    frames: AtomicUsize,
}

impl RecordingViewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scrolls(&self) -> Vec<ScrollPosition> {
        lock(&self.scrolls).clone()
    }

    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Viewport for RecordingViewport {
    async fn next_frame(&self) {
        tokio::task::yield_now().await;
        self.frames.fetch_add(1, Ordering::SeqCst);
    }

    fn scroll_to(&self, position: ScrollPosition) {
        lock(&self.scrolls).push(position);
    }
}

// ============================================================================
// SESSION STORE
// ============================================================================

/// Memory-backed session store that can be made unavailable at runtime.
#[derive(Default)]
pub struct FlakySessionStore {
    inner: MemorySessionStore,
    failing: AtomicBool,
}

impl FlakySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemorySessionStore {
        &self.inner
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::unavailable("scripted outage"))
        } else {
            Ok(())
        }
    }
}

impl SessionStore for FlakySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.inner.remove(key)
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub fn arb_partition_id() -> impl Strategy<Value = PartitionId> {
    (1u32..=9).prop_map(PartitionId::new)
}

pub fn arb_item() -> impl Strategy<Value = Item> {
    (1u32..2000, 1u32..=9, any::<bool>()).prop_map(|(id, partition, full)| {
        let item = full_item(&id.to_string(), partition);
        if full {
            item
        } else {
            item.to_partial()
        }
    })
}

pub fn arb_build_mode() -> impl Strategy<Value = BuildMode> {
    prop_oneof![Just(BuildMode::Static), Just(BuildMode::Runtime)]
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
