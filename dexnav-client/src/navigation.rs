//! Navigation cache controller.
//!
//! Resolves every partition navigation through one path. Back/forward
//! transitions and programmatic navigation consult the [`PartitionCache`]
//! first and hydrate the list view synchronously on a fresh hit; link
//! navigation always goes to the network. Network results are written to the
//! cache and the view only if no newer navigation has started meanwhile.

use std::sync::Arc;

use dexnav_core::{
    select_shape, BuildMode, CatalogSource, Epoch, EpochCounter, FetchKind, History, Item,
    PartitionId, PartitionRange, PopEvent, TransportError,
};
use dexnav_storage::{PartitionCache, PositionKey};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::preload::Preloader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentSource {
    Link,
    HistoryPop,
}

/// One navigation request, discarded once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub partition: PartitionId,
    pub origin: Option<PartitionId>,
    pub source: IntentSource,
}

impl NavigationIntent {
    pub fn link(partition: PartitionId, origin: Option<PartitionId>) -> Self {
        Self {
            partition,
            origin,
            source: IntentSource::Link,
        }
    }

    pub fn history_pop(partition: PartitionId, origin: Option<PartitionId>) -> Self {
        Self {
            partition,
            origin,
            source: IntentSource::HistoryPop,
        }
    }
}

/// How an intent was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Served from a fresh cache entry; no network call was made.
    ///
    /// The view is already populated, so the saved scroll position for
    /// [`NavigationController::position_key`] can be restored right away.
    FromCache,
    /// A fetch is in flight; watch the view for the result.
    Fetching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOrigin {
    Cache,
    Network,
}

/// What a partition listing renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    pub partition: Option<PartitionId>,
    pub items: Vec<Item>,
    pub loading: bool,
    pub error: Option<TransportError>,
    pub origin: Option<ViewOrigin>,
}

impl ListView {
    fn empty() -> Self {
        Self {
            partition: None,
            items: Vec::new(),
            loading: false,
            error: None,
            origin: None,
        }
    }

    fn loading(partition: PartitionId) -> Self {
        Self {
            partition: Some(partition),
            loading: true,
            ..Self::empty()
        }
    }

    fn cached(partition: PartitionId, items: Vec<Item>) -> Self {
        Self {
            partition: Some(partition),
            items,
            loading: false,
            error: None,
            origin: Some(ViewOrigin::Cache),
        }
    }
}

struct ControllerShared {
    source: Arc<dyn CatalogSource>,
    cache: Arc<PartitionCache>,
    mode: BuildMode,
    epochs: EpochCounter,
    view: watch::Sender<ListView>,
}

pub struct NavigationController {
    shared: Arc<ControllerShared>,
    history: Arc<dyn History>,
    range: PartitionRange,
    preloader: Option<Preloader>,
    cancel: Option<CancellationToken>,
}

impl NavigationController {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        cache: Arc<PartitionCache>,
        history: Arc<dyn History>,
        range: PartitionRange,
        mode: BuildMode,
    ) -> Self {
        let (view, _) = watch::channel(ListView::empty());
        Self {
            shared: Arc::new(ControllerShared {
                source,
                cache,
                mode,
                epochs: EpochCounter::new(),
                view,
            }),
            history,
            range,
            preloader: None,
            cancel: None,
        }
    }

    /// Warm adjacent partitions after every resolved navigation.
    pub fn with_preloader(mut self, preloader: Preloader) -> Self {
        self.preloader = Some(preloader);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<ListView> {
        self.shared.view.subscribe()
    }

    pub fn view(&self) -> ListView {
        self.shared.view.borrow().clone()
    }

    pub fn current_partition(&self) -> Option<PartitionId> {
        self.shared.view.borrow().partition
    }

    /// Scroll position key for the partition currently shown.
    pub fn position_key(&self) -> Option<PositionKey> {
        self.current_partition().map(PositionKey::for_partition)
    }

    /// Resolve the partition named by the current URL, as on first page load.
    pub fn mount(&mut self) -> Resolution {
        let partition = self.history.location().partition().unwrap_or(self.range.first);
        self.resolve(NavigationIntent::link(partition, None))
    }

    /// Resolve an intent. Only history pops consult the cache.
    pub fn resolve(&mut self, intent: NavigationIntent) -> Resolution {
        let cache_first = intent.source == IntentSource::HistoryPop;
        self.resolve_with(intent, cache_first)
    }

    /// Handle a back/forward transition. The target comes from the URL now shown.
    ///
    /// Scroll restoration is left to the caller. Once the view has items
    /// (immediately on [`Resolution::FromCache`], after the fetch settles
    /// otherwise), mount a tracker for the restored partition and restore it:
    ///
    /// ```ignore
    /// if let Some(key) = controller.position_key() {
    ///     let mut tracker = services.scroll_tracker(key);
    ///     tracker.restore(&viewport).await;
    /// }
    /// ```
    pub fn on_history_pop(&mut self, event: PopEvent) -> Resolution {
        let partition = self.history.location().partition().unwrap_or(self.range.first);
        let origin = event.previous.partition();
        self.resolve(NavigationIntent::history_pop(partition, origin))
    }

    /// Programmatic navigation: cache-first resolution, then a history push.
    pub fn navigate_to_partition(&mut self, partition: PartitionId) -> Resolution {
        let origin = self.current_partition();
        let resolution = self.resolve_with(NavigationIntent::link(partition, origin), true);
        let next = self.history.location().with_partition(partition);
        self.history.push(next);
        resolution
    }

    /// Re-fetch the current partition from the network.
    pub fn retry(&mut self) -> Option<Resolution> {
        let partition = self.current_partition()?;
        Some(self.resolve_with(NavigationIntent::link(partition, Some(partition)), false))
    }

    fn resolve_with(&mut self, intent: NavigationIntent, cache_first: bool) -> Resolution {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        let epoch = self.shared.epochs.bump();
        let partition = intent.partition;
        let in_range = self.range.contains(partition);

        if in_range {
            if let Some(preloader) = self.preloader.as_mut() {
                preloader.schedule(partition);
            }
        } else if let Some(preloader) = self.preloader.as_mut() {
            preloader.cancel();
        }

        // Out-of-range ids never hit the cache; the fetch layer reports them.
        if cache_first && in_range {
            if let Some(entry) = self.shared.cache.get(partition) {
                tracing::debug!(
                    %partition,
                    origin = ?intent.origin,
                    source = ?intent.source,
                    "navigation served from cache"
                );
                self.shared
                    .view
                    .send_replace(ListView::cached(partition, entry.items));
                return Resolution::FromCache;
            }
        }

        tracing::debug!(
            %partition,
            origin = ?intent.origin,
            source = ?intent.source,
            %epoch,
            "navigation fetching"
        );
        self.shared.view.send_replace(ListView::loading(partition));

        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        let shared = self.shared.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::trace!(%partition, %epoch, "partition fetch cancelled");
                }
                _ = shared.fetch(partition, epoch) => {}
            }
        });
        Resolution::Fetching
    }
}

impl Drop for NavigationController {
    fn drop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

impl ControllerShared {
    async fn fetch(&self, partition: PartitionId, epoch: Epoch) {
        let shape = select_shape(FetchKind::List, self.mode);
        let result = self.source.fetch_list(partition, shape).await;

        if let Err(err) = self.epochs.ensure_current(epoch) {
            tracing::trace!(%partition, error = %err, "discarding partition response");
            return;
        }

        match result {
            Ok(items) => {
                self.cache.put(partition, items.clone());
                self.view.send_if_modified(|view| {
                    if !self.epochs.is_current(epoch) {
                        return false;
                    }
                    *view = ListView {
                        partition: Some(partition),
                        items,
                        loading: false,
                        error: None,
                        origin: Some(ViewOrigin::Network),
                    };
                    true
                });
            }
            Err(err) => {
                tracing::debug!(%partition, error = %err, "partition fetch failed");
                self.view.send_if_modified(|view| {
                    if !self.epochs.is_current(epoch) {
                        return false;
                    }
                    view.loading = false;
                    view.error = Some(err);
                    true
                });
            }
        }
    }
}
