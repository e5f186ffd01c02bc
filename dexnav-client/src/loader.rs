//! Progressive detail loading.
//!
//! A detail view first receives whatever shape the strategy selector picks
//! for its build mode. In runtime mode a one-shot timer then upgrades the view
//! to the full record. The effective view is published through a
//! [`tokio::sync::watch`] channel and moves through
//! `initial -> upgrading -> upgraded` only; once upgraded, nothing written for
//! the same subject can bring back the partial record.
//!
//! Every subject change bumps the loader's epoch and cancels the previous
//! subject's token. Writes re-check the epoch inside the watch lock, so a
//! response that outlives its subject is dropped rather than applied.

use std::sync::Arc;
use std::time::Duration;

use dexnav_core::{
    select_shape, BuildMode, CatalogSource, Epoch, EpochCounter, FetchKind, FetchShape, Item,
    ItemId, TransportError,
};
use dexnav_storage::DetailCache;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadPhase {
    Initial,
    Upgrading,
    Upgraded,
}

/// What a detail view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub subject: Option<ItemId>,
    pub data: Option<Item>,
    pub loading: bool,
    pub error: Option<TransportError>,
    pub phase: LoadPhase,
}

impl DetailView {
    fn idle() -> Self {
        Self {
            subject: None,
            data: None,
            loading: false,
            error: None,
            phase: LoadPhase::Initial,
        }
    }

    fn loading(subject: ItemId) -> Self {
        Self {
            subject: Some(subject),
            loading: true,
            ..Self::idle()
        }
    }

    /// Shape of the effective data, if any has arrived.
    pub fn shape(&self) -> Option<FetchShape> {
        self.data.as_ref().map(Item::shape)
    }
}

struct LoaderShared {
    source: Arc<dyn CatalogSource>,
    details: Arc<DetailCache>,
    mode: BuildMode,
    upgrade_delay: Duration,
    epochs: EpochCounter,
    view: watch::Sender<DetailView>,
}

/// Owns the load state of the single active detail view.
pub struct ProgressiveLoader {
    shared: Arc<LoaderShared>,
    cancel: Option<CancellationToken>,
}

impl ProgressiveLoader {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        details: Arc<DetailCache>,
        mode: BuildMode,
        upgrade_delay: Duration,
    ) -> Self {
        let (view, _) = watch::channel(DetailView::idle());
        Self {
            shared: Arc::new(LoaderShared {
                source,
                details,
                mode,
                upgrade_delay,
                epochs: EpochCounter::new(),
                view,
            }),
            cancel: None,
        }
    }

    pub fn mode(&self) -> BuildMode {
        self.shared.mode
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailView> {
        self.shared.view.subscribe()
    }

    pub fn view(&self) -> DetailView {
        self.shared.view.borrow().clone()
    }

    /// Start loading `subject` from `initial`, abandoning any previous subject.
    pub fn load(&mut self, subject: ItemId) {
        self.cancel_pending();
        let epoch = self.shared.epochs.bump();
        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        self.shared.view.send_replace(DetailView::loading(subject.clone()));

        tracing::debug!(%subject, %epoch, mode = %self.shared.mode, "loading detail");
        let shared = self.shared.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::trace!(%subject, %epoch, "detail load cancelled");
                }
                _ = shared.run(&subject, epoch) => {}
            }
        });
    }

    /// Load `subject` unless it is already the current, healthy subject.
    pub fn set_subject(&mut self, subject: ItemId) {
        let unchanged = {
            let view = self.shared.view.borrow();
            view.subject.as_ref() == Some(&subject) && view.error.is_none()
        };
        if !unchanged {
            self.load(subject);
        }
    }

    /// Re-run the whole sequence for the current subject.
    pub fn retry(&mut self) -> bool {
        let subject = self.shared.view.borrow().subject.clone();
        match subject {
            Some(subject) => {
                self.load(subject);
                true
            }
            None => false,
        }
    }

    /// Upgrade now instead of waiting for the timer.
    ///
    /// Returns false when there is nothing to upgrade: static mode, no subject,
    /// an initial fetch that failed, or an upgrade already started.
    pub fn upgrade_now(&mut self) -> bool {
        if self.shared.mode != BuildMode::Runtime {
            return false;
        }
        let subject = {
            let view = self.shared.view.borrow();
            if view.phase != LoadPhase::Initial || view.error.is_some() {
                return false;
            }
            match view.subject.clone() {
                Some(subject) => subject,
                None => return false,
            }
        };
        let Some(token) = self.cancel.clone() else {
            return false;
        };

        let epoch = self.shared.epochs.current();
        let shared = self.shared.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = shared.upgrade(&subject, epoch) => {}
            }
        });
        true
    }

    /// Drop the current subject, e.g. when the view unmounts.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.shared.epochs.bump();
        self.shared.view.send_replace(DetailView::idle());
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

impl Drop for ProgressiveLoader {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

impl LoaderShared {
    async fn run(&self, subject: &ItemId, epoch: Epoch) {
        let shape = select_shape(FetchKind::Detail, self.mode);
        match self.source.fetch_detail(subject, shape).await {
            Ok(item) => {
                if item.is_full() && self.epochs.is_current(epoch) {
                    self.details.put(item.clone());
                }
                self.apply_initial(epoch, item);
            }
            Err(err) => {
                if self.apply_error(epoch, err) {
                    return;
                }
            }
        }

        if self.mode != BuildMode::Runtime {
            return;
        }
        tokio::time::sleep(self.upgrade_delay).await;
        self.upgrade(subject, epoch).await;
    }

    fn apply_initial(&self, epoch: Epoch, item: Item) {
        self.view.send_if_modified(|view| {
            if let Err(err) = self.epochs.ensure_current(epoch) {
                tracing::trace!(error = %err, "discarding initial detail");
                return false;
            }
            if view.phase == LoadPhase::Upgraded {
                tracing::trace!(subject = %item.id, "full record already shown, dropping partial");
                return false;
            }
            view.data = Some(item);
            view.loading = false;
            view.error = None;
            true
        });
    }

    /// Surface a failed initial fetch. Returns true when the failure was shown.
    fn apply_error(&self, epoch: Epoch, err: TransportError) -> bool {
        self.view.send_if_modified(|view| {
            if let Err(stale) = self.epochs.ensure_current(epoch) {
                tracing::trace!(error = %stale, "discarding initial detail failure");
                return false;
            }
            if view.phase == LoadPhase::Upgraded {
                return false;
            }
            tracing::debug!(error = %err, "initial detail fetch failed");
            view.loading = false;
            view.error = Some(err);
            true
        })
    }

    async fn upgrade(&self, subject: &ItemId, epoch: Epoch) {
        let began = self.view.send_if_modified(|view| {
            if !self.epochs.is_current(epoch)
                || view.phase != LoadPhase::Initial
                || view.error.is_some()
            {
                return false;
            }
            view.phase = LoadPhase::Upgrading;
            true
        });
        if !began {
            return;
        }

        let item = match self.details.get(subject) {
            Some(item) => {
                tracing::debug!(%subject, "upgrade served from detail cache");
                item
            }
            None => match self.source.fetch_detail(subject, FetchShape::Full).await {
                Ok(item) if item.is_full() => {
                    if let Err(err) = self.epochs.ensure_current(epoch) {
                        tracing::trace!(error = %err, "discarding upgrade");
                        return;
                    }
                    self.details.put(item.clone());
                    item
                }
                Ok(_) => {
                    tracing::warn!(%subject, "upgrade returned a partial record, keeping current data");
                    return;
                }
                Err(err) => {
                    tracing::warn!(%subject, error = %err, "upgrade fetch failed, keeping partial data");
                    return;
                }
            },
        };

        self.view.send_if_modified(|view| {
            if let Err(err) = self.epochs.ensure_current(epoch) {
                tracing::trace!(error = %err, "discarding upgrade");
                return false;
            }
            view.phase = LoadPhase::Upgraded;
            view.data = Some(item);
            view.loading = false;
            view.error = None;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexnav_core::{ManualClock, PartitionRange};
    use dexnav_test_utils::{catalog_fixture, MockCatalogSource};

    fn loader(mode: BuildMode, source: Arc<MockCatalogSource>) -> ProgressiveLoader {
        let details = Arc::new(DetailCache::new(Arc::new(ManualClock::starting_now())));
        ProgressiveLoader::new(source, details, mode, Duration::from_millis(2000))
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_static_mode_fetches_full_once() {
        let source = Arc::new(MockCatalogSource::standard());
        let mut loader = loader(BuildMode::Static, source.clone());
        let mut rx = loader.subscribe();

        loader.load(ItemId::new("4"));
        let view = rx.wait_for(|v| !v.loading).await.unwrap().clone();
        assert_eq!(view.shape(), Some(FetchShape::Full));
        assert_eq!(view.phase, LoadPhase::Initial);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.total_calls(), 1);
        assert!(!loader.upgrade_now());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_initial_failure_blocks_upgrade_and_retry_recovers() {
        let source = Arc::new(MockCatalogSource::standard());
        source.fail_detail(&ItemId::new("2"), FetchShape::Partial);
        let mut loader = loader(BuildMode::Runtime, source.clone());
        let mut rx = loader.subscribe();

        loader.load(ItemId::new("2"));
        let view = rx.wait_for(|v| !v.loading).await.unwrap().clone();
        assert!(view.error.is_some());
        assert!(view.data.is_none());
        assert!(!loader.upgrade_now());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.detail_calls("2", FetchShape::Full), 0);

        source.heal_detail(&ItemId::new("2"), FetchShape::Partial);
        assert!(loader.retry());
        let view = rx
            .wait_for(|v| v.phase == LoadPhase::Upgraded)
            .await
            .unwrap()
            .clone();
        assert!(view.error.is_none());
        assert_eq!(view.shape(), Some(FetchShape::Full));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_upgrade_prefers_detail_cache() {
        let source = Arc::new(MockCatalogSource::new(catalog_fixture(PartitionRange::new(1, 1), 3)));
        let mut loader = loader(BuildMode::Runtime, source.clone());
        let mut rx = loader.subscribe();

        loader.load(ItemId::new("1"));
        rx.wait_for(|v| v.phase == LoadPhase::Upgraded).await.unwrap();
        assert_eq!(source.detail_calls("1", FetchShape::Full), 1);

        loader.load(ItemId::new("1"));
        let view = rx
            .wait_for(|v| v.phase == LoadPhase::Upgraded)
            .await
            .unwrap()
            .clone();
        assert_eq!(view.shape(), Some(FetchShape::Full));
        assert_eq!(source.detail_calls("1", FetchShape::Full), 1);
        assert_eq!(source.detail_calls("1", FetchShape::Partial), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_failed_upgrade_keeps_partial() {
        let source = Arc::new(MockCatalogSource::standard());
        source.fail_detail(&ItemId::new("5"), FetchShape::Full);
        let mut loader = loader(BuildMode::Runtime, source.clone());
        let mut rx = loader.subscribe();

        loader.load(ItemId::new("5"));
        rx.wait_for(|v| v.phase == LoadPhase::Upgrading).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let view = loader.view();
        assert!(view.error.is_none());
        assert_eq!(view.shape(), Some(FetchShape::Partial));
        assert_eq!(view.phase, LoadPhase::Upgrading);
        assert_eq!(source.detail_calls("5", FetchShape::Full), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_set_subject_same_subject_is_noop() {
        let source = Arc::new(MockCatalogSource::standard());
        let mut loader = loader(BuildMode::Runtime, source.clone());
        let mut rx = loader.subscribe();

        loader.set_subject(ItemId::new("3"));
        rx.wait_for(|v| !v.loading).await.unwrap();
        loader.set_subject(ItemId::new("3"));
        tokio::task::yield_now().await;
        assert_eq!(source.detail_calls("3", FetchShape::Partial), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_reset_cancels_upgrade() {
        let source = Arc::new(MockCatalogSource::standard());
        let mut loader = loader(BuildMode::Runtime, source.clone());
        let mut rx = loader.subscribe();

        loader.load(ItemId::new("6"));
        rx.wait_for(|v| !v.loading).await.unwrap();
        loader.reset();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.detail_calls("6", FetchShape::Full), 0);
        assert_eq!(loader.view().subject, None);
    }
}
