//! Scroll restoration for one mounted page.
//!
//! Scroll events are debounced before they reach the [`PositionStore`]; the
//! last pending position is written synchronously on teardown. Restoration
//! runs at most once per mount and waits for the next paint frame so it does
//! not fight the browser's own scroll anchoring.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dexnav_core::{ScrollPosition, Viewport};
use dexnav_storage::{PositionKey, PositionStore};
use tokio_util::sync::CancellationToken;

pub struct ScrollTracker {
    key: PositionKey,
    store: Arc<PositionStore>,
    debounce: Duration,
    pending: Arc<Mutex<Option<ScrollPosition>>>,
    debounce_cancel: Option<CancellationToken>,
    restored: bool,
}

impl ScrollTracker {
    /// Mount a tracker for the page identified by `key`.
    pub fn mount(key: PositionKey, store: Arc<PositionStore>, debounce: Duration) -> Self {
        Self {
            key,
            store,
            debounce,
            pending: Arc::new(Mutex::new(None)),
            debounce_cancel: None,
            restored: false,
        }
    }

    pub fn key(&self) -> &PositionKey {
        &self.key
    }

    pub fn has_restored(&self) -> bool {
        self.restored
    }

    /// Record a scroll event; the position is saved once scrolling settles.
    pub fn on_scroll(&mut self, position: ScrollPosition) {
        *lock(&self.pending) = Some(position);
        if let Some(token) = self.debounce_cancel.take() {
            token.cancel();
        }

        let token = CancellationToken::new();
        self.debounce_cancel = Some(token.clone());
        let pending = self.pending.clone();
        let store = self.store.clone();
        let key = self.key.clone();
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(debounce) => {
                    let settled = lock(&pending).take();
                    if let Some(position) = settled {
                        store.save(&key, position);
                    }
                }
            }
        });
    }

    /// Write any pending position immediately.
    pub fn flush(&mut self) {
        if let Some(token) = self.debounce_cancel.take() {
            token.cancel();
        }
        let pending = lock(&self.pending).take();
        if let Some(position) = pending {
            self.store.save(&self.key, position);
        }
    }

    /// Jump the viewport to the saved position on the next frame.
    ///
    /// Only the first call per mount consults the store; later calls return
    /// `None` without touching the viewport.
    pub async fn restore(&mut self, viewport: &dyn Viewport) -> Option<ScrollPosition> {
        if self.restored {
            return None;
        }
        self.restored = true;

        let position = self.store.restore(&self.key)?;
        viewport.next_frame().await;
        viewport.scroll_to(position);
        tracing::debug!(key = %self.key, x = position.x, y = position.y, "scroll restored");
        Some(position)
    }

    /// Unmount: flush the pending position and stop tracking.
    pub fn teardown(mut self) {
        self.flush();
    }
}

impl Drop for ScrollTracker {
    fn drop(&mut self) {
        self.flush();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
