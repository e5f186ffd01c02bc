//! Speculative warm-up of neighbouring partitions.
//!
//! After a partition settles, the preloader waits a fixed delay and then
//! fetches the adjacent partitions (current ± 1) that are not already fresh in
//! the [`PartitionCache`]. Failures are logged and dropped; there is no retry.

use std::sync::Arc;
use std::time::Duration;

use dexnav_core::{select_shape, BuildMode, CatalogSource, FetchKind, PartitionId, PartitionRange};
use dexnav_storage::PartitionCache;
use tokio_util::sync::CancellationToken;

pub struct Preloader {
    source: Arc<dyn CatalogSource>,
    cache: Arc<PartitionCache>,
    range: PartitionRange,
    mode: BuildMode,
    delay: Duration,
    cancel: Option<CancellationToken>,
}

impl Preloader {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        cache: Arc<PartitionCache>,
        range: PartitionRange,
        mode: BuildMode,
        delay: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            range,
            mode,
            delay,
            cancel: None,
        }
    }

    /// Schedule warm-up around `current`, replacing any pending schedule.
    pub fn schedule(&mut self, current: PartitionId) {
        self.cancel();
        let targets = self.range.adjacent(current);
        if targets.is_empty() {
            return;
        }

        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        let source = self.source.clone();
        let cache = self.cache.clone();
        let shape = select_shape(FetchKind::List, self.mode);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::trace!(%current, "preload cancelled");
                }
                _ = async {
                    tokio::time::sleep(delay).await;
                    for partition in targets {
                        if cache.is_fresh(partition) {
                            continue;
                        }
                        match source.fetch_list(partition, shape).await {
                            Ok(items) => {
                                cache.put(partition, items);
                                tracing::debug!(%partition, "preloaded partition");
                            }
                            Err(err) => {
                                tracing::warn!(%partition, error = %err, "preload failed, ignoring");
                            }
                        }
                    }
                } => {}
            }
        });
    }

    /// Drop any pending or in-flight warm-up.
    pub fn cancel(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

impl Drop for Preloader {
    fn drop(&mut self) {
        self.cancel();
    }
}
