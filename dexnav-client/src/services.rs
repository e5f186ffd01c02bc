//! Wiring for the per-session caches and the controllers built on them.
//!
//! One [`Services`] value lives for the browser session. The caches it holds
//! are shared; loaders, controllers and scroll trackers are created per view.

use std::sync::Arc;

use dexnav_core::{BuildMode, CatalogSource, Clock, History, PartitionRange};
use dexnav_storage::{DetailCache, PartitionCache, PositionKey, PositionStore, SessionStore};

use crate::config::ClientConfig;
use crate::loader::ProgressiveLoader;
use crate::navigation::NavigationController;
use crate::preload::Preloader;
use crate::scroll::ScrollTracker;

#[derive(Clone)]
pub struct Services {
    config: ClientConfig,
    mode: BuildMode,
    source: Arc<dyn CatalogSource>,
    partitions: Arc<PartitionCache>,
    positions: Arc<PositionStore>,
    details: Arc<DetailCache>,
}

impl Services {
    pub fn new(
        config: ClientConfig,
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mode = config.build_mode();
        let partitions = Arc::new(PartitionCache::with_ttl(
            store.clone(),
            clock.clone(),
            config.partition_ttl(),
        ));
        let positions = Arc::new(
            PositionStore::with_ttl(store, clock.clone(), config.position_ttl())
                .with_max_entries(config.position_max_entries.unwrap_or(0)),
        );
        let details = Arc::new(DetailCache::with_ttl(clock, config.partition_ttl()));
        tracing::info!(
            %mode,
            api = %config.api_base_url,
            preload = config.preload_enabled,
            "dexnav services ready"
        );
        Self {
            config,
            mode,
            source,
            partitions,
            positions,
            details,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn range(&self) -> PartitionRange {
        self.config.partition_range()
    }

    pub fn source(&self) -> &Arc<dyn CatalogSource> {
        &self.source
    }

    pub fn partition_cache(&self) -> &Arc<PartitionCache> {
        &self.partitions
    }

    pub fn position_store(&self) -> &Arc<PositionStore> {
        &self.positions
    }

    pub fn detail_cache(&self) -> &Arc<DetailCache> {
        &self.details
    }

    /// Loader for one detail view.
    pub fn loader(&self) -> ProgressiveLoader {
        ProgressiveLoader::new(
            self.source.clone(),
            self.details.clone(),
            self.mode,
            self.config.upgrade_delay(),
        )
    }

    pub fn preloader(&self) -> Preloader {
        Preloader::new(
            self.source.clone(),
            self.partitions.clone(),
            self.range(),
            self.mode,
            self.config.preload_delay(),
        )
    }

    /// Navigation controller bound to `history`, preloading when enabled.
    pub fn navigation(&self, history: Arc<dyn History>) -> NavigationController {
        let controller = NavigationController::new(
            self.source.clone(),
            self.partitions.clone(),
            history,
            self.range(),
            self.mode,
        );
        if self.config.preload_enabled {
            controller.with_preloader(self.preloader())
        } else {
            controller
        }
    }

    pub fn scroll_tracker(&self, key: PositionKey) -> ScrollTracker {
        ScrollTracker::mount(key, self.positions.clone(), self.config.scroll_debounce())
    }
}
