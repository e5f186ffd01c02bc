//! dexnav Core - Entity Types and Contracts
//!
//! Pure data structures plus the contracts of the collaborators the rest of
//! the workspace talks to (data source, browser history, viewport). Nothing in
//! this crate performs I/O or spawns tasks.

pub mod clock;
pub mod epoch;
pub mod error;
pub mod history;
pub mod ids;
pub mod item;
pub mod source;
pub mod strategy;
pub mod viewport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use epoch::{Epoch, EpochCounter};
pub use error::{DexError, DexResult, StorageError, TransportError};
pub use history::{History, Location, PopEvent, PARTITION_QUERY_PARAM};
pub use ids::{ItemId, PartitionId, PartitionRange};
pub use item::{Item, ItemDetails, Stat};
pub use source::CatalogSource;
pub use strategy::{select_shape, BuildMode, FetchKind, FetchShape, BUILD_MODE_ENV};
pub use viewport::{ScrollPosition, Viewport};

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// TIMING DEFAULTS
// ============================================================================

/// Age after which a cached partition is treated as absent.
pub const PARTITION_TTL: Duration = Duration::from_secs(30 * 60);

/// Age after which a saved scroll position is treated as absent.
pub const POSITION_TTL: Duration = PARTITION_TTL;

/// Delay before a runtime-mode detail view upgrades to the full shape.
pub const DEFAULT_UPGRADE_DELAY: Duration = Duration::from_millis(2000);

/// Scroll inactivity window before a position is written.
pub const SCROLL_SAVE_DEBOUNCE: Duration = Duration::from_millis(150);

/// Delay before adjacent partitions are speculatively fetched.
pub const DEFAULT_PRELOAD_DELAY: Duration = Duration::from_millis(1000);

/// Returns true when an entry stored at `stored_at` is still within `ttl` at `now`.
///
/// Entries stamped in the future (clock skew) count as fresh.
pub fn within_ttl(stored_at: Timestamp, now: Timestamp, ttl: Duration) -> bool {
    match now.signed_duration_since(stored_at).to_std() {
        Ok(age) => age < ttl,
        Err(_) => true,
    }
}
