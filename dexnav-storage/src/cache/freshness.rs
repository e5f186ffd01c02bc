//! Freshness rules for cached entries.

use dexnav_core::{within_ttl, Timestamp};
use std::time::Duration;

/// Anything stamped with the time it was stored.
pub trait Timestamped {
    fn stamped_at(&self) -> Timestamp;
}

/// Age limit applied on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    ttl: Duration,
}

impl TtlPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh iff `now - stamped_at < ttl`.
    pub fn is_fresh<T: Timestamped + ?Sized>(&self, entry: &T, now: Timestamp) -> bool {
        within_ttl(entry.stamped_at(), now, self.ttl)
    }

    /// How long ago the entry was stored, zero for future stamps.
    pub fn age<T: Timestamped + ?Sized>(&self, entry: &T, now: Timestamp) -> Duration {
        now.signed_duration_since(entry.stamped_at())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
