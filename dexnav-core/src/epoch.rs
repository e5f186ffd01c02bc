//! Epoch tokens for discarding late asynchronous results.
//!
//! Every subject or partition change bumps the owning component's counter.
//! Async work captures the epoch it was started under and re-checks it right
//! before each write; a mismatch marks the result as stale.

use crate::error::{DexError, DexResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A monotonically increasing token identifying one request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Epoch(u64);

impl Epoch {
    /// The epoch before any request was issued.
    pub const ZERO: Epoch = Epoch(0);

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_newer_than(&self, other: &Epoch) -> bool {
        self.0 > other.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared epoch counter. Clones observe the same sequence.
#[derive(Debug, Clone, Default)]
pub struct EpochCounter {
    current: Arc<AtomicU64>,
}

impl EpochCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new context, invalidating every previously issued epoch.
    pub fn bump(&self) -> Epoch {
        Epoch(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn current(&self) -> Epoch {
        Epoch(self.current.load(Ordering::Acquire))
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.current() == epoch
    }

    /// Fails with [`DexError::StaleResponse`] when `epoch` has been superseded.
    pub fn ensure_current(&self, epoch: Epoch) -> DexResult<()> {
        let current = self.current();
        if current == epoch {
            Ok(())
        } else {
            Err(DexError::StaleResponse {
                token: epoch,
                current,
            })
        }
    }
}
