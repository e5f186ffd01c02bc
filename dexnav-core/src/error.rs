//! Error types for dexnav operations

use crate::epoch::Epoch;
use thiserror::Error;

/// Data-source failures.
///
/// Cloneable so the primary fetch error can sit inside observable view state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Data source unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("Data source returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Failed to decode response: {reason}")]
    Decode { reason: String },
}

impl TransportError {
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable {
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Session store failures. Never fatal: callers degrade to a cache miss.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Session storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Corrupt entry under {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

impl StorageError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Master error type for all dexnav errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DexError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Stale response for epoch {token} (current {current})")]
    StaleResponse { token: Epoch, current: Epoch },
}

/// Result type alias for dexnav operations.
pub type DexResult<T> = Result<T, DexError>;
