//! Error types for the client.

use crate::config::ConfigError;
use dexnav_core::{DexError, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Dex(#[from] DexError),
    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Detail loader stopped before the record settled")]
    LoaderClosed,
    #[error("Usage: {0}")]
    Usage(String),
    #[error("Failed to init tracing subscriber: {0}")]
    Telemetry(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
