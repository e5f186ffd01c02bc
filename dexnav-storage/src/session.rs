//! Session-scoped key/value store.
//!
//! Mirrors the browser's `sessionStorage`: string keys, string values, and an
//! implementation that is allowed to fail on every call.

use dexnav_core::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;

/// String key/value store scoped to one browsing session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value. Undecodable entries are reported as corrupt.
pub(crate) fn read_json<T: DeserializeOwned>(
    store: &dyn SessionStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

pub(crate) fn write_json<T: Serialize>(
    store: &dyn SessionStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.set(key, &raw)
}

/// In-memory session store with an optional byte quota.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse writes once keys plus values would exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn used_bytes(entries: &HashMap<String, String>) -> usize {
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::unavailable("session store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::unavailable("session store lock poisoned"))?;
        if let Some(quota) = self.quota_bytes {
            let replaced = entries.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
            let projected = Self::used_bytes(&entries) - replaced + key.len() + value.len();
            if projected > quota {
                return Err(StorageError::unavailable(format!(
                    "quota of {} bytes exceeded",
                    quota
                )));
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::unavailable("session store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// A store that is never available, as in a locked-down private window.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableSessionStore;

impl SessionStore for UnavailableSessionStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::unavailable("session storage disabled"))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::unavailable("session storage disabled"))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::unavailable("session storage disabled"))
    }
}
