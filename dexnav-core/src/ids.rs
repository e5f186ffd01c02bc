//! Identity types for catalog items and partitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal partition ("generation") identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(u32);

impl PartitionId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn previous(&self) -> Option<PartitionId> {
        self.0.checked_sub(1).map(PartitionId)
    }

    pub fn next(&self) -> Option<PartitionId> {
        self.0.checked_add(1).map(PartitionId)
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PartitionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(PartitionId)
    }
}

impl From<u32> for PartitionId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Catalog item identifier as the data source spells it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The declared set of valid partition ids, `first..=last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRange {
    pub first: PartitionId,
    pub last: PartitionId,
}

impl PartitionRange {
    pub fn new(first: u32, last: u32) -> Self {
        Self {
            first: PartitionId(first),
            last: PartitionId(last),
        }
    }

    pub fn contains(&self, id: PartitionId) -> bool {
        self.first <= id && id <= self.last
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }

    /// In-range neighbours of `id` (previous first), used for preloading.
    pub fn adjacent(&self, id: PartitionId) -> Vec<PartitionId> {
        [id.previous(), id.next()]
            .into_iter()
            .flatten()
            .filter(|candidate| self.contains(*candidate))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = PartitionId> {
        (self.first.0..=self.last.0).map(PartitionId)
    }
}
