//! Catalog item records.
//!
//! A record fetched with the partial shape carries only the cheap listing
//! fields; the full shape adds [`ItemDetails`]. The shape of a record is derived
//! from whether details are present, never stored separately.

use crate::ids::{ItemId, PartitionId};
use crate::strategy::FetchShape;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub partition: PartitionId,
    #[serde(default)]
    pub kinds: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ItemDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetails {
    /// Height in decimetres.
    pub height: u32,
    /// Weight in hectograms.
    pub weight: u32,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub stats: Vec<Stat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub name: String,
    pub base: u16,
}

impl Item {
    pub fn shape(&self) -> FetchShape {
        if self.details.is_some() {
            FetchShape::Full
        } else {
            FetchShape::Partial
        }
    }

    pub fn is_full(&self) -> bool {
        self.shape() == FetchShape::Full
    }

    /// Drop the full-shape fields, yielding the partial representation.
    pub fn to_partial(&self) -> Item {
        Item {
            details: None,
            ..self.clone()
        }
    }
}
