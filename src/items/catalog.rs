//! Item catalog
//!
//! Immutable lookup from item-type id to its definition.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::item::{ItemCategory, ItemDefinition};
use crate::error::ConfigError;

/// All item definitions keyed by item-type id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCatalog {
    definitions: BTreeMap<String, ItemDefinition>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a definition
    pub fn insert(&mut self, item_type: impl Into<String>, definition: ItemDefinition) {
        self.definitions.insert(item_type.into(), definition);
    }

    pub fn get(&self, item_type: &str) -> Option<&ItemDefinition> {
        self.definitions.get(item_type)
    }

    pub fn contains(&self, item_type: &str) -> bool {
        self.definitions.contains_key(item_type)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions in id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ItemDefinition)> {
        self.definitions.iter().map(|(id, def)| (id.as_str(), def))
    }

    /// Display name, falling back to the raw id for unknown types
    pub fn display_name<'a>(&'a self, item_type: &'a str) -> &'a str {
        self.get(item_type).map(|d| d.name.as_str()).unwrap_or(item_type)
    }

    /// Stack limit, 1 for unknown types
    pub fn max_stack(&self, item_type: &str) -> u32 {
        self.get(item_type).map(|d| d.max_stack).unwrap_or(1)
    }

    /// Equippable item types in id order
    pub fn equippable_types(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, def)| def.is_equippable())
            .map(|(id, _)| id)
            .collect()
    }

    /// Item types of one category in id order
    pub fn types_in(&self, category: ItemCategory) -> Vec<&str> {
        self.iter()
            .filter(|(_, def)| def.category == category)
            .map(|(id, _)| id)
            .collect()
    }

    /// Check per-item invariants and salvage references
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (id, def) in self.iter() {
            if def.max_stack == 0 {
                return Err(ConfigError::item(id, "max_stack must be at least 1"));
            }
            if def.category.is_equipment() {
                if def.equip_slot.is_none() {
                    return Err(ConfigError::item(id, "equipment needs an equip slot"));
                }
                if def.max_stack != 1 {
                    return Err(ConfigError::item(id, "equipment cannot stack"));
                }
            } else if def.equip_slot.is_some() {
                return Err(ConfigError::item(
                    id,
                    format!("{} items cannot have an equip slot", def.category.name()),
                ));
            }
            if def.category == ItemCategory::SetPiece && def.set_id.is_none() {
                return Err(ConfigError::item(id, "set pieces need a set id"));
            }
            if let Some(stat) = def.stats.invalid_field() {
                return Err(ConfigError::item(
                    id,
                    format!("stat `{}` must be finite and non-negative", stat),
                ));
            }
            for salvage in &def.salvage {
                if salvage.amount == 0 {
                    return Err(ConfigError::item(id, "salvage amounts must be positive"));
                }
                if !self.contains(&salvage.item_type) {
                    return Err(ConfigError::item(
                        id,
                        format!("salvage refers to unknown item `{}`", salvage.item_type),
                    ));
                }
            }
        }
        Ok(())
    }
}
