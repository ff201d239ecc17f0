//! Economy tuning
//!
//! Inventory size, rarity weights and crafting rates in one RON-loadable struct.

use serde::{Deserialize, Serialize};

use crate::crafting::CraftingConfig;
use crate::error::ConfigError;
use crate::items::RarityTable;

/// Global economy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Inventory grid rows
    pub inventory_rows: usize,
    /// Inventory grid columns
    pub inventory_columns: usize,
    pub rarity: RarityTable,
    pub crafting: CraftingConfig,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            inventory_rows: 5,
            inventory_columns: 6,
            rarity: RarityTable::default(),
            crafting: CraftingConfig::default(),
        }
    }
}

impl EconomyConfig {
    /// Total inventory slots
    pub fn inventory_capacity(&self) -> usize {
        self.inventory_rows.saturating_mul(self.inventory_columns)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inventory_capacity() == 0 {
            return Err(ConfigError::Economy("inventory needs at least one slot".into()));
        }
        self.rarity.validate()?;
        self.crafting.validate()
    }
}
