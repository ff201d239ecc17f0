//! Game data
//!
//! Immutable economy content loaded once (from RON files or the built-in
//! reference set) and shared between components through an `Arc`.

pub mod config;
pub mod items;
pub mod sets;
pub mod recipes;
pub mod loot_tables;
pub mod loader;

pub use config::EconomyConfig;
pub use loader::{export_default_data, load_from_dir};

use crate::crafting::RecipeBook;
use crate::error::ConfigError;
use crate::items::{ItemCatalog, LootRoller, LootTables, SetRegistry};

/// All static economy content
#[derive(Debug, Clone, PartialEq)]
pub struct GameData {
    pub config: EconomyConfig,
    pub items: ItemCatalog,
    pub sets: SetRegistry,
    pub recipes: RecipeBook,
    pub loot_tables: LootTables,
}

impl GameData {
    /// Assemble and validate game data
    pub fn new(
        config: EconomyConfig,
        items: ItemCatalog,
        sets: SetRegistry,
        recipes: RecipeBook,
        loot_tables: LootTables,
    ) -> Result<Self, ConfigError> {
        let data = Self { config, items, sets, recipes, loot_tables };
        data.validate()?;
        Ok(data)
    }

    /// Check every table and the references between them
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        self.items.validate()?;
        self.sets.validate()?;
        self.recipes.validate(&self.items)?;
        self.loot_tables.validate(&self.items)?;

        for (item_type, def) in self.items.iter() {
            if let Some(set_id) = &def.set_id {
                if !self.sets.contains(set_id) {
                    return Err(ConfigError::item(item_type, format!("unknown set `{}`", set_id)));
                }
            }
            for recipe_id in &def.unlocks_recipes {
                if !self.recipes.contains(recipe_id) {
                    return Err(ConfigError::item(
                        item_type,
                        format!("unlocks unknown recipe `{}`", recipe_id),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Loot roller over this data's rarity table and catalog
    pub fn loot_roller(&self) -> LootRoller<'_> {
        LootRoller::new(&self.config.rarity, &self.items)
    }
}

impl Default for GameData {
    /// The built-in reference data
    fn default() -> Self {
        Self {
            config: EconomyConfig::default(),
            items: items::default_items(),
            sets: sets::default_sets(),
            recipes: recipes::default_recipes(),
            loot_tables: loot_tables::default_loot_tables(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ItemCategory, ItemDefinition};

    #[test]
    fn test_reference_data_is_valid() {
        let data = GameData::default();
        assert!(data.validate().is_ok(), "{:?}", data.validate().err());
        assert_eq!(data.config.inventory_capacity(), 30);
        assert!(data.loot_tables.get("oni_boss").unwrap().guarantee_epic_on_boss);
    }

    #[test]
    fn test_unknown_set_reference_rejected() {
        let mut data = GameData::default();
        let mut orphan = ItemDefinition::new("Orphan", ItemCategory::SetPiece);
        orphan.equip_slot = Some(crate::items::EquipSlot::Armor);
        orphan.set_id = Some("ghost".to_string());
        data.items.insert("orphan", orphan);
        assert!(matches!(data.validate(), Err(ConfigError::Item { .. })));
    }

    #[test]
    fn test_unknown_unlock_rejected() {
        let GameData { config, mut items, sets, recipes, loot_tables } = GameData::default();
        let mut blueprint = ItemDefinition::new("Mystery Blueprint", ItemCategory::Consumable);
        blueprint.unlocks_recipes = vec!["mystery".to_string()];
        items.insert("mystery_blueprint", blueprint);
        assert!(GameData::new(config, items, sets, recipes, loot_tables).is_err());
    }
}
