//! Crafting recipes
//!
//! Recipe definitions, the recipe book, and crafting tuning values.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::items::{ItemCatalog, Rarity};

fn one() -> u32 {
    1
}

/// An input of a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub item_type: String,
    pub amount: u32,
    /// Lowest rarity that counts toward this ingredient
    #[serde(default)]
    pub min_rarity: Rarity,
}

impl Ingredient {
    pub fn new(item_type: impl Into<String>, amount: u32) -> Self {
        Self { item_type: item_type.into(), amount, min_rarity: Rarity::Common }
    }

    pub fn with_min_rarity(mut self, rarity: Rarity) -> Self {
        self.min_rarity = rarity;
        self
    }
}

/// How the crafted item's rarity is decided
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultRarity {
    Fixed(Rarity),
    /// Weighted roll with the crafter's bonus luck
    #[default]
    Random,
    /// Rounded average of the consumed ingredients' rarities
    Inherit,
}

/// A crafting recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftingRecipe {
    /// Human-readable name
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Items consumed by this recipe
    pub ingredients: Vec<Ingredient>,
    /// Item type produced
    pub result_item: String,
    #[serde(default = "one")]
    pub result_amount: u32,
    #[serde(default)]
    pub result_rarity: ResultRarity,
    /// Crafting time in seconds before the time multiplier; 0 = instant
    #[serde(default)]
    pub crafting_cost: f32,
    /// Coins charged when the craft starts
    #[serde(default)]
    pub currency_cost: u64,
    /// Minimum crafter level
    #[serde(default)]
    pub required_level: u32,
    #[serde(default)]
    pub unlocked_by_default: bool,
}

impl CraftingRecipe {
    /// Instant recipe producing one Common unit, unlocked from the start
    pub fn new(name: impl Into<String>, ingredients: Vec<Ingredient>, result_item: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            ingredients,
            result_item: result_item.into(),
            result_amount: 1,
            result_rarity: ResultRarity::Fixed(Rarity::Common),
            crafting_cost: 0.0,
            currency_cost: 0,
            required_level: 0,
            unlocked_by_default: true,
        }
    }

    /// Sets the crafting time.
    pub fn with_time(mut self, seconds: f32) -> Self {
        self.crafting_cost = seconds;
        self
    }

    /// Sets the coin price.
    pub fn with_price(mut self, coins: u64) -> Self {
        self.currency_cost = coins;
        self
    }

    pub fn with_result(mut self, amount: u32, rarity: ResultRarity) -> Self {
        self.result_amount = amount;
        self.result_rarity = rarity;
        self
    }

    /// Sets the required level.
    pub fn with_level(mut self, level: u32) -> Self {
        self.required_level = level;
        self
    }

    pub fn locked(mut self) -> Self {
        self.unlocked_by_default = false;
        self
    }

    pub fn is_instant(&self) -> bool {
        self.crafting_cost <= 0.0
    }
}

/// Tuning values for crafting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftingConfig {
    /// Seconds of real time per unit of crafting cost
    pub time_multiplier: f32,
    /// Share of each ingredient line returned on cancel (0..=1)
    pub refund_rate: f32,
    /// Chance for an inherited rarity to step up one tier (0..=1)
    pub inherit_upgrade_chance: f32,
    /// Level a new crafter starts at
    pub starting_level: u32,
}

impl Default for CraftingConfig {
    fn default() -> Self {
        Self {
            time_multiplier: 1.0,
            refund_rate: 0.5,
            inherit_upgrade_chance: 0.1,
            starting_level: 1,
        }
    }
}

impl CraftingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.time_multiplier.is_finite() || self.time_multiplier < 0.0 {
            return Err(ConfigError::Economy("time_multiplier must be finite and non-negative".into()));
        }
        if !(0.0..=1.0).contains(&self.refund_rate) {
            return Err(ConfigError::Economy("refund_rate must be within 0..=1".into()));
        }
        if !(0.0..=1.0).contains(&self.inherit_upgrade_chance) {
            return Err(ConfigError::Economy("inherit_upgrade_chance must be within 0..=1".into()));
        }
        Ok(())
    }
}

/// All recipes keyed by recipe id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeBook {
    recipes: BTreeMap<String, CraftingRecipe>,
}

impl RecipeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, recipe: CraftingRecipe) {
        self.recipes.insert(id.into(), recipe);
    }

    pub fn get(&self, id: &str) -> Option<&CraftingRecipe> {
        self.recipes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.recipes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CraftingRecipe)> {
        self.recipes.iter().map(|(id, recipe)| (id.as_str(), recipe))
    }

    /// Ids of the recipes a new crafter knows
    pub fn default_unlocked(&self) -> BTreeSet<String> {
        self.iter()
            .filter(|(_, r)| r.unlocked_by_default)
            .map(|(id, _)| id.to_string())
            .collect()
    }

    /// Recipes must name known items with positive amounts
    pub fn validate(&self, catalog: &ItemCatalog) -> Result<(), ConfigError> {
        for (id, recipe) in self.iter() {
            if !catalog.contains(&recipe.result_item) {
                return Err(ConfigError::recipe(
                    id,
                    format!("unknown result item `{}`", recipe.result_item),
                ));
            }
            if recipe.result_amount == 0 {
                return Err(ConfigError::recipe(id, "result amount must be positive"));
            }
            if !recipe.crafting_cost.is_finite() {
                return Err(ConfigError::recipe(id, "crafting cost must be finite"));
            }
            let mut seen = BTreeSet::new();
            for ingredient in &recipe.ingredients {
                if !catalog.contains(&ingredient.item_type) {
                    return Err(ConfigError::recipe(
                        id,
                        format!("unknown ingredient `{}`", ingredient.item_type),
                    ));
                }
                if ingredient.amount == 0 {
                    return Err(ConfigError::recipe(
                        id,
                        format!("ingredient `{}` needs a positive amount", ingredient.item_type),
                    ));
                }
                if !seen.insert(ingredient.item_type.as_str()) {
                    return Err(ConfigError::recipe(
                        id,
                        format!("ingredient `{}` is listed twice", ingredient.item_type),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ItemCategory, ItemDefinition};

    fn catalog() -> ItemCatalog {
        let mut catalog = ItemCatalog::new();
        let mut scrap = ItemDefinition::new("Scrap Metal", ItemCategory::Material);
        scrap.max_stack = 99;
        catalog.insert("scrap_metal", scrap);
        catalog.insert("repair_kit", ItemDefinition::new("Repair Kit", ItemCategory::Consumable));
        catalog
    }

    #[test]
    fn test_builder_defaults() {
        let recipe = CraftingRecipe::new("Repair Kit", vec![Ingredient::new("scrap_metal", 3)], "repair_kit")
            .with_time(2.0)
            .with_price(10)
            .locked();
        assert!(!recipe.is_instant());
        assert_eq!(recipe.currency_cost, 10);
        assert!(!recipe.unlocked_by_default);
    }

    #[test]
    fn test_validate_recipe_book() {
        let catalog = catalog();
        let mut book = RecipeBook::new();
        book.insert(
            "repair_kit",
            CraftingRecipe::new("Repair Kit", vec![Ingredient::new("scrap_metal", 3)], "repair_kit"),
        );
        assert!(book.validate(&catalog).is_ok());
        assert_eq!(book.default_unlocked().len(), 1);

        book.insert(
            "broken",
            CraftingRecipe::new("Broken", vec![Ingredient::new("scrap_metal", 0)], "repair_kit"),
        );
        assert!(matches!(book.validate(&catalog), Err(ConfigError::Recipe { .. })));
    }

    #[test]
    fn test_duplicate_ingredient_rejected() {
        let catalog = catalog();
        let mut book = RecipeBook::new();
        book.insert(
            "double",
            CraftingRecipe::new(
                "Double",
                vec![Ingredient::new("scrap_metal", 1), Ingredient::new("scrap_metal", 2)],
                "repair_kit",
            ),
        );
        assert!(book.validate(&catalog).is_err());
    }

    #[test]
    fn test_config_bounds() {
        assert!(CraftingConfig::default().validate().is_ok());
        let config = CraftingConfig { refund_rate: 1.5, ..CraftingConfig::default() };
        assert!(config.validate().is_err());
    }
}
