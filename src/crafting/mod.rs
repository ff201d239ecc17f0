//! Crafting
//!
//! Recipes and the resolver that turns ingredients into items over time.

pub mod recipe;
pub mod resolver;

pub use recipe::{CraftingConfig, CraftingRecipe, Ingredient, RecipeBook, ResultRarity};
pub use resolver::{
    inherit_rarity, refund_amount, ConsumedIngredient, CraftContext, CraftStart, CraftState,
    CraftedItem, CraftingProcess, CraftingResolver,
};
