//! Built-in crafting recipes

use crate::crafting::{CraftingRecipe, Ingredient, RecipeBook, ResultRarity};
use crate::items::Rarity;

/// Create the default recipe book (hardcoded fallback)
pub fn default_recipes() -> RecipeBook {
    let mut book = RecipeBook::new();

    book.insert(
        "repair_kit",
        CraftingRecipe::new(
            "Repair Kit",
            vec![Ingredient::new("scrap_metal", 3), Ingredient::new("circuit_board", 1)],
            "repair_kit",
        )
        .with_time(2.0),
    );

    book.insert(
        "energy_drink",
        CraftingRecipe::new("Energy Drink", vec![Ingredient::new("neon_crystal", 2)], "energy_drink")
            .with_result(2, ResultRarity::Fixed(Rarity::Common)),
    );

    // Ring quality follows the crystals that went in
    book.insert(
        "chrome_ring",
        CraftingRecipe::new(
            "Chrome Ring",
            vec![Ingredient::new("scrap_metal", 3), Ingredient::new("neon_crystal", 3)],
            "chrome_ring",
        )
        .with_time(4.0)
        .with_price(25)
        .with_result(1, ResultRarity::Inherit),
    );

    book.insert(
        "kevlar_vest",
        CraftingRecipe::new(
            "Kevlar Vest",
            vec![Ingredient::new("scrap_metal", 8), Ingredient::new("circuit_board", 1)],
            "kevlar_vest",
        )
        .with_time(3.0)
        .with_price(15)
        .with_result(1, ResultRarity::Random),
    );

    book.insert(
        "pulse_amplifier",
        CraftingRecipe::new(
            "Pulse Amplifier",
            vec![
                Ingredient::new("circuit_board", 2),
                Ingredient::new("plasma_cell", 2).with_min_rarity(Rarity::Uncommon),
            ],
            "pulse_amplifier",
        )
        .with_time(5.0)
        .with_price(40)
        .with_level(2)
        .with_result(1, ResultRarity::Random),
    );

    book.insert(
        "plasma_edge",
        CraftingRecipe::new(
            "Plasma Edge",
            vec![
                Ingredient::new("plasma_cell", 4),
                Ingredient::new("neon_crystal", 2).with_min_rarity(Rarity::Rare),
            ],
            "plasma_edge",
        )
        .with_time(8.0)
        .with_price(120)
        .with_level(5)
        .with_result(1, ResultRarity::Random)
        .locked(),
    );

    book
}
