//! Built-in loot tables

use crate::items::{GuaranteedDrop, LootTable, LootTableEntry, LootTables, Rarity, RarityRule};

fn entry(item_type: &str, drop_chance: f32, min_amount: u32, max_amount: u32) -> LootTableEntry {
    let mut entry = LootTableEntry::new(item_type, drop_chance);
    entry.min_amount = min_amount;
    entry.max_amount = max_amount;
    entry
}

/// Create the default loot tables (hardcoded fallback)
pub fn default_loot_tables() -> LootTables {
    let mut tables = LootTables::new();

    // Common trash mob
    tables.insert(
        "scrap_drone",
        LootTable {
            entries: vec![
                entry("scrap_metal", 80.0, 1, 4),
                entry("circuit_board", 35.0, 1, 2),
                entry("neon_crystal", 20.0, 1, 2),
                entry("energy_drink", 10.0, 1, 1),
                entry("chrome_ring", 3.0, 1, 1),
            ],
            min_drops: 1,
            max_drops: 3,
            coin_drop_chance: 60.0,
            min_coins: 1,
            max_coins: 8,
            ..LootTable::default()
        },
    );

    tables.insert(
        "supply_cache",
        LootTable {
            entries: vec![
                entry("repair_kit", 50.0, 1, 2),
                entry("plasma_cell", 40.0, 1, 3),
                entry("kevlar_vest", 15.0, 1, 1),
                entry("pulse_amplifier", 10.0, 1, 1),
                entry("lucky_charm", 5.0, 1, 1),
            ],
            guaranteed: vec![GuaranteedDrop {
                item_type: "scrap_metal".to_string(),
                min_rarity: Rarity::Common,
                amount: 5,
            }],
            min_drops: 2,
            max_drops: 4,
            coin_drop_chance: 100.0,
            min_coins: 10,
            max_coins: 30,
            ..LootTable::default()
        },
    );

    let mut katana = entry("samurai_katana_mod", 25.0, 1, 1);
    katana.rarity = RarityRule::Forced(Rarity::Epic);
    let mut blueprint = entry("blueprint_plasma_edge", 30.0, 1, 1);
    blueprint.rarity = RarityRule::Forced(Rarity::Rare);
    let mut visor = entry("samurai_visor", 20.0, 1, 1);
    visor.luck_multiplier = 2.0;
    tables.insert(
        "oni_boss",
        LootTable {
            entries: vec![
                katana,
                visor,
                entry("samurai_plating", 20.0, 1, 1),
                blueprint,
                entry("plasma_cell", 60.0, 2, 5),
            ],
            guaranteed: vec![GuaranteedDrop {
                item_type: "oni_core".to_string(),
                min_rarity: Rarity::Rare,
                amount: 1,
            }],
            min_drops: 2,
            max_drops: 4,
            guarantee_epic_on_boss: true,
            coin_drop_chance: 100.0,
            min_coins: 100,
            max_coins: 250,
        },
    );

    tables
}
