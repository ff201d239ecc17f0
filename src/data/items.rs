//! Built-in item catalog
//!
//! Reference item definitions used when no `items.ron` is present.

use crate::items::{EquipSlot, ItemCatalog, ItemCategory, ItemDefinition, SalvageYield, StatBlock};

fn material(name: &str, description: &str, max_stack: u32, sell: u32) -> ItemDefinition {
    let mut def = ItemDefinition::new(name, ItemCategory::Material);
    def.description = description.to_string();
    def.max_stack = max_stack;
    def.base_sell_value = sell;
    def
}

fn consumable(name: &str, description: &str, max_stack: u32, sell: u32) -> ItemDefinition {
    let mut def = ItemDefinition::new(name, ItemCategory::Consumable);
    def.description = description.to_string();
    def.max_stack = max_stack;
    def.base_sell_value = sell;
    def
}

fn gear(name: &str, description: &str, slot: EquipSlot, stats: StatBlock, sell: u32) -> ItemDefinition {
    let mut def = ItemDefinition::new(name, ItemCategory::Equipment);
    def.description = description.to_string();
    def.equip_slot = Some(slot);
    def.stats = stats;
    def.base_sell_value = sell;
    def
}

fn set_piece(name: &str, description: &str, slot: EquipSlot, set_id: &str, stats: StatBlock, sell: u32) -> ItemDefinition {
    let mut def = gear(name, description, slot, stats, sell);
    def.category = ItemCategory::SetPiece;
    def.set_id = Some(set_id.to_string());
    def
}

fn salvage(item_type: &str, amount: u32) -> SalvageYield {
    SalvageYield { item_type: item_type.to_string(), amount }
}

/// Create the default item catalog (hardcoded fallback)
pub fn default_items() -> ItemCatalog {
    let mut catalog = ItemCatalog::new();

    // === MATERIALS ===
    catalog.insert(
        "scrap_metal",
        material("Scrap Metal", "Bent plates pulled from wrecked drones.", 99, 1),
    );
    catalog.insert(
        "neon_crystal",
        material("Neon Crystal", "A glowing shard cut from an old sign.", 50, 4),
    );
    catalog.insert(
        "plasma_cell",
        material("Plasma Cell", "Volatile power cell. Handle with care.", 20, 6),
    );
    catalog.insert(
        "circuit_board",
        material("Circuit Board", "Salvaged logic board, mostly intact.", 30, 3),
    );

    // === CONSUMABLES ===
    catalog.insert(
        "repair_kit",
        consumable("Repair Kit", "Patches armor plating in the field.", 10, 8),
    );
    catalog.insert(
        "energy_drink",
        consumable("Energy Drink", "Tastes like battery acid. Works.", 20, 2),
    );
    let mut blueprint = consumable(
        "Plasma Edge Blueprint",
        "Schematics for a plasma blade mod. Study it to learn the recipe.",
        1,
        50,
    );
    blueprint.unlocks_recipes = vec!["plasma_edge".to_string()];
    catalog.insert("blueprint_plasma_edge", blueprint);

    // === EQUIPMENT ===
    let mut chrome_ring = gear(
        "Chrome Ring",
        "Polished band etched with a lucky circuit.",
        EquipSlot::Accessory1,
        StatBlock { crit: 2.0, drop_rate: 5.0, ..StatBlock::ZERO },
        20,
    );
    chrome_ring.salvage = vec![salvage("scrap_metal", 2)];
    catalog.insert("chrome_ring", chrome_ring);

    let mut kevlar_vest = gear(
        "Kevlar Vest",
        "Layered fibre plates. Stops most street rounds.",
        EquipSlot::Armor,
        StatBlock { defense: 8.0, ..StatBlock::ZERO },
        30,
    );
    kevlar_vest.salvage = vec![salvage("scrap_metal", 4)];
    catalog.insert("kevlar_vest", kevlar_vest);

    let mut pulse_amplifier = gear(
        "Pulse Amplifier",
        "Boosts weapon output at the cost of heat.",
        EquipSlot::WeaponMod1,
        StatBlock { damage: 6.0, speed: 2.0, ..StatBlock::ZERO },
        35,
    );
    pulse_amplifier.salvage = vec![salvage("circuit_board", 1), salvage("plasma_cell", 1)];
    catalog.insert("pulse_amplifier", pulse_amplifier);

    let mut plasma_edge = gear(
        "Plasma Edge",
        "Sheathes the blade in superheated plasma.",
        EquipSlot::WeaponMod1,
        StatBlock { damage: 14.0, crit: 3.0, ..StatBlock::ZERO },
        90,
    );
    plasma_edge.salvage = vec![salvage("plasma_cell", 2), salvage("neon_crystal", 1)];
    catalog.insert("plasma_edge", plasma_edge);

    catalog.insert(
        "lucky_charm",
        gear(
            "Lucky Charm",
            "A dice keychain. Somehow it helps.",
            EquipSlot::Accessory1,
            StatBlock { drop_rate: 10.0, ..StatBlock::ZERO },
            25,
        ),
    );

    // === NEON SAMURAI SET ===
    catalog.insert(
        "samurai_katana_mod",
        set_piece(
            "Samurai Katana Mod",
            "Monomolecular edge tuned for the Neon Samurai.",
            EquipSlot::WeaponMod1,
            "neon_samurai",
            StatBlock { damage: 10.0, ..StatBlock::ZERO },
            60,
        ),
    );
    catalog.insert(
        "samurai_visor",
        set_piece(
            "Samurai Visor",
            "Targeting visor with a crimson glow.",
            EquipSlot::Accessory1,
            "neon_samurai",
            StatBlock { crit: 4.0, ..StatBlock::ZERO },
            60,
        ),
    );
    catalog.insert(
        "samurai_plating",
        set_piece(
            "Samurai Plating",
            "Lacquered plates in the old style.",
            EquipSlot::Armor,
            "neon_samurai",
            StatBlock { defense: 10.0, ..StatBlock::ZERO },
            60,
        ),
    );

    // === SPECIAL ===
    let mut oni_core = ItemDefinition::new("Oni Core", ItemCategory::Special);
    oni_core.description = "Still humming. Collectors pay well for these.".to_string();
    oni_core.base_sell_value = 250;
    catalog.insert("oni_core", oni_core);

    catalog
}
