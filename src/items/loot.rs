//! Loot generation system
//!
//! Drop tables and the roller that turns a table plus bonus luck into item
//! results and coins.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::catalog::ItemCatalog;
use super::rarity::{Rarity, RarityTable};
use crate::error::ConfigError;

/// Extra luck applied to the rarity roll of a boss's guaranteed drop
pub const BOSS_LUCK_BONUS: f32 = 50.0;

/// Anything that contributes bonus luck to a roll
pub trait LuckSource {
    /// Bonus luck in percent (0 = base odds)
    fn bonus_luck_percent(&self) -> f32;
}

impl LuckSource for f32 {
    fn bonus_luck_percent(&self) -> f32 {
        *self
    }
}

/// How an entry decides the rarity of what it drops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RarityRule {
    #[default]
    Random,
    Forced(Rarity),
}

fn one() -> u32 {
    1
}

fn unit_multiplier() -> f32 {
    1.0
}

/// One weighted line of a drop table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootTableEntry {
    pub item_type: String,
    /// Chance in percent (0-100) before luck
    pub drop_chance: f32,
    #[serde(default = "one")]
    pub min_amount: u32,
    #[serde(default = "one")]
    pub max_amount: u32,
    #[serde(default)]
    pub rarity: RarityRule,
    /// Scales the bonus luck used for this entry's rarity roll
    #[serde(default = "unit_multiplier")]
    pub luck_multiplier: f32,
}

impl LootTableEntry {
    pub fn new(item_type: impl Into<String>, drop_chance: f32) -> Self {
        Self {
            item_type: item_type.into(),
            drop_chance,
            min_amount: 1,
            max_amount: 1,
            rarity: RarityRule::Random,
            luck_multiplier: 1.0,
        }
    }
}

/// A drop that always happens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuaranteedDrop {
    pub item_type: String,
    #[serde(default)]
    pub min_rarity: Rarity,
    #[serde(default = "one")]
    pub amount: u32,
}

/// A drop table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootTable {
    pub entries: Vec<LootTableEntry>,
    pub guaranteed: Vec<GuaranteedDrop>,
    /// Backfill target for the number of results
    pub min_drops: u32,
    /// Cap on weighted drops (0 = unlimited)
    pub max_drops: u32,
    /// Always drop one Epic-or-better item
    pub guarantee_epic_on_boss: bool,
    /// Chance in percent to drop coins
    pub coin_drop_chance: f32,
    pub min_coins: u32,
    pub max_coins: u32,
}

impl LootTable {
    /// Check chances, amounts and item references
    pub fn validate(&self, id: &str, catalog: &ItemCatalog) -> Result<(), ConfigError> {
        for entry in &self.entries {
            if !catalog.contains(&entry.item_type) {
                return Err(ConfigError::loot_table(
                    id,
                    format!("unknown item `{}`", entry.item_type),
                ));
            }
            if !(0.0..=100.0).contains(&entry.drop_chance) {
                return Err(ConfigError::loot_table(
                    id,
                    format!("drop chance {} of `{}` is outside 0..100", entry.drop_chance, entry.item_type),
                ));
            }
            if entry.min_amount == 0 || entry.min_amount > entry.max_amount {
                return Err(ConfigError::loot_table(
                    id,
                    format!(
                        "amount range {}..={} of `{}` is invalid",
                        entry.min_amount, entry.max_amount, entry.item_type
                    ),
                ));
            }
            if !entry.luck_multiplier.is_finite() {
                return Err(ConfigError::loot_table(id, "luck multiplier must be finite"));
            }
        }
        for drop in &self.guaranteed {
            if !catalog.contains(&drop.item_type) {
                return Err(ConfigError::loot_table(
                    id,
                    format!("unknown guaranteed item `{}`", drop.item_type),
                ));
            }
            if drop.amount == 0 {
                return Err(ConfigError::loot_table(id, "guaranteed amount must be positive"));
            }
        }
        if !(0.0..=100.0).contains(&self.coin_drop_chance) {
            return Err(ConfigError::loot_table(id, "coin drop chance is outside 0..100"));
        }
        if self.min_coins > self.max_coins {
            return Err(ConfigError::loot_table(id, "min_coins exceeds max_coins"));
        }
        Ok(())
    }
}

/// Named drop tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LootTables {
    tables: BTreeMap<String, LootTable>,
}

impl LootTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, table: LootTable) {
        self.tables.insert(id.into(), table);
    }

    pub fn get(&self, id: &str) -> Option<&LootTable> {
        self.tables.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LootTable)> {
        self.tables.iter().map(|(id, table)| (id.as_str(), table))
    }

    pub fn validate(&self, catalog: &ItemCatalog) -> Result<(), ConfigError> {
        self.tables.iter().try_for_each(|(id, table)| table.validate(id, catalog))
    }
}

/// A single rolled drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootResult {
    pub item_type: String,
    pub rarity: Rarity,
    pub amount: u32,
}

impl LootResult {
    pub fn new(item_type: impl Into<String>, rarity: Rarity, amount: u32) -> Self {
        Self { item_type: item_type.into(), rarity, amount }
    }
}

/// Everything one roll produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LootRoll {
    pub results: Vec<LootResult>,
    pub coins: u32,
}

impl LootRoll {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.coins == 0
    }

    /// Total item units across all results
    pub fn total_units(&self) -> u32 {
        self.results.iter().map(|r| r.amount).sum()
    }
}

/// Rolls drop tables against the rarity table and catalog
#[derive(Debug, Clone, Copy)]
pub struct LootRoller<'a> {
    rarities: &'a RarityTable,
    catalog: &'a ItemCatalog,
}

impl<'a> LootRoller<'a> {
    pub fn new(rarities: &'a RarityTable, catalog: &'a ItemCatalog) -> Self {
        Self { rarities, catalog }
    }

    /// Roll a table
    ///
    /// Guaranteed drops first, then the boss drop, then each entry in table
    /// order, then backfill up to `min_drops`, then coins.
    pub fn roll(&self, table: &LootTable, luck: &impl LuckSource, rng: &mut impl Rng) -> LootRoll {
        let bonus_luck = luck.bonus_luck_percent();
        let mut results = Vec::new();

        for drop in &table.guaranteed {
            let rarity = drop.min_rarity.max(self.rarities.roll(bonus_luck, rng));
            results.push(LootResult::new(drop.item_type.clone(), rarity, drop.amount));
        }

        if table.guarantee_epic_on_boss {
            if let Some(result) = self.roll_boss_drop(table, bonus_luck, rng) {
                results.push(result);
            }
        }

        let chance_scale = 1.0 + bonus_luck * 0.01;
        let mut weighted_drops = 0u32;
        for entry in &table.entries {
            if table.max_drops > 0 && weighted_drops >= table.max_drops {
                break;
            }
            let roll: f32 = rng.gen_range(0.0..100.0);
            if entry.drop_chance > 0.0 && roll <= entry.drop_chance * chance_scale {
                results.push(self.roll_entry(entry, bonus_luck, rng));
                weighted_drops += 1;
            }
        }

        while results.len() < table.min_drops as usize && !table.entries.is_empty() {
            let entry = &table.entries[rng.gen_range(0..table.entries.len())];
            results.push(self.roll_entry(entry, bonus_luck, rng));
        }

        let mut coins = 0;
        if table.coin_drop_chance > 0.0 {
            let roll: f32 = rng.gen_range(0.0..100.0);
            if roll <= table.coin_drop_chance {
                let low = table.min_coins.min(table.max_coins);
                let high = table.min_coins.max(table.max_coins);
                coins = rng.gen_range(low..=high);
            }
        }

        log::debug!(
            "Rolled {} drops and {} coins at {:.1}% bonus luck",
            results.len(),
            coins,
            bonus_luck
        );
        LootRoll { results, coins }
    }

    fn roll_entry(&self, entry: &LootTableEntry, bonus_luck: f32, rng: &mut impl Rng) -> LootResult {
        let low = entry.min_amount.min(entry.max_amount);
        let high = entry.min_amount.max(entry.max_amount);
        let amount = rng.gen_range(low..=high).max(1);
        let rarity = match entry.rarity {
            RarityRule::Forced(rarity) => rarity,
            RarityRule::Random => self.rarities.roll(bonus_luck * entry.luck_multiplier, rng),
        };
        LootResult::new(entry.item_type.clone(), rarity, amount)
    }

    /// Epic-or-better pick, preferring entries forced to Epic or above
    fn roll_boss_drop(&self, table: &LootTable, bonus_luck: f32, rng: &mut impl Rng) -> Option<LootResult> {
        if table.entries.is_empty() {
            let candidates = self.catalog.equippable_types();
            if candidates.is_empty() {
                log::warn!("Boss table has no entries and the catalog has no equipment");
                return None;
            }
            let item_type = candidates[rng.gen_range(0..candidates.len())];
            let rarity = self.boss_rarity(bonus_luck, rng);
            return Some(LootResult::new(item_type, rarity, 1));
        }

        let premium: Vec<&LootTableEntry> = table
            .entries
            .iter()
            .filter(|e| matches!(e.rarity, RarityRule::Forced(r) if r >= Rarity::Epic))
            .collect();
        let entry = if premium.is_empty() {
            &table.entries[rng.gen_range(0..table.entries.len())]
        } else {
            premium[rng.gen_range(0..premium.len())]
        };
        // A forced rarity only steers the pick; the drop itself is rolled
        let rarity = self.boss_rarity(bonus_luck, rng);
        let low = entry.min_amount.min(entry.max_amount);
        let high = entry.min_amount.max(entry.max_amount);
        let amount = rng.gen_range(low..=high).max(1);
        Some(LootResult::new(entry.item_type.clone(), rarity, amount))
    }

    fn boss_rarity(&self, bonus_luck: f32, rng: &mut impl Rng) -> Rarity {
        Rarity::Epic.max(self.rarities.roll(bonus_luck + BOSS_LUCK_BONUS, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::item::{EquipSlot, ItemCategory, ItemDefinition};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> ItemCatalog {
        let mut catalog = ItemCatalog::new();
        let mut scrap = ItemDefinition::new("Scrap Metal", ItemCategory::Material);
        scrap.max_stack = 99;
        catalog.insert("scrap_metal", scrap);
        let mut crystal = ItemDefinition::new("Neon Crystal", ItemCategory::Material);
        crystal.max_stack = 50;
        catalog.insert("neon_crystal", crystal);
        let mut ring = ItemDefinition::new("Chrome Ring", ItemCategory::Equipment);
        ring.equip_slot = Some(EquipSlot::Accessory1);
        catalog.insert("chrome_ring", ring);
        let mut vest = ItemDefinition::new("Kevlar Vest", ItemCategory::Equipment);
        vest.equip_slot = Some(EquipSlot::Armor);
        catalog.insert("kevlar_vest", vest);
        catalog
    }

    #[test]
    fn test_boss_table_without_entries_drops_one_epic() {
        let rarities = RarityTable::default();
        let catalog = catalog();
        let roller = LootRoller::new(&rarities, &catalog);
        let table = LootTable { guarantee_epic_on_boss: true, ..LootTable::default() };

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let roll = roller.roll(&table, &0.0f32, &mut rng);
            assert_eq!(roll.results.len(), 1);
            let drop = &roll.results[0];
            assert!(drop.rarity >= Rarity::Epic);
            assert_eq!(drop.amount, 1);
            assert!(catalog.get(&drop.item_type).unwrap().is_equippable());
        }
    }

    #[test]
    fn test_boss_prefers_premium_entries() {
        let rarities = RarityTable::default();
        let catalog = catalog();
        let roller = LootRoller::new(&rarities, &catalog);
        let mut premium = LootTableEntry::new("kevlar_vest", 0.0);
        premium.rarity = RarityRule::Forced(Rarity::Legendary);
        let table = LootTable {
            entries: vec![LootTableEntry::new("scrap_metal", 0.0), premium],
            guarantee_epic_on_boss: true,
            ..LootTable::default()
        };

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let roll = roller.roll(&table, &0.0f32, &mut rng);
            assert_eq!(roll.results.len(), 1);
            assert_eq!(roll.results[0].item_type, "kevlar_vest");
            assert!(roll.results[0].rarity >= Rarity::Epic);
        }
    }

    #[test]
    fn test_boss_rarity_is_rolled_even_for_forced_entries() {
        let rarities = RarityTable::default();
        let catalog = catalog();
        let roller = LootRoller::new(&rarities, &catalog);
        let mut premium = LootTableEntry::new("kevlar_vest", 0.0);
        premium.rarity = RarityRule::Forced(Rarity::Legendary);
        let table = LootTable {
            entries: vec![premium],
            guarantee_epic_on_boss: true,
            ..LootTable::default()
        };

        let rolls = 10_000;
        let mut rng = StdRng::seed_from_u64(21);
        let legendary = (0..rolls)
            .filter(|_| roller.roll(&table, &0.0f32, &mut rng).results[0].rarity == Rarity::Legendary)
            .count();
        let share = legendary as f64 / rolls as f64;
        let expected = rarities.probability(Rarity::Legendary, BOSS_LUCK_BONUS);
        assert!((share - expected).abs() < 0.01, "legendary share {} expected ~{}", share, expected);
    }

    #[test]
    fn test_guaranteed_drop_respects_floor() {
        let rarities = RarityTable::default();
        let catalog = catalog();
        let roller = LootRoller::new(&rarities, &catalog);
        let table = LootTable {
            guaranteed: vec![GuaranteedDrop {
                item_type: "neon_crystal".into(),
                min_rarity: Rarity::Rare,
                amount: 3,
            }],
            ..LootTable::default()
        };

        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let roll = roller.roll(&table, &0.0f32, &mut rng);
            assert_eq!(roll.results, vec![LootResult::new(
                "neon_crystal",
                roll.results[0].rarity,
                3
            )]);
            assert!(roll.results[0].rarity >= Rarity::Rare);
        }
    }

    #[test]
    fn test_max_drops_caps_weighted_drops() {
        let rarities = RarityTable::default();
        let catalog = catalog();
        let roller = LootRoller::new(&rarities, &catalog);
        let table = LootTable {
            entries: vec![
                LootTableEntry::new("scrap_metal", 100.0),
                LootTableEntry::new("neon_crystal", 100.0),
                LootTableEntry::new("chrome_ring", 100.0),
            ],
            max_drops: 2,
            ..LootTable::default()
        };

        let mut rng = StdRng::seed_from_u64(2);
        let roll = roller.roll(&table, &0.0f32, &mut rng);
        let types: Vec<&str> = roll.results.iter().map(|r| r.item_type.as_str()).collect();
        assert_eq!(types, vec!["scrap_metal", "neon_crystal"]);
    }

    #[test]
    fn test_backfill_reaches_min_drops() {
        let rarities = RarityTable::default();
        let catalog = catalog();
        let roller = LootRoller::new(&rarities, &catalog);
        let table = LootTable {
            entries: vec![LootTableEntry::new("scrap_metal", 0.0)],
            min_drops: 3,
            ..LootTable::default()
        };

        let mut rng = StdRng::seed_from_u64(8);
        let roll = roller.roll(&table, &0.0f32, &mut rng);
        assert_eq!(roll.results.len(), 3);
        assert!(roll.results.iter().all(|r| r.item_type == "scrap_metal"));
    }

    #[test]
    fn test_empty_table_cannot_backfill() {
        let rarities = RarityTable::default();
        let catalog = catalog();
        let roller = LootRoller::new(&rarities, &catalog);
        let table = LootTable { min_drops: 4, ..LootTable::default() };

        let mut rng = StdRng::seed_from_u64(1);
        let roll = roller.roll(&table, &0.0f32, &mut rng);
        assert!(roll.is_empty());
    }

    #[test]
    fn test_forced_rarity_and_amount_range() {
        let rarities = RarityTable::default();
        let catalog = catalog();
        let roller = LootRoller::new(&rarities, &catalog);
        let mut entry = LootTableEntry::new("scrap_metal", 100.0);
        entry.min_amount = 2;
        entry.max_amount = 5;
        entry.rarity = RarityRule::Forced(Rarity::Uncommon);
        let table = LootTable { entries: vec![entry], ..LootTable::default() };

        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let roll = roller.roll(&table, &0.0f32, &mut rng);
            let drop = &roll.results[0];
            assert_eq!(drop.rarity, Rarity::Uncommon);
            assert!((2..=5).contains(&drop.amount));
        }
    }

    #[test]
    fn test_coins_need_positive_chance() {
        let rarities = RarityTable::default();
        let catalog = catalog();
        let roller = LootRoller::new(&rarities, &catalog);
        let mut rng = StdRng::seed_from_u64(6);

        let never = LootTable { coin_drop_chance: 0.0, min_coins: 5, max_coins: 9, ..LootTable::default() };
        assert_eq!(roller.roll(&never, &0.0f32, &mut rng).coins, 0);

        let always = LootTable { coin_drop_chance: 100.0, min_coins: 5, max_coins: 9, ..LootTable::default() };
        for _ in 0..50 {
            let coins = roller.roll(&always, &0.0f32, &mut rng).coins;
            assert!((5..=9).contains(&coins));
        }
    }

    #[test]
    fn test_validate_catches_bad_entries() {
        let catalog = catalog();
        let mut entry = LootTableEntry::new("scrap_metal", 150.0);
        let mut table = LootTable { entries: vec![entry.clone()], ..LootTable::default() };
        assert!(table.validate("t", &catalog).is_err());

        entry.drop_chance = 50.0;
        entry.min_amount = 4;
        entry.max_amount = 2;
        table.entries = vec![entry];
        assert!(table.validate("t", &catalog).is_err());

        table.entries = vec![LootTableEntry::new("unobtainium", 10.0)];
        assert!(matches!(table.validate("t", &catalog), Err(ConfigError::LootTable { .. })));
    }
}
