//! Item system

pub mod rarity;
pub mod item;
pub mod catalog;
pub mod sets;
pub mod loot;
pub mod inventory;
pub mod equipment;

pub use rarity::{Rarity, RarityTable, RarityTier};
pub use item::{EquipSlot, ItemCategory, ItemDefinition, ItemFactory, ItemInstance, ItemUid, SalvageYield, StatBlock};
pub use catalog::ItemCatalog;
pub use sets::{ActiveSetBonus, ItemSet, SetBonusTier, SetRegistry};
pub use loot::{
    GuaranteedDrop, LootResult, LootRoll, LootRoller, LootTable, LootTableEntry, LootTables, LuckSource,
    RarityRule, BOSS_LUCK_BONUS,
};
pub use inventory::{ConsumedPart, Delivery, Inventory, ItemFilter, SortMode, UsedItem};
pub use equipment::Equipment;
