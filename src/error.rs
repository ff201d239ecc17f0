//! Error types
//!
//! Validation, capacity and misuse failures are plain values returned to the
//! caller. None of them is fatal and none leaves partial state behind.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::items::{EquipSlot, ItemInstance, ItemUid, Rarity};

/// Configuration problems found while loading game data
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rarity table: {0}")]
    Rarity(String),
    #[error("item `{item}`: {reason}")]
    Item { item: String, reason: String },
    #[error("set `{set}`: {reason}")]
    Set { set: String, reason: String },
    #[error("recipe `{recipe}`: {reason}")]
    Recipe { recipe: String, reason: String },
    #[error("loot table `{table}`: {reason}")]
    LootTable { table: String, reason: String },
    #[error("economy config: {0}")]
    Economy(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("failed to serialize game data: {0}")]
    Serialize(#[from] ron::Error),
}

impl ConfigError {
    pub(crate) fn item(item: &str, reason: impl Into<String>) -> Self {
        ConfigError::Item { item: item.to_string(), reason: reason.into() }
    }

    pub(crate) fn set(set: &str, reason: impl Into<String>) -> Self {
        ConfigError::Set { set: set.to_string(), reason: reason.into() }
    }

    pub(crate) fn recipe(recipe: &str, reason: impl Into<String>) -> Self {
        ConfigError::Recipe { recipe: recipe.to_string(), reason: reason.into() }
    }

    pub(crate) fn loot_table(table: &str, reason: impl Into<String>) -> Self {
        ConfigError::LootTable { table: table.to_string(), reason: reason.into() }
    }
}

/// Inventory store failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("inventory full ({capacity} slots)")]
    Full { capacity: usize },
    #[error("unknown item type `{0}`")]
    UnknownItemType(String),
    #[error("stack of {count} `{item_type}` exceeds the limit of {max_stack}")]
    OversizedStack { item_type: String, count: u32, max_stack: u32 },
    #[error("item {0} is not in the inventory")]
    NotFound(ItemUid),
    #[error("`{0}` cannot be used")]
    NotConsumable(String),
    #[error("`{0}` yields nothing when dismantled")]
    NotSalvageable(String),
}

/// Equipment board failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquipError {
    #[error("unknown item type `{0}`")]
    UnknownItemType(String),
    #[error("`{0}` is not equipment")]
    NotEquippable(String),
    #[error("`{item_type}` does not fit the {slot:?} slot")]
    WrongSlot { item_type: String, slot: EquipSlot },
    #[error("item {0} is not in the inventory")]
    NotFound(ItemUid),
    #[error("nothing equipped in the {0:?} slot")]
    SlotEmpty(EquipSlot),
    #[error("inventory has no room for the unequipped item")]
    InventoryFull,
}

/// Crafting validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CraftError {
    #[error("unknown recipe `{0}`")]
    UnknownRecipe(String),
    #[error("recipe `{0}` is locked")]
    Locked(String),
    #[error("recipe needs level {required}, crafter is level {current}")]
    LevelTooLow { required: u32, current: u32 },
    #[error("need {required} `{item_type}` at {min_rarity:?} or better, have {available}")]
    InsufficientIngredient {
        item_type: String,
        min_rarity: Rarity,
        required: u32,
        available: u32,
    },
    #[error("need {required} coins, have {available}")]
    InsufficientCoins { required: u64, available: u64 },
    #[error("already crafting `{0}`")]
    AlreadyCrafting(String),
    #[error("no craft in progress")]
    NotCrafting,
}

/// Save payload failures
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("invalid save data: {0}")]
    InvalidData(String),
}

/// A failed operation that took an item by value hands it back here, so the
/// caller can decide what to do with it (usually drop it in the world).
#[derive(Debug)]
pub struct Rejected<E> {
    pub item: ItemInstance,
    pub reason: E,
}

impl<E> Rejected<E> {
    pub fn new(item: ItemInstance, reason: E) -> Self {
        Self { item, reason }
    }

    pub fn into_item(self) -> ItemInstance {
        self.item
    }
}

impl<E: fmt::Display> fmt::Display for Rejected<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (item {})", self.reason, self.item.unique_id())
    }
}

impl<E: std::error::Error + 'static> std::error::Error for Rejected<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}
