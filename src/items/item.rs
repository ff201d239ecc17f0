//! Item definitions
//!
//! Static per-type definitions, stat blocks, and the runtime item instance
//! that moves between the inventory and the equipment board.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use super::rarity::Rarity;

/// Main item categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Consumable,
    Equipment,
    Material,
    SetPiece,
    Special,
}

impl ItemCategory {
    /// Get sort value for grouping (lower = appears first)
    /// Wearables come before consumables and crafting stock
    pub fn sort_value(&self) -> u8 {
        match self {
            ItemCategory::Equipment => 0,
            ItemCategory::SetPiece => 1,
            ItemCategory::Consumable => 2,
            ItemCategory::Material => 3,
            ItemCategory::Special => 4,
        }
    }

    /// Check if items of this category can occupy an equipment slot
    pub fn is_equipment(&self) -> bool {
        matches!(self, ItemCategory::Equipment | ItemCategory::SetPiece)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ItemCategory::Consumable => "Consumable",
            ItemCategory::Equipment => "Equipment",
            ItemCategory::Material => "Material",
            ItemCategory::SetPiece => "Set Piece",
            ItemCategory::Special => "Special",
        }
    }
}

/// Equipment slot for wearable items
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    WeaponMod1,
    WeaponMod2,
    Accessory1,
    Accessory2,
    Armor,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 5] = [
        EquipSlot::WeaponMod1,
        EquipSlot::WeaponMod2,
        EquipSlot::Accessory1,
        EquipSlot::Accessory2,
        EquipSlot::Armor,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EquipSlot::WeaponMod1 => "Weapon Mod I",
            EquipSlot::WeaponMod2 => "Weapon Mod II",
            EquipSlot::Accessory1 => "Accessory I",
            EquipSlot::Accessory2 => "Accessory II",
            EquipSlot::Armor => "Armor",
        }
    }

    /// The other half of a paired slot (weapon mods, accessories)
    pub fn sibling(&self) -> Option<EquipSlot> {
        match self {
            EquipSlot::WeaponMod1 => Some(EquipSlot::WeaponMod2),
            EquipSlot::WeaponMod2 => Some(EquipSlot::WeaponMod1),
            EquipSlot::Accessory1 => Some(EquipSlot::Accessory2),
            EquipSlot::Accessory2 => Some(EquipSlot::Accessory1),
            EquipSlot::Armor => None,
        }
    }

    /// Whether an item authored for `self` may sit in `slot`
    pub fn accepts(&self, slot: EquipSlot) -> bool {
        *self == slot || self.sibling() == Some(slot)
    }
}

/// Aggregatable stat values
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBlock {
    pub damage: f32,
    pub speed: f32,
    pub defense: f32,
    pub crit: f32,
    /// Drop-rate bonus in percent; feeds bonus luck
    pub drop_rate: f32,
}

impl StatBlock {
    pub const ZERO: StatBlock = StatBlock {
        damage: 0.0,
        speed: 0.0,
        defense: 0.0,
        crit: 0.0,
        drop_rate: 0.0,
    };

    /// Every stat multiplied by `factor`
    pub fn scaled(&self, factor: f32) -> StatBlock {
        StatBlock {
            damage: self.damage * factor,
            speed: self.speed * factor,
            defense: self.defense * factor,
            crit: self.crit * factor,
            drop_rate: self.drop_rate * factor,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == StatBlock::ZERO
    }

    /// Named values, for validation and display
    pub fn fields(&self) -> [(&'static str, f32); 5] {
        [
            ("damage", self.damage),
            ("speed", self.speed),
            ("defense", self.defense),
            ("crit", self.crit),
            ("drop_rate", self.drop_rate),
        ]
    }

    /// First stat that is negative or not finite
    pub fn invalid_field(&self) -> Option<&'static str> {
        self.fields()
            .iter()
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
            .map(|(name, _)| *name)
    }
}

impl Add for StatBlock {
    type Output = StatBlock;

    fn add(self, rhs: StatBlock) -> StatBlock {
        StatBlock {
            damage: self.damage + rhs.damage,
            speed: self.speed + rhs.speed,
            defense: self.defense + rhs.defense,
            crit: self.crit + rhs.crit,
            drop_rate: self.drop_rate + rhs.drop_rate,
        }
    }
}

impl AddAssign for StatBlock {
    fn add_assign(&mut self, rhs: StatBlock) {
        *self = *self + rhs;
    }
}

/// Items granted by dismantling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalvageYield {
    pub item_type: String,
    pub amount: u32,
}

/// Static definition of an item type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    /// Display name
    pub name: String,
    /// Flavour text, searched by inventory queries
    #[serde(default)]
    pub description: String,
    pub category: ItemCategory,
    /// Largest stack one inventory slot may hold
    pub max_stack: u32,
    /// Slot this item is authored for (if equippable)
    #[serde(default)]
    pub equip_slot: Option<EquipSlot>,
    /// Set membership for set bonuses
    #[serde(default)]
    pub set_id: Option<String>,
    /// Stats before the rarity multiplier
    #[serde(default)]
    pub stats: StatBlock,
    /// Coin value of a single Common unit
    #[serde(default)]
    pub base_sell_value: u32,
    /// Materials recovered on dismantle
    #[serde(default)]
    pub salvage: Vec<SalvageYield>,
    /// Recipes unlocked when this item is used
    #[serde(default)]
    pub unlocks_recipes: Vec<String>,
}

impl ItemDefinition {
    /// Create a definition with single-unit stacks and no stats
    pub fn new(name: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category,
            max_stack: 1,
            equip_slot: None,
            set_id: None,
            stats: StatBlock::ZERO,
            base_sell_value: 0,
            salvage: Vec::new(),
            unlocks_recipes: Vec::new(),
        }
    }

    /// Equipment/SetPiece with an equip slot
    pub fn is_equippable(&self) -> bool {
        self.category.is_equipment() && self.equip_slot.is_some()
    }

    pub fn is_consumable(&self) -> bool {
        self.category == ItemCategory::Consumable
    }

    pub fn is_stackable(&self) -> bool {
        self.max_stack > 1
    }
}

/// Opaque, never-reused instance identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemUid(pub u64);

impl fmt::Display for ItemUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A concrete stack of items owned by exactly one container
///
/// Not `Clone`: an instance changes hands by move, so the same uid can never
/// sit in two containers at once.
#[derive(Debug, PartialEq)]
pub struct ItemInstance {
    unique_id: ItemUid,
    item_type: String,
    rarity: Rarity,
    stack_count: u32,
    slot_index: Option<usize>,
    equipped_slot: Option<EquipSlot>,
    created_at: u64,
}

impl ItemInstance {
    pub(crate) fn from_parts(
        unique_id: ItemUid,
        item_type: impl Into<String>,
        rarity: Rarity,
        stack_count: u32,
        created_at: u64,
    ) -> Self {
        Self {
            unique_id,
            item_type: item_type.into(),
            rarity,
            stack_count,
            slot_index: None,
            equipped_slot: None,
            created_at,
        }
    }

    pub fn unique_id(&self) -> ItemUid {
        self.unique_id
    }

    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    pub fn rarity(&self) -> Rarity {
        self.rarity
    }

    pub fn stack_count(&self) -> u32 {
        self.stack_count
    }

    /// Inventory slot, `None` while unassigned or equipped
    pub fn slot_index(&self) -> Option<usize> {
        self.slot_index
    }

    pub fn is_equipped(&self) -> bool {
        self.equipped_slot.is_some()
    }

    pub fn equipped_slot(&self) -> Option<EquipSlot> {
        self.equipped_slot
    }

    /// Milliseconds on the economy clock when the instance was minted
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Same type and rarity, so the two could share a stack
    pub fn stacks_with(&self, other: &ItemInstance) -> bool {
        self.item_type == other.item_type && self.rarity == other.rarity
    }

    /// Oldest-first ordering key
    pub(crate) fn age_key(&self) -> (u64, ItemUid) {
        (self.created_at, self.unique_id)
    }

    pub(crate) fn set_stack_count(&mut self, count: u32) {
        self.stack_count = count;
    }

    pub(crate) fn set_slot_index(&mut self, slot: Option<usize>) {
        self.slot_index = slot;
    }

    pub(crate) fn set_equipped_slot(&mut self, slot: Option<EquipSlot>) {
        self.equipped_slot = slot;
        if slot.is_some() {
            self.slot_index = None;
        }
    }
}

/// Mints instances with fresh uids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFactory {
    next_uid: u64,
}

impl Default for ItemFactory {
    fn default() -> Self {
        Self { next_uid: 1 }
    }
}

impl ItemFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume numbering after previously issued uids
    pub fn starting_at(next_uid: u64) -> Self {
        Self { next_uid: next_uid.max(1) }
    }

    /// Uid the next mint will receive
    pub fn next_uid(&self) -> u64 {
        self.next_uid
    }

    fn allocate(&mut self) -> ItemUid {
        let uid = ItemUid(self.next_uid);
        self.next_uid += 1;
        uid
    }

    /// Mint one instance
    pub fn mint(
        &mut self,
        item_type: &str,
        rarity: Rarity,
        stack_count: u32,
        created_at: u64,
    ) -> ItemInstance {
        let uid = self.allocate();
        ItemInstance::from_parts(uid, item_type, rarity, stack_count, created_at)
    }

    /// Mint `amount` units split into stacks of at most `max_stack`
    pub fn mint_stacks(
        &mut self,
        item_type: &str,
        rarity: Rarity,
        amount: u32,
        max_stack: u32,
        created_at: u64,
    ) -> Vec<ItemInstance> {
        let max_stack = max_stack.max(1);
        let mut stacks = Vec::new();
        let mut remaining = amount;
        while remaining > 0 {
            let count = remaining.min(max_stack);
            stacks.push(self.mint(item_type, rarity, count, created_at));
            remaining -= count;
        }
        stacks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_never_reuses_uids() {
        let mut factory = ItemFactory::new();
        let a = factory.mint("scrap_metal", Rarity::Common, 1, 0);
        let b = factory.mint("scrap_metal", Rarity::Common, 1, 0);
        drop(a);
        let c = factory.mint("scrap_metal", Rarity::Common, 1, 0);
        assert!(b.unique_id() < c.unique_id());
        assert_eq!(factory.next_uid(), 4);
    }

    #[test]
    fn test_mint_stacks_splits_by_max_stack() {
        let mut factory = ItemFactory::new();
        let stacks = factory.mint_stacks("scrap_metal", Rarity::Common, 25, 10, 5);
        let counts: Vec<u32> = stacks.iter().map(|s| s.stack_count()).collect();
        assert_eq!(counts, vec![10, 10, 5]);
        assert!(stacks.iter().all(|s| s.created_at() == 5));
        assert!(factory.mint_stacks("scrap_metal", Rarity::Common, 0, 10, 0).is_empty());
    }

    #[test]
    fn test_slot_siblings() {
        assert_eq!(EquipSlot::WeaponMod1.sibling(), Some(EquipSlot::WeaponMod2));
        assert_eq!(EquipSlot::Accessory2.sibling(), Some(EquipSlot::Accessory1));
        assert_eq!(EquipSlot::Armor.sibling(), None);
        assert!(EquipSlot::Accessory1.accepts(EquipSlot::Accessory2));
        assert!(!EquipSlot::Accessory1.accepts(EquipSlot::Armor));
    }

    #[test]
    fn test_stat_block_math() {
        let base = StatBlock { damage: 10.0, crit: 2.0, ..StatBlock::ZERO };
        let scaled = base.scaled(1.5);
        assert_eq!(scaled.damage, 15.0);
        assert_eq!(scaled.crit, 3.0);

        let mut total = StatBlock::ZERO;
        total += scaled;
        total += StatBlock { defense: 4.0, ..StatBlock::ZERO };
        assert_eq!(total.defense, 4.0);
        assert_eq!(total.damage, 15.0);
    }

    #[test]
    fn test_invalid_stats_detected() {
        let stats = StatBlock { speed: -1.0, ..StatBlock::ZERO };
        assert_eq!(stats.invalid_field(), Some("speed"));
        assert_eq!(StatBlock::ZERO.invalid_field(), None);
    }

    #[test]
    fn test_equippable_requires_slot() {
        let mut def = ItemDefinition::new("Chrome Ring", ItemCategory::Equipment);
        assert!(!def.is_equippable());
        def.equip_slot = Some(EquipSlot::Accessory1);
        assert!(def.is_equippable());

        let mut material = ItemDefinition::new("Scrap Metal", ItemCategory::Material);
        material.equip_slot = Some(EquipSlot::Armor);
        assert!(!material.is_equippable());
    }
}
