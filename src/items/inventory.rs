//! Inventory system
//!
//! Bounded slot store for item stacks. Stacks of the same type and rarity
//! merge up to the type's limit; anything else takes the lowest free slot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::item::{ItemCategory, ItemFactory, ItemInstance, ItemUid};
use super::loot::LootResult;
use super::rarity::Rarity;
use crate::data::GameData;
use crate::error::{InventoryError, Rejected};
use crate::events::{EconomyObserver, WorldPosition};

/// Sort modes for inventory queries and reorganizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortMode {
    /// Newest items first
    #[default]
    Recent,
    /// Sort by display name alphabetically
    Name,
    /// Sort by rarity (legendary first), then by category
    Rarity,
    /// Sort by category (equipment first), then by rarity
    Type,
    /// Largest stacks first
    Amount,
}

/// Query filter; empty fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub category: Option<ItemCategory>,
    pub search: Option<String>,
}

impl ItemFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(category: ItemCategory) -> Self {
        Self { category: Some(category), search: None }
    }

    pub fn search(text: impl Into<String>) -> Self {
        Self { category: None, search: Some(text.into()) }
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }
}

/// Part of a stack taken by `remove_matching`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumedPart {
    pub unique_id: ItemUid,
    pub rarity: Rarity,
    pub amount: u32,
}

/// Outcome of using a consumable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsedItem {
    pub item_type: String,
    pub rarity: Rarity,
    /// Units left in the stack (0 = stack destroyed)
    pub remaining: u32,
}

/// How many units of a delivery landed in the store and how many spilled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub stored: u32,
    pub spilled: u32,
}

/// Player inventory
#[derive(Debug)]
pub struct Inventory {
    data: Arc<GameData>,
    capacity: usize,
    items: Vec<ItemInstance>,
    coins: u64,
}

impl Inventory {
    /// Create an inventory sized by the economy config
    pub fn new(data: Arc<GameData>) -> Self {
        let capacity = data.config.inventory_capacity();
        Self::with_capacity(data, capacity)
    }

    pub fn with_capacity(data: Arc<GameData>, capacity: usize) -> Self {
        Self {
            data,
            capacity,
            items: Vec::new(),
            coins: 0,
        }
    }

    /// Get total slot capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get number of occupied slots
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every slot is occupied (stacks may still have merge room)
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.items.len())
    }

    /// All stored stacks, in insertion order
    pub fn items(&self) -> &[ItemInstance] {
        &self.items
    }

    /// Get item by uid
    pub fn get(&self, uid: ItemUid) -> Option<&ItemInstance> {
        self.items.iter().find(|i| i.unique_id() == uid)
    }

    /// Get item in a slot
    pub fn get_at(&self, slot: usize) -> Option<&ItemInstance> {
        self.items.iter().find(|i| i.slot_index() == Some(slot))
    }

    pub fn contains(&self, uid: ItemUid) -> bool {
        self.get(uid).is_some()
    }

    /// Units of a type at or above a rarity, summed across stacks
    pub fn count_of(&self, item_type: &str, min_rarity: Rarity) -> u32 {
        self.items
            .iter()
            .filter(|i| i.item_type() == item_type && i.rarity() >= min_rarity)
            .map(|i| i.stack_count())
            .sum()
    }

    /// Units that existing stacks of this type and rarity can still absorb
    pub fn merge_room(&self, item_type: &str, rarity: Rarity) -> u32 {
        let max_stack = self.data.items.max_stack(item_type);
        self.items
            .iter()
            .filter(|i| i.item_type() == item_type && i.rarity() == rarity)
            .map(|i| max_stack.saturating_sub(i.stack_count()))
            .sum()
    }

    fn lowest_free_slot(&self) -> Option<usize> {
        (0..self.capacity).find(|slot| self.get_at(*slot).is_none())
    }

    /// Check if the whole instance would be accepted
    pub fn can_fit(&self, item: &ItemInstance) -> bool {
        self.lowest_free_slot().is_some()
            || self.merge_room(item.item_type(), item.rarity()) >= item.stack_count()
    }

    /// Add an item, merging into matching stacks first
    ///
    /// Fails without touching the store when there is neither merge room nor a
    /// free slot. When merging absorbed part of the stack but no slot is left
    /// for the rest, the error carries the remainder.
    pub fn try_add(&mut self, mut item: ItemInstance) -> Result<(), Rejected<InventoryError>> {
        if item.stack_count() == 0 {
            return Ok(());
        }

        let max_stack = match self.data.items.get(item.item_type()) {
            Some(def) => def.max_stack,
            None => {
                let reason = InventoryError::UnknownItemType(item.item_type().to_string());
                return Err(Rejected::new(item, reason));
            }
        };
        if item.stack_count() > max_stack {
            let reason = InventoryError::OversizedStack {
                item_type: item.item_type().to_string(),
                count: item.stack_count(),
                max_stack,
            };
            return Err(Rejected::new(item, reason));
        }

        let free_slot = self.lowest_free_slot();
        if free_slot.is_none() && self.merge_room(item.item_type(), item.rarity()) == 0 {
            return Err(Rejected::new(item, InventoryError::Full { capacity: self.capacity }));
        }

        let item_type = item.item_type().to_string();
        let rarity = item.rarity();
        for stack in self
            .items
            .iter_mut()
            .filter(|s| s.item_type() == item_type && s.rarity() == rarity)
        {
            let moved = max_stack.saturating_sub(stack.stack_count()).min(item.stack_count());
            stack.set_stack_count(stack.stack_count() + moved);
            item.set_stack_count(item.stack_count() - moved);
            if item.stack_count() == 0 {
                return Ok(());
            }
        }

        match free_slot {
            Some(slot) => {
                item.set_equipped_slot(None);
                item.set_slot_index(Some(slot));
                self.items.push(item);
                Ok(())
            }
            None => Err(Rejected::new(item, InventoryError::Full { capacity: self.capacity })),
        }
    }

    /// Mint `result` and store it, spilling whatever does not fit into the world
    pub fn add_or_spill(
        &mut self,
        factory: &mut ItemFactory,
        observer: &mut dyn EconomyObserver,
        result: &LootResult,
        created_at: u64,
        position: WorldPosition,
    ) -> Delivery {
        let mut delivery = Delivery::default();
        match self.data.items.get(&result.item_type).map(|d| d.max_stack) {
            Some(max_stack) => {
                let stacks = factory.mint_stacks(
                    &result.item_type,
                    result.rarity,
                    result.amount,
                    max_stack,
                    created_at,
                );
                for stack in stacks {
                    let count = stack.stack_count();
                    match self.try_add(stack) {
                        Ok(()) => delivery.stored += count,
                        Err(rejected) => {
                            let left = rejected.item.stack_count();
                            delivery.stored += count - left;
                            delivery.spilled += left;
                        }
                    }
                }
            }
            None => {
                log::warn!("Unknown item type `{}` cannot be stored", result.item_type);
                delivery.spilled = result.amount;
            }
        }

        if delivery.spilled > 0 {
            log::info!(
                "Inventory full, dropped {}x {} ({}) in the world",
                delivery.spilled,
                result.item_type,
                result.rarity.name()
            );
            observer.spawn_loot_visual(&result.item_type, result.rarity, delivery.spilled, position);
        }
        delivery
    }

    /// Remove an item by uid
    pub fn remove(&mut self, uid: ItemUid) -> Option<ItemInstance> {
        let index = self.items.iter().position(|i| i.unique_id() == uid)?;
        let mut item = self.items.remove(index);
        item.set_slot_index(None);
        Some(item)
    }

    /// Remove up to `amount` units of a type, oldest stacks first
    pub fn remove_by_type(&mut self, item_type: &str, amount: u32) -> u32 {
        self.remove_matching(item_type, Rarity::Common, amount)
            .iter()
            .map(|p| p.amount)
            .sum()
    }

    /// Remove up to `amount` units at or above `min_rarity`, oldest stacks first
    pub fn remove_matching(
        &mut self,
        item_type: &str,
        min_rarity: Rarity,
        amount: u32,
    ) -> Vec<ConsumedPart> {
        let mut order: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, i)| i.item_type() == item_type && i.rarity() >= min_rarity)
            .map(|(index, _)| index)
            .collect();
        order.sort_by_key(|&index| self.items[index].age_key());

        let mut parts = Vec::new();
        let mut remaining = amount;
        for index in order {
            if remaining == 0 {
                break;
            }
            let stack = &mut self.items[index];
            let taken = remaining.min(stack.stack_count());
            stack.set_stack_count(stack.stack_count() - taken);
            remaining -= taken;
            parts.push(ConsumedPart {
                unique_id: stack.unique_id(),
                rarity: stack.rarity(),
                amount: taken,
            });
        }
        self.items.retain(|i| i.stack_count() > 0);
        parts
    }

    /// Use (consume) one unit of a consumable stack
    pub fn use_item(&mut self, uid: ItemUid) -> Result<UsedItem, InventoryError> {
        let index = self
            .items
            .iter()
            .position(|i| i.unique_id() == uid)
            .ok_or(InventoryError::NotFound(uid))?;
        let item_type = self.items[index].item_type().to_string();
        let def = self
            .data
            .items
            .get(&item_type)
            .ok_or_else(|| InventoryError::UnknownItemType(item_type.clone()))?;
        if !def.is_consumable() {
            return Err(InventoryError::NotConsumable(item_type));
        }

        let stack = &mut self.items[index];
        let remaining = stack.stack_count().saturating_sub(1);
        stack.set_stack_count(remaining);
        let used = UsedItem { item_type, rarity: stack.rarity(), remaining };
        if remaining == 0 {
            self.items.remove(index);
        }
        Ok(used)
    }

    fn matches(&self, item: &ItemInstance, filter: &ItemFilter) -> bool {
        let def = self.data.items.get(item.item_type());
        if let Some(category) = filter.category {
            if def.map(|d| d.category) != Some(category) {
                return false;
            }
        }
        match filter.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(text) => {
                let needle = text.to_lowercase();
                item.item_type().to_lowercase().contains(&needle)
                    || def.is_some_and(|d| {
                        d.name.to_lowercase().contains(&needle)
                            || d.description.to_lowercase().contains(&needle)
                    })
            }
        }
    }

    /// Filtered, sorted view of the stored stacks
    pub fn query(&self, filter: &ItemFilter, sort: SortMode) -> Vec<&ItemInstance> {
        let mut items: Vec<&ItemInstance> =
            self.items.iter().filter(|i| self.matches(i, filter)).collect();

        let catalog = &self.data.items;
        let name = |i: &ItemInstance| catalog.display_name(i.item_type()).to_string();
        let category = |i: &ItemInstance| {
            catalog.get(i.item_type()).map(|d| d.category.sort_value()).unwrap_or(u8::MAX)
        };

        match sort {
            SortMode::Recent => {
                items.sort_by(|a, b| b.age_key().cmp(&a.age_key()));
            }
            SortMode::Name => {
                items.sort_by(|a, b| {
                    name(*a).cmp(&name(*b))
                        .then_with(|| b.rarity().cmp(&a.rarity()))
                        .then_with(|| a.unique_id().cmp(&b.unique_id()))
                });
            }
            SortMode::Rarity => {
                items.sort_by(|a, b| {
                    b.rarity().cmp(&a.rarity())
                        .then_with(|| category(*a).cmp(&category(*b)))
                        .then_with(|| name(*a).cmp(&name(*b)))
                        .then_with(|| a.unique_id().cmp(&b.unique_id()))
                });
            }
            SortMode::Type => {
                items.sort_by(|a, b| {
                    category(*a).cmp(&category(*b))
                        .then_with(|| b.rarity().cmp(&a.rarity()))
                        .then_with(|| name(*a).cmp(&name(*b)))
                        .then_with(|| a.unique_id().cmp(&b.unique_id()))
                });
            }
            SortMode::Amount => {
                items.sort_by(|a, b| {
                    b.stack_count().cmp(&a.stack_count())
                        .then_with(|| name(*a).cmp(&name(*b)))
                        .then_with(|| a.unique_id().cmp(&b.unique_id()))
                });
            }
        }
        items
    }

    /// Reassign slot indices so slot order follows `sort`
    pub fn reorganize(&mut self, sort: SortMode) {
        let order: Vec<ItemUid> = self
            .query(&ItemFilter::all(), sort)
            .iter()
            .map(|i| i.unique_id())
            .collect();
        for (slot, uid) in order.iter().enumerate() {
            if let Some(item) = self.items.iter_mut().find(|i| i.unique_id() == *uid) {
                item.set_slot_index(Some(slot));
            }
        }
        self.items.sort_by_key(|i| i.slot_index());
    }

    /// Move an item to a slot, swapping with any occupant
    pub fn move_item(&mut self, uid: ItemUid, slot: usize) -> bool {
        if slot >= self.capacity {
            return false;
        }
        let Some(from) = self.get(uid).and_then(|i| i.slot_index()) else {
            return false;
        };
        if let Some(occupant) = self.items.iter_mut().find(|i| i.slot_index() == Some(slot)) {
            occupant.set_slot_index(Some(from));
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.unique_id() == uid) {
            item.set_slot_index(Some(slot));
        }
        true
    }

    /// Put back an item with a recorded slot, used when loading a save
    pub(crate) fn restore(&mut self, mut item: ItemInstance, slot: usize) -> Result<(), String> {
        if slot >= self.capacity {
            return Err(format!("slot {} is outside the inventory", slot));
        }
        if self.get_at(slot).is_some() {
            return Err(format!("slot {} is used twice", slot));
        }
        item.set_equipped_slot(None);
        item.set_slot_index(Some(slot));
        self.items.push(item);
        Ok(())
    }

    /// Get current coins
    pub fn coins(&self) -> u64 {
        self.coins
    }

    /// Add coins
    pub fn add_coins(&mut self, amount: u64) {
        self.coins = self.coins.saturating_add(amount);
    }

    /// Spend coins, returns false if not enough
    pub fn spend_coins(&mut self, amount: u64) -> bool {
        if self.coins >= amount {
            self.coins -= amount;
            true
        } else {
            false
        }
    }
}
