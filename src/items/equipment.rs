//! Equipment system
//!
//! Manages equipped items, per-set piece counts and the aggregated stat
//! totals (rarity-scaled base stats plus active set bonuses).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::inventory::Inventory;
use super::item::{EquipSlot, ItemInstance, ItemUid, StatBlock};
use super::loot::LuckSource;
use super::sets::ActiveSetBonus;
use crate::data::GameData;
use crate::error::{EquipError, Rejected};
use crate::events::{EconomyObserver, WorldPosition};

/// Player equipment slots
#[derive(Debug)]
pub struct Equipment {
    data: Arc<GameData>,
    /// Items in each slot
    slots: BTreeMap<EquipSlot, ItemInstance>,
    /// Equipped pieces per set id
    set_counts: BTreeMap<String, u32>,
    /// Active tier index per set id
    active_tiers: BTreeMap<String, usize>,
    totals: StatBlock,
}

impl Equipment {
    pub fn new(data: Arc<GameData>) -> Self {
        Self {
            data,
            slots: BTreeMap::new(),
            set_counts: BTreeMap::new(),
            active_tiers: BTreeMap::new(),
            totals: StatBlock::ZERO,
        }
    }

    /// Get item in a slot
    pub fn equipped(&self, slot: EquipSlot) -> Option<&ItemInstance> {
        self.slots.get(&slot)
    }

    /// Check if a slot is empty
    pub fn is_empty(&self, slot: EquipSlot) -> bool {
        !self.slots.contains_key(&slot)
    }

    /// Get all equipped items with their slots
    pub fn items(&self) -> impl Iterator<Item = (EquipSlot, &ItemInstance)> {
        self.slots.iter().map(|(slot, item)| (*slot, item))
    }

    /// Slot holding an item, if equipped
    pub fn slot_of(&self, uid: ItemUid) -> Option<EquipSlot> {
        self.slots
            .iter()
            .find(|(_, item)| item.unique_id() == uid)
            .map(|(slot, _)| *slot)
    }

    /// Equipped pieces of a set
    pub fn set_piece_count(&self, set_id: &str) -> u32 {
        self.set_counts.get(set_id).copied().unwrap_or(0)
    }

    /// Current aggregated stats
    pub fn totals(&self) -> StatBlock {
        self.totals
    }

    /// Sets whose bonus currently applies
    pub fn active_sets(&self) -> Vec<ActiveSetBonus> {
        self.active_tiers
            .iter()
            .filter_map(|(set_id, &tier_index)| {
                let set = self.data.sets.get(set_id)?;
                Some(ActiveSetBonus {
                    set_id: set_id.clone(),
                    name: set.name.clone(),
                    pieces: self.set_piece_count(set_id),
                    tier_index,
                    tier: set.tiers.get(tier_index)?.clone(),
                })
            })
            .collect()
    }

    /// Slot an item type would go to: its authored slot, or the free sibling
    /// of a paired slot when the authored one is taken
    pub fn target_slot(&self, item_type: &str) -> Result<EquipSlot, EquipError> {
        let def = self
            .data
            .items
            .get(item_type)
            .ok_or_else(|| EquipError::UnknownItemType(item_type.to_string()))?;
        let preferred = match def.equip_slot {
            Some(slot) if def.category.is_equipment() => slot,
            _ => return Err(EquipError::NotEquippable(item_type.to_string())),
        };
        if !self.is_empty(preferred) {
            if let Some(sibling) = preferred.sibling().filter(|s| self.is_empty(*s)) {
                return Ok(sibling);
            }
        }
        Ok(preferred)
    }

    /// Check an explicit slot choice against the item's definition
    pub fn check_slot(&self, item_type: &str, slot: EquipSlot) -> Result<(), EquipError> {
        let def = self
            .data
            .items
            .get(item_type)
            .ok_or_else(|| EquipError::UnknownItemType(item_type.to_string()))?;
        match def.equip_slot {
            Some(authored) if def.category.is_equipment() => {
                if authored.accepts(slot) {
                    Ok(())
                } else {
                    Err(EquipError::WrongSlot { item_type: item_type.to_string(), slot })
                }
            }
            _ => Err(EquipError::NotEquippable(item_type.to_string())),
        }
    }

    /// Equip an item into its target slot, returning the displaced occupant
    pub fn equip(
        &mut self,
        item: ItemInstance,
        observer: &mut dyn EconomyObserver,
    ) -> Result<Option<ItemInstance>, Rejected<EquipError>> {
        match self.target_slot(item.item_type()) {
            Ok(slot) => self.equip_to(item, slot, observer),
            Err(reason) => Err(Rejected::new(item, reason)),
        }
    }

    /// Equip an item into a specific slot, returning the displaced occupant
    pub fn equip_to(
        &mut self,
        mut item: ItemInstance,
        slot: EquipSlot,
        observer: &mut dyn EconomyObserver,
    ) -> Result<Option<ItemInstance>, Rejected<EquipError>> {
        if let Err(reason) = self.check_slot(item.item_type(), slot) {
            return Err(Rejected::new(item, reason));
        }

        let mut touched_sets = BTreeSet::new();
        let previous = match self.slots.remove(&slot) {
            Some(mut old) => {
                old.set_equipped_slot(None);
                if let Some(set_id) = self.set_of(old.item_type()) {
                    self.adjust_set_count(&set_id, -1);
                    touched_sets.insert(set_id);
                }
                observer.item_unequipped(slot, &old);
                Some(old)
            }
            None => None,
        };

        item.set_equipped_slot(Some(slot));
        if let Some(set_id) = self.set_of(item.item_type()) {
            self.adjust_set_count(&set_id, 1);
            touched_sets.insert(set_id);
        }
        log::info!("Equipped {} {} in {}", item.item_type(), item.unique_id(), slot.name());
        observer.item_equipped(slot, &item);
        self.slots.insert(slot, item);

        for set_id in &touched_sets {
            self.refresh_set_tier(set_id, observer);
        }
        let totals = self.recalculate_stats();
        observer.stats_changed(&totals);
        Ok(previous)
    }

    /// Remove the item in a slot
    pub fn unequip(&mut self, slot: EquipSlot, observer: &mut dyn EconomyObserver) -> Option<ItemInstance> {
        let mut item = self.slots.remove(&slot)?;
        item.set_equipped_slot(None);
        log::info!("Unequipped {} {} from {}", item.item_type(), item.unique_id(), slot.name());
        observer.item_unequipped(slot, &item);

        if let Some(set_id) = self.set_of(item.item_type()) {
            self.adjust_set_count(&set_id, -1);
            self.refresh_set_tier(&set_id, observer);
        }
        let totals = self.recalculate_stats();
        observer.stats_changed(&totals);
        Some(item)
    }

    /// Move an item from the inventory onto the board
    ///
    /// Any displaced occupant goes back into the inventory in the same
    /// operation. Fails with nothing moved if the item is missing or cannot
    /// be equipped.
    pub fn try_equip(
        &mut self,
        uid: ItemUid,
        inventory: &mut Inventory,
        observer: &mut dyn EconomyObserver,
    ) -> Result<EquipSlot, EquipError> {
        let item_type = inventory
            .get(uid)
            .map(|i| i.item_type().to_string())
            .ok_or(EquipError::NotFound(uid))?;
        let slot = self.target_slot(&item_type)?;
        self.move_from_inventory(uid, slot, inventory, observer)
    }

    /// Like `try_equip` with an explicit slot
    pub fn try_equip_to(
        &mut self,
        uid: ItemUid,
        slot: EquipSlot,
        inventory: &mut Inventory,
        observer: &mut dyn EconomyObserver,
    ) -> Result<EquipSlot, EquipError> {
        let item_type = inventory
            .get(uid)
            .map(|i| i.item_type().to_string())
            .ok_or(EquipError::NotFound(uid))?;
        self.check_slot(&item_type, slot)?;
        self.move_from_inventory(uid, slot, inventory, observer)
    }

    fn move_from_inventory(
        &mut self,
        uid: ItemUid,
        slot: EquipSlot,
        inventory: &mut Inventory,
        observer: &mut dyn EconomyObserver,
    ) -> Result<EquipSlot, EquipError> {
        let item = inventory.remove(uid).ok_or(EquipError::NotFound(uid))?;
        match self.equip_to(item, slot, observer) {
            Ok(Some(previous)) => {
                // The equipped item's slot was just freed, so this fits
                if let Err(rejected) = inventory.try_add(previous) {
                    log::error!("Displaced item did not fit back: {}", rejected);
                    let item = rejected.into_item();
                    observer.spawn_loot_visual(
                        item.item_type(),
                        item.rarity(),
                        item.stack_count(),
                        WorldPosition::default(),
                    );
                }
                Ok(slot)
            }
            Ok(None) => Ok(slot),
            Err(rejected) => {
                let reason = rejected.reason.clone();
                if let Err(back) = inventory.try_add(rejected.into_item()) {
                    log::error!("Rejected item did not fit back: {}", back);
                }
                Err(reason)
            }
        }
    }

    /// Move the item in a slot back into the inventory
    ///
    /// Fails with no change when the slot is empty or the inventory cannot
    /// take the item.
    pub fn unequip_to(
        &mut self,
        slot: EquipSlot,
        inventory: &mut Inventory,
        observer: &mut dyn EconomyObserver,
    ) -> Result<ItemUid, EquipError> {
        let item = self.slots.get(&slot).ok_or(EquipError::SlotEmpty(slot))?;
        if !inventory.can_fit(item) {
            return Err(EquipError::InventoryFull);
        }
        let item = self.unequip(slot, observer).ok_or(EquipError::SlotEmpty(slot))?;
        let uid = item.unique_id();
        if let Err(rejected) = inventory.try_add(item) {
            log::error!("Unequipped item did not fit: {}", rejected);
            let reason = rejected.reason.clone();
            let item = rejected.into_item();
            // Put it back so nothing is lost
            if let Err(back) = self.equip_to(item, slot, observer) {
                log::error!("Could not re-equip {}: {}", uid, back);
            }
            log::debug!("Unequip aborted: {}", reason);
            return Err(EquipError::InventoryFull);
        }
        Ok(uid)
    }

    /// Full recompute of the aggregated stats; idempotent
    pub fn recalculate_stats(&mut self) -> StatBlock {
        let mut totals = StatBlock::ZERO;
        for item in self.slots.values() {
            if let Some(def) = self.data.items.get(item.item_type()) {
                let multiplier = self.data.config.rarity.stat_multiplier(item.rarity());
                totals += def.stats.scaled(multiplier);
            }
        }
        for (set_id, count) in &self.set_counts {
            if let Some(tier) = self.data.sets.get_active_tier(set_id, *count) {
                totals += tier.bonus;
            }
        }
        self.totals = totals;
        totals
    }

    /// Put an item straight into a slot while loading a save; no events
    pub(crate) fn restore(&mut self, mut item: ItemInstance, slot: EquipSlot) -> Result<(), String> {
        self.check_slot(item.item_type(), slot).map_err(|e| e.to_string())?;
        if self.slots.contains_key(&slot) {
            return Err(format!("{:?} slot is filled twice", slot));
        }
        if let Some(set_id) = self.set_of(item.item_type()) {
            self.adjust_set_count(&set_id, 1);
            if let Some(index) = self.data.sets.active_tier_index(&set_id, self.set_piece_count(&set_id)) {
                self.active_tiers.insert(set_id, index);
            } else {
                self.active_tiers.remove(&set_id);
            }
        }
        item.set_equipped_slot(Some(slot));
        self.slots.insert(slot, item);
        self.recalculate_stats();
        Ok(())
    }

    fn set_of(&self, item_type: &str) -> Option<String> {
        self.data.items.get(item_type).and_then(|d| d.set_id.clone())
    }

    fn adjust_set_count(&mut self, set_id: &str, delta: i32) {
        let count = self.set_counts.entry(set_id.to_string()).or_insert(0);
        *count = count.saturating_add_signed(delta);
        if *count == 0 {
            self.set_counts.remove(set_id);
        }
    }

    /// Re-evaluate one set's tier and raise events if it changed
    fn refresh_set_tier(&mut self, set_id: &str, observer: &mut dyn EconomyObserver) {
        let count = self.set_piece_count(set_id);
        let new_tier = self.data.sets.active_tier_index(set_id, count);
        let old_tier = self.active_tiers.get(set_id).copied();
        if new_tier == old_tier {
            return;
        }

        match new_tier {
            Some(index) => {
                self.active_tiers.insert(set_id.to_string(), index);
                if let Some(tier) = self.data.sets.get(set_id).and_then(|s| s.tiers.get(index)) {
                    log::info!("Set bonus {} active with {} pieces", set_id, count);
                    observer.set_bonus_activated(set_id, count, tier);
                }
            }
            None => {
                self.active_tiers.remove(set_id);
                log::info!("Set bonus {} deactivated", set_id);
                observer.set_bonus_deactivated(set_id);
            }
        }
    }
}

impl LuckSource for Equipment {
    fn bonus_luck_percent(&self) -> f32 {
        self.totals.drop_rate
    }
}
