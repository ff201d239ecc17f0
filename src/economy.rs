//! Economy façade
//!
//! Owns one player's inventory, equipment board and crafting state together
//! with the uid factory, the random source and the host observer, and exposes
//! the operations a game loop calls.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::crafting::{CraftContext, CraftStart, CraftedItem, CraftingResolver};
use crate::data::GameData;
use crate::error::{CraftError, EquipError, InventoryError, SaveError};
use crate::events::{EconomyObserver, NullObserver, WorldPosition};
use crate::items::{
    Delivery, EquipSlot, Equipment, Inventory, ItemFactory, ItemInstance, ItemUid, LootResult, LootRoll,
    LuckSource, Rarity, UsedItem,
};
use crate::save::{SaveData, SAVE_VERSION};

/// A player's slice of the item economy
pub struct Economy {
    data: Arc<GameData>,
    inventory: Inventory,
    equipment: Equipment,
    crafting: CraftingResolver,
    factory: ItemFactory,
    rng: StdRng,
    observer: Box<dyn EconomyObserver>,
    /// Milliseconds of ticked time; stamps new items
    clock_ms: u64,
    /// Where crafted overflow is dropped
    position: WorldPosition,
}

impl std::fmt::Debug for Economy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Economy")
            .field("inventory", &self.inventory)
            .field("equipment", &self.equipment)
            .field("crafting", &self.crafting)
            .field("clock_ms", &self.clock_ms)
            .finish_non_exhaustive()
    }
}

impl Economy {
    /// Create an empty economy with an entropy-seeded random source
    pub fn new(data: Arc<GameData>) -> Self {
        Self::with_rng(data, StdRng::from_entropy())
    }

    /// Create an empty economy with a reproducible random source
    pub fn with_seed(data: Arc<GameData>, seed: u64) -> Self {
        Self::with_rng(data, StdRng::seed_from_u64(seed))
    }

    fn with_rng(data: Arc<GameData>, rng: StdRng) -> Self {
        Self {
            inventory: Inventory::new(data.clone()),
            equipment: Equipment::new(data.clone()),
            crafting: CraftingResolver::new(data.clone()),
            data,
            factory: ItemFactory::new(),
            rng,
            observer: Box::new(NullObserver),
            clock_ms: 0,
            position: WorldPosition::default(),
        }
    }

    /// Route callbacks to `observer`
    pub fn with_observer(mut self, observer: Box<dyn EconomyObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn set_observer(&mut self, observer: Box<dyn EconomyObserver>) {
        self.observer = observer;
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn data(&self) -> &Arc<GameData> {
        &self.data
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    pub fn equipment(&self) -> &Equipment {
        &self.equipment
    }

    pub fn crafting(&self) -> &CraftingResolver {
        &self.crafting
    }

    pub fn crafting_mut(&mut self) -> &mut CraftingResolver {
        &mut self.crafting
    }

    /// Get the uid factory
    pub fn factory(&self) -> &ItemFactory {
        &self.factory
    }

    /// Get mutable RNG reference
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn position(&self) -> WorldPosition {
        self.position
    }

    /// Move the player; crafted overflow lands here
    pub fn set_position(&mut self, position: WorldPosition) {
        self.position = position;
    }

    /// Bonus luck from equipped drop-rate stats
    pub fn bonus_luck_percent(&self) -> f32 {
        self.equipment.bonus_luck_percent()
    }

    /// Mint a fresh item without storing it
    pub fn mint(&mut self, item_type: &str, rarity: Rarity, count: u32) -> ItemInstance {
        self.factory.mint(item_type, rarity, count, self.clock_ms)
    }

    /// Mint and store `amount` units, spilling what does not fit
    pub fn give(&mut self, item_type: &str, rarity: Rarity, amount: u32) -> Delivery {
        let result = LootResult::new(item_type, rarity, amount);
        self.inventory.add_or_spill(
            &mut self.factory,
            self.observer.as_mut(),
            &result,
            self.clock_ms,
            self.position,
        )
    }

    // ---- Loot ----

    /// Roll a named table with the equipment's bonus luck
    pub fn roll_loot(&mut self, table_id: &str) -> Option<LootRoll> {
        let Some(table) = self.data.loot_tables.get(table_id) else {
            log::warn!("Unknown loot table `{}`", table_id);
            return None;
        };
        let roll = self.data.loot_roller().roll(table, &self.equipment, &mut self.rng);
        log::debug!(
            "Rolled {}: {} results, {} coins",
            table_id,
            roll.results.len(),
            roll.coins
        );
        Some(roll)
    }

    /// Store a roll's items and coins; overflow is dropped at `position`
    pub fn collect_loot(&mut self, roll: &LootRoll, position: WorldPosition) -> Delivery {
        let mut total = Delivery::default();
        for result in &roll.results {
            let delivery = self.inventory.add_or_spill(
                &mut self.factory,
                self.observer.as_mut(),
                result,
                self.clock_ms,
                position,
            );
            total.stored += delivery.stored;
            total.spilled += delivery.spilled;
        }
        if roll.coins > 0 {
            self.inventory.add_coins(u64::from(roll.coins));
        }
        log::info!(
            "Picked up {} units and {} coins ({} left on the ground)",
            total.stored,
            roll.coins,
            total.spilled
        );
        total
    }

    // ---- Inventory ----

    /// Use a consumable; blueprints unlock the recipes they name
    pub fn use_item(&mut self, uid: ItemUid) -> Result<UsedItem, InventoryError> {
        let unlocks = self
            .inventory
            .get(uid)
            .and_then(|item| self.data.items.get(item.item_type()))
            .map(|def| def.unlocks_recipes.clone())
            .unwrap_or_default();
        let used = self.inventory.use_item(uid)?;
        for recipe_id in &unlocks {
            self.crafting.unlock_recipe(recipe_id);
        }
        Ok(used)
    }

    /// Sell a whole stack; returns the coins earned
    pub fn sell_item(&mut self, uid: ItemUid) -> Result<u64, InventoryError> {
        let item = self.inventory.remove(uid).ok_or(InventoryError::NotFound(uid))?;
        let base = self.data.items.get(item.item_type()).map(|d| d.base_sell_value).unwrap_or(0);
        let value = u64::from(base)
            .saturating_mul(u64::from(self.data.config.rarity.sell_multiplier(item.rarity())))
            .saturating_mul(u64::from(item.stack_count()));
        self.inventory.add_coins(value);
        log::info!("Sold {}x {} for {} coins", item.stack_count(), item.item_type(), value);
        Ok(value)
    }

    /// Break a stack down into its salvage materials
    pub fn dismantle_item(&mut self, uid: ItemUid) -> Result<Vec<LootResult>, InventoryError> {
        let item = self.inventory.get(uid).ok_or(InventoryError::NotFound(uid))?;
        let salvage = self
            .data
            .items
            .get(item.item_type())
            .map(|d| d.salvage.clone())
            .unwrap_or_default();
        if salvage.is_empty() {
            return Err(InventoryError::NotSalvageable(item.item_type().to_string()));
        }

        let item = self.inventory.remove(uid).ok_or(InventoryError::NotFound(uid))?;
        let yields: Vec<LootResult> = salvage
            .iter()
            .map(|s| {
                LootResult::new(s.item_type.clone(), Rarity::Common, s.amount.saturating_mul(item.stack_count()))
            })
            .collect();
        for result in &yields {
            self.inventory.add_or_spill(
                &mut self.factory,
                self.observer.as_mut(),
                result,
                self.clock_ms,
                self.position,
            );
        }
        log::info!("Dismantled {}x {}", item.stack_count(), item.item_type());
        Ok(yields)
    }

    /// Throw a stack out into the world
    pub fn drop_item(&mut self, uid: ItemUid, position: WorldPosition) -> Result<(), InventoryError> {
        let item = self.inventory.remove(uid).ok_or(InventoryError::NotFound(uid))?;
        log::info!("Dropped {}x {}", item.stack_count(), item.item_type());
        self.observer
            .spawn_loot_visual(item.item_type(), item.rarity(), item.stack_count(), position);
        Ok(())
    }

    // ---- Equipment ----

    /// Equip from the inventory into the item's preferred slot
    pub fn try_equip(&mut self, uid: ItemUid) -> Result<EquipSlot, EquipError> {
        self.equipment.try_equip(uid, &mut self.inventory, self.observer.as_mut())
    }

    /// Equip from the inventory into a specific slot
    pub fn try_equip_to(&mut self, uid: ItemUid, slot: EquipSlot) -> Result<EquipSlot, EquipError> {
        self.equipment.try_equip_to(uid, slot, &mut self.inventory, self.observer.as_mut())
    }

    /// Move an equipped item back to the inventory
    pub fn unequip(&mut self, slot: EquipSlot) -> Result<ItemUid, EquipError> {
        self.equipment.unequip_to(slot, &mut self.inventory, self.observer.as_mut())
    }

    // ---- Crafting ----

    pub fn can_craft(&self, recipe_id: &str) -> Result<(), CraftError> {
        self.crafting.can_craft(&self.inventory, recipe_id)
    }

    pub fn start_craft(&mut self, recipe_id: &str) -> Result<CraftStart, CraftError> {
        let bonus_luck = self.equipment.bonus_luck_percent();
        let mut ctx = CraftContext {
            inventory: &mut self.inventory,
            factory: &mut self.factory,
            rng: &mut self.rng,
            observer: self.observer.as_mut(),
            bonus_luck,
            now_ms: self.clock_ms,
            position: self.position,
        };
        self.crafting.start_craft(recipe_id, &mut ctx)
    }

    /// Abort the running craft; returns what was refunded
    pub fn cancel_craft(&mut self) -> Result<Vec<LootResult>, CraftError> {
        let bonus_luck = self.equipment.bonus_luck_percent();
        let mut ctx = CraftContext {
            inventory: &mut self.inventory,
            factory: &mut self.factory,
            rng: &mut self.rng,
            observer: self.observer.as_mut(),
            bonus_luck,
            now_ms: self.clock_ms,
            position: self.position,
        };
        self.crafting.cancel_craft(&mut ctx)
    }

    pub fn craft_progress(&self) -> f32 {
        self.crafting.progress()
    }

    pub fn craft_remaining(&self) -> Duration {
        self.crafting.remaining_time()
    }

    /// Advance time; returns a craft that finished during this step
    pub fn tick(&mut self, delta: Duration) -> Option<CraftedItem> {
        self.clock_ms = self
            .clock_ms
            .saturating_add(u64::try_from(delta.as_millis()).unwrap_or(u64::MAX));
        let bonus_luck = self.equipment.bonus_luck_percent();
        let mut ctx = CraftContext {
            inventory: &mut self.inventory,
            factory: &mut self.factory,
            rng: &mut self.rng,
            observer: self.observer.as_mut(),
            bonus_luck,
            now_ms: self.clock_ms,
            position: self.position,
        };
        self.crafting.tick(delta, &mut ctx)
    }

    // ---- Persistence ----

    /// Rebuild an economy from a save
    ///
    /// Every item must be known, sized within its stack limit and placed either
    /// in an inventory slot or an equipment slot. The random source is seeded
    /// from entropy; call `reseed` for reproducible sessions.
    pub fn restore(data: Arc<GameData>, save: &SaveData) -> Result<Self, SaveError> {
        if save.version != SAVE_VERSION {
            return Err(SaveError::VersionMismatch { expected: SAVE_VERSION, found: save.version });
        }

        let mut economy = Self::new(data.clone());
        let equipped: BTreeMap<ItemUid, EquipSlot> =
            save.equipped.iter().map(|e| (e.unique_id, e.slot)).collect();
        if equipped.len() != save.equipped.len() {
            return Err(SaveError::InvalidData("an item is equipped twice".into()));
        }

        let mut seen = BTreeSet::new();
        let mut highest_uid = 0;
        for saved in &save.items {
            if !seen.insert(saved.unique_id) {
                return Err(SaveError::InvalidData(format!("item {} appears twice", saved.unique_id)));
            }
            let max_stack = data
                .items
                .get(&saved.item_type)
                .map(|d| d.max_stack)
                .ok_or_else(|| SaveError::InvalidData(format!("unknown item type `{}`", saved.item_type)))?;
            if saved.stack_count == 0 || saved.stack_count > max_stack {
                return Err(SaveError::InvalidData(format!(
                    "item {} has {} units, limit is {}",
                    saved.unique_id, saved.stack_count, max_stack
                )));
            }
            highest_uid = highest_uid.max(saved.unique_id.0);

            let item = ItemInstance::from_parts(
                saved.unique_id,
                saved.item_type.clone(),
                saved.rarity,
                saved.stack_count,
                saved.created_at,
            );
            let placed = match (equipped.get(&saved.unique_id), saved.slot_index) {
                (Some(&slot), _) => economy.equipment.restore(item, slot),
                (None, Some(index)) => economy.inventory.restore(item, index),
                (None, None) => Err(format!("item {} has no slot", saved.unique_id)),
            };
            placed.map_err(SaveError::InvalidData)?;
        }
        if let Some(missing) = equipped.keys().find(|uid| !seen.contains(*uid)) {
            return Err(SaveError::InvalidData(format!("equipped item {} is missing", missing)));
        }

        economy.inventory.add_coins(save.coins);
        economy.factory = ItemFactory::starting_at(save.next_uid.max(highest_uid + 1));
        economy.crafting.set_level(save.crafter_level);
        economy
            .crafting
            .restore(&save.unlocked_recipes, save.active_craft.clone())
            .map_err(SaveError::InvalidData)?;
        economy.clock_ms = save.clock_ms;

        log::info!(
            "Restored economy: {} stacks, {} equipped, {} coins",
            economy.inventory.count(),
            save.equipped.len(),
            save.coins
        );
        Ok(economy)
    }
}
