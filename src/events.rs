//! Economy observer
//!
//! Hooks for the host game: world drops, stat refreshes, equip changes, set
//! bonus transitions and crafting progress. Every hook defaults to a no-op.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crafting::CraftedItem;
use crate::items::{EquipSlot, ItemInstance, ItemUid, LootResult, Rarity, SetBonusTier, StatBlock};

/// World position used for dropped loot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPosition {
    pub x: f32,
    pub y: f32,
}

impl WorldPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Callbacks the economy raises for presentation and gameplay systems
#[allow(unused_variables)]
pub trait EconomyObserver {
    /// Items that could not be stored and now lie in the world
    fn spawn_loot_visual(&mut self, item_type: &str, rarity: Rarity, amount: u32, position: WorldPosition) {}

    /// Aggregated equipment stats after a recalculation
    fn stats_changed(&mut self, totals: &StatBlock) {}

    fn item_equipped(&mut self, slot: EquipSlot, item: &ItemInstance) {}

    fn item_unequipped(&mut self, slot: EquipSlot, item: &ItemInstance) {}

    /// A set moved to a new active tier
    fn set_bonus_activated(&mut self, set_id: &str, pieces: u32, tier: &SetBonusTier) {}

    /// A set dropped below its first tier
    fn set_bonus_deactivated(&mut self, set_id: &str) {}

    fn craft_started(&mut self, recipe_id: &str, duration: Duration) {}

    fn craft_completed(&mut self, crafted: &CraftedItem) {}

    fn craft_cancelled(&mut self, recipe_id: &str, refunded: &[LootResult]) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl EconomyObserver for NullObserver {}

/// A recorded observer callback
#[derive(Debug, Clone, PartialEq)]
pub enum EconomyEvent {
    LootSpawned {
        item_type: String,
        rarity: Rarity,
        amount: u32,
        position: WorldPosition,
    },
    StatsChanged(StatBlock),
    ItemEquipped {
        slot: EquipSlot,
        unique_id: ItemUid,
    },
    ItemUnequipped {
        slot: EquipSlot,
        unique_id: ItemUid,
    },
    SetBonusActivated {
        set_id: String,
        pieces: u32,
        required_pieces: u32,
    },
    SetBonusDeactivated {
        set_id: String,
    },
    CraftStarted {
        recipe_id: String,
        duration: Duration,
    },
    CraftCompleted {
        recipe_id: String,
        item_type: String,
        rarity: Rarity,
        amount: u32,
    },
    CraftCancelled {
        recipe_id: String,
        refunded: Vec<LootResult>,
    },
}

/// Observer that records every callback
///
/// Clones share one log, so a test can hand a clone to the economy and read
/// the events back from the original.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Rc<RefCell<Vec<EconomyEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<EconomyEvent> {
        self.events.borrow().clone()
    }

    /// Number of recorded events matching a predicate
    pub fn count(&self, predicate: impl Fn(&EconomyEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| predicate(e)).count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: EconomyEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl EconomyObserver for RecordingObserver {
    fn spawn_loot_visual(&mut self, item_type: &str, rarity: Rarity, amount: u32, position: WorldPosition) {
        self.push(EconomyEvent::LootSpawned {
            item_type: item_type.to_string(),
            rarity,
            amount,
            position,
        });
    }

    fn stats_changed(&mut self, totals: &StatBlock) {
        self.push(EconomyEvent::StatsChanged(*totals));
    }

    fn item_equipped(&mut self, slot: EquipSlot, item: &ItemInstance) {
        self.push(EconomyEvent::ItemEquipped { slot, unique_id: item.unique_id() });
    }

    fn item_unequipped(&mut self, slot: EquipSlot, item: &ItemInstance) {
        self.push(EconomyEvent::ItemUnequipped { slot, unique_id: item.unique_id() });
    }

    fn set_bonus_activated(&mut self, set_id: &str, pieces: u32, tier: &SetBonusTier) {
        self.push(EconomyEvent::SetBonusActivated {
            set_id: set_id.to_string(),
            pieces,
            required_pieces: tier.required_pieces,
        });
    }

    fn set_bonus_deactivated(&mut self, set_id: &str) {
        self.push(EconomyEvent::SetBonusDeactivated { set_id: set_id.to_string() });
    }

    fn craft_started(&mut self, recipe_id: &str, duration: Duration) {
        self.push(EconomyEvent::CraftStarted { recipe_id: recipe_id.to_string(), duration });
    }

    fn craft_completed(&mut self, crafted: &CraftedItem) {
        self.push(EconomyEvent::CraftCompleted {
            recipe_id: crafted.recipe_id.clone(),
            item_type: crafted.item_type.clone(),
            rarity: crafted.rarity,
            amount: crafted.amount,
        });
    }

    fn craft_cancelled(&mut self, recipe_id: &str, refunded: &[LootResult]) {
        self.push(EconomyEvent::CraftCancelled {
            recipe_id: recipe_id.to_string(),
            refunded: refunded.to_vec(),
        });
    }
}

/// Logs every callback through `log`
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl EconomyObserver for LoggingObserver {
    fn spawn_loot_visual(&mut self, item_type: &str, rarity: Rarity, amount: u32, position: WorldPosition) {
        log::info!(
            "Dropped {}x {} ({}) at ({:.1}, {:.1})",
            amount,
            item_type,
            rarity.name(),
            position.x,
            position.y
        );
    }

    fn stats_changed(&mut self, totals: &StatBlock) {
        log::debug!("Equipment stats now {:?}", totals);
    }

    fn set_bonus_activated(&mut self, set_id: &str, pieces: u32, tier: &SetBonusTier) {
        log::info!("Set {} active at {} pieces (tier {})", set_id, pieces, tier.required_pieces);
    }

    fn set_bonus_deactivated(&mut self, set_id: &str) {
        log::info!("Set {} bonus lost", set_id);
    }

    fn craft_completed(&mut self, crafted: &CraftedItem) {
        log::info!(
            "Crafted {}x {} ({})",
            crafted.amount,
            crafted.item_type,
            crafted.rarity.name()
        );
    }
}
