//! Gearworks - item economy rules engine
//!
//! Weighted loot rolls, a stacking slot inventory, an equipment board with
//! set bonuses and a timed crafting resolver, driven by RON game data.

pub mod error;
pub mod events;
pub mod items;
pub mod crafting;
pub mod data;
pub mod economy;
pub mod save;

// Re-export commonly used types
pub use data::GameData;
pub use economy::Economy;
pub use error::{ConfigError, CraftError, EquipError, InventoryError, Rejected, SaveError};
pub use events::{EconomyObserver, LoggingObserver, NullObserver, WorldPosition};
pub use items::{EquipSlot, ItemInstance, ItemUid, Rarity};
