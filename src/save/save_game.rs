//! Economy save data
//!
//! Handles saving and loading economy state to/from disk.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::crafting::CraftingProcess;
use crate::economy::Economy;
use crate::error::SaveError;
use crate::items::{EquipSlot, ItemInstance, ItemUid, Rarity};

/// Save file version for compatibility checking
pub const SAVE_VERSION: u32 = 1;

/// Complete save data structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    /// Every owned instance, stored or equipped
    pub items: Vec<SavedItem>,
    /// Which of `items` sit on the equipment board
    pub equipped: Vec<SavedEquip>,
    pub unlocked_recipes: Vec<String>,
    pub coins: u64,
    /// Next uid the factory will issue
    pub next_uid: u64,
    pub crafter_level: u32,
    /// Craft in flight with its already-consumed ingredients
    #[serde(default)]
    pub active_craft: Option<CraftingProcess>,
    #[serde(default)]
    pub clock_ms: u64,
}

/// One item instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedItem {
    pub unique_id: ItemUid,
    pub item_type: String,
    pub rarity: Rarity,
    pub stack_count: u32,
    /// Inventory slot; `None` for equipped items
    pub slot_index: Option<usize>,
    pub created_at: u64,
}

impl From<&ItemInstance> for SavedItem {
    fn from(item: &ItemInstance) -> Self {
        Self {
            unique_id: item.unique_id(),
            item_type: item.item_type().to_string(),
            rarity: item.rarity(),
            stack_count: item.stack_count(),
            slot_index: item.slot_index(),
            created_at: item.created_at(),
        }
    }
}

/// An equipped item and its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedEquip {
    pub unique_id: ItemUid,
    pub slot: EquipSlot,
}

impl SaveData {
    /// Snapshot an economy
    pub fn capture(economy: &Economy) -> Self {
        let mut items: Vec<SavedItem> = economy.inventory().items().iter().map(SavedItem::from).collect();
        let mut equipped = Vec::new();
        for (slot, item) in economy.equipment().items() {
            items.push(SavedItem::from(item));
            equipped.push(SavedEquip { unique_id: item.unique_id(), slot });
        }

        Self {
            version: SAVE_VERSION,
            items,
            equipped,
            unlocked_recipes: economy.crafting().unlocked_recipes().map(str::to_string).collect(),
            coins: economy.inventory().coins(),
            next_uid: economy.factory().next_uid(),
            crafter_level: economy.crafting().level(),
            active_craft: economy.crafting().active().cloned(),
            clock_ms: economy.clock_ms(),
        }
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and version-check a save
    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let save: SaveData = serde_json::from_str(json)?;
        if save.version != SAVE_VERSION {
            return Err(SaveError::VersionMismatch {
                expected: SAVE_VERSION,
                found: save.version,
            });
        }
        Ok(save)
    }
}

/// Save an economy to a file
pub fn save_to_path(economy: &Economy, path: impl AsRef<Path>) -> Result<(), SaveError> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let json = SaveData::capture(economy).to_json()?;
    fs::write(path, json)?;

    log::info!("Economy saved to {}", path.display());
    Ok(())
}

/// Load save data from a file
pub fn load_from_path(path: impl AsRef<Path>) -> Result<SaveData, SaveError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let save = SaveData::from_json(&json)?;

    log::info!("Economy loaded from {}", path.display());
    Ok(save)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GameData;
    use std::sync::Arc;
    use std::time::Duration;

    fn session() -> Economy {
        let mut economy = Economy::with_seed(Arc::new(GameData::default()), 7);
        economy.give("scrap_metal", Rarity::Common, 12);
        economy.give("circuit_board", Rarity::Uncommon, 2);
        let vest = economy.mint("kevlar_vest", Rarity::Epic, 1);
        let vest_uid = vest.unique_id();
        economy.inventory_mut().try_add(vest).unwrap();
        economy.try_equip(vest_uid).unwrap();
        economy.inventory_mut().add_coins(77);
        economy
    }

    #[test]
    fn test_capture_and_restore() {
        let economy = session();
        let save = SaveData::capture(&economy);
        assert_eq!(save.equipped.len(), 1);
        assert_eq!(save.items.len(), 3);

        let json = save.to_json().unwrap();
        let loaded = SaveData::from_json(&json).unwrap();
        assert_eq!(loaded, save);

        let restored = Economy::restore(economy.data().clone(), &loaded).unwrap();
        assert_eq!(restored.inventory().coins(), 77);
        assert_eq!(restored.inventory().count_of("scrap_metal", Rarity::Common), 12);
        assert_eq!(
            restored.equipment().equipped(EquipSlot::Armor).unwrap().rarity(),
            Rarity::Epic
        );
        assert_eq!(restored.equipment().totals(), economy.equipment().totals());
        assert_eq!(restored.factory().next_uid(), economy.factory().next_uid());
        assert_eq!(SaveData::capture(&restored), save);
    }

    #[test]
    fn test_running_craft_survives_save() {
        let mut economy = session();
        economy.start_craft("repair_kit").unwrap();
        economy.tick(Duration::from_millis(500));

        let save = SaveData::capture(&economy);
        let mut restored = Economy::restore(economy.data().clone(), &save).unwrap();
        assert!(restored.crafting().is_crafting());
        assert!(restored.tick(Duration::from_millis(1500)).is_some());
        assert_eq!(restored.inventory().count_of("repair_kit", Rarity::Common), 1);
    }

    #[test]
    fn test_version_mismatch() {
        let mut save = SaveData::capture(&session());
        save.version = 99;
        let json = serde_json::to_string(&save).unwrap();
        assert!(matches!(
            SaveData::from_json(&json),
            Err(SaveError::VersionMismatch { expected: 1, found: 99 })
        ));
    }

    #[test]
    fn test_corrupt_saves_rejected() {
        let economy = session();
        let data = economy.data().clone();

        let mut duplicate = SaveData::capture(&economy);
        let first = duplicate.items[0].clone();
        duplicate.items.push(first);
        assert!(matches!(Economy::restore(data.clone(), &duplicate), Err(SaveError::InvalidData(_))));

        let mut unknown = SaveData::capture(&economy);
        unknown.items[0].item_type = "unobtainium".to_string();
        assert!(matches!(Economy::restore(data.clone(), &unknown), Err(SaveError::InvalidData(_))));

        let mut oversized = SaveData::capture(&economy);
        let scrap = oversized.items.iter_mut().find(|i| i.item_type == "scrap_metal").unwrap();
        scrap.stack_count = 500;
        assert!(matches!(Economy::restore(data, &oversized), Err(SaveError::InvalidData(_))));
    }

    #[test]
    fn test_save_to_and_load_from_path() {
        let economy = session();
        let path = std::env::temp_dir()
            .join(format!("gearworks_save_{}", std::process::id()))
            .join("slot_0.json");
        save_to_path(&economy, &path).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded, SaveData::capture(&economy));
        let _ = fs::remove_file(&path);
    }
}
