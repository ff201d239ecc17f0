//! RON data loader
//!
//! Loads game data from a directory of RON files, with fallback to the
//! built-in reference data for any file that is missing.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::GameData;
use crate::error::ConfigError;

pub const ECONOMY_FILE: &str = "economy.ron";
pub const ITEMS_FILE: &str = "items.ron";
pub const SETS_FILE: &str = "sets.ron";
pub const RECIPES_FILE: &str = "recipes.ron";
pub const LOOT_TABLES_FILE: &str = "loot_tables.ron";

/// Load and validate game data from `dir`
///
/// Missing files use the reference data. A file that exists but cannot be
/// read, parsed or validated is an error.
pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<GameData, ConfigError> {
    let dir = dir.as_ref();
    let defaults = GameData::default();

    let config = load_file(&dir.join(ECONOMY_FILE), || defaults.config.clone())?;
    let items = load_file(&dir.join(ITEMS_FILE), || defaults.items.clone())?;
    let sets = load_file(&dir.join(SETS_FILE), || defaults.sets.clone())?;
    let recipes = load_file(&dir.join(RECIPES_FILE), || defaults.recipes.clone())?;
    let loot_tables = load_file(&dir.join(LOOT_TABLES_FILE), || defaults.loot_tables.clone())?;

    let data = GameData::new(config, items, sets, recipes, loot_tables)?;
    log::info!(
        "Loaded game data from {}: {} items, {} recipes",
        dir.display(),
        data.items.len(),
        data.recipes.len()
    );
    Ok(data)
}

fn load_file<T: DeserializeOwned>(path: &Path, fallback: impl FnOnce() -> T) -> Result<T, ConfigError> {
    if !path.exists() {
        log::info!("{} not found, using built-in defaults", path.display());
        return Ok(fallback());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Export all default data to RON files for easy editing
pub fn export_default_data(dir: impl AsRef<Path>) -> Result<(), ConfigError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let data = GameData::default();
    write_file(&dir.join(ECONOMY_FILE), &data.config)?;
    write_file(&dir.join(ITEMS_FILE), &data.items)?;
    write_file(&dir.join(SETS_FILE), &data.sets)?;
    write_file(&dir.join(RECIPES_FILE), &data.recipes)?;
    write_file(&dir.join(LOOT_TABLES_FILE), &data.loot_tables)?;
    log::info!("Exported default game data to {}", dir.display());
    Ok(())
}

fn write_file<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())?;
    fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gearworks_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_export_then_load() {
        let dir = scratch_dir("export");
        export_default_data(&dir).unwrap();
        for file in [ECONOMY_FILE, ITEMS_FILE, SETS_FILE, RECIPES_FILE, LOOT_TABLES_FILE] {
            assert!(dir.join(file).exists(), "{} not created", file);
        }

        let loaded = load_from_dir(&dir).unwrap();
        assert_eq!(loaded, GameData::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_files_fall_back() {
        let dir = scratch_dir("missing");
        let loaded = load_from_dir(&dir).unwrap();
        assert_eq!(loaded.items.len(), GameData::default().items.len());
    }

    #[test]
    fn test_partial_override() {
        let dir = scratch_dir("partial");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(ECONOMY_FILE), "(inventory_rows: 2, inventory_columns: 4)").unwrap();

        let loaded = load_from_dir(&dir).unwrap();
        assert_eq!(loaded.config.inventory_capacity(), 8);
        assert_eq!(loaded.recipes, GameData::default().recipes);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bad_file_fails_loudly() {
        let dir = scratch_dir("bad");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(ITEMS_FILE), "{ not ron").unwrap();
        assert!(matches!(load_from_dir(&dir), Err(ConfigError::Parse { .. })));

        fs::write(dir.join(ITEMS_FILE), "{}").unwrap();
        // Recipes now point at items that do not exist
        assert!(matches!(load_from_dir(&dir), Err(ConfigError::Recipe { .. })));
        let _ = fs::remove_dir_all(&dir);
    }
}
