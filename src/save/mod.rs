//! Save/load system
//!
//! Snapshots an economy to JSON and rebuilds it later.

pub mod save_game;

pub use save_game::{load_from_path, save_to_path, SaveData, SavedEquip, SavedItem, SAVE_VERSION};
