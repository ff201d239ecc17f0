//! Gearworks - Demo
//!
//! Runs a short seeded session against the economy and logs what happens.
//!
//! Usage:
//!   gearworks [DATA_DIR]          load RON data (missing files use defaults)
//!   gearworks --export DATA_DIR   write the default data as RON and exit

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use gearworks::data::{export_default_data, load_from_dir};
use gearworks::items::{ItemFilter, SortMode};
use gearworks::{Economy, GameData, LoggingObserver, WorldPosition};

const DEMO_SEED: u64 = 0x6765_6172;
const TICK: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Gearworks demo v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let data = match args.as_slice() {
        [flag, dir] if flag == "--export" => {
            export_default_data(dir).with_context(|| format!("exporting data to {}", dir))?;
            return Ok(());
        }
        [flag] if flag == "--export" => bail!("--export needs a target directory"),
        [dir] => load_from_dir(dir).with_context(|| format!("loading data from {}", dir))?,
        [] => GameData::default(),
        _ => bail!("usage: gearworks [DATA_DIR] | --export DATA_DIR"),
    };

    run_session(Arc::new(data))
}

/// Seeded session: clear some trash, kill the boss, gear up and craft
fn run_session(data: Arc<GameData>) -> Result<()> {
    let mut economy = Economy::with_seed(data, DEMO_SEED).with_observer(Box::new(LoggingObserver));

    for (wave, table_id) in ["scrap_drone", "scrap_drone", "supply_cache", "scrap_drone", "oni_boss"]
        .iter()
        .enumerate()
    {
        let Some(roll) = economy.roll_loot(table_id) else {
            continue;
        };
        for drop in &roll.results {
            log::info!("  {} dropped {}x {} ({})", table_id, drop.amount, drop.item_type, drop.rarity.name());
        }
        economy.collect_loot(&roll, WorldPosition::new(wave as f32 * 10.0, 0.0));
    }

    // Wear the best piece for every slot
    let candidates: Vec<_> = economy
        .inventory()
        .query(&ItemFilter::all(), SortMode::Rarity)
        .iter()
        .filter(|item| {
            economy
                .data()
                .items
                .get(item.item_type())
                .is_some_and(|def| def.is_equippable())
        })
        .map(|item| item.unique_id())
        .collect();
    for uid in candidates {
        match economy.try_equip(uid) {
            Ok(slot) => log::info!("Equipped {} in {}", uid, slot.name()),
            Err(e) => log::debug!("Skipped {}: {}", uid, e),
        }
    }
    log::info!("Bonus luck from gear: {:.1}%", economy.bonus_luck_percent());

    // Learn any blueprints picked up along the way
    let blueprints: Vec<_> = economy
        .inventory()
        .items()
        .iter()
        .filter(|item| {
            economy
                .data()
                .items
                .get(item.item_type())
                .is_some_and(|def| !def.unlocks_recipes.is_empty())
        })
        .map(|item| item.unique_id())
        .collect();
    for uid in blueprints {
        economy.use_item(uid)?;
    }

    for recipe_id in ["repair_kit", "chrome_ring", "energy_drink"] {
        if let Err(e) = economy.can_craft(recipe_id) {
            log::info!("Cannot craft {}: {}", recipe_id, e);
            continue;
        }
        economy.start_craft(recipe_id)?;
        while economy.crafting().is_crafting() {
            economy.tick(TICK);
        }
    }

    let inventory = economy.inventory();
    log::info!(
        "Session over: {}/{} slots used, {} coins, {} sets active",
        inventory.count(),
        inventory.capacity(),
        inventory.coins(),
        economy.equipment().active_sets().len()
    );
    for item in inventory.query(&ItemFilter::all(), SortMode::Type) {
        log::info!(
            "  {:>3}x {} ({})",
            item.stack_count(),
            economy.data().items.display_name(item.item_type()),
            item.rarity().name()
        );
    }

    log::info!("Gearworks demo finished cleanly");
    Ok(())
}
