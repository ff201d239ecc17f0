//! End-to-end economy scenarios through the public API.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use gearworks::crafting::CraftStart;
use gearworks::events::{EconomyEvent, RecordingObserver};
use gearworks::items::{ItemFilter, LootTable, SortMode};
use gearworks::save::SaveData;
use gearworks::{CraftError, Economy, EquipSlot, GameData, ItemUid, Rarity, WorldPosition};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn economy() -> (Economy, RecordingObserver) {
    let observer = RecordingObserver::new();
    let economy =
        Economy::with_seed(Arc::new(GameData::default()), 1234).with_observer(Box::new(observer.clone()));
    (economy, observer)
}

fn stock(economy: &mut Economy, item_type: &str, rarity: Rarity, count: u32) -> ItemUid {
    let item = economy.mint(item_type, rarity, count);
    let uid = item.unique_id();
    economy.inventory_mut().try_add(item).unwrap();
    uid
}

/// Every stored stack respects its type's limit, occupies its own slot within
/// capacity, and equipped items are off the grid
fn assert_invariants(economy: &Economy) {
    let catalog = &economy.data().items;
    let inventory = economy.inventory();
    assert!(inventory.count() <= inventory.capacity());

    let mut slots = BTreeSet::new();
    for item in inventory.items() {
        assert!(item.stack_count() >= 1);
        assert!(item.stack_count() <= catalog.max_stack(item.item_type()));
        assert!(!item.is_equipped());
        let slot = item.slot_index().expect("stored item has a slot");
        assert!(slot < inventory.capacity(), "slot {} outside capacity", slot);
        assert!(slots.insert(slot), "slot {} used twice", slot);
    }
    for (slot, item) in economy.equipment().items() {
        assert_eq!(item.equipped_slot(), Some(slot));
        assert!(!economy.inventory().contains(item.unique_id()));
    }
}

#[test]
fn farming_loop_keeps_invariants() {
    let (mut economy, _) = economy();
    for round in 0..40 {
        let table = if round % 10 == 9 { "oni_boss" } else { "scrap_drone" };
        let roll = economy.roll_loot(table).unwrap();
        economy.collect_loot(&roll, WorldPosition::new(round as f32, 0.0));
        assert_invariants(&economy);
    }

    let gear: Vec<ItemUid> = economy
        .inventory()
        .query(&ItemFilter::all(), SortMode::Rarity)
        .iter()
        .filter(|i| economy.data().items.get(i.item_type()).is_some_and(|d| d.is_equippable()))
        .map(|i| i.unique_id())
        .collect();
    for uid in gear {
        let _ = economy.try_equip(uid);
        assert_invariants(&economy);
    }
}

#[test]
fn full_inventory_spills_loot_into_world() {
    let (mut economy, observer) = economy();
    for _ in 0..30 {
        stock(&mut economy, "chrome_ring", Rarity::Common, 1);
    }
    assert!(economy.inventory().is_full());

    let delivery = economy.give("scrap_metal", Rarity::Common, 5);
    assert_eq!(delivery.stored, 0);
    assert_eq!(delivery.spilled, 5);
    assert_eq!(economy.inventory().count(), 30);
    assert_invariants(&economy);
    assert_eq!(
        observer.count(|e| matches!(e, EconomyEvent::LootSpawned { amount: 5, .. })),
        1
    );
}

#[test]
fn neon_samurai_set_steps_through_tiers() {
    let (mut economy, observer) = economy();
    let katana = stock(&mut economy, "samurai_katana_mod", Rarity::Common, 1);
    let visor = stock(&mut economy, "samurai_visor", Rarity::Common, 1);
    let plating = stock(&mut economy, "samurai_plating", Rarity::Common, 1);

    economy.try_equip(katana).unwrap();
    assert!(economy.equipment().active_sets().is_empty());

    economy.try_equip(visor).unwrap();
    let sets = economy.equipment().active_sets();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].tier.required_pieces, 2);

    economy.try_equip(plating).unwrap();
    let sets = economy.equipment().active_sets();
    assert_eq!(sets[0].tier.required_pieces, 3);
    assert_eq!(sets[0].tier.special_effect.as_deref(), Some("blade_dash"));

    let activations: Vec<u32> = observer
        .events()
        .iter()
        .filter_map(|e| match e {
            EconomyEvent::SetBonusActivated { required_pieces, .. } => Some(*required_pieces),
            _ => None,
        })
        .collect();
    assert_eq!(activations, vec![2, 3]);

    economy.unequip(EquipSlot::Armor).unwrap();
    economy.unequip(EquipSlot::WeaponMod1).unwrap();
    assert!(economy.equipment().active_sets().is_empty());
    assert_eq!(
        observer.count(|e| matches!(e, EconomyEvent::SetBonusDeactivated { .. })),
        1
    );
}

#[test]
fn craft_cancel_refunds_half_rounded_down() {
    let (mut economy, _) = economy();
    stock(&mut economy, "scrap_metal", Rarity::Common, 3);
    stock(&mut economy, "neon_crystal", Rarity::Uncommon, 3);
    economy.inventory_mut().add_coins(25);

    let started = economy.start_craft("chrome_ring").unwrap();
    assert!(matches!(started, CraftStart::Started { .. }));
    economy.tick(Duration::from_secs(1));
    assert!(economy.craft_progress() > 0.0);
    assert_eq!(
        economy.start_craft("chrome_ring"),
        Err(CraftError::AlreadyCrafting("chrome_ring".to_string()))
    );

    let refunded = economy.cancel_craft().unwrap();
    assert_eq!(refunded.iter().map(|r| r.amount).sum::<u32>(), 2);
    assert_eq!(economy.inventory().count_of("neon_crystal", Rarity::Uncommon), 1);
    assert_eq!(economy.inventory().count_of("scrap_metal", Rarity::Common), 1);
    assert_eq!(economy.inventory().coins(), 0);
    assert_eq!(economy.craft_remaining(), Duration::ZERO);
}

#[test]
fn inherited_rarity_follows_ingredients() {
    let data = GameData {
        config: {
            let mut config = GameData::default().config;
            config.crafting.inherit_upgrade_chance = 0.0;
            config
        },
        ..GameData::default()
    };
    let mut economy = Economy::with_seed(Arc::new(data), 9);
    stock(&mut economy, "scrap_metal", Rarity::Epic, 3);
    stock(&mut economy, "neon_crystal", Rarity::Epic, 3);
    economy.inventory_mut().add_coins(25);

    economy.start_craft("chrome_ring").unwrap();
    let crafted = economy.tick(Duration::from_secs(10)).unwrap();
    assert_eq!(crafted.rarity, Rarity::Epic);
}

#[test]
fn empty_boss_table_still_pays_out() {
    let data = GameData::default();
    let roller = data.loot_roller();
    let table = LootTable { guarantee_epic_on_boss: true, ..LootTable::default() };
    let mut rng = StdRng::seed_from_u64(77);
    for _ in 0..100 {
        let roll = roller.roll(&table, &0.0f32, &mut rng);
        assert_eq!(roll.results.len(), 1);
        assert!(roll.results[0].rarity >= Rarity::Epic);
    }
}

#[test]
fn session_survives_save_and_restore() {
    let (mut economy, _) = economy();
    for _ in 0..5 {
        let roll = economy.roll_loot("supply_cache").unwrap();
        economy.collect_loot(&roll, WorldPosition::default());
    }
    let ring = stock(&mut economy, "chrome_ring", Rarity::Rare, 1);
    economy.try_equip(ring).unwrap();

    let json = SaveData::capture(&economy).to_json().unwrap();
    let save = SaveData::from_json(&json).unwrap();
    let restored = Economy::restore(economy.data().clone(), &save).unwrap();

    assert_eq!(restored.inventory().coins(), economy.inventory().coins());
    assert_eq!(restored.inventory().count(), economy.inventory().count());
    assert_eq!(restored.bonus_luck_percent(), economy.bonus_luck_percent());
    assert_eq!(
        restored.equipment().equipped(EquipSlot::Accessory1).map(|i| i.unique_id()),
        Some(ring)
    );
    assert_invariants(&restored);
}
