//! End-to-end device scenarios through the public engine API.

use devicecraft_core::config::DeviceConfig;
use devicecraft_core::event::{DeviceEvent, EventKind};
use devicecraft_core::filter::ItemFilter;
use devicecraft_core::grid_world::GridWorld;
use devicecraft_core::item::{ItemStack, StorageGroup};
use devicecraft_core::position::BlockPos;
use devicecraft_core::redstone::RedstoneMode;
use devicecraft_core::test_utils::*;
use devicecraft_core::world::{Biome, World};

const ORIGIN: BlockPos = BlockPos::new(0, 64, 0);

// ===========================================================================
// Fisher timing
// ===========================================================================

#[test]
fn fisher_time_constant_by_environment() {
    let TestSetup { mut engine, ids } = setup(1);
    let id = engine.place_device(ids.fisher, ORIGIN).unwrap();
    assert_eq!(engine.time_constant(id), Some(7200));

    engine.world.set_default_biome(Biome::OCEAN);
    assert_eq!(engine.time_constant(id), Some(2400));

    engine.world.set_default_biome(Biome {
        ocean: true,
        river: true,
        precipitation: true,
    });
    assert_eq!(engine.time_constant(id), Some(1200));

    engine.world.set_raining(true);
    assert_eq!(engine.time_constant(id), Some(600));
}

#[test]
fn fisher_density_shortens_cycle() {
    let TestSetup { mut engine, ids } = setup(1);
    let id = engine.place_device(ids.fisher, ORIGIN).unwrap();
    lake(&mut engine.world, ORIGIN, 2);
    // 5 x 2 x 5 box minus the device block.
    assert_eq!(engine.time_constant(id), Some(7200 - 20 * 49));
}

#[test]
fn range_augment_widens_density_scan() {
    let TestSetup { mut engine, ids } = setup(1);
    let id = engine.place_device(ids.fisher, ORIGIN).unwrap();
    lake(&mut engine.world, ORIGIN, 3);
    let narrow = engine.time_constant(id).unwrap();
    engine.insert_augment(id, 0, ids.range_augment).unwrap();
    assert_eq!(engine.radius(id), Some(3));
    let wide = engine.time_constant(id).unwrap();
    assert!(wide < narrow);
}

#[test]
fn desert_rain_does_not_count() {
    let TestSetup { mut engine, ids } = setup(1);
    let id = engine.place_device(ids.fisher, ORIGIN).unwrap();
    engine.world.set_default_biome(Biome::DESERT);
    engine.world.set_raining(true);
    assert_eq!(engine.time_constant(id), Some(7200));
}

// ===========================================================================
// Fisher production
// ===========================================================================

#[test]
fn fisher_catches_after_half_cycle() {
    let TestSetup { mut engine, ids } = setup(3);
    pond(&mut engine.world, ORIGIN, 2);
    let id = engine.place_device(ids.fisher, ORIGIN).unwrap();

    let summary = engine.run(3599);
    assert_eq!(summary.acted, 0);
    let summary = engine.run(1);
    assert_eq!(summary.acted, 1);

    let device = engine.device(id).unwrap();
    assert_eq!(device.inventory().quantity(ids.cod), 1);
    // Two pond sources sit inside the density scan.
    assert_eq!(device.countdown(), 7160);
    assert!((1..=3).contains(&device.xp().stored()));
}

#[test]
fn upgrade_rolls_loot_multiple_times() {
    let TestSetup { mut engine, ids } = setup(3);
    pond(&mut engine.world, ORIGIN, 2);
    let id = engine.place_device(ids.fisher, ORIGIN).unwrap();
    engine.insert_augment(id, 0, ids.upgrade_augment).unwrap();
    engine.run(3600);
    let device = engine.device(id).unwrap();
    assert_eq!(device.inventory().quantity(ids.cod), 2);
    assert_eq!(device.xp().capacity(), 5000);
}

#[test]
fn dry_fisher_wastes_cycles() {
    let TestSetup { mut engine, ids } = setup(3);
    pond(&mut engine.world, ORIGIN, 1);
    let id = engine.place_device(ids.fisher, ORIGIN).unwrap();
    let summary = engine.run(3600);
    assert_eq!(summary.wasted, 1);
    assert_eq!(summary.acted, 0);
    assert_eq!(engine.device(id).unwrap().inventory().total(), 0);

    let kinds: Vec<EventKind> = engine.drain_events().iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Activated,
            EventKind::ValiditySampled,
            EventKind::CycleWasted
        ]
    );
}

#[test]
fn validity_waits_for_loaded_chunks() {
    let mut world = GridWorld::new(5);
    world.track_loaded_chunks();
    let TestSetup { mut engine, ids } = setup_with(world, DeviceConfig::default());
    let pos = BlockPos::new(8, 64, 8);
    pond(&mut engine.world, pos, 2);
    let id = engine.place_device(ids.fisher, pos).unwrap();

    engine.run(10);
    assert!(!engine.device(id).unwrap().validity().is_cached());
    assert_eq!(engine.time_constant(id), Some(7200));

    engine.world.load_chunk(0, 0);
    engine.step();
    assert!(engine.device(id).unwrap().validity().is_valid());
}

#[test]
fn unloaded_chunk_freezes_devices() {
    let mut world = GridWorld::new(5);
    world.track_loaded_chunks();
    let TestSetup { mut engine, ids } = setup_with(world, DeviceConfig::default());
    let fisher_pos = BlockPos::new(8, 64, 8);
    pond(&mut engine.world, fisher_pos, 2);
    let fisher = engine.place_device(ids.fisher, fisher_pos).unwrap();
    let collector_pos = BlockPos::new(40, 64, 8);
    let collector = engine.place_device(ids.collector, collector_pos).unwrap();
    let e = drop_item(&mut engine.world, collector_pos.offset(1, 0, 1), ItemStack::new(ids.cod, 3));

    let summary = engine.run(100);
    assert_eq!(summary.unloaded, 200);
    assert_eq!((summary.acted, summary.wasted), (0, 0));
    assert_eq!(engine.device(fisher).unwrap().countdown(), 3600);
    assert!(!engine.device(fisher).unwrap().validity().is_cached());
    assert_eq!(engine.device(collector).unwrap().countdown(), 1);
    assert!(engine.world.entity(e).is_some());
    assert_eq!(engine.device(collector).unwrap().inventory().quantity(ids.cod), 0);

    // Only the fisher's chunk comes back; the missed ticks are not replayed.
    engine.world.load_chunk(0, 0);
    engine.run(100);
    assert_eq!(engine.device(fisher).unwrap().countdown(), 3500);
    assert!(engine.world.entity(e).is_some());

    engine.world.unload_chunk(0, 0);
    engine.run(1000);
    assert_eq!(engine.device(fisher).unwrap().countdown(), 3500);

    engine.world.load_chunk(2, 0);
    let summary = engine.step();
    assert_eq!(summary.acted, 1);
    assert_eq!(summary.unloaded, 1);
    assert!(engine.world.entity(e).is_none());
    assert_eq!(engine.device(collector).unwrap().inventory().quantity(ids.cod), 3);
}

// ===========================================================================
// Collector
// ===========================================================================

#[test]
fn collector_picks_up_on_first_tick() {
    let TestSetup { mut engine, ids } = setup(1);
    let e = drop_item(&mut engine.world, ORIGIN.offset(3, 0, -2), ItemStack::new(ids.salmon, 12));
    let id = engine.place_device(ids.collector, ORIGIN).unwrap();

    engine.step();
    assert!(engine.world.entity(e).is_none());
    assert_eq!(engine.device(id).unwrap().inventory().quantity(ids.salmon), 12);
}

#[test]
fn collector_ignores_items_out_of_range() {
    let TestSetup { mut engine, ids } = setup(1);
    let far = drop_item(&mut engine.world, ORIGIN.offset(6, 0, 0), ItemStack::new(ids.cod, 1));
    let below = drop_item(&mut engine.world, ORIGIN.offset(0, -2, 0), ItemStack::new(ids.cod, 1));
    engine.place_device(ids.collector, ORIGIN).unwrap();
    engine.run(40);
    assert!(engine.world.entity(far).is_some());
    assert!(engine.world.entity(below).is_some());
}

#[test]
fn full_collector_leaves_entity_unchanged() {
    let TestSetup { mut engine, ids } = setup(1);
    let id = engine.place_device(ids.collector, ORIGIN).unwrap();
    for _ in 0..15 {
        let rest = engine
            .insert_item(id, StorageGroup::Accessible, ItemStack::new(ids.pufferfish, 64))
            .unwrap();
        assert!(rest.is_none());
    }
    let e = drop_item(&mut engine.world, ORIGIN.offset(1, 0, 1), ItemStack::new(ids.cod, 8));
    engine.run(25);
    let stack = engine.world.entity(e).and_then(|e| e.as_item()).map(|i| i.stack);
    assert_eq!(stack, Some(ItemStack::new(ids.cod, 8)));
}

#[test]
fn conveyor_items_need_demagnetize() {
    let TestSetup { mut engine, ids } = setup(1);
    let e = drop_item(&mut engine.world, ORIGIN.offset(1, 0, 0), ItemStack::new(ids.cod, 2));
    if let Some(item) = engine.world.entity_mut(e).and_then(|e| e.as_item_mut()) {
        item.on_conveyor = true;
    }
    engine.place_device(ids.collector, ORIGIN).unwrap();
    engine.step();
    assert!(engine.world.entity(e).is_some());

    if let Some(item) = engine.world.entity_mut(e).and_then(|e| e.as_item_mut()) {
        item.demagnetize = true;
    }
    engine.run(20);
    assert!(engine.world.entity(e).is_none());
}

#[test]
fn filter_applies_only_with_augment() {
    let TestSetup { mut engine, ids } = setup(1);
    let id = engine.place_device(ids.collector, ORIGIN).unwrap();
    engine.set_filter(id, ItemFilter::allow([ids.salmon])).unwrap();
    engine.insert_augment(id, 0, ids.filter_augment).unwrap();

    let cod = drop_item(&mut engine.world, ORIGIN.offset(1, 0, 0), ItemStack::new(ids.cod, 2));
    let salmon = drop_item(&mut engine.world, ORIGIN.offset(-1, 0, 0), ItemStack::new(ids.salmon, 2));
    engine.step();
    assert!(engine.world.entity(cod).is_some());
    assert!(engine.world.entity(salmon).is_none());

    engine.remove_augment(id, 0).unwrap();
    engine.run(20);
    assert!(engine.world.entity(cod).is_none());
}

#[test]
fn collector_absorbs_orbs() {
    let TestSetup { mut engine, ids } = setup(1);
    let id = engine.place_device(ids.collector, ORIGIN).unwrap();
    let orb = engine.world.spawn_orb(block_center(ORIGIN.offset(2, 1, 2)), 30);
    engine.step();
    assert!(engine.world.entity(orb).is_none());
    assert_eq!(engine.device(id).unwrap().xp().stored(), 30);
    assert_eq!(engine.extract_xp(id, 100).unwrap(), 30);
}

#[test]
fn xp_feature_off_leaves_orbs() {
    let config = DeviceConfig {
        xp_storage_feature: false,
        ..DeviceConfig::default()
    };
    let TestSetup { mut engine, ids } = setup_with(GridWorld::new(1), config);
    engine.place_device(ids.collector, ORIGIN).unwrap();
    let orb = engine.world.spawn_orb(block_center(ORIGIN.offset(2, 1, 2)), 30);
    engine.step();
    assert!(engine.world.entity(orb).is_some());
}

#[test]
fn redstone_high_waits_for_power() {
    let TestSetup { mut engine, ids } = setup(1);
    let id = engine.place_device(ids.collector, ORIGIN).unwrap();
    engine.set_redstone_mode(id, RedstoneMode::High).unwrap();
    let e = drop_item(&mut engine.world, ORIGIN.offset(1, 0, 0), ItemStack::new(ids.cod, 1));

    engine.run(50);
    assert!(engine.world.entity(e).is_some());
    assert!(!engine.device(id).unwrap().is_active());

    engine.world.set_redstone_power(ORIGIN, 7);
    let summary = engine.step();
    assert_eq!(summary.acted, 1);
    assert!(engine.world.entity(e).is_none());
}

#[test]
fn client_engine_never_acts() {
    let TestSetup { mut engine, ids } = setup_with(GridWorld::new_client(1), DeviceConfig::default());
    let e = drop_item(&mut engine.world, ORIGIN.offset(1, 0, 0), ItemStack::new(ids.cod, 1));
    let id = engine.place_device(ids.collector, ORIGIN).unwrap();
    let summary = engine.run(100);
    assert_eq!(summary.acted, 0);
    assert!(engine.world.entity(e).is_some());
    assert!(!engine.device(id).unwrap().is_active());
    assert!(engine.drain_events().is_empty());
}

#[test]
fn collected_events_name_the_device() {
    let TestSetup { mut engine, ids } = setup(1);
    let id = engine.place_device(ids.collector, ORIGIN).unwrap();
    drop_item(&mut engine.world, ORIGIN.offset(1, 0, 0), ItemStack::new(ids.cod, 3));
    engine.suppress_event(EventKind::Activated);
    engine.step();
    let events = engine.drain_events();
    assert_eq!(
        events,
        vec![DeviceEvent::ItemsCollected {
            device: id,
            item_type: ids.cod,
            quantity: 3,
            tick: 0,
        }]
    );
}
