//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::augment::{AugmentCategory, AugmentData};
use crate::config::DeviceConfig;
use crate::engine::Engine;
use crate::environment::adjacent_cells;
use crate::grid_world::GridWorld;
use crate::id::*;
use crate::item::ItemStack;
use crate::loot::{LootEntry, LootTable};
use crate::position::{BlockPos, Vec3};
use crate::registry::{DeviceType, Registry, RegistryBuilder};
use crate::world::{Fluid, FluidState};

// ===========================================================================
// World helpers
// ===========================================================================

/// Put water sources into the first `sides` cells of `adjacent_cells(pos)`
/// (below, then north, south, west, east).
pub fn pond(world: &mut GridWorld, pos: BlockPos, sides: usize) {
    for cell in adjacent_cells(pos).iter().take(sides) {
        world.set_fluid(*cell, FluidState::Source(Fluid::Water));
    }
}

/// Fill the whole density-scan box of a fisher at `pos` with water, except
/// the device's own block.
pub fn lake(world: &mut GridWorld, pos: BlockPos, radius: i32) {
    world.fill_fluid(
        pos.offset(-radius, 1 - radius, -radius),
        pos.offset(radius, 0, radius),
        FluidState::Source(Fluid::Water),
    );
    world.set_fluid(pos, FluidState::Empty);
}

/// Single-entry loot table: one of `item` per roll.
pub fn fishing_table(world: &mut GridWorld, item: ItemTypeId) -> LootTableId {
    world.loot_tables_mut().register(LootTable {
        name: "fishing".to_string(),
        picks: 1,
        entries: vec![LootEntry {
            item_type: item,
            weight: 1,
            min_count: 1,
            max_count: 1,
        }],
    })
}

/// Drop `stack` on the block at `pos`, centered.
pub fn drop_item(world: &mut GridWorld, pos: BlockPos, stack: ItemStack) -> EntityId {
    world.spawn_item(block_center(pos), stack)
}

pub fn block_center(pos: BlockPos) -> Vec3 {
    Vec3::from_f64(pos.x as f64 + 0.5, pos.y as f64, pos.z as f64 + 0.5)
}

// ===========================================================================
// Registry and engine
// ===========================================================================

/// Ids of everything [`test_registry`] registers.
#[derive(Debug, Clone, Copy)]
pub struct TestIds {
    pub cod: ItemTypeId,
    pub salmon: ItemTypeId,
    pub pufferfish: ItemTypeId,
    /// Area effect, radius +1.
    pub range_augment: ItemTypeId,
    /// Filter feature.
    pub filter_augment: ItemTypeId,
    /// Upgrade: base multiplier 2, experience capacity x2.
    pub upgrade_augment: ItemTypeId,
    pub collector: DeviceTypeId,
    pub fisher: DeviceTypeId,
    /// A fisher whose first cycle expires on its first tick.
    pub quick_fisher: DeviceTypeId,
    pub fishing: LootTableId,
}

pub struct TestSetup {
    pub engine: Engine,
    pub ids: TestIds,
}

/// Registry with the collector, the fisher and a few items. `fishing` is
/// the fisher's loot table id.
pub fn test_registry(fishing: LootTableId) -> (Registry, TestIds) {
    let mut b = RegistryBuilder::new();
    let cod = b.register_item("cod").unwrap();
    let salmon = b.register_item("salmon").unwrap();
    let pufferfish = b.register_item("pufferfish").unwrap();
    let range_augment = b
        .register_augment(
            "range_augment",
            AugmentData {
                radius: 1,
                ..AugmentData::new(AugmentCategory::AreaEffect)
            },
        )
        .unwrap();
    let mut filter = AugmentData::new(AugmentCategory::Filter);
    filter.features.filter = true;
    let filter_augment = b.register_augment("filter_augment", filter).unwrap();
    let upgrade_augment = b
        .register_augment(
            "upgrade_augment",
            AugmentData {
                base_mod: 2,
                xp_storage: 2,
                ..AugmentData::new(AugmentCategory::Upgrade)
            },
        )
        .unwrap();
    let collector = b.register_device_type(DeviceType::collector()).unwrap();
    let fisher = b.register_device_type(DeviceType::fisher(fishing)).unwrap();
    let quick_fisher = b
        .register_device_type(DeviceType {
            name: "quick_fisher".to_string(),
            initial_countdown: 1,
            ..DeviceType::fisher(fishing)
        })
        .unwrap();
    let registry = b.build().unwrap();

    let ids = TestIds {
        cod,
        salmon,
        pufferfish,
        range_augment,
        filter_augment,
        upgrade_augment,
        collector,
        fisher,
        quick_fisher,
        fishing,
    };
    (registry, ids)
}

/// A server-side engine whose fisher always catches one cod.
pub fn setup(seed: u64) -> TestSetup {
    setup_with(GridWorld::new(seed), DeviceConfig { seed, ..DeviceConfig::default() })
}

pub fn setup_with(mut world: GridWorld, config: DeviceConfig) -> TestSetup {
    // Item ids are assigned in registration order, so cod is always 0.
    let fishing = fishing_table(&mut world, ItemTypeId(0));
    let (registry, ids) = test_registry(fishing);
    TestSetup {
        engine: Engine::new(registry, world, config),
        ids,
    }
}
