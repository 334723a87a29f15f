//! The demo layout: a fisher on a lake, a dry fisher, and a collector
//! sitting in a field of dropped loot.

use devicecraft_core::engine::{Engine, EngineError};
use devicecraft_core::id::DeviceId;
use devicecraft_core::item::ItemStack;
use devicecraft_core::position::BlockPos;
use devicecraft_core::world::{Fluid, FluidState};

pub struct Scene {
    pub lake_fisher: DeviceId,
    pub dry_fisher: DeviceId,
    pub collector: DeviceId,
}

/// Fill the box around `pos` with water sources, leaving `pos` itself dry.
fn flood(engine: &mut Engine, pos: BlockPos, radius: i32) {
    engine.world.fill_fluid(
        pos.offset(-radius, 1 - radius, -radius),
        pos.offset(radius, 0, radius),
        FluidState::Source(Fluid::Water),
    );
    engine.world.set_fluid(pos, FluidState::Empty);
}

pub fn build(engine: &mut Engine) -> Result<Scene, EngineError> {
    let lake_pos = BlockPos::new(0, 64, 0);
    flood(engine, lake_pos, 2);
    let lake_fisher = engine.place_device_named("fisher", lake_pos)?;

    // One source is not enough to fish.
    let dry_pos = BlockPos::new(-20, 64, 0);
    engine
        .world
        .set_fluid(dry_pos.offset(1, 0, 0), FluidState::Source(Fluid::Water));
    let dry_fisher = engine.place_device_named("fisher", dry_pos)?;

    let field = BlockPos::new(20, 64, 0);
    let collector = engine.place_device_named("collector", field)?;
    let drops: Vec<_> = ["cod", "salmon", "pufferfish", "string"]
        .into_iter()
        .enumerate()
        .filter_map(|(i, name)| {
            let item = engine.registry().item_id(name);
            if item.is_none() {
                tracing::warn!(item = name, "demo item missing from data, skipped");
            }
            item.map(|item| (i, item))
        })
        .collect();
    for (i, item) in drops {
        let offset = i as i32 - 2;
        engine.world.spawn_item(
            field.offset(offset, 0, offset).center(),
            ItemStack::new(item, 4 + i as u32),
        );
    }
    for value in [3, 7, 11] {
        engine.world.spawn_orb(field.offset(value % 4, 1, -1).center(), value as u32);
    }

    if let Some(range) = engine.registry().item_id("range_augment") {
        engine.insert_augment(collector, 0, range)?;
    }

    tracing::info!(devices = engine.device_count(), "demo scene built");
    Ok(Scene {
        lake_fisher,
        dry_fisher,
        collector,
    })
}
