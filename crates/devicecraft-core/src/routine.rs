//! Per-cycle device actions.
//!
//! A device type names one [`ActionRoutine`]; the tick machine invokes it
//! exactly once per expired countdown. Routines never fail: anything that
//! does not fit stays where it was (collection) or is discarded (production).

use crate::filter::{ACCEPT_ALL, ItemFilter};
use crate::id::LootTableId;
use crate::item::{Inventory, ItemStack, StorageGroup};
use crate::position::{Aabb, BlockPos};
use crate::world::{EntityClass, World};
use crate::xp::XpStorage;
use serde::{Deserialize, Serialize};

/// What a device does when its countdown expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionRoutine {
    /// Pull dropped items and experience orbs from the surrounding area.
    Collect,
    /// Roll a loot table into the output slots.
    Produce { loot: LootTableId },
}

/// Storage and settings a routine may touch on its device.
#[derive(Debug)]
pub struct RoutineTarget<'a> {
    pub inventory: &'a mut Inventory,
    /// `Some` while the experience feature is enabled.
    pub xp: Option<&'a mut XpStorage>,
    pub filter: &'a ItemFilter,
    pub radius: i32,
    /// Loot rolls per production cycle.
    pub rolls: u32,
}

/// What one routine invocation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutineReport {
    /// Stacks moved into the device, in collection order. Partial pickups
    /// report only the moved quantity.
    pub collected: Vec<ItemStack>,
    /// Stacks that fully fit into the output slots.
    pub produced: Vec<ItemStack>,
    /// Items rolled but discarded for lack of space.
    pub discarded: u32,
    pub xp_absorbed: u32,
    /// Entities removed from the world.
    pub entities_removed: u32,
}

impl ActionRoutine {
    pub fn run<W: World + ?Sized>(
        &self,
        world: &mut W,
        pos: BlockPos,
        target: RoutineTarget<'_>,
    ) -> RoutineReport {
        let mut report = RoutineReport::default();
        match *self {
            ActionRoutine::Collect => collect(world, pos, target, &mut report),
            ActionRoutine::Produce { loot } => produce(world, loot, target, &mut report),
        }
        report
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Area swept by a collector of the given radius: from
/// `(x - r, y - 1, z - r)` to `(x + 1 + r, y + 1 + r, z + 1 + r)`.
pub fn collection_area(pos: BlockPos, radius: i32) -> Aabb {
    let r = radius.max(0);
    Aabb::from_corners(pos.offset(-r, -1, -r), pos.offset(1 + r, 1 + r, 1 + r))
}

fn collect<W: World + ?Sized>(
    world: &mut W,
    pos: BlockPos,
    target: RoutineTarget<'_>,
    report: &mut RoutineReport,
) {
    let area = collection_area(pos, target.radius);
    collect_items(world, &area, target.inventory, target.filter, report);
    if let Some(xp) = target.xp {
        collect_xp(world, &area, xp, report);
    }
}

/// Move eligible item entities inside `area` into the accessible slots.
pub fn collect_items<W: World + ?Sized>(
    world: &mut W,
    area: &Aabb,
    inventory: &mut Inventory,
    filter: &ItemFilter,
    report: &mut RoutineReport,
) {
    for id in world.entities_within(area, EntityClass::Item) {
        let Some(entity) = world.entity(id) else {
            continue;
        };
        let Some(item) = entity.as_item() else {
            continue;
        };
        if !entity.alive || !item.can_be_collected() || !filter.accepts(item.stack.item_type) {
            continue;
        }
        let stack = item.stack;

        match inventory.insert(StorageGroup::Accessible, stack, filter, false) {
            None => {
                tracing::trace!(?id, item = ?stack.item_type, qty = stack.quantity, "collected item");
                world.remove_entity(id);
                report.collected.push(stack);
                report.entities_removed += 1;
            }
            Some(rest) if rest.quantity < stack.quantity => {
                tracing::trace!(?id, left = rest.quantity, "partially collected item");
                if let Some(item) = world.entity_mut(id).and_then(|e| e.as_item_mut()) {
                    item.stack = rest;
                }
                report
                    .collected
                    .push(ItemStack::new(stack.item_type, stack.quantity - rest.quantity));
            }
            Some(_) => {}
        }
    }
}

/// Drain experience orbs inside `area` into `xp`.
pub fn collect_xp<W: World + ?Sized>(
    world: &mut W,
    area: &Aabb,
    xp: &mut XpStorage,
    report: &mut RoutineReport,
) {
    for id in world.entities_within(area, EntityClass::Orb) {
        let Some(orb) = world.entity_mut(id).and_then(|e| e.as_orb_mut()) else {
            continue;
        };
        let absorbed = xp.receive_xp(orb.value, false);
        orb.value -= absorbed;
        let spent = orb.value == 0;
        report.xp_absorbed += absorbed;
        if spent {
            world.remove_entity(id);
            report.entities_removed += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Production
// ---------------------------------------------------------------------------

fn produce<W: World + ?Sized>(
    world: &mut W,
    table: LootTableId,
    target: RoutineTarget<'_>,
    report: &mut RoutineReport,
) {
    let mut caught = false;
    for _ in 0..target.rolls.max(1) {
        for stack in world.roll_loot(table) {
            // The output group is filled internally and ignores the filter.
            match target
                .inventory
                .insert(StorageGroup::Output, stack, &ACCEPT_ALL, false)
            {
                None => {
                    caught = true;
                    report.produced.push(stack);
                }
                Some(rest) => {
                    report.discarded += rest.quantity;
                    if rest.quantity < stack.quantity {
                        report
                            .produced
                            .push(ItemStack::new(stack.item_type, stack.quantity - rest.quantity));
                    }
                }
            }
        }
    }

    if caught && let Some(xp) = target.xp {
        let bonus = 1 + world.rng().next_bounded(3);
        report.xp_absorbed += xp.receive_xp(bonus, false);
    }
}
