//! The per-device tick machine.
//!
//! # Lifecycle
//!
//! A device is `Inactive` until its redstone gate opens. On the tick the gate
//! opens it becomes `Active`; device types with `reset_on_activate` also set
//! their countdown to 1 so the very next decrement expires it.
//!
//! The validity precondition is sampled on every tick until something is
//! cached, whether or not the gate is open. While active, every tick then:
//!
//! 1. Decrements the countdown. Above zero, nothing else happens.
//! 2. At zero, re-seeds the countdown from the timing policy, then runs the
//!    action routine once. A device whose precondition fails consumes the
//!    cycle without acting.
//!
//! Client worlds are mirrors: ticking there is a no-op.

use crate::augment::{
    AttributeDefaults, Augment, AugmentError, AugmentSlots, DeviceAttributes, recompute_all,
    validate_augment,
};
use crate::config::DeviceConfig;
use crate::environment::EnvironmentSnapshot;
use crate::event::{DeviceEvent, EventLog};
use crate::filter::{ACCEPT_ALL, ItemFilter};
use crate::fixed::Ticks;
use crate::id::{DeviceId, DeviceTypeId, ItemTypeId};
use crate::item::{Inventory, ItemStack, StorageGroup};
use crate::position::BlockPos;
use crate::redstone::{RedstoneControl, RedstoneMode};
use crate::registry::{DeviceType, TimingMode};
use crate::routine::{RoutineReport, RoutineTarget};
use crate::timing::interval_from_snapshot;
use crate::validity::ValidityCache;
use crate::world::World;
use crate::xp::XpStorage;
use serde::{Deserialize, Serialize};

/// What a single call to [`Device::tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Client world; nothing ran.
    Mirrored,
    /// Gate closed.
    Idle,
    /// Countdown still running.
    Waiting,
    /// Countdown expired but the device is not valid.
    Wasted,
    /// Countdown expired and the routine ran.
    Acted(RoutineReport),
}

/// The primitive fields a host persists per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDeviceState {
    pub radius: i32,
    pub countdown: u32,
    pub validity_cached: bool,
    pub valid: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    type_id: DeviceTypeId,
    pos: BlockPos,
    active: bool,
    countdown: u32,
    defaults: AttributeDefaults,
    attributes: DeviceAttributes,
    augments: AugmentSlots,
    validity: ValidityCache,
    inventory: Inventory,
    xp: XpStorage,
    filter: ItemFilter,
    redstone: RedstoneControl,
}

impl Device {
    pub fn new(type_id: DeviceTypeId, ty: &DeviceType, pos: BlockPos, config: &DeviceConfig) -> Self {
        let defaults = ty.attribute_defaults(config);
        let attributes = recompute_all(&defaults, std::iter::empty());

        let layout = ty.inventory;
        let mut inventory = Inventory::new();
        inventory.add_slots(StorageGroup::Input, layout.input, layout.stack_limit);
        inventory.add_slots(StorageGroup::Accessible, layout.accessible, layout.stack_limit);
        inventory.add_slots(StorageGroup::Output, layout.output, layout.stack_limit);

        Self {
            type_id,
            pos,
            active: false,
            countdown: ty.initial_countdown.max(1),
            defaults,
            attributes,
            augments: AugmentSlots::new(ty.augment_slots),
            validity: ValidityCache::default(),
            inventory,
            xp: XpStorage::new(ty.base_xp_storage.saturating_mul(attributes.xp_storage_mult)),
            filter: ItemFilter::default(),
            redstone: RedstoneControl::default(),
        }
    }

    // -- Accessors --

    pub fn type_id(&self) -> DeviceTypeId {
        self.type_id
    }

    pub fn position(&self) -> BlockPos {
        self.pos
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Ticks until the next action.
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn radius(&self) -> i32 {
        self.attributes.radius
    }

    pub fn attributes(&self) -> &DeviceAttributes {
        &self.attributes
    }

    pub fn augments(&self) -> &AugmentSlots {
        &self.augments
    }

    pub fn validity(&self) -> ValidityCache {
        self.validity
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn xp(&self) -> &XpStorage {
        &self.xp
    }

    pub fn filter(&self) -> &ItemFilter {
        &self.filter
    }

    pub fn redstone(&self) -> RedstoneControl {
        self.redstone
    }

    /// The filter in force: the configured one while a filter augment is
    /// installed, otherwise accept-all.
    pub fn effective_filter(&self) -> &ItemFilter {
        if self.attributes.filter_feature {
            &self.filter
        } else {
            &ACCEPT_ALL
        }
    }

    /// Current cycle length. Environmental devices sample their surroundings;
    /// when the area is unavailable they report the base constant.
    pub fn time_constant<W: World + ?Sized>(&self, ty: &DeviceType, world: &W) -> u32 {
        match ty.timing {
            TimingMode::Fixed => ty.time_constant,
            TimingMode::Environmental { fluid, .. } => {
                EnvironmentSnapshot::sample(world, self.pos, self.attributes.radius, fluid)
                    .map(|snap| interval_from_snapshot(ty.time_constant, &snap, ty.bounds()))
                    .unwrap_or(ty.time_constant)
            }
        }
    }

    // -- Settings --

    pub fn set_filter(&mut self, filter: ItemFilter) {
        self.filter = filter;
    }

    pub fn set_redstone_mode(&mut self, mode: RedstoneMode) {
        self.redstone = RedstoneControl::new(mode);
    }

    /// Forget the cached validity; the next tick samples again.
    pub fn invalidate(&mut self) {
        self.validity.invalidate();
    }

    // -- Augments --

    /// Install `augment` into `slot`, returning the augment it replaced.
    /// Validation ignores whatever currently sits in `slot`, so swapping one
    /// filter for another is allowed.
    pub fn install_augment(
        &mut self,
        ty: &DeviceType,
        slot: usize,
        augment: Augment,
    ) -> Result<Option<Augment>, AugmentError> {
        self.augments.check(slot)?;
        if !validate_augment(
            &ty.augment_categories,
            &augment.data,
            self.augments.installed_except(slot),
        ) {
            return Err(AugmentError::Rejected(augment.data.category));
        }
        let previous = self.augments.put(slot, augment)?;
        self.recompute(ty);
        Ok(previous)
    }

    pub fn remove_augment(
        &mut self,
        ty: &DeviceType,
        slot: usize,
    ) -> Result<Option<Augment>, AugmentError> {
        let removed = self.augments.take(slot)?;
        if removed.is_some() {
            self.recompute(ty);
        }
        Ok(removed)
    }

    fn recompute(&mut self, ty: &DeviceType) {
        self.attributes = recompute_all(&self.defaults, self.augments.installed());
        self.xp.set_capacity(
            ty.base_xp_storage
                .saturating_mul(self.attributes.xp_storage_mult),
        );
    }

    // -- Storage --

    /// Insert from outside the device. Output slots refuse external
    /// insertion; the rest honour the effective filter.
    #[must_use = "leftover items must be returned to their source"]
    pub fn insert_item(
        &mut self,
        group: StorageGroup,
        stack: ItemStack,
        simulate: bool,
    ) -> Option<ItemStack> {
        if group == StorageGroup::Output {
            return Some(stack);
        }
        let filter = if self.attributes.filter_feature {
            &self.filter
        } else {
            &ACCEPT_ALL
        };
        self.inventory.insert(group, stack, filter, simulate)
    }

    /// Extract from outside the device. Input slots refuse extraction.
    pub fn extract_item(&mut self, group: StorageGroup, item_type: ItemTypeId, quantity: u32) -> u32 {
        if group == StorageGroup::Input {
            return 0;
        }
        self.inventory.extract(group, item_type, quantity)
    }

    pub fn extract_xp(&mut self, amount: u32) -> u32 {
        self.xp.extract_xp(amount, false)
    }

    // -- Tick --

    pub fn tick<W: World + ?Sized>(
        &mut self,
        id: DeviceId,
        ty: &DeviceType,
        world: &mut W,
        events: &mut EventLog,
        tick: Ticks,
    ) -> TickOutcome {
        if world.is_client() {
            return TickOutcome::Mirrored;
        }

        let gate = self.redstone.state(world.redstone_power(self.pos));
        if gate != self.active {
            self.active = gate;
            if gate {
                if ty.reset_on_activate {
                    self.countdown = 1;
                }
                tracing::debug!(?id, device_type = %ty.name, "device activated");
                events.push(DeviceEvent::Activated { device: id, tick });
            } else {
                tracing::debug!(?id, device_type = %ty.name, "device deactivated");
                events.push(DeviceEvent::Deactivated { device: id, tick });
            }
        }

        if let Some(rule) = &ty.validity
            && let Some(valid) = self.validity.refresh(&*world, self.pos, rule)
        {
            tracing::debug!(?id, valid, "validity sampled");
            events.push(DeviceEvent::ValiditySampled {
                device: id,
                valid,
                tick,
            });
        }

        if !self.active {
            return TickOutcome::Idle;
        }

        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return TickOutcome::Waiting;
        }

        self.countdown = self.time_constant(ty, &*world);
        tracing::debug!(?id, next = self.countdown, "cycle expired");

        if ty.validity.is_some() && !self.validity.is_valid() {
            tracing::debug!(?id, "cycle wasted on invalid device");
            events.push(DeviceEvent::CycleWasted { device: id, tick });
            return TickOutcome::Wasted;
        }

        let filter = if self.attributes.filter_feature {
            &self.filter
        } else {
            &ACCEPT_ALL
        };
        let target = RoutineTarget {
            inventory: &mut self.inventory,
            xp: if self.attributes.xp_storage_feature {
                Some(&mut self.xp)
            } else {
                None
            },
            filter,
            radius: self.attributes.radius,
            rolls: self.attributes.base_mod,
        };
        let report = ty.routine.run(world, self.pos, target);

        for stack in &report.collected {
            events.push(DeviceEvent::ItemsCollected {
                device: id,
                item_type: stack.item_type,
                quantity: stack.quantity,
                tick,
            });
        }
        for stack in &report.produced {
            events.push(DeviceEvent::LootProduced {
                device: id,
                item_type: stack.item_type,
                quantity: stack.quantity,
                tick,
            });
        }
        if report.xp_absorbed > 0 {
            events.push(DeviceEvent::XpAbsorbed {
                device: id,
                amount: report.xp_absorbed,
                tick,
            });
        }

        TickOutcome::Acted(report)
    }

    // -- Persistence --

    pub fn persisted(&self) -> PersistedDeviceState {
        let (validity_cached, valid) = self.validity.to_parts();
        PersistedDeviceState {
            radius: self.attributes.radius,
            countdown: self.countdown,
            validity_cached,
            valid,
            active: self.active,
        }
    }

    /// Restore persisted fields. The radius is re-derived from the installed
    /// augments rather than trusted. No catch-up: the countdown resumes where
    /// it stopped.
    pub fn restore(&mut self, ty: &DeviceType, state: PersistedDeviceState) {
        self.countdown = state.countdown.max(1);
        self.validity = ValidityCache::from_parts(state.validity_cached, state.valid);
        self.active = state.active;
        self.recompute(ty);
        if state.radius != self.attributes.radius {
            tracing::debug!(
                saved = state.radius,
                derived = self.attributes.radius,
                "persisted radius differs from augments"
            );
        }
    }
}
