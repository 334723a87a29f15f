//! The simulation engine: owns the world and every placed device.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - A [`GridWorld`] (fluids, biomes, weather, redstone, loose entities, loot)
//! - The frozen [`Registry`] of device types and items
//! - All devices, keyed by [`DeviceId`] in a slotmap
//! - A [`SimState`] tick counter and an [`EventLog`]
//!
//! Each `step()` ticks every device once, in slotmap iteration order, then
//! advances the clock and recomputes the state hash. Devices whose type is
//! missing from the registry are skipped.

use crate::augment::{Augment, AugmentError};
use crate::config::DeviceConfig;
use crate::device::{Device, TickOutcome};
use crate::environment::adjacent_cells;
use crate::event::{DeviceEvent, EventKind, EventLog, PassiveListener};
use crate::filter::ItemFilter;
use crate::grid_world::GridWorld;
use crate::id::{DeviceId, DeviceTypeId, ItemTypeId};
use crate::item::{ItemStack, StorageGroup};
use crate::position::BlockPos;
use crate::redstone::RedstoneMode;
use crate::registry::{DeviceType, Registry};
use crate::sim::{SimState, StateHash};
use crate::world::{EntityKind, World};
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown device {0:?}")]
    UnknownDevice(DeviceId),
    #[error("unknown device type {0:?}")]
    UnknownDeviceType(DeviceTypeId),
    #[error("unknown device type name '{0}'")]
    UnknownDeviceTypeName(String),
    #[error("position {0:?} already holds a device")]
    Occupied(BlockPos),
    #[error(transparent)]
    Augment(#[from] AugmentError),
}

// ---------------------------------------------------------------------------
// Step summary
// ---------------------------------------------------------------------------

/// Counts of what happened during one or more steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    pub steps: u64,
    /// Device ticks that ran the routine.
    pub acted: u64,
    /// Device ticks whose cycle expired on an invalid device.
    pub wasted: u64,
    /// Device ticks skipped because the device's chunk was not loaded.
    pub unloaded: u64,
}

impl StepSummary {
    fn absorb(&mut self, other: StepSummary) {
        self.steps += other.steps;
        self.acted += other.acted;
        self.wasted += other.wasted;
        self.unloaded += other.unloaded;
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Engine {
    /// The world devices live in. Hosts edit it freely between steps.
    pub world: GridWorld,
    pub(crate) registry: Registry,
    pub(crate) config: DeviceConfig,
    pub(crate) devices: SlotMap<DeviceId, Device>,
    pub sim_state: SimState,
    pub(crate) paused: bool,
    pub(crate) last_state_hash: u64,
    pub events: EventLog,
}

impl Engine {
    pub fn new(registry: Registry, world: GridWorld, config: DeviceConfig) -> Self {
        Self {
            world,
            registry,
            config,
            devices: SlotMap::with_key(),
            sim_state: SimState::new(),
            paused: false,
            last_state_hash: 0,
            events: EventLog::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Device management
    // -----------------------------------------------------------------------

    /// Place a new device of `type_id` at `pos`.
    pub fn place_device(
        &mut self,
        type_id: DeviceTypeId,
        pos: BlockPos,
    ) -> Result<DeviceId, EngineError> {
        let ty = self
            .registry
            .device_type(type_id)
            .ok_or(EngineError::UnknownDeviceType(type_id))?;
        if self.device_at(pos).is_some() {
            return Err(EngineError::Occupied(pos));
        }
        let device = Device::new(type_id, ty, pos, &self.config);
        let id = self.devices.insert(device);
        tracing::debug!(?id, device_type = %ty.name, ?pos, "device placed");
        Ok(id)
    }

    pub fn place_device_named(&mut self, name: &str, pos: BlockPos) -> Result<DeviceId, EngineError> {
        let type_id = self
            .registry
            .device_type_id(name)
            .ok_or_else(|| EngineError::UnknownDeviceTypeName(name.to_string()))?;
        self.place_device(type_id, pos)
    }

    pub fn remove_device(&mut self, id: DeviceId) -> Result<Device, EngineError> {
        let device = self
            .devices
            .remove(id)
            .ok_or(EngineError::UnknownDevice(id))?;
        tracing::debug!(?id, "device removed");
        Ok(device)
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn device_at(&self, pos: BlockPos) -> Option<DeviceId> {
        self.devices
            .iter()
            .find(|(_, d)| d.position() == pos)
            .map(|(id, _)| id)
    }

    pub fn devices(&self) -> impl Iterator<Item = (DeviceId, &Device)> {
        self.devices.iter()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn device_type_of(&self, id: DeviceId) -> Option<&DeviceType> {
        let device = self.devices.get(id)?;
        self.registry.device_type(device.type_id())
    }

    /// Resolve a device and its type for mutation.
    fn device_and_type(&mut self, id: DeviceId) -> Result<(&mut Device, &DeviceType), EngineError> {
        let device = self
            .devices
            .get_mut(id)
            .ok_or(EngineError::UnknownDevice(id))?;
        let ty = self
            .registry
            .device_type(device.type_id())
            .ok_or(EngineError::UnknownDeviceType(device.type_id()))?;
        Ok((device, ty))
    }

    fn device_mut(&mut self, id: DeviceId) -> Result<&mut Device, EngineError> {
        self.devices
            .get_mut(id)
            .ok_or(EngineError::UnknownDevice(id))
    }

    // -----------------------------------------------------------------------
    // Augments and settings
    // -----------------------------------------------------------------------

    /// Install the augment item `item` into `slot`. Returns the item that was
    /// previously in the slot, if any.
    pub fn insert_augment(
        &mut self,
        id: DeviceId,
        slot: usize,
        item: ItemTypeId,
    ) -> Result<Option<ItemTypeId>, EngineError> {
        let data = self
            .registry
            .augment_data(item)
            .cloned()
            .ok_or(AugmentError::NotAnAugment(item))?;
        let (device, ty) = self.device_and_type(id)?;
        let previous = device.install_augment(
            ty,
            slot,
            Augment {
                item_type: item,
                data,
            },
        )?;
        tracing::debug!(?id, slot, radius = device.radius(), "augment installed");
        Ok(previous.map(|a| a.item_type))
    }

    pub fn remove_augment(
        &mut self,
        id: DeviceId,
        slot: usize,
    ) -> Result<Option<ItemTypeId>, EngineError> {
        let (device, ty) = self.device_and_type(id)?;
        let removed = device.remove_augment(ty, slot)?;
        Ok(removed.map(|a| a.item_type))
    }

    pub fn set_filter(&mut self, id: DeviceId, filter: ItemFilter) -> Result<(), EngineError> {
        self.device_mut(id)?.set_filter(filter);
        Ok(())
    }

    pub fn set_redstone_mode(&mut self, id: DeviceId, mode: RedstoneMode) -> Result<(), EngineError> {
        self.device_mut(id)?.set_redstone_mode(mode);
        Ok(())
    }

    pub fn invalidate(&mut self, id: DeviceId) -> Result<(), EngineError> {
        self.device_mut(id)?.invalidate();
        Ok(())
    }

    /// A block changed at `pos`: forget the cached validity of every device
    /// that counts it as an adjacent cell. Returns how many were reset.
    pub fn notify_block_changed(&mut self, pos: BlockPos) -> usize {
        let mut reset = 0;
        for (_, device) in self.devices.iter_mut() {
            if adjacent_cells(device.position()).contains(&pos) {
                device.invalidate();
                reset += 1;
            }
        }
        reset
    }

    // -----------------------------------------------------------------------
    // Storage access
    // -----------------------------------------------------------------------

    pub fn insert_item(
        &mut self,
        id: DeviceId,
        group: StorageGroup,
        stack: ItemStack,
    ) -> Result<Option<ItemStack>, EngineError> {
        Ok(self.device_mut(id)?.insert_item(group, stack, false))
    }

    pub fn extract_item(
        &mut self,
        id: DeviceId,
        group: StorageGroup,
        item_type: ItemTypeId,
        quantity: u32,
    ) -> Result<u32, EngineError> {
        Ok(self.device_mut(id)?.extract_item(group, item_type, quantity))
    }

    pub fn extract_xp(&mut self, id: DeviceId, amount: u32) -> Result<u32, EngineError> {
        Ok(self.device_mut(id)?.extract_xp(amount))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn radius(&self, id: DeviceId) -> Option<i32> {
        self.devices.get(id).map(|d| d.radius())
    }

    /// Current cycle length of a device, sampled from the world now.
    pub fn time_constant(&self, id: DeviceId) -> Option<u32> {
        let device = self.devices.get(id)?;
        let ty = self.registry.device_type(device.type_id())?;
        Some(device.time_constant(ty, &self.world))
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn suppress_event(&mut self, kind: EventKind) {
        self.events.suppress(kind);
    }

    pub fn on_passive(&mut self, listener: PassiveListener) {
        self.events.on_passive(listener);
    }

    pub fn drain_events(&mut self) -> Vec<DeviceEvent> {
        self.events.drain()
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// While paused, `step()` is a no-op. Configuration still works.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Tick every device once. Devices in unloaded chunks are frozen: no
    /// countdown, no sampling, no action, and no catch-up once reloaded.
    pub fn step(&mut self) -> StepSummary {
        if self.paused {
            return StepSummary::default();
        }
        let tick = self.sim_state.tick;
        let mut summary = StepSummary {
            steps: 1,
            ..StepSummary::default()
        };

        for (id, device) in self.devices.iter_mut() {
            let Some(ty) = self.registry.device_type(device.type_id()) else {
                tracing::warn!(?id, type_id = ?device.type_id(), "device type missing; skipped");
                continue;
            };
            if !self.world.is_area_loaded(device.position(), 0) {
                summary.unloaded += 1;
                continue;
            }
            match device.tick(id, ty, &mut self.world, &mut self.events, tick) {
                TickOutcome::Acted(_) => summary.acted += 1,
                TickOutcome::Wasted => summary.wasted += 1,
                TickOutcome::Mirrored | TickOutcome::Idle | TickOutcome::Waiting => {}
            }
        }

        self.sim_state.tick += 1;
        self.last_state_hash = self.compute_state_hash();
        summary
    }

    /// Run `steps` steps back to back.
    pub fn run(&mut self, steps: u64) -> StepSummary {
        let mut total = StepSummary::default();
        for _ in 0..steps {
            total.absorb(self.step());
        }
        total
    }

    // -----------------------------------------------------------------------
    // State hash
    // -----------------------------------------------------------------------

    /// The hash computed at the end of the last step.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    pub(crate) fn compute_state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.sim_state.tick);

        for (_, device) in &self.devices {
            let pos = device.position();
            hasher.write_i32(pos.x);
            hasher.write_i32(pos.y);
            hasher.write_i32(pos.z);
            hasher.write_bool(device.is_active());
            hasher.write_u32(device.countdown());
            hasher.write_i32(device.radius());
            let (cached, valid) = device.validity().to_parts();
            hasher.write_bool(cached);
            hasher.write_bool(valid);
            for slot in device.inventory().slots() {
                if let Some(stack) = slot.stack {
                    hasher.write_u32(stack.item_type.0);
                    hasher.write_u32(stack.quantity);
                } else {
                    hasher.write_u32(u32::MAX);
                }
            }
            hasher.write_u32(device.xp().stored());
        }

        hasher.write_u64(self.world.rng_state());
        for (_, entity) in self.world.entities() {
            hasher.write_fixed64(entity.pos.x);
            hasher.write_fixed64(entity.pos.y);
            hasher.write_fixed64(entity.pos.z);
            match &entity.kind {
                EntityKind::Item(item) => {
                    hasher.write_u32(item.stack.item_type.0);
                    hasher.write_u32(item.stack.quantity);
                }
                EntityKind::Orb(orb) => hasher.write_u32(orb.value),
            }
        }

        hasher.finish()
    }

    /// Whether the host world is a client mirror.
    pub fn is_client(&self) -> bool {
        self.world.is_client()
    }
}
