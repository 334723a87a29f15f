//! Serialization and snapshot support for the engine.
//!
//! Snapshots are `bitcode`-encoded with a versioned header. The registry is
//! not part of a snapshot: it is rebuilt from data files at startup and
//! handed back in on load. The event log holds closures and is never
//! persisted.

use crate::config::DeviceConfig;
use crate::device::{Device, PersistedDeviceState};
use crate::engine::Engine;
use crate::event::EventLog;
use crate::grid_world::GridWorld;
use crate::id::{DeviceId, DeviceTypeId};
use crate::registry::Registry;
use crate::sim::SimState;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying an engine snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xDE71_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("device {device:?} references unknown device type {type_id:?}")]
    UnknownDeviceType {
        device: DeviceId,
        type_id: DeviceTypeId,
    },
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct EngineSnapshot {
    header: SnapshotHeader,
    world: GridWorld,
    config: DeviceConfig,
    devices: SlotMap<DeviceId, Device>,
    sim_state: SimState,
    last_state_hash: u64,
    #[serde(default)]
    paused: bool,
}

impl Engine {
    /// Serialize the world, devices and clock.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = EngineSnapshot {
            header: SnapshotHeader::new(self.sim_state.tick),
            world: self.world.clone(),
            config: self.config.clone(),
            devices: self.devices.clone(),
            sim_state: self.sim_state.clone(),
            last_state_hash: self.last_state_hash,
            paused: self.paused,
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Rebuild an engine from [`Engine::serialize`] output and the registry
    /// the devices were created against.
    pub fn deserialize(data: &[u8], registry: Registry) -> Result<Self, DeserializeError> {
        let snapshot: EngineSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        for (device, d) in &snapshot.devices {
            if registry.device_type(d.type_id()).is_none() {
                return Err(DeserializeError::UnknownDeviceType {
                    device,
                    type_id: d.type_id(),
                });
            }
        }

        tracing::debug!(
            tick = snapshot.header.tick,
            devices = snapshot.devices.len(),
            "snapshot loaded"
        );
        Ok(Engine {
            world: snapshot.world,
            registry,
            config: snapshot.config,
            devices: snapshot.devices,
            sim_state: snapshot.sim_state,
            paused: snapshot.paused,
            last_state_hash: snapshot.last_state_hash,
            events: EventLog::default(),
        })
    }
}

/// Encode the primitive per-device fields on their own, for hosts that keep
/// device state inside their own save format.
pub fn serialize_device_state(state: &PersistedDeviceState) -> Result<Vec<u8>, SerializeError> {
    bitcode::serialize(state).map_err(|e| SerializeError::Encode(e.to_string()))
}

pub fn deserialize_device_state(data: &[u8]) -> Result<PersistedDeviceState, DeserializeError> {
    bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))
}
