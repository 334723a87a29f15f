//! Devicecraft Core -- tick-driven block devices for voxel simulations.
//!
//! A device sits on a block, counts down a cycle interval and, when the
//! countdown expires, runs an action routine against the world around it.
//! Two routines ship with the crate: a collector that pulls dropped items and
//! experience orbs into its slots, and a liquid-fed producer (the fisher)
//! that rolls a loot table into its output slots.
//!
//! # Per-Device Tick
//!
//! Each call to [`engine::Engine::step`] ticks every device once:
//!
//! 1. **Gate** -- evaluate the redstone control; track `Inactive`/`Active`.
//! 2. **Validity** -- sample the placement precondition if not cached, even
//!    while inactive.
//! 3. **Countdown** -- decrement; on expiry re-seed from the timing policy.
//! 4. **Action** -- run the routine once (skipped, but counted, if invalid).
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Owns the world, the registry and all devices.
//! - [`device::Device`] -- Per-device state and the tick machine.
//! - [`registry::DeviceType`] -- Capability table consulted by value.
//! - [`timing::compute_interval`] -- Environment-modulated cycle length.
//! - [`validity::ValidityCache`] -- One-shot structural precondition cache.
//! - [`augment`] -- Reset-then-reapply attribute recomputation.
//! - [`world::World`] -- The query surface devices run against;
//!   [`grid_world::GridWorld`] implements it.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for entity positions.
//! - [`serialize`] -- Versioned snapshots via bitcode.

pub mod augment;
pub mod config;
pub mod device;
pub mod engine;
pub mod environment;
pub mod event;
pub mod filter;
pub mod fixed;
pub mod grid_world;
pub mod id;
pub mod item;
pub mod loot;
pub mod position;
pub mod redstone;
pub mod registry;
pub mod rng;
pub mod routine;
pub mod serialize;
pub mod sim;
pub mod timing;
pub mod validity;
pub mod world;
pub mod xp;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
