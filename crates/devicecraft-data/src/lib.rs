//! Data-driven device definitions.
//!
//! Reads `config`, `items`, `augments`, `loot_tables` and `device_types`
//! files (RON, TOML or JSON) from a directory, resolves every name to an id
//! and hands back a frozen [`devicecraft_core::registry::Registry`] plus the
//! loot tables the world needs.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, DeviceData, load_device_data};
