//! Serde data file structs for device content definitions.
//!
//! These structs define the on-disk format for items, augments, loot tables
//! and device types. They are deserialized from RON, JSON, or TOML data
//! files and then resolved into engine types by the loader.

use serde::Deserialize;

// ===========================================================================
// Items
// ===========================================================================

/// A plain item type definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
}

// ===========================================================================
// Augments
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryData {
    AreaEffect,
    Filter,
    Upgrade,
    Fluid,
}

/// Feature switches an augment turns on.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FeaturesData {
    #[serde(default)]
    pub xp_storage: bool,
    #[serde(default)]
    pub filter: bool,
}

/// An augment item definition. Augments are items too, so their names share
/// the item namespace.
#[derive(Debug, Clone, Deserialize)]
pub struct AugmentItemData {
    pub name: String,
    pub category: CategoryData,
    #[serde(default)]
    pub radius: i32,
    #[serde(default)]
    pub base_mod: u32,
    #[serde(default)]
    pub xp_storage: u32,
    #[serde(default)]
    pub features: FeaturesData,
}

// ===========================================================================
// Loot tables
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LootEntryData {
    pub item: String,
    #[serde(default = "default_one")]
    pub weight: u32,
    #[serde(default = "default_one")]
    pub min: u32,
    #[serde(default = "default_one")]
    pub max: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LootTableData {
    pub name: String,
    /// Weighted draws per roll.
    #[serde(default = "default_one")]
    pub picks: u32,
    pub entries: Vec<LootEntryData>,
}

// ===========================================================================
// Device types
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineData {
    Collect,
    Produce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluidData {
    Water,
    Lava,
}

/// Timing policy: `fixed`, or `environmental` with the liquid that counts
/// toward density and the floor divisor.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingData {
    #[default]
    Fixed,
    Environmental {
        fluid: FluidData,
        #[serde(default = "default_floor_divisor")]
        floor_divisor: u32,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ValidityData {
    pub fluid: FluidData,
    pub min_adjacent: u32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SlotsData {
    #[serde(default)]
    pub accessible: usize,
    #[serde(default)]
    pub input: usize,
    #[serde(default)]
    pub output: usize,
    /// Falls back to the config-wide stack limit.
    #[serde(default)]
    pub stack_limit: Option<u32>,
}

/// A device type definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceTypeData {
    pub name: String,
    pub routine: RoutineData,
    /// Required for `produce` routines.
    #[serde(default)]
    pub loot_table: Option<String>,
    pub time_constant: u32,
    #[serde(default)]
    pub timing: TimingData,
    #[serde(default)]
    pub base_radius: i32,
    #[serde(default = "default_one")]
    pub initial_countdown: u32,
    #[serde(default)]
    pub reset_on_activate: bool,
    #[serde(default)]
    pub validity: Option<ValidityData>,
    #[serde(default)]
    pub augment_categories: Vec<CategoryData>,
    #[serde(default)]
    pub augment_slots: usize,
    #[serde(default)]
    pub slots: SlotsData,
    #[serde(default)]
    pub base_xp_storage: u32,
}

fn default_one() -> u32 {
    1
}

fn default_floor_divisor() -> u32 {
    20
}
