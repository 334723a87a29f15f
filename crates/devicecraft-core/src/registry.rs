//! Device types, items and augment definitions, frozen at startup.
//!
//! The registry is built once through [`RegistryBuilder`] and is immutable
//! afterwards. Devices consult their [`DeviceType`] by value each tick; no
//! per-type state is shared or mutated at runtime.

use crate::augment::{AttributeDefaults, AugmentCategory, AugmentData};
use crate::config::DeviceConfig;
use crate::id::{DeviceTypeId, ItemTypeId, LootTableId};
use crate::routine::ActionRoutine;
use crate::timing::TimingBounds;
use crate::validity::ValidityRule;
use crate::world::Fluid;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Device types
// ---------------------------------------------------------------------------

/// How a device derives its cycle interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingMode {
    /// Always the base time constant.
    Fixed,
    /// Environment-modulated (see [`crate::timing::compute_interval`]), with
    /// a floor of `time_constant / floor_divisor`.
    Environmental { fluid: Fluid, floor_divisor: u32 },
}

/// Slot counts per storage group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLayout {
    pub accessible: usize,
    pub input: usize,
    pub output: usize,
    pub stack_limit: u32,
}

/// The capability table for one kind of device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceType {
    pub name: String,
    pub routine: ActionRoutine,
    /// Base ticks per cycle.
    pub time_constant: u32,
    pub timing: TimingMode,
    pub base_radius: i32,
    /// Countdown a freshly placed device starts with.
    pub initial_countdown: u32,
    /// Whether switching on forces an action on the very next tick.
    pub reset_on_activate: bool,
    /// Structural precondition gating the action, if any.
    pub validity: Option<ValidityRule>,
    pub augment_categories: Vec<AugmentCategory>,
    pub augment_slots: usize,
    pub inventory: InventoryLayout,
    pub base_xp_storage: u32,
}

impl DeviceType {
    /// Item and experience collector: every second, pulls dropped items and
    /// orbs within its radius into 15 accessible slots.
    pub fn collector() -> Self {
        Self {
            name: "collector".to_string(),
            routine: ActionRoutine::Collect,
            time_constant: 20,
            timing: TimingMode::Fixed,
            base_radius: 4,
            initial_countdown: 1,
            reset_on_activate: true,
            validity: None,
            augment_categories: vec![AugmentCategory::AreaEffect, AugmentCategory::Filter],
            augment_slots: 3,
            inventory: InventoryLayout {
                accessible: 15,
                input: 0,
                output: 0,
                stack_limit: crate::item::DEFAULT_STACK_LIMIT,
            },
            base_xp_storage: 2500,
        }
    }

    /// Water-fed fisher: needs two adjacent water sources and periodically
    /// rolls `loot` into its output slots. Nearby water, ocean and river
    /// biomes and rain shorten the cycle.
    pub fn fisher(loot: LootTableId) -> Self {
        Self {
            name: "fisher".to_string(),
            routine: ActionRoutine::Produce { loot },
            time_constant: 7200,
            timing: TimingMode::Environmental {
                fluid: Fluid::Water,
                floor_divisor: 20,
            },
            base_radius: 2,
            initial_countdown: 3600,
            reset_on_activate: false,
            validity: Some(ValidityRule {
                fluid: Fluid::Water,
                min_adjacent: 2,
            }),
            augment_categories: vec![
                AugmentCategory::Upgrade,
                AugmentCategory::AreaEffect,
                AugmentCategory::Filter,
            ],
            augment_slots: 3,
            inventory: InventoryLayout {
                accessible: 0,
                input: 1,
                output: 15,
                stack_limit: crate::item::DEFAULT_STACK_LIMIT,
            },
            base_xp_storage: 2500,
        }
    }

    /// Interval bounds for this type.
    pub fn bounds(&self) -> TimingBounds {
        match self.timing {
            TimingMode::Fixed => TimingBounds::new(self.time_constant, self.time_constant),
            TimingMode::Environmental { floor_divisor, .. } => {
                TimingBounds::from_constant(self.time_constant, floor_divisor)
            }
        }
    }

    pub fn attribute_defaults(&self, config: &DeviceConfig) -> AttributeDefaults {
        AttributeDefaults {
            radius: self.base_radius,
            xp_storage_feature: config.xp_storage_feature,
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDef {
    pub name: String,
    /// Present if the item can be installed as an augment.
    pub augment: Option<AugmentData>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate name: {0}")]
    Duplicate(String),
    #[error("device type '{name}': {reason}")]
    InvalidDeviceType { name: String, reason: String },
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    items: Vec<ItemDef>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    device_types: Vec<DeviceType>,
    device_name_to_id: HashMap<String, DeviceTypeId>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_item(&mut self, def: ItemDef) -> Result<ItemTypeId, RegistryError> {
        if self.item_name_to_id.contains_key(&def.name) {
            return Err(RegistryError::Duplicate(def.name));
        }
        let id = ItemTypeId(self.items.len() as u32);
        self.item_name_to_id.insert(def.name.clone(), id);
        self.items.push(def);
        Ok(id)
    }

    /// Register a plain item type.
    pub fn register_item(&mut self, name: &str) -> Result<ItemTypeId, RegistryError> {
        self.push_item(ItemDef {
            name: name.to_string(),
            augment: None,
        })
    }

    /// Register an item that can be installed as an augment.
    pub fn register_augment(
        &mut self,
        name: &str,
        data: AugmentData,
    ) -> Result<ItemTypeId, RegistryError> {
        self.push_item(ItemDef {
            name: name.to_string(),
            augment: Some(data),
        })
    }

    pub fn register_device_type(&mut self, ty: DeviceType) -> Result<DeviceTypeId, RegistryError> {
        if self.device_name_to_id.contains_key(&ty.name) {
            return Err(RegistryError::Duplicate(ty.name));
        }
        let id = DeviceTypeId(self.device_types.len() as u32);
        self.device_name_to_id.insert(ty.name.clone(), id);
        self.device_types.push(ty);
        Ok(id)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    /// Validate every device type and freeze.
    pub fn build(self) -> Result<Registry, RegistryError> {
        for ty in &self.device_types {
            let invalid = |reason: &str| RegistryError::InvalidDeviceType {
                name: ty.name.clone(),
                reason: reason.to_string(),
            };
            if ty.time_constant == 0 {
                return Err(invalid("time constant must be positive"));
            }
            if let TimingMode::Environmental { floor_divisor, .. } = ty.timing
                && floor_divisor == 0
            {
                return Err(invalid("floor divisor must be positive"));
            }
            if ty.inventory.stack_limit == 0 {
                return Err(invalid("stack limit must be positive"));
            }
            if ty.initial_countdown == 0 {
                tracing::warn!(
                    device_type = %ty.name,
                    "initial countdown of 0 is treated as 1"
                );
            }
        }

        Ok(Registry {
            items: self.items,
            item_name_to_id: self.item_name_to_id,
            device_types: self.device_types,
            device_name_to_id: self.device_name_to_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable registry. Frozen after build().
#[derive(Debug, Clone)]
pub struct Registry {
    items: Vec<ItemDef>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    device_types: Vec<DeviceType>,
    device_name_to_id: HashMap<String, DeviceTypeId>,
}

impl Registry {
    pub fn item(&self, id: ItemTypeId) -> Option<&ItemDef> {
        self.items.get(id.0 as usize)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn item_name(&self, id: ItemTypeId) -> Option<&str> {
        self.item(id).map(|d| d.name.as_str())
    }

    /// Augment effect of an item, if it is an augment.
    pub fn augment_data(&self, id: ItemTypeId) -> Option<&AugmentData> {
        self.item(id).and_then(|d| d.augment.as_ref())
    }

    pub fn device_type(&self, id: DeviceTypeId) -> Option<&DeviceType> {
        self.device_types.get(id.0 as usize)
    }

    pub fn device_type_id(&self, name: &str) -> Option<DeviceTypeId> {
        self.device_name_to_id.get(name).copied()
    }

    pub fn device_types(&self) -> impl Iterator<Item = (DeviceTypeId, &DeviceType)> {
        self.device_types
            .iter()
            .enumerate()
            .map(|(i, t)| (DeviceTypeId(i as u32), t))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut b = RegistryBuilder::new();
        let cod = b.register_item("cod").unwrap();
        let range = b
            .register_augment("range_augment", AugmentData::new(AugmentCategory::AreaEffect))
            .unwrap();
        let collector = b.register_device_type(DeviceType::collector()).unwrap();
        let reg = b.build().unwrap();

        assert_eq!(reg.item_id("cod"), Some(cod));
        assert_eq!(reg.item_name(range), Some("range_augment"));
        assert!(reg.augment_data(cod).is_none());
        assert!(reg.augment_data(range).is_some());
        assert_eq!(reg.device_type_id("collector"), Some(collector));
        assert_eq!(reg.device_type(collector).unwrap().time_constant, 20);
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut b = RegistryBuilder::new();
        b.register_item("cod").unwrap();
        assert_eq!(
            b.register_item("cod"),
            Err(RegistryError::Duplicate("cod".to_string()))
        );
        b.register_device_type(DeviceType::collector()).unwrap();
        assert!(b.register_device_type(DeviceType::collector()).is_err());
    }

    #[test]
    fn zero_time_constant_rejected() {
        let mut b = RegistryBuilder::new();
        let mut ty = DeviceType::collector();
        ty.time_constant = 0;
        b.register_device_type(ty).unwrap();
        assert!(matches!(
            b.build(),
            Err(RegistryError::InvalidDeviceType { .. })
        ));
    }

    #[test]
    fn zero_floor_divisor_rejected() {
        let mut b = RegistryBuilder::new();
        let mut ty = DeviceType::fisher(LootTableId(0));
        ty.timing = TimingMode::Environmental {
            fluid: Fluid::Water,
            floor_divisor: 0,
        };
        b.register_device_type(ty).unwrap();
        assert!(b.build().is_err());
    }

    #[test]
    fn fisher_bounds_use_floor_divisor() {
        let ty = DeviceType::fisher(LootTableId(0));
        let b = ty.bounds();
        assert_eq!((b.min(), b.max()), (360, 7200));
        let c = DeviceType::collector().bounds();
        assert_eq!((c.min(), c.max()), (20, 20));
    }

    #[test]
    fn category_allow_lists() {
        let collector = DeviceType::collector();
        let fisher = DeviceType::fisher(LootTableId(0));
        assert!(!collector.augment_categories.contains(&AugmentCategory::Upgrade));
        assert!(fisher.augment_categories.contains(&AugmentCategory::Upgrade));
        assert!(!fisher.augment_categories.contains(&AugmentCategory::Fluid));
    }
}
