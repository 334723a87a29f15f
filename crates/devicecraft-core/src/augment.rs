//! Augments and the attributes they modify.
//!
//! A device's augmentable attributes are never patched in place. Any change
//! to the installed set goes through [`recompute_all`], which resets to the
//! device-type defaults and re-applies every installed augment in slot
//! order, so the result depends only on the current slot contents.

use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Augment data
// ---------------------------------------------------------------------------

/// Category an augment belongs to. Device types accept a fixed subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AugmentCategory {
    AreaEffect,
    Filter,
    Upgrade,
    Fluid,
}

impl AugmentCategory {
    /// Categories of which at most one may be installed per device.
    pub fn is_unique(&self) -> bool {
        matches!(self, AugmentCategory::Filter)
    }
}

/// Optional device features an augment switches on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentFeatures {
    #[serde(default)]
    pub xp_storage: bool,
    #[serde(default)]
    pub filter: bool,
}

/// The attribute effect of one augment item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentData {
    pub category: AugmentCategory,
    /// Added to the device radius.
    #[serde(default)]
    pub radius: i32,
    /// Base multiplier (loot rolls per cycle). Combined by maximum; 0 = no effect.
    #[serde(default)]
    pub base_mod: u32,
    /// Experience capacity multiplier. Combined by maximum; 0 = no effect.
    #[serde(default)]
    pub xp_storage: u32,
    #[serde(default)]
    pub features: AugmentFeatures,
}

impl AugmentData {
    pub fn new(category: AugmentCategory) -> Self {
        Self {
            category,
            radius: 0,
            base_mod: 0,
            xp_storage: 0,
            features: AugmentFeatures::default(),
        }
    }
}

/// An augment item as installed in a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Augment {
    pub item_type: ItemTypeId,
    pub data: AugmentData,
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Upper bound on a device's effective radius. Keeps collection boxes and
/// density scans bounded no matter how augments stack.
pub const MAX_RADIUS: i32 = 16;

/// Device-type defaults that [`reset_attributes`] restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefaults {
    pub radius: i32,
    pub xp_storage_feature: bool,
}

/// The augment-modifiable attributes of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAttributes {
    pub radius: i32,
    pub base_mod: u32,
    pub xp_storage_mult: u32,
    pub xp_storage_feature: bool,
    pub filter_feature: bool,
}

pub fn reset_attributes(defaults: &AttributeDefaults) -> DeviceAttributes {
    DeviceAttributes {
        radius: defaults.radius,
        base_mod: 1,
        xp_storage_mult: 1,
        xp_storage_feature: defaults.xp_storage_feature,
        filter_feature: false,
    }
}

pub fn apply_augment(attrs: &mut DeviceAttributes, data: &AugmentData) {
    attrs.radius = attrs.radius.saturating_add(data.radius);
    attrs.base_mod = attrs.base_mod.max(data.base_mod);
    attrs.xp_storage_mult = attrs.xp_storage_mult.max(data.xp_storage);
    attrs.xp_storage_feature |= data.features.xp_storage;
    attrs.filter_feature |= data.features.filter;
}

/// Reset to defaults, then apply every augment in order. The resulting
/// radius is clamped into `0..=MAX_RADIUS`.
pub fn recompute_all<'a>(
    defaults: &AttributeDefaults,
    augments: impl IntoIterator<Item = &'a AugmentData>,
) -> DeviceAttributes {
    let mut attrs = reset_attributes(defaults);
    for data in augments {
        apply_augment(&mut attrs, data);
    }
    attrs.radius = attrs.radius.clamp(0, MAX_RADIUS);
    attrs
}

/// Whether `candidate` may join the `installed` augments on a device that
/// accepts `allowed` categories.
pub fn validate_augment<'a>(
    allowed: &[AugmentCategory],
    candidate: &AugmentData,
    installed: impl IntoIterator<Item = &'a AugmentData>,
) -> bool {
    if !allowed.contains(&candidate.category) {
        return false;
    }
    if candidate.category.is_unique() {
        return installed
            .into_iter()
            .all(|a| a.category != candidate.category);
    }
    true
}

// ---------------------------------------------------------------------------
// Augment slots
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AugmentError {
    #[error("augment slot {slot} out of range (device has {len})")]
    SlotOutOfRange { slot: usize, len: usize },
    #[error("augment category {0:?} rejected by this device")]
    Rejected(AugmentCategory),
    #[error("item {0:?} is not an augment")]
    NotAnAugment(ItemTypeId),
}

/// Fixed-size, ordered augment slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentSlots {
    slots: Vec<Option<Augment>>,
}

impl AugmentSlots {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Augment> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    /// Installed augments in slot order.
    pub fn installed(&self) -> impl Iterator<Item = &AugmentData> {
        self.slots.iter().flatten().map(|a| &a.data)
    }

    /// Installed augments in slot order, skipping `except`.
    pub fn installed_except(&self, except: usize) -> impl Iterator<Item = &AugmentData> {
        self.slots
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != except)
            .filter_map(|(_, s)| s.as_ref())
            .map(|a| &a.data)
    }

    pub(crate) fn check(&self, slot: usize) -> Result<(), AugmentError> {
        if slot >= self.slots.len() {
            return Err(AugmentError::SlotOutOfRange {
                slot,
                len: self.slots.len(),
            });
        }
        Ok(())
    }

    /// Put `augment` in `slot`, returning whatever was there.
    pub fn put(&mut self, slot: usize, augment: Augment) -> Result<Option<Augment>, AugmentError> {
        self.check(slot)?;
        Ok(self.slots[slot].replace(augment))
    }

    pub fn take(&mut self, slot: usize) -> Result<Option<Augment>, AugmentError> {
        self.check(slot)?;
        Ok(self.slots[slot].take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: AttributeDefaults = AttributeDefaults {
        radius: 4,
        xp_storage_feature: false,
    };

    fn range(delta: i32) -> AugmentData {
        AugmentData {
            radius: delta,
            ..AugmentData::new(AugmentCategory::AreaEffect)
        }
    }

    fn none<'a>() -> std::iter::Empty<&'a AugmentData> {
        std::iter::empty()
    }

    fn upgrade(base_mod: u32) -> AugmentData {
        AugmentData {
            base_mod,
            ..AugmentData::new(AugmentCategory::Upgrade)
        }
    }

    #[test]
    fn reset_restores_defaults() {
        let attrs = reset_attributes(&DEFAULTS);
        assert_eq!(attrs.radius, 4);
        assert_eq!(attrs.base_mod, 1);
        assert!(!attrs.filter_feature);
    }

    #[test]
    fn radius_is_base_plus_sum_of_deltas() {
        let augs = [range(1), range(2), upgrade(3)];
        let attrs = recompute_all(&DEFAULTS, augs.iter());
        assert_eq!(attrs.radius, 7);
        assert_eq!(attrs.base_mod, 3);
    }

    #[test]
    fn base_mod_combines_by_maximum() {
        let augs = [upgrade(4), upgrade(2)];
        assert_eq!(recompute_all(&DEFAULTS, augs.iter()).base_mod, 4);
    }

    #[test]
    fn recompute_is_idempotent() {
        let augs = [range(2), upgrade(2)];
        let a = recompute_all(&DEFAULTS, augs.iter());
        let b = recompute_all(&DEFAULTS, augs.iter());
        assert_eq!(a, b);
    }

    #[test]
    fn removing_an_augment_does_not_drift() {
        let with = [range(3), range(1)];
        let without = [range(1)];
        assert_eq!(recompute_all(&DEFAULTS, with.iter()).radius, 8);
        assert_eq!(recompute_all(&DEFAULTS, without.iter()).radius, 5);
    }

    #[test]
    fn negative_radius_clamps_to_zero() {
        let augs = [range(-3), range(-4)];
        assert_eq!(recompute_all(&DEFAULTS, augs.iter()).radius, 0);
    }

    #[test]
    fn extreme_radius_deltas_saturate_and_clamp() {
        let huge = [range(i32::MAX), range(i32::MAX), range(1)];
        assert_eq!(recompute_all(&DEFAULTS, huge.iter()).radius, MAX_RADIUS);

        let tiny = [range(i32::MIN), range(i32::MIN)];
        assert_eq!(recompute_all(&DEFAULTS, tiny.iter()).radius, 0);

        let mixed = [range(i32::MAX), range(i32::MIN)];
        assert_eq!(recompute_all(&DEFAULTS, mixed.iter()).radius, 3);
    }

    #[test]
    fn features_switch_on() {
        let mut filter = AugmentData::new(AugmentCategory::Filter);
        filter.features.filter = true;
        let attrs = recompute_all(&DEFAULTS, [&filter]);
        assert!(attrs.filter_feature);
        assert!(!attrs.xp_storage_feature);
    }

    #[test]
    fn validate_checks_category_allow_list() {
        let collector = [AugmentCategory::AreaEffect, AugmentCategory::Filter];
        assert!(validate_augment(&collector, &range(1), none()));
        assert!(!validate_augment(&collector, &upgrade(2), none()));
    }

    #[test]
    fn validate_rejects_second_filter() {
        let allowed = [AugmentCategory::Filter];
        let filter = AugmentData::new(AugmentCategory::Filter);
        assert!(validate_augment(&allowed, &filter, none()));
        assert!(!validate_augment(&allowed, &filter, [&filter]));
    }

    #[test]
    fn slots_put_and_take() {
        let mut slots = AugmentSlots::new(2);
        let aug = Augment {
            item_type: ItemTypeId(7),
            data: range(1),
        };
        assert_eq!(slots.put(1, aug.clone()), Ok(None));
        assert_eq!(slots.installed().count(), 1);
        assert_eq!(slots.installed_except(1).count(), 0);
        assert_eq!(slots.take(1), Ok(Some(aug)));
        assert_eq!(
            slots.take(2),
            Err(AugmentError::SlotOutOfRange { slot: 2, len: 2 })
        );
    }
}
