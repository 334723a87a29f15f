use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed device in the engine.
    pub struct DeviceId;

    /// Identifies a loose entity (dropped item or experience orb) in the world.
    pub struct EntityId;
}

/// Identifies an item type in the registry. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemTypeId(pub u32);

/// Identifies a device type (collector, fisher, ...) in the registry.
///
/// This is the registration token handed to placement code: it selects the
/// action routine, time constant and accepted augment categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceTypeId(pub u32);

/// Identifies a loot table in the world's loot service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LootTableId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_id_equality() {
        assert_eq!(ItemTypeId(0), ItemTypeId(0));
        assert_ne!(ItemTypeId(0), ItemTypeId(1));
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(DeviceTypeId(0), "collector");
        map.insert(DeviceTypeId(1), "fisher");
        assert_eq!(map[&DeviceTypeId(1)], "fisher");
    }
}
