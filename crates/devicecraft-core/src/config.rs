use crate::item::DEFAULT_STACK_LIMIT;
use serde::{Deserialize, Serialize};

/// Global engine settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Whether devices run the experience subsystem without an augment.
    #[serde(default = "default_true")]
    pub xp_storage_feature: bool,
    /// Seed for the world RNG.
    #[serde(default)]
    pub seed: u64,
    /// Stack limit for device slots that do not set their own.
    #[serde(default = "default_stack_limit")]
    pub stack_limit: u32,
}

fn default_true() -> bool {
    true
}

fn default_stack_limit() -> u32 {
    DEFAULT_STACK_LIMIT
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            xp_storage_feature: true,
            seed: 0,
            stack_limit: DEFAULT_STACK_LIMIT,
        }
    }
}
