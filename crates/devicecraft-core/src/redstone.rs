use serde::{Deserialize, Serialize};

/// How a device reacts to the redstone power at its position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedstoneMode {
    /// Ignore power; always on.
    #[default]
    Disabled,
    /// On while unpowered.
    Low,
    /// On while powered.
    High,
}

/// Per-device activity gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedstoneControl {
    pub mode: RedstoneMode,
}

impl RedstoneControl {
    pub fn new(mode: RedstoneMode) -> Self {
        Self { mode }
    }

    /// Whether the device should run given `power` (0-15) at its position.
    pub fn state(&self, power: u8) -> bool {
        match self.mode {
            RedstoneMode::Disabled => true,
            RedstoneMode::Low => power == 0,
            RedstoneMode::High => power > 0,
        }
    }
}
