//! Cycle interval policy.
//!
//! A device's interval starts at its base time constant, loses a fixed
//! amount per nearby liquid source, is divided down by ocean, river and rain
//! (in that order, each applied to the running value) and is finally clamped
//! into the device's bounds.

use crate::environment::EnvironmentSnapshot;
use serde::{Deserialize, Serialize};

/// Ticks removed from the interval per matching liquid block in the density scan.
pub const DENSITY_PENALTY: i64 = 20;

/// Inclusive interval bounds. Always `1 <= min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingBounds {
    min: u32,
    max: u32,
}

impl TimingBounds {
    /// Build bounds, repairing inverted or zero values.
    pub fn new(min: u32, max: u32) -> Self {
        let max = max.max(1);
        let min = min.clamp(1, max);
        Self { min, max }
    }

    /// Bounds `[constant / floor_divisor, constant]`.
    pub fn from_constant(constant: u32, floor_divisor: u32) -> Self {
        Self::new(constant / floor_divisor.max(1), constant)
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn clamp(&self, value: i64) -> u32 {
        value.clamp(self.min as i64, self.max as i64) as u32
    }
}

/// Compute the next cycle interval. Pure: callers re-evaluate it every time
/// the countdown is re-seeded.
pub fn compute_interval(
    base_constant: u32,
    density: u32,
    ocean: bool,
    river: bool,
    raining: bool,
    bounds: TimingBounds,
) -> u32 {
    let mut constant = base_constant as i64 - DENSITY_PENALTY * density as i64;
    if ocean {
        constant /= 3;
    }
    if river {
        constant /= 2;
    }
    if raining {
        constant /= 2;
    }
    bounds.clamp(constant)
}

/// [`compute_interval`] fed from an environment snapshot.
pub fn interval_from_snapshot(
    base_constant: u32,
    snapshot: &EnvironmentSnapshot,
    bounds: TimingBounds,
) -> u32 {
    compute_interval(
        base_constant,
        snapshot.density,
        snapshot.biome.ocean_like,
        snapshot.biome.river_like,
        snapshot.raining,
        bounds,
    )
}
