//! One-shot structural validity cache.
//!
//! A device with a placement precondition (enough adjacent liquid sources)
//! samples it once, the first time the world allows it, and keeps the answer
//! until someone calls [`ValidityCache::invalidate`].

use crate::environment::count_adjacent_sources;
use crate::position::BlockPos;
use crate::world::{Fluid, World};
use serde::{Deserialize, Serialize};

/// Placement precondition: at least `min_adjacent` source blocks of `fluid`
/// below or beside the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityRule {
    pub fluid: Fluid,
    pub min_adjacent: u32,
}

impl ValidityRule {
    pub fn evaluate<W: World + ?Sized>(&self, world: &W, pos: BlockPos) -> bool {
        count_adjacent_sources(world, pos, self.fluid) >= self.min_adjacent
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidityCache {
    /// Not sampled yet. Reads as invalid.
    #[default]
    Unknown,
    Sampled(bool),
}

impl ValidityCache {
    /// Rebuild from the two persisted flags.
    pub fn from_parts(cached: bool, valid: bool) -> Self {
        if cached {
            ValidityCache::Sampled(valid)
        } else {
            ValidityCache::Unknown
        }
    }

    /// `(cached, valid)` as plain booleans for persistence.
    pub fn to_parts(&self) -> (bool, bool) {
        match self {
            ValidityCache::Unknown => (false, false),
            ValidityCache::Sampled(v) => (true, *v),
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, ValidityCache::Sampled(_))
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidityCache::Sampled(true))
    }

    pub fn invalidate(&mut self) {
        *self = ValidityCache::Unknown;
    }

    /// Sample the rule if nothing is cached yet.
    ///
    /// Sampling is skipped on a client world and while the immediate
    /// neighborhood is unloaded. Returns the freshly sampled result, or
    /// `None` if nothing was sampled on this call.
    pub fn refresh<W: World + ?Sized>(
        &mut self,
        world: &W,
        pos: BlockPos,
        rule: &ValidityRule,
    ) -> Option<bool> {
        if self.is_cached() || world.is_client() || !world.is_area_loaded(pos, 1) {
            return None;
        }
        let valid = rule.evaluate(world, pos);
        *self = ValidityCache::Sampled(valid);
        Some(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_world::GridWorld;
    use crate::world::FluidState;

    const RULE: ValidityRule = ValidityRule {
        fluid: Fluid::Water,
        min_adjacent: 2,
    };

    fn pond(world: &mut GridWorld, pos: BlockPos, sides: usize) {
        let cells = crate::environment::adjacent_cells(pos);
        for cell in cells.iter().take(sides) {
            world.set_fluid(*cell, FluidState::Source(Fluid::Water));
        }
    }

    #[test]
    fn unknown_reads_invalid() {
        let cache = ValidityCache::default();
        assert!(!cache.is_cached());
        assert!(!cache.is_valid());
    }

    #[test]
    fn samples_once_then_sticks() {
        let mut world = GridWorld::new(0);
        let p = BlockPos::new(0, 64, 0);
        pond(&mut world, p, 2);

        let mut cache = ValidityCache::default();
        assert_eq!(cache.refresh(&world, p, &RULE), Some(true));
        assert!(cache.is_valid());

        // Draining the water does not change the cached answer.
        world.fill_fluid(p.offset(-1, -1, -1), p.offset(1, 0, 1), FluidState::Empty);
        assert_eq!(cache.refresh(&world, p, &RULE), None);
        assert!(cache.is_valid());

        cache.invalidate();
        assert_eq!(cache.refresh(&world, p, &RULE), Some(false));
        assert!(!cache.is_valid());
    }

    #[test]
    fn one_source_is_not_enough() {
        let mut world = GridWorld::new(0);
        let p = BlockPos::new(0, 64, 0);
        pond(&mut world, p, 1);
        let mut cache = ValidityCache::default();
        assert_eq!(cache.refresh(&world, p, &RULE), Some(false));
    }

    #[test]
    fn client_world_never_samples() {
        let mut world = GridWorld::new_client(0);
        let p = BlockPos::new(0, 64, 0);
        pond(&mut world, p, 5);
        let mut cache = ValidityCache::default();
        assert_eq!(cache.refresh(&world, p, &RULE), None);
        assert_eq!(cache, ValidityCache::Unknown);
    }

    #[test]
    fn unloaded_region_defers_sampling() {
        let mut world = GridWorld::new(0);
        world.track_loaded_chunks();
        let p = BlockPos::new(4, 64, 4);
        pond(&mut world, p, 3);

        let mut cache = ValidityCache::default();
        assert_eq!(cache.refresh(&world, p, &RULE), None);
        world.load_chunk(0, 0);
        assert_eq!(cache.refresh(&world, p, &RULE), Some(true));
    }

    #[test]
    fn parts_round_trip() {
        for cache in [
            ValidityCache::Unknown,
            ValidityCache::Sampled(false),
            ValidityCache::Sampled(true),
        ] {
            let (cached, valid) = cache.to_parts();
            assert_eq!(ValidityCache::from_parts(cached, valid), cache);
        }
    }
}
