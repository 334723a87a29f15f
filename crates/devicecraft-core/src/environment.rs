//! Read-only environment sampling around a device.
//!
//! All functions here are pure queries of the world at call time. Nothing is
//! cached: an [`EnvironmentSnapshot`] is built fresh whenever a device needs
//! one and thrown away afterwards.

use crate::position::{BlockPos, Direction};
use crate::world::{Fluid, World};

/// The cells checked for adjacency: the block below and the four horizontal
/// neighbors.
pub fn adjacent_cells(pos: BlockPos) -> [BlockPos; 5] {
    let [n, s, w, e] = Direction::horizontal();
    [
        pos.step(Direction::Down),
        pos.step(n),
        pos.step(s),
        pos.step(w),
        pos.step(e),
    ]
}

/// Number of `fluid` source blocks among the adjacent cells.
pub fn count_adjacent_sources<W: World + ?Sized>(world: &W, pos: BlockPos, fluid: Fluid) -> u32 {
    adjacent_cells(pos)
        .iter()
        .filter(|p| world.fluid_at(**p).is_source_of(fluid))
        .count() as u32
}

/// Number of `fluid` source blocks in the box from `(x-r, y+1-r, z-r)` to
/// `(x+r, y, z+r)`: a square of half-width `r` reaching `r - 1` blocks below
/// the device and up to its own level.
pub fn scan_fluid_density<W: World + ?Sized>(
    world: &W,
    pos: BlockPos,
    radius: i32,
    fluid: Fluid,
) -> u32 {
    let r = radius.max(0);
    let low = pos.offset(-r, 1 - r, -r);
    let high = pos.offset(r, 0, r);
    BlockPos::all_in_box(low, high)
        .filter(|p| world.fluid_at(*p).is_source_of(fluid))
        .count() as u32
}

/// Biome category flags relevant to timing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BiomeClass {
    pub ocean_like: bool,
    pub river_like: bool,
}

pub fn classify_biome<W: World + ?Sized>(world: &W, pos: BlockPos) -> BiomeClass {
    let biome = world.biome_at(pos);
    BiomeClass {
        ocean_like: biome.ocean,
        river_like: biome.river,
    }
}

pub fn is_precipitating<W: World + ?Sized>(world: &W, pos: BlockPos) -> bool {
    world.is_raining_at(pos)
}

/// Everything timing and validity need to know about a device's surroundings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    pub density: u32,
    pub biome: BiomeClass,
    pub raining: bool,
}

impl EnvironmentSnapshot {
    /// Sample the surroundings of `pos`. Returns `None` if the scanned region
    /// is not loaded, in which case the caller must not act on stale data.
    pub fn sample<W: World + ?Sized>(
        world: &W,
        pos: BlockPos,
        radius: i32,
        fluid: Fluid,
    ) -> Option<Self> {
        if !world.is_area_loaded(pos, radius.max(1)) {
            return None;
        }
        Some(Self {
            density: scan_fluid_density(world, pos, radius, fluid),
            biome: classify_biome(world, pos),
            raining: is_precipitating(world, pos),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_world::GridWorld;
    use crate::world::{Biome, FluidState};

    const WATER: FluidState = FluidState::Source(Fluid::Water);

    #[test]
    fn adjacent_ignores_above_and_diagonals() {
        let mut world = GridWorld::new(0);
        let p = BlockPos::new(0, 64, 0);
        world.set_fluid(p.offset(0, 1, 0), WATER);
        world.set_fluid(p.offset(1, 0, 1), WATER);
        assert_eq!(count_adjacent_sources(&world, p, Fluid::Water), 0);

        world.set_fluid(p.offset(0, -1, 0), WATER);
        world.set_fluid(p.offset(-1, 0, 0), WATER);
        assert_eq!(count_adjacent_sources(&world, p, Fluid::Water), 2);
    }

    #[test]
    fn adjacent_counts_only_matching_sources() {
        let mut world = GridWorld::new(0);
        let p = BlockPos::new(0, 64, 0);
        world.set_fluid(p.offset(1, 0, 0), FluidState::Flowing(Fluid::Water));
        world.set_fluid(p.offset(-1, 0, 0), FluidState::Source(Fluid::Lava));
        world.set_fluid(p.offset(0, 0, 1), WATER);
        assert_eq!(count_adjacent_sources(&world, p, Fluid::Water), 1);
        assert_eq!(count_adjacent_sources(&world, p, Fluid::Lava), 1);
    }

    #[test]
    fn density_box_spans_expected_band() {
        let mut world = GridWorld::new(0);
        let p = BlockPos::new(0, 64, 0);
        // Radius 2: x/z in -2..=2, y in 63..=64.
        world.fill_fluid(p.offset(-5, -5, -5), p.offset(5, 5, 5), WATER);
        assert_eq!(scan_fluid_density(&world, p, 2, Fluid::Water), 5 * 5 * 2);
        // Radius 1: a single layer at the device's level.
        assert_eq!(scan_fluid_density(&world, p, 1, Fluid::Water), 3 * 3);
    }

    #[test]
    fn density_with_zero_radius_checks_own_cell() {
        let mut world = GridWorld::new(0);
        let p = BlockPos::new(0, 64, 0);
        // Box (0, 65, 0)..(0, 64, 0) normalizes to the device column, y 64..=65.
        world.set_fluid(p, WATER);
        assert_eq!(scan_fluid_density(&world, p, 0, Fluid::Water), 1);
    }

    #[test]
    fn classify_reads_biome_flags() {
        let mut world = GridWorld::new(0);
        world.set_biome(0, 0, Biome::OCEAN);
        let class = classify_biome(&world, BlockPos::new(0, 64, 0));
        assert!(class.ocean_like);
        assert!(!class.river_like);
    }

    #[test]
    fn snapshot_unavailable_when_unloaded() {
        let mut world = GridWorld::new(0);
        world.track_loaded_chunks();
        let p = BlockPos::new(8, 64, 8);
        assert!(EnvironmentSnapshot::sample(&world, p, 2, Fluid::Water).is_none());
        world.load_chunk(0, 0);
        let snap = EnvironmentSnapshot::sample(&world, p, 2, Fluid::Water).unwrap();
        assert_eq!(snap.density, 0);
        assert!(!snap.raining);
    }
}
