//! Block coordinates, neighbor directions and axis-aligned boxes.
//!
//! Blocks live on an integer lattice ([`BlockPos`]); loose entities live at
//! fixed-point positions ([`Vec3`]). An [`Aabb`] spans fixed-point space and
//! is what area queries are expressed in.

use crate::fixed::{Fixed64, block_coord};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BlockPos
// ---------------------------------------------------------------------------

/// A block coordinate. `y` is the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The neighboring block in the given direction.
    pub fn step(&self, dir: Direction) -> Self {
        let (dx, dy, dz) = dir.offset();
        self.offset(dx, dy, dz)
    }

    /// Every block in the inclusive box spanned by `a` and `b`, iterated
    /// x-fastest, then z, then y.
    pub fn all_in_box(a: BlockPos, b: BlockPos) -> impl Iterator<Item = BlockPos> {
        let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
        let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
        let (z0, z1) = (a.z.min(b.z), a.z.max(b.z));
        (y0..=y1).flat_map(move |y| {
            (z0..=z1).flat_map(move |z| (x0..=x1).map(move |x| BlockPos::new(x, y, z)))
        })
    }

    /// Chunk column containing this block (16x16 columns).
    pub fn chunk(&self) -> (i32, i32) {
        (self.x.div_euclid(16), self.z.div_euclid(16))
    }

    /// Fixed-point center of this block.
    pub fn center(&self) -> Vec3 {
        let half = Fixed64::from_num(0.5);
        Vec3::new(
            block_coord(self.x) + half,
            block_coord(self.y) + half,
            block_coord(self.z) + half,
        )
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// The six axis-aligned neighbor directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    /// The four horizontal directions.
    pub fn horizontal() -> [Direction; 4] {
        [
            Direction::North,
            Direction::South,
            Direction::West,
            Direction::East,
        ]
    }

    /// Offset for this direction. North is -z, east is +x.
    pub fn offset(&self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// Vec3 / Aabb
// ---------------------------------------------------------------------------

/// A fixed-point position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: Fixed64,
    pub y: Fixed64,
    pub z: Fixed64,
}

impl Vec3 {
    pub fn new(x: Fixed64, y: Fixed64, z: Fixed64) -> Self {
        Self { x, y, z }
    }

    /// Convenience constructor for setup code and tests.
    pub fn from_f64(x: f64, y: f64, z: f64) -> Self {
        Self::new(
            Fixed64::from_num(x),
            Fixed64::from_num(y),
            Fixed64::from_num(z),
        )
    }
}

/// An axis-aligned box in fixed-point space. Containment is half-open:
/// `min <= p < max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box spanning from the minimum corner of block `a` to the minimum
    /// corner of block `b`.
    pub fn from_corners(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: Vec3::new(
                block_coord(a.x.min(b.x)),
                block_coord(a.y.min(b.y)),
                block_coord(a.z.min(b.z)),
            ),
            max: Vec3::new(
                block_coord(a.x.max(b.x)),
                block_coord(a.y.max(b.y)),
                block_coord(a.z.max(b.z)),
            ),
        }
    }

    pub fn contains(&self, p: &Vec3) -> bool {
        p.x >= self.min.x
            && p.x < self.max.x
            && p.y >= self.min.y
            && p.y < self.max.y
            && p.z >= self.min.z
            && p.z < self.max.z
    }
}
