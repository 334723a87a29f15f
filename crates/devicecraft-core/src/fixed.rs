use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits. Used for entity
/// positions so that area containment is bit-exact across platforms.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// The fixed-point coordinate of the minimum corner of a block.
#[inline]
pub fn block_coord(v: i32) -> Fixed64 {
    Fixed64::from_num(v)
}
