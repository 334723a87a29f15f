//! Deterministic PRNG for loot rolls and experience rewards.
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, and trivially
//! serializable for snapshots.

/// SplitMix64 pseudo-random number generator.
///
/// Deterministic across platforms, so two engines seeded alike produce the
/// same loot and the same state hash.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `0..bound`. Returns 0 when `bound` is 0.
    pub fn next_bounded(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        // Multiply-shift reduction of the upper 32 bits.
        let r = self.next_u64() >> 32;
        ((r * bound as u64) >> 32) as u32
    }

    /// Uniform value in `min..=max`. Returns `min` if the range is empty.
    pub fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        min + self.next_bounded(max - min + 1)
    }

    /// Get the internal state (for hashing/serialization).
    pub fn state(&self) -> u64 {
        self.state
    }
}
