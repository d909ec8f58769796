//! Deterministic PRNG for world generation (terrain, random maps, node tiers).
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, and trivially
//! reproducible from a seed so that tests can pin down a generated world.

/// SplitMix64 pseudo-random number generator.
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
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        // Multiply-shift keeps the bias negligible for the small bounds used here.
        ((self.next_u64() >> 32) * bound as u64 >> 32) as u32
    }

    /// Pick an index into `weights` with probability proportional to its weight.
    ///
    /// Returns `None` if the weights are empty or all zero.
    pub fn weighted_index(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u32 = weights.iter().sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.next_below(total);
        for (i, &w) in weights.iter().enumerate() {
            if roll < w {
                return Some(i);
            }
            roll -= w;
        }
        None
    }

    /// Get the internal state.
    pub fn state(&self) -> u64 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn next_below_stays_in_range() {
        let mut rng = SimRng::new(7);
        for _ in 0..1_000 {
            assert!(rng.next_below(25) < 25);
        }
        assert_eq!(rng.next_below(0), 0);
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        let mut rng = SimRng::new(3);
        for _ in 0..200 {
            assert_eq!(rng.weighted_index(&[0, 5, 0]), Some(1));
        }
        assert_eq!(rng.weighted_index(&[0, 0]), None);
        assert_eq!(rng.weighted_index(&[]), None);
    }

    #[test]
    fn weighted_index_roughly_follows_weights() {
        let mut rng = SimRng::new(12345);
        let mut counts = [0u32; 3];
        for _ in 0..10_000 {
            counts[rng.weighted_index(&[50, 35, 15]).unwrap()] += 1;
        }
        // Expect ~5000 / 3500 / 1500 with generous tolerance.
        assert!((4500..=5500).contains(&counts[0]), "got {counts:?}");
        assert!((3000..=4000).contains(&counts[1]), "got {counts:?}");
        assert!((1100..=1900).contains(&counts[2]), "got {counts:?}");
    }

    #[test]
    fn serialization_round_trip() {
        let mut rng = SimRng::new(42);
        for _ in 0..50 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: SimRng = serde_json::from_str(&json).unwrap();
        assert_eq!(rng, restored);
        assert_eq!(rng.next_u64(), restored.next_u64());
    }
}
