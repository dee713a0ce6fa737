//! Deterministic random numbers for dealing and shuffling.
//!
//! A small linear congruential generator: the same seed always deals the
//! same hands and reveals the same round cards on every platform.

/// Seeded generator used at game setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckRng {
    state: u64,
}

impl DeckRng {
    /// Create a generator from `seed`.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Next raw value.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(0x5_DEEC_E66D).wrapping_add(11);
        self.state
    }

    /// Uniform-ish index in `0..bound`. Returns 0 for an empty range.
    pub fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        // Low bits of an LCG cycle quickly; use the high half.
        ((self.next() >> 33) % bound as u64) as usize
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = DeckRng::new(42);
        let mut b = DeckRng::new(42);
        for _ in 0..16 {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut items: Vec<u32> = (0..20).collect();
        DeckRng::new(7).shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_below_stays_in_range() {
        let mut rng = DeckRng::new(3);
        assert_eq!(rng.below(0), 0);
        for _ in 0..100 {
            assert!(rng.below(5) < 5);
        }
    }
}
