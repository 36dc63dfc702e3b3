//! Deterministic randomness for the random selection policies.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seedable generator owned by a pool.
#[derive(Clone, Debug)]
pub struct PoolRng {
    inner: ChaCha8Rng,
}

impl PoolRng {
    /// Generator with a fixed seed: same seed, same selections.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generator seeded from the wall clock.
    #[must_use]
    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        // Fold the high bits in so that every bit of the clock contributes.
        #[allow(clippy::cast_possible_truncation)]
        let seed = (nanos as u64) ^ ((nanos >> 64) as u64);
        Self::seeded(seed)
    }

    /// Seeded when `seed` is set, clock-seeded otherwise.
    #[must_use]
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_clock, Self::seeded)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }

    /// Uniform integer in `1..=100`.
    #[inline]
    pub fn percent(&mut self) -> u32 {
        self.inner.gen_range(1..=100)
    }

    /// Fisher–Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = PoolRng::seeded(7);
        let mut b = PoolRng::seeded(7);
        for _ in 0..64 {
            assert_eq!(a.index(10), b.index(10));
        }
    }

    #[test]
    fn test_percent_bounds() {
        let mut rng = PoolRng::seeded(1);
        for _ in 0..10_000 {
            let roll = rng.percent();
            assert!((1..=100).contains(&roll));
        }
    }

    #[test]
    fn test_shuffle_keeps_elements() {
        let mut rng = PoolRng::seeded(3);
        let mut items: Vec<u32> = (0..20).collect();
        rng.shuffle(&mut items);
        items.sort_unstable();
        assert_eq!(items, (0..20).collect::<Vec<_>>());
    }
}
