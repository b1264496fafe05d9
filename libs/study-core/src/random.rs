//! Random sources for the card scheduler.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform random draws needed by the scheduler.
pub trait RandomSource {
    /// Uniform integer in `[0, bound)`. `bound` is never zero.
    fn next_index(&mut self, bound: usize) -> usize;

    /// Uniform float in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// [`RandomSource`] backed by `StdRng`.
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Seed from the operating system.
    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible sequence for a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_index(&mut self, bound: usize) -> usize {
        self.rng.random_range(0..bound)
    }

    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_index(&mut self, bound: usize) -> usize {
        (**self).next_index(bound)
    }

    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Uniform Fisher-Yates shuffle: position `i` swaps with a uniform pick in `[i, n)`.
pub fn shuffle<T, R: RandomSource + ?Sized>(values: &mut [T], rng: &mut R) {
    let n = values.len();
    for i in 0..n {
        let j = i + rng.next_index(n - i);
        values.swap(i, j);
    }
}
