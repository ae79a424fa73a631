//! Reproducible, independent random streams for Monte-Carlo replicates.
//!
//! A single run-level seed initialises a root Xoshiro256++ generator. Replicate
//! `i` receives the root state advanced by `i` calls to [`Xoshiro256PlusPlus::jump`],
//! so every replicate draws from its own non-overlapping block of 2^128
//! outputs. The assignment depends only on the seed and the replicate index,
//! never on how many workers execute the run.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Generator owned by exactly one replicate for its whole lifetime.
pub type ReplicateRng = Xoshiro256PlusPlus;

/// Source of per-replicate streams derived from one run-level seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedStreams {
    seed: u64,
}

impl SeedStreams {
    /// Create a stream source from an explicit run seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create a stream source from a seed drawn from the thread-local generator.
    pub fn from_entropy() -> Self {
        Self::new(rand::rng().random())
    }

    /// Use `seed` if given, otherwise draw one from entropy.
    pub fn from_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::new)
    }

    /// The run-level seed; logging it makes an entropy-seeded run repeatable.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derive the streams for replicates `0..n_reps`, in replicate order.
    pub fn streams(&self, n_reps: usize) -> Vec<ReplicateRng> {
        let mut root = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        (0..n_reps)
            .map(|_| {
                let stream = root.clone();
                root.jump();
                stream
            })
            .collect()
    }

    /// Derive the stream of a single replicate.
    ///
    /// Equal to `self.streams(index + 1)[index]`.
    pub fn stream(&self, index: usize) -> ReplicateRng {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        for _ in 0..index {
            rng.jump();
        }
        rng
    }
}
