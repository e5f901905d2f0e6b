//! Seeded scenario randomness.
//!
//! One generator drives every random choice of a run: spawn point,
//! blueprint, color, and pause length. With a fixed seed and the same
//! simulator answers, a run makes the same choices in the same order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The scenario's random number generator and the seed it was built from.
#[derive(Debug, Clone)]
pub struct ScenarioRng {
    seed: u64,
    rng: StdRng,
}

impl ScenarioRng {
    /// Seed from `seed`, or draw a fresh seed from the OS when `None`.
    ///
    /// The drawn seed is kept so the run can be replayed.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        Self::from_seed(seed)
    }

    /// Seed deterministically.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The seed this generator started from.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// The underlying generator.
    pub const fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}
