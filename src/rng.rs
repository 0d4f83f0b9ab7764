//! Deterministic random number generation
//!
//! Every optimizer invocation owns a private ChaCha8 stream seeded from the
//! master seed and the biomass state it is solving, so runs are reproducible
//! and workers never contend on a shared generator.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::states::BiomassKey;

/// Derive the seed for one optimizer invocation.
pub fn run_seed(master_seed: u64, state: BiomassKey) -> u64 {
    let mut seed = master_seed;
    seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    seed ^= (state.raw() as u64).wrapping_mul(1103515245);
    seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    seed
}

/// RNG for one optimizer invocation.
pub fn run_rng(master_seed: u64, state: BiomassKey) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(run_seed(master_seed, state))
}
