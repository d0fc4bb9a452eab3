use rand::{rngs::SmallRng, SeedableRng};

/// Builds the random source used for weight sampling and random inputs.
///
/// A seed gives a reproducible stream; `None` draws the seed from OS entropy.
pub fn build_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}
