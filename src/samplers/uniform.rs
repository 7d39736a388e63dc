//! Draws correspondence rows for each hypothesis with equal probability.

use crate::core::Sampler;
use crate::types::DataMatrix;
use crate::utils::UniformRandomGenerator;

/// Picks `sample_size` distinct correspondence rows per round, every row
/// equally likely.
#[derive(Default)]
pub struct UniformRandomSampler {
    rng: UniformRandomGenerator,
}

impl UniformRandomSampler {
    /// Entropy-seeded sampler; successive runs draw different rows.
    pub fn new() -> Self {
        Self {
            rng: UniformRandomGenerator::new(),
        }
    }

    /// Sampler whose draws repeat exactly for the same `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: UniformRandomGenerator::from_seed(seed),
        }
    }

    /// Seeded when `seed` is given, entropy-seeded otherwise.
    pub fn with_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::from_seed)
    }
}

impl Sampler for UniformRandomSampler {
    fn sample(&mut self, data: &DataMatrix, sample_size: usize, out_indices: &mut [usize]) -> bool {
        let n = data.nrows();
        if sample_size == 0 || n == 0 || sample_size > n || out_indices.len() < sample_size {
            return false;
        }
        self.rng.gen_unique(&mut out_indices[..sample_size], n);
        true
    }
}
