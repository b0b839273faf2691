//! Deterministic sampling for crossover parent selection.
//!
//! Every stream is a pure function of its seed string: the string is hashed
//! with SHA-256 and the digest seeds a `ChaCha8Rng`. No global generator is
//! involved, so draws are identical across threads, processes and call order.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Minimum number of parents in a crossover.
pub const MIN_PARENTS: usize = 2;

/// Create a reproducible random stream from an arbitrary seed string.
pub fn seeded_rng(seed: &str) -> ChaCha8Rng {
    let digest: [u8; 32] = Sha256::digest(seed.as_bytes()).into();
    ChaCha8Rng::from_seed(digest)
}

/// Sampler keyed by `(test, generation, iteration)` under a fixed tag.
#[derive(Debug, Clone)]
pub struct Sampler {
    tag: String,
}

impl Sampler {
    /// Sampler under `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Random stream for one crossover.
    pub fn stream(&self, test_id: &str, generation: usize, iteration: usize) -> ChaCha8Rng {
        seeded_rng(&format!(
            "{}-{}-{}-{}",
            self.tag, test_id, generation, iteration
        ))
    }

    /// Pick distinct parent indices for one crossover.
    ///
    /// The parent count is uniform in `[2, max_crossovers)`, clamped to the
    /// pool length. Indices are drawn uniformly with rejection on collision,
    /// in draw order.
    pub fn select_parents(
        &self,
        test_id: &str,
        generation: usize,
        iteration: usize,
        pool_len: usize,
        max_crossovers: usize,
    ) -> Vec<usize> {
        let mut rng = self.stream(test_id, generation, iteration);

        let count = if max_crossovers > MIN_PARENTS {
            rng.random_range(MIN_PARENTS..max_crossovers)
        } else {
            MIN_PARENTS
        }
        .min(pool_len);

        let mut indices = Vec::with_capacity(count);
        while indices.len() < count {
            let index = rng.random_range(0..pool_len);
            if !indices.contains(&index) {
                indices.push(index);
            }
        }
        indices
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new("EE-CROSSOVER")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::RngCore;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = seeded_rng("EE-CROSSOVER-p1-0-0");
        let mut b = seeded_rng("EE-CROSSOVER-p1-0-0");
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_different_keys_differ() {
        let sampler = Sampler::default();
        let mut a = sampler.stream("p1", 0, 0);
        let mut b = sampler.stream("p1", 0, 1);
        let draws_a: Vec<u64> = (0..4).map(|_| a.next_u64()).collect();
        let draws_b: Vec<u64> = (0..4).map(|_| b.next_u64()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn test_parents_clamped_to_pool() {
        let sampler = Sampler::default();
        let parents = sampler.select_parents("p1", 0, 0, 1, 4);
        assert_eq!(parents, vec![0]);
        assert!(sampler.select_parents("p1", 0, 0, 0, 4).is_empty());
    }

    #[test]
    fn test_two_parents_when_range_is_fixed() {
        let sampler = Sampler::default();
        let parents = sampler.select_parents("p9", 3, 5, 8, 3);
        assert_eq!(parents.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_selection_is_reproducible(
            test_id in "[a-z0-9]{1,12}",
            generation in 0usize..16,
            iteration in 0usize..16,
        ) {
            let first = Sampler::default().select_parents(&test_id, generation, iteration, 8, 4);
            let second = Sampler::default().select_parents(&test_id, generation, iteration, 8, 4);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_selection_is_distinct_and_sized(
            test_id in "[a-z0-9]{1,12}",
            generation in 0usize..16,
            iteration in 0usize..16,
            pool_len in 3usize..16,
            max_crossovers in 3usize..6,
        ) {
            let parents = Sampler::default()
                .select_parents(&test_id, generation, iteration, pool_len, max_crossovers);

            prop_assert!(parents.len() >= MIN_PARENTS);
            prop_assert!(parents.len() < max_crossovers);
            prop_assert!(parents.iter().all(|&i| i < pool_len));

            let mut unique = parents.clone();
            unique.sort_unstable();
            unique.dedup();
            prop_assert_eq!(unique.len(), parents.len());
        }
    }
}
