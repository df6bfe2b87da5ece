//! Random, de-duplicated label permutations of a fixed group size.
//!
//! Sampling is strictly sequential: the set of already drawn assignments is owned by
//! [`PermutationSampler::sample`] and dropped before the (parallel) evaluation begins.

use crate::testing::utils::n_choose_k_capped;
use anyhow::{Result, anyhow};
use log::{debug, warn};
use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::sync::Arc;

/// Progress is logged every this many created assignments.
const PROGRESS_INTERVAL: usize = 10_000;

/// Observations treated as Positive in one trial, as sorted indices.
///
/// Clones share the index storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelAssignment(Arc<[usize]>);

impl LabelAssignment {
    /// Canonical form of a set of indices: sorted, without duplicates
    pub fn new(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        LabelAssignment(indices.into())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Draws up to `n_permutations` distinct assignments of `group_size` out of `n_observations`.
#[derive(Debug, Clone)]
pub struct PermutationSampler {
    n_observations: usize,
    group_size: usize,
    n_permutations: usize,
    seed: Option<u64>,
}

/// The assignments of one run, the observed labelling first.
#[derive(Debug, Clone)]
pub struct PermutationSample {
    assignments: Vec<LabelAssignment>,
    requested: usize,
}

impl PermutationSample {
    pub fn assignments(&self) -> &[LabelAssignment] {
        &self.assignments
    }

    pub fn observed(&self) -> &LabelAssignment {
        &self.assignments[0]
    }

    /// Permutations asked for, the observed labelling excluded
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Distinct permutations drawn, the observed labelling excluded
    pub fn effective(&self) -> usize {
        self.assignments.len() - 1
    }

    /// Trials to evaluate: every permutation plus the observed labelling
    pub fn trials(&self) -> usize {
        self.assignments.len()
    }
}

impl PermutationSampler {
    pub fn new(n_observations: usize, group_size: usize, n_permutations: usize) -> Self {
        PermutationSampler {
            n_observations,
            group_size,
            n_permutations,
            seed: None,
        }
    }

    /// Fix the generator seed; unseeded samplers draw from OS entropy
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Number of assignments the sample will hold, the observed one included.
    ///
    /// This is `n_permutations + 1` unless fewer distinct assignments exist.
    pub fn target_size(&self) -> usize {
        let wanted = self.n_permutations.saturating_add(1);
        n_choose_k_capped(self.n_observations, self.group_size, wanted)
    }

    pub fn sample(&self, observed: &LabelAssignment) -> Result<PermutationSample> {
        if observed.len() != self.group_size {
            return Err(anyhow!(
                "Observed assignment has {} members, expected {}",
                observed.len(),
                self.group_size
            ));
        }
        if let Some(&i) = observed.indices().iter().find(|&&i| i >= self.n_observations) {
            return Err(anyhow!(
                "Observed assignment index {} out of range for {} observations",
                i,
                self.n_observations
            ));
        }

        let wanted = self.n_permutations.saturating_add(1);
        let total = n_choose_k_capped(
            self.n_observations,
            self.group_size,
            wanted.saturating_add(1),
        );

        // When every distinct assignment is needed, enumerate instead of searching at random
        let assignments = if total <= wanted {
            if total < wanted {
                warn!(
                    "Only {} distinct assignments of {} out of {} observations exist; using all of them instead of {} permutations",
                    total, self.group_size, self.n_observations, self.n_permutations
                );
            }
            self.enumerate_all(observed)
        } else {
            self.draw_random(observed, wanted)
        };

        debug!("{} assignments created", assignments.len());
        Ok(PermutationSample {
            assignments,
            requested: self.n_permutations,
        })
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn draw_random(&self, observed: &LabelAssignment, target: usize) -> Vec<LabelAssignment> {
        let mut rng = self.rng();
        let mut seen: HashSet<LabelAssignment> = HashSet::with_capacity(target);
        let mut assignments = Vec::with_capacity(target);

        seen.insert(observed.clone());
        assignments.push(observed.clone());

        while assignments.len() < target {
            let drawn = index::sample(&mut rng, self.n_observations, self.group_size).into_vec();
            let candidate = LabelAssignment::new(drawn);
            if seen.insert(candidate.clone()) {
                assignments.push(candidate);
                if assignments.len() % PROGRESS_INTERVAL == 0 {
                    debug!("{} permutations created", assignments.len());
                }
            }
        }

        assignments
    }

    /// Every k-combination in lexicographic order, the observed one moved to the front.
    fn enumerate_all(&self, observed: &LabelAssignment) -> Vec<LabelAssignment> {
        let n = self.n_observations;
        let k = self.group_size;
        let mut assignments = vec![observed.clone()];

        let mut current: Vec<usize> = (0..k).collect();
        loop {
            if current.as_slice() != observed.indices() {
                assignments.push(LabelAssignment(current.as_slice().into()));
            }

            // Rightmost position that can still be incremented
            let Some(pos) = (0..k).rev().find(|&i| current[i] < n - k + i) else {
                break;
            };
            current[pos] += 1;
            for i in pos + 1..k {
                current[i] = current[i - 1] + 1;
            }
        }

        assignments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_assignment_is_canonical() {
        let a = LabelAssignment::new(vec![3, 1, 2, 1]);
        assert_eq!(a.indices(), &[1, 2, 3]);
        assert_eq!(a, LabelAssignment::new(vec![2, 3, 1]));
    }

    #[test]
    fn test_drawn_assignments_share_storage_with_dedup_set() {
        let a = LabelAssignment::new(vec![4, 1, 2]);
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.0, &b.0));

        let observed = LabelAssignment::new(vec![0, 1]);
        let sample = PermutationSampler::new(30, 2, 20)
            .with_seed(Some(5))
            .sample(&observed)
            .unwrap();
        // The caller's observed assignment is reused, not copied
        assert!(Arc::ptr_eq(&sample.observed().0, &observed.0));
    }

    #[test]
    fn test_sample_sizes_and_distinctness() {
        let observed = LabelAssignment::new(vec![0, 1, 2, 3]);
        let sample = PermutationSampler::new(8, 4, 50)
            .with_seed(Some(42))
            .sample(&observed)
            .unwrap();
        assert_eq!(sample.trials(), 51);
        assert_eq!(sample.effective(), 50);
        assert_eq!(sample.observed(), &observed);

        let unique: HashSet<_> = sample.assignments().iter().collect();
        assert_eq!(unique.len(), 51);
        for a in sample.assignments() {
            assert_eq!(a.len(), 4);
            assert!(a.indices().iter().all(|&i| i < 8));
            assert!(a.indices().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_exhaustion_uses_every_assignment() {
        let observed = LabelAssignment::new(vec![0, 2, 3]);
        let sampler = PermutationSampler::new(4, 3, 1000).with_seed(Some(1));
        assert_eq!(sampler.target_size(), 4);

        let sample = sampler.sample(&observed).unwrap();
        assert_eq!(sample.trials(), 4);
        assert_eq!(sample.effective(), 3);
        assert_eq!(sample.requested(), 1000);
        assert_eq!(sample.observed(), &observed);

        let unique: HashSet<_> = sample.assignments().iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_exact_fit_is_not_exhaustion() {
        // C(5, 2) = 10 = N + 1
        let observed = LabelAssignment::new(vec![0, 1]);
        let sample = PermutationSampler::new(5, 2, 9)
            .with_seed(Some(7))
            .sample(&observed)
            .unwrap();
        assert_eq!(sample.trials(), 10);
        assert_eq!(sample.effective(), 9);
    }

    #[test]
    fn test_zero_permutations() {
        let observed = LabelAssignment::new(vec![1]);
        let sample = PermutationSampler::new(5, 1, 0).sample(&observed).unwrap();
        assert_eq!(sample.trials(), 1);
        assert_eq!(sample.effective(), 0);
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let observed = LabelAssignment::new(vec![0, 1, 2]);
        let sampler = PermutationSampler::new(20, 3, 200).with_seed(Some(2024));
        let a = sampler.sample(&observed).unwrap();
        let b = sampler.sample(&observed).unwrap();
        assert_eq!(a.assignments(), b.assignments());

        let c = PermutationSampler::new(20, 3, 200)
            .with_seed(Some(2025))
            .sample(&observed)
            .unwrap();
        assert_ne!(a.assignments(), c.assignments());
    }

    #[test]
    fn test_invalid_observed_assignment() {
        let sampler = PermutationSampler::new(5, 2, 10);
        assert!(sampler.sample(&LabelAssignment::new(vec![0])).is_err());
        assert!(sampler.sample(&LabelAssignment::new(vec![0, 5])).is_err());
    }

    #[test]
    fn test_enumeration_covers_all_combinations() {
        let observed = LabelAssignment::new(vec![1, 3]);
        let sample = PermutationSampler::new(5, 2, 100).sample(&observed).unwrap();
        assert_eq!(sample.trials(), 10);
        assert_eq!(sample.observed(), &observed);
        let unique: HashSet<_> = sample.assignments().iter().collect();
        assert_eq!(unique.len(), 10);
    }
}
