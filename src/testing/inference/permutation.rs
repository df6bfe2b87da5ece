//! Monte-Carlo permutation test of every feature of a dataset.
//!
//! # Algorithm
//!
//! 1. Rank every feature once and compute the observed statistic of each feature
//! 2. Sample distinct labellings of the same group size as the observed Positives
//! 3. Evaluate the statistic for every labelling (the observed one included) in parallel
//! 4. P-value = labellings no less extreme than the observed one / labellings evaluated

use crate::data::Dataset;
use crate::testing::inference::ranks::RankIndex;
use crate::testing::inference::sampler::{LabelAssignment, PermutationSample, PermutationSampler};
use crate::testing::inference::statistic::StatisticEngine;
use crate::testing::{
    Direction, FeatureTestResult, PermutationTestResults, StatisticKind, StatisticResult,
};
use anyhow::Result;
use log::info;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for permutation testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationConfig {
    /// Number of permutations to sample besides the observed labelling.
    pub n_permutations: usize,
    /// Statistic whose group difference is tested.
    pub statistic: StatisticKind,
    /// Random seed for reproducibility; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Worker threads for the evaluation; 0 lets rayon decide.
    pub threads: usize,
    /// Significance levels reported per feature.
    pub alphas: Vec<f64>,
    /// Family-wise alpha of the Holm-Bonferroni correction, if any.
    pub correction_alpha: Option<f64>,
}

impl Default for PermutationConfig {
    fn default() -> Self {
        PermutationConfig {
            n_permutations: 1000,
            statistic: StatisticKind::Mean,
            seed: None,
            threads: 0,
            alphas: vec![0.05],
            correction_alpha: None,
        }
    }
}

/// Observed difference of one feature and the tail it is compared against.
#[derive(Debug, Clone, Copy)]
struct Reference {
    observed: f64,
    direction: Direction,
}

impl Reference {
    fn from_statistic(stat: &StatisticResult) -> Self {
        Reference {
            observed: stat.difference,
            direction: Direction::from_observed(stat.difference),
        }
    }

    fn counts(&self, permuted: &StatisticResult) -> bool {
        self.direction
            .is_no_less_extreme(self.observed, permuted.difference)
    }
}

pub struct PermutationTester {
    config: PermutationConfig,
}

impl PermutationTester {
    pub fn new(config: PermutationConfig) -> Self {
        PermutationTester { config }
    }

    pub fn config(&self) -> &PermutationConfig {
        &self.config
    }

    pub fn run(&self, dataset: &Dataset) -> Result<PermutationTestResults> {
        let config = &self.config;
        let observed = LabelAssignment::new(dataset.positive_indices());
        info!(
            "Permutation test: {} features, statistic {}, {} permutations requested",
            dataset.n_features(),
            config.statistic,
            config.n_permutations
        );

        let ranks = RankIndex::build(dataset);
        let engine = StatisticEngine::new(dataset, &ranks, config.statistic);

        let references: Vec<Reference> = engine
            .evaluate(&observed)
            .iter()
            .map(Reference::from_statistic)
            .collect();
        let summaries = engine.summarize(&observed);

        let sample = PermutationSampler::new(
            dataset.n_observations(),
            observed.len(),
            config.n_permutations,
        )
        .with_seed(config.seed)
        .sample(&observed)?;
        info!(
            "{} distinct permutations sampled ({} trials with the observed labelling)",
            sample.effective(),
            sample.trials()
        );

        let counts = self.count_extreme(&engine, &references, &sample)?;
        let trials = sample.trials();

        let results = dataset
            .features
            .iter()
            .zip(references.iter().zip(summaries))
            .zip(counts)
            .map(|((feature, (reference, (positive, other))), count)| FeatureTestResult {
                feature: feature.clone(),
                positive_summary: positive,
                other_summary: other,
                observed: reference.observed,
                direction: reference.direction,
                trials,
                extremity_count: count,
                p_value: count as f64 / trials as f64,
                significant_at: Vec::new(),
                holm_adjusted_p_value: None,
                holm_significant: None,
            })
            .collect();

        let mut results = PermutationTestResults::new(
            results,
            config.statistic,
            sample.requested(),
            sample.effective(),
        )
        .with_alpha_levels(&config.alphas);

        if let Some(alpha) = config.correction_alpha {
            results = results.with_holm_correction(alpha)?;
            info!(
                "{} features significant after Holm-Bonferroni correction at {}",
                results
                    .results
                    .iter()
                    .filter(|r| r.holm_significant == Some(true))
                    .count(),
                alpha
            );
        }

        Ok(results)
    }

    /// Per-feature count of trials no less extreme than the observed labelling.
    ///
    /// Each rayon worker folds into its own counter vector; the vectors are summed at the end.
    fn count_extreme(
        &self,
        engine: &StatisticEngine<'_>,
        references: &[Reference],
        sample: &PermutationSample,
    ) -> Result<Vec<usize>> {
        let n_features = references.len();
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()?;

        let counts = pool.install(|| {
            sample
                .assignments()
                .par_iter()
                .fold(
                    || vec![0usize; n_features],
                    |mut acc, assignment| {
                        for (j, stat) in engine.evaluate(assignment).iter().enumerate() {
                            if references[j].counts(stat) {
                                acc[j] += 1;
                            }
                        }
                        acc
                    },
                )
                .reduce(|| vec![0usize; n_features], merge_counts)
        });

        Ok(counts)
    }
}

fn merge_counts(mut a: Vec<usize>, b: Vec<usize>) -> Vec<usize> {
    for (x, y) in a.iter_mut().zip(b) {
        *x += y;
    }
    a
}
