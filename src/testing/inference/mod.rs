use crate::data::Dataset;
use crate::testing::{PermutationTestResults, StatisticKind, StatisticResult};

pub mod permutation;

pub mod ranks;

pub mod sampler;

pub mod statistic;

pub use permutation::{PermutationConfig, PermutationTester};
pub use ranks::{FeatureRankTable, RankIndex};
pub use sampler::{LabelAssignment, PermutationSample, PermutationSampler};
pub use statistic::StatisticEngine;

pub trait DatasetStatTests {
    /// Monte-Carlo permutation test of every feature, Positive against Unlabelled.
    fn permutation_test(&self, config: &PermutationConfig) -> anyhow::Result<PermutationTestResults>;

    /// Statistic of every feature under the observed class labels.
    fn observed_statistics(&self, kind: StatisticKind) -> Vec<StatisticResult>;
}

impl DatasetStatTests for Dataset {
    fn permutation_test(&self, config: &PermutationConfig) -> anyhow::Result<PermutationTestResults> {
        PermutationTester::new(config.clone()).run(self)
    }

    fn observed_statistics(&self, kind: StatisticKind) -> Vec<StatisticResult> {
        let ranks = RankIndex::build(self);
        let observed = LabelAssignment::new(self.positive_indices());
        StatisticEngine::new(self, &ranks, kind).evaluate(&observed)
    }
}
