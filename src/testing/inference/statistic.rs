use crate::data::Dataset;
use crate::testing::inference::ranks::RankIndex;
use crate::testing::inference::sampler::LabelAssignment;
use crate::testing::utils::{group_mask, median, split_by_mask};
use crate::testing::{GroupSummary, StatisticKind, StatisticResult};
use statrs::statistics::Statistics;

/// Computes the selected group statistic of every feature for a labelling.
///
/// The engine only borrows the dataset and its rank index; one instance serves the observed
/// labelling and all sampled permutations, from any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct StatisticEngine<'a> {
    dataset: &'a Dataset,
    ranks: &'a RankIndex,
    kind: StatisticKind,
}

impl<'a> StatisticEngine<'a> {
    pub fn new(dataset: &'a Dataset, ranks: &'a RankIndex, kind: StatisticKind) -> Self {
        StatisticEngine {
            dataset,
            ranks,
            kind,
        }
    }

    pub fn kind(&self) -> StatisticKind {
        self.kind
    }

    /// One [`StatisticResult`] per feature, in column order.
    pub fn evaluate(&self, assignment: &LabelAssignment) -> Vec<StatisticResult> {
        let mask = group_mask(assignment.indices(), self.dataset.n_observations());
        (0..self.dataset.n_features())
            .map(|j| self.feature_statistic(self.kind, j, &mask))
            .collect()
    }

    /// Mean, median and rank sum of both groups for every feature.
    pub fn summarize(&self, assignment: &LabelAssignment) -> Vec<(GroupSummary, GroupSummary)> {
        let mask = group_mask(assignment.indices(), self.dataset.n_observations());
        (0..self.dataset.n_features())
            .map(|j| {
                let mean = self.feature_statistic(StatisticKind::Mean, j, &mask);
                let median = self.feature_statistic(StatisticKind::Median, j, &mask);
                let rank_sum = self.feature_statistic(StatisticKind::RankSum, j, &mask);
                (
                    GroupSummary {
                        mean: mean.positive,
                        median: median.positive,
                        rank_sum: rank_sum.positive,
                    },
                    GroupSummary {
                        mean: mean.other,
                        median: median.other,
                        rank_sum: rank_sum.other,
                    },
                )
            })
            .collect()
    }

    fn feature_statistic(&self, kind: StatisticKind, j: usize, mask: &[bool]) -> StatisticResult {
        match kind {
            StatisticKind::Mean => {
                let (positive, other) = split_by_mask(self.dataset.feature(j), mask);
                StatisticResult::new(positive.mean(), other.mean())
            }
            StatisticKind::Median => {
                let (mut positive, mut other) = split_by_mask(self.dataset.feature(j), mask);
                StatisticResult::new(median(&mut positive), median(&mut other))
            }
            StatisticKind::RankSum => {
                let mut positive = 0.0;
                let mut other = 0.0;
                for (&rank, &m) in self.ranks.feature(j).ranks().iter().zip(mask) {
                    if m {
                        positive += rank;
                    } else {
                        other += rank;
                    }
                }
                StatisticResult::new(positive, other)
            }
        }
    }
}
