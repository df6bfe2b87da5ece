//! Tie-aware mid-ranks of every feature column.
//!
//! Ranks depend only on the values of a column, never on the class labels, so a [`RankIndex`]
//! is built once per run and shared read-only by every trial of the permutation test.

use crate::data::Dataset;
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;

/// Mid-ranks of one feature, in observation order.
#[derive(Debug, Clone)]
pub struct FeatureRankTable {
    by_observation: Vec<f64>,
}

impl FeatureRankTable {
    pub fn from_values(values: &[f64]) -> Self {
        FeatureRankTable {
            by_observation: mid_ranks(values),
        }
    }

    pub fn ranks(&self) -> &[f64] {
        &self.by_observation
    }
}

/// Rank tables of every feature of a dataset.
#[derive(Debug, Clone)]
pub struct RankIndex {
    tables: Vec<FeatureRankTable>,
}

impl RankIndex {
    pub fn build(dataset: &Dataset) -> Self {
        let tables = (0..dataset.n_features())
            .into_par_iter()
            .map(|j| FeatureRankTable::from_values(&dataset.feature(j).to_vec()))
            .collect();

        RankIndex { tables }
    }

    pub fn feature(&self, j: usize) -> &FeatureRankTable {
        &self.tables[j]
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// 1-based ranks of `values`, tied values sharing the mean of their rank positions
pub fn mid_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let val = values[order[i]];
        let mut j = i + 1;

        // Tied by numeric equality, so -0.0 and 0.0 share a rank
        while j < n && values[order[j]] == val {
            j += 1;
        }

        // Positions i..j hold ranks i+1..=j
        let rank = (i + j + 1) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }

        i = j;
    }

    ranks
}
