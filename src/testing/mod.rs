use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod correction;
pub mod inference;

pub mod utils;

/// Group statistic compared between the Positive and Unlabelled observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticKind {
    Mean,
    Median,
    RankSum,
}

impl StatisticKind {
    pub const ALL: [StatisticKind; 3] =
        [StatisticKind::Mean, StatisticKind::Median, StatisticKind::RankSum];
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatisticKind::Mean => "mean",
            StatisticKind::Median => "median",
            StatisticKind::RankSum => "ranksum",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for StatisticKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(StatisticKind::Mean),
            "median" => Ok(StatisticKind::Median),
            "ranksum" | "rank-sum" | "rank_sum" => Ok(StatisticKind::RankSum),
            other => Err(anyhow::anyhow!(
                "Unknown test statistic '{}' (expected mean, median or ranksum)",
                other
            )),
        }
    }
}

/// Which tail counts as "at least as extreme", fixed by the sign of the observed difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Observed difference is negative: smaller-or-equal differences count.
    Lower,
    /// Observed difference is positive or zero: greater-or-equal differences count.
    Upper,
}

impl Direction {
    pub fn from_observed(difference: f64) -> Self {
        if difference < 0.0 {
            Direction::Lower
        } else {
            Direction::Upper
        }
    }

    /// Whether a permuted difference is no less extreme than the observed one.
    pub fn is_no_less_extreme(self, observed: f64, permuted: f64) -> bool {
        match self {
            Direction::Lower => permuted <= observed,
            Direction::Upper => permuted >= observed,
        }
    }
}

/// One group statistic for both groups of a single feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticResult {
    pub positive: f64,
    pub other: f64,
    /// `positive - other`
    pub difference: f64,
}

impl StatisticResult {
    pub fn new(positive: f64, other: f64) -> Self {
        StatisticResult {
            positive,
            other,
            difference: positive - other,
        }
    }
}

/// Mean, median and rank sum of one group for a single feature.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroupSummary {
    pub mean: f64,
    pub median: f64,
    pub rank_sum: f64,
}

#[derive(Debug, Clone)]
pub struct FeatureTestResult {
    pub feature: String,
    /// Observed group summaries of the Positive observations
    pub positive_summary: GroupSummary,
    /// Observed group summaries of the Unlabelled observations
    pub other_summary: GroupSummary,
    /// Observed signed difference of the tested statistic
    pub observed: f64,
    pub direction: Direction,
    /// Trials evaluated, the observed labelling included
    pub trials: usize,
    /// Trials no less extreme than the observed one
    pub extremity_count: usize,
    pub p_value: f64,
    /// Significance at each alpha of the owning results, in the same order
    pub significant_at: Vec<bool>,
    pub holm_adjusted_p_value: Option<f64>,
    pub holm_significant: Option<bool>,
}

impl FeatureTestResult {
    /// Check if the result is statistically significant at the given threshold
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value <= alpha
    }
}

#[derive(Debug, Clone)]
pub struct PermutationTestResults {
    /// One entry per tested feature, in dataset column order
    pub results: Vec<FeatureTestResult>,
    pub statistic: StatisticKind,
    /// Permutations asked for
    pub requested_permutations: usize,
    /// Distinct permutations actually evaluated besides the observed labelling
    pub effective_permutations: usize,
    pub alphas: Vec<f64>,
    /// Family-wise alpha of the Holm correction, when applied
    pub correction_alpha: Option<f64>,
}

impl PermutationTestResults {
    pub fn new(
        results: Vec<FeatureTestResult>,
        statistic: StatisticKind,
        requested_permutations: usize,
        effective_permutations: usize,
    ) -> Self {
        PermutationTestResults {
            results,
            statistic,
            requested_permutations,
            effective_permutations,
            alphas: Vec::new(),
            correction_alpha: None,
        }
    }

    /// Record per-alpha significance (`p <= alpha`) for every feature.
    pub fn with_alpha_levels(mut self, alphas: &[f64]) -> Self {
        for result in &mut self.results {
            result.significant_at = alphas.iter().map(|&a| result.is_significant(a)).collect();
        }
        self.alphas = alphas.to_vec();
        self
    }

    /// Apply the Holm-Bonferroni step-down procedure across all features.
    pub fn with_holm_correction(mut self, alpha: f64) -> anyhow::Result<Self> {
        let p_values = self.p_values();
        let adjusted = correction::holm_bonferroni_correction(&p_values)?;
        let significant = correction::holm_bonferroni_significance(&p_values, alpha)?;
        for ((result, adj), sig) in self.results.iter_mut().zip(adjusted).zip(significant) {
            result.holm_adjusted_p_value = Some(adj);
            result.holm_significant = Some(sig);
        }
        self.correction_alpha = Some(alpha);
        Ok(self)
    }

    /// Trials evaluated per feature (sampled permutations plus the observed labelling)
    pub fn trials(&self) -> usize {
        self.effective_permutations + 1
    }

    /// Whether fewer distinct permutations exist than were requested
    pub fn is_exhaustive(&self) -> bool {
        self.effective_permutations < self.requested_permutations
    }

    pub fn p_values(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.p_value).collect()
    }

    /// Get indices of significant features at the given threshold, Holm-adjusted when available
    pub fn significant_indices(&self, alpha: f64) -> Vec<usize> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                let p = r.holm_adjusted_p_value.unwrap_or(r.p_value);
                if p <= alpha { Some(i) } else { None }
            })
            .collect()
    }

    /// Get the number of significant features at the given threshold
    pub fn num_significant(&self, alpha: f64) -> usize {
        self.significant_indices(alpha).len()
    }

    /// Get top n features by p-value
    pub fn top_features(&self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.results.len()).collect();
        indices.sort_by(|&a, &b| self.results[a].p_value.total_cmp(&self.results[b].p_value));
        indices.truncate(n);
        indices
    }
}
