//! # feature-significance
//!
//! Permutation significance testing of numeric features between a Positive class and the
//! remaining (Unlabelled) observations of a labelled tabular dataset.
//!
//! For each feature a group statistic (mean, median or rank sum) is computed for both classes
//! and their difference compared against the differences obtained under random relabellings.
//! The p-value is the fraction of trials, the observed labelling included, that are no less
//! extreme than the observed difference. Relabellings are drawn without replacement, so when a
//! dataset has fewer distinct labellings than requested the test becomes exact.
//!
//! ## Core Features
//!
//! - **Permutation Test**: Seeded, de-duplicated relabellings evaluated in parallel with rayon
//! - **Test Statistics**: Difference of means, medians or mid-rank sums
//! - **Multiple Testing Correction**: Holm-Bonferroni step-down across all features
//!
//! ## Quick Start
//!
//! Load a tab-separated dataset with [`data::load_dataset`] and use the
//! [`testing::inference::DatasetStatTests`] trait, or drive a whole run from a [`param::Param`]
//! with [`run`].
//!
//! ## Module Organization
//!
//! - **[`data`]**: Dataset model and the tab-separated loader
//! - **[`testing`]**: Ranks, statistics, permutation sampling and testing, and correction
//! - **[`param`]**: YAML parameter file
//! - **[`output`]**: Results table and parameter record

pub mod data;
pub mod output;
pub mod param;
pub mod testing;

use log::info;
use param::Param;
use testing::PermutationTestResults;
use testing::inference::PermutationTester;

/// Load the dataset named by `param`, test every feature and write the results directory.
///
/// The results directory is checked before any work is done, so an existing directory fails
/// fast and is left untouched.
pub fn run(param: &Param) -> anyhow::Result<PermutationTestResults> {
    param::validate(param)?;
    output::ensure_output_available(&param.data.output)?;

    let dataset = data::load_dataset(&param.data.dataset, &param.load_options())?;
    info!(
        "Testing {} features over {} observations ({} Positive) with the {} statistic",
        dataset.n_features(),
        dataset.n_observations(),
        dataset.n_positive(),
        param.permutation.statistic
    );

    let results = PermutationTester::new(param.permutation_config()).run(&dataset)?;

    for &alpha in &results.alphas {
        info!(
            "{} features significant at {}",
            results.results.iter().filter(|r| r.is_significant(alpha)).count(),
            alpha
        );
    }
    output::write_results(&results, param, &param.data.output)?;
    Ok(results)
}
