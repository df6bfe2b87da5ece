//! Results directory: the per-feature table and the record of the parameters used.

use crate::param::Param;
use crate::testing::PermutationTestResults;
use anyhow::{Context, Result, bail};
use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub const RESULTS_FILE: &str = "StatisticalTesting.txt";
pub const PARAMETERS_FILE: &str = "ParametersUsed.txt";

#[derive(Serialize)]
struct ParametersUsed<'a> {
    parameters: &'a Param,
    requested_permutations: usize,
    effective_permutations: usize,
    trials: usize,
}

/// Fail if the results directory already exists; results are never written over.
pub fn ensure_output_available<P: AsRef<Path>>(dir: P) -> Result<()> {
    let dir = dir.as_ref();
    if dir.exists() {
        bail!("The results directory {} already exists", dir.display());
    }
    Ok(())
}

/// Create the results directory and write both output files into it.
pub fn write_results<P: AsRef<Path>>(
    results: &PermutationTestResults,
    param: &Param,
    dir: P,
) -> Result<()> {
    let dir = dir.as_ref();
    ensure_output_available(dir)?;
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create results directory {}", dir.display()))?;

    let results_path = dir.join(RESULTS_FILE);
    let file = File::create(&results_path)
        .with_context(|| format!("Cannot create {}", results_path.display()))?;
    write_results_table(results, BufWriter::new(file))?;

    let parameters_path = dir.join(PARAMETERS_FILE);
    let file = File::create(&parameters_path)
        .with_context(|| format!("Cannot create {}", parameters_path.display()))?;
    write_parameters(results, param, BufWriter::new(file))?;

    info!("Results written to {}", dir.display());
    Ok(())
}

/// Tab-separated table, one row per feature in dataset order.
pub fn write_results_table<W: Write>(results: &PermutationTestResults, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);

    wtr.write_record(header(results))?;

    for r in &results.results {
        let mut row = vec![
            r.feature.clone(),
            format_float(r.positive_summary.mean),
            format_float(r.positive_summary.median),
            format_float(r.positive_summary.rank_sum),
            format_float(r.other_summary.mean),
            format_float(r.other_summary.median),
            format_float(r.other_summary.rank_sum),
            r.trials.to_string(),
            format_float(r.observed),
            r.extremity_count.to_string(),
            format_float(r.p_value),
        ];
        row.extend(r.significant_at.iter().map(|&s| format_bool(s)));
        if results.correction_alpha.is_some() {
            row.push(format_bool(r.holm_significant.unwrap_or(false)));
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_parameters<W: Write>(
    results: &PermutationTestResults,
    param: &Param,
    writer: W,
) -> Result<()> {
    let used = ParametersUsed {
        parameters: param,
        requested_permutations: results.requested_permutations,
        effective_permutations: results.effective_permutations,
        trials: results.trials(),
    };
    serde_yaml::to_writer(writer, &used)?;
    Ok(())
}

fn header(results: &PermutationTestResults) -> Vec<String> {
    let mut columns: Vec<String> = [
        "Feature",
        "PositiveMean",
        "PositiveMedian",
        "PositiveRankSum",
        "UnlabelledMean",
        "UnlabelledMedian",
        "UnlabelledRankSum",
        "Permutations",
        "OriginalStatistic",
        "StatsNoLessExtreme",
        "PValue",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    columns.extend(results.alphas.iter().map(|a| format!("SignificantAt-{}", a)));
    if let Some(alpha) = results.correction_alpha {
        columns.push(format!("CorrectedSignificantAt-{}", alpha));
    }
    columns
}

/// Integral values keep one decimal (`3.0`), everything else uses the shortest exact form
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn format_bool(value: bool) -> String {
    let text = if value { "True" } else { "False" };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Direction, FeatureTestResult, GroupSummary, StatisticKind};

    fn results() -> PermutationTestResults {
        let r = FeatureTestResult {
            feature: "Hydrophobicity".to_string(),
            positive_summary: GroupSummary { mean: 11.5, median: 11.5, rank_sum: 26.0 },
            other_summary: GroupSummary { mean: 2.5, median: 2.5, rank_sum: 10.0 },
            observed: 9.0,
            direction: Direction::Upper,
            trials: 51,
            extremity_count: 1,
            p_value: 1.0 / 51.0,
            significant_at: Vec::new(),
            holm_adjusted_p_value: None,
            holm_significant: None,
        };
        PermutationTestResults::new(vec![r], StatisticKind::Mean, 50, 50)
            .with_alpha_levels(&[0.05, 0.01])
    }

    #[test]
    fn test_table_layout() {
        let mut buf = Vec::new();
        write_results_table(&results(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Feature\tPositiveMean\tPositiveMedian\tPositiveRankSum\tUnlabelledMean\t\
             UnlabelledMedian\tUnlabelledRankSum\tPermutations\tOriginalStatistic\t\
             StatsNoLessExtreme\tPValue\tSignificantAt-0.05\tSignificantAt-0.01"
        );
        let fields: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(fields[0], "Hydrophobicity");
        assert_eq!(fields[3], "26.0");
        assert_eq!(fields[7], "51");
        assert_eq!(fields[8], "9.0");
        assert_eq!(fields[9], "1");
        assert_eq!(fields[10].parse::<f64>().unwrap(), 1.0 / 51.0);
        assert_eq!(&fields[11..], &["True", "False"]);
    }

    #[test]
    fn test_corrected_column() {
        let results = results().with_holm_correction(0.05).unwrap();
        let mut buf = Vec::new();
        write_results_table(&results, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].ends_with("\tCorrectedSignificantAt-0.05"));
        assert!(lines[1].ends_with("\tTrue\tFalse\tTrue"));
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(-2.0), "-2.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(1.0 / 3.0), "0.3333333333333333");
    }

    #[test]
    fn test_existing_directory_refused() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_results(&results(), &Param::default(), dir.path()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(!dir.path().join(RESULTS_FILE).exists());
    }

    #[test]
    fn test_write_results_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results");
        write_results(&results(), &Param::default(), &out).unwrap();
        assert!(out.join(RESULTS_FILE).exists());

        let yaml = fs::read_to_string(out.join(PARAMETERS_FILE)).unwrap();
        assert!(yaml.contains("effective_permutations: 50"));
        assert!(yaml.contains("trials: 51"));
        assert!(yaml.contains("statistic: mean"));
    }
}
