use crate::data::LoadOptions;
use crate::testing::StatisticKind;
use crate::testing::inference::PermutationConfig;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("Cannot read parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse parameter file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid parameter: {0}")]
    Invalid(String),
}

// Field definitions and associated default values

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Param {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub permutation: Permutation,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct General {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "uzero_default")]
    pub thread_number: usize,
    #[serde(default = "log_level_default")]
    pub log_level: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Data {
    #[serde(default = "empty_string")]
    pub dataset: String,
    #[serde(default = "empty_string")]
    pub output: String,
    #[serde(default)]
    pub exclude_features: Vec<String>,
    #[serde(default = "positive_label_default")]
    pub positive_label: String,
    #[serde(default = "class_column_default")]
    pub class_column: String,
    #[serde(default = "uzero_default")]
    pub skip_header_lines: usize,
    #[serde(default = "false_default")]
    pub feature_type_row: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Permutation {
    #[serde(default = "permutations_default")]
    pub permutations: usize,
    #[serde(default = "statistic_default")]
    pub statistic: StatisticKind,
    #[serde(default = "alphas_default")]
    pub alphas: Vec<f64>,
    /// Family-wise alpha of the Holm-Bonferroni correction; 0 disables it
    #[serde(default = "zero_default")]
    pub correction_alpha: f64,
}

impl Default for General {
    fn default() -> Self {
        General {
            seed: None,
            thread_number: uzero_default(),
            log_level: log_level_default(),
        }
    }
}

impl Default for Data {
    fn default() -> Self {
        Data {
            dataset: empty_string(),
            output: empty_string(),
            exclude_features: Vec::new(),
            positive_label: positive_label_default(),
            class_column: class_column_default(),
            skip_header_lines: uzero_default(),
            feature_type_row: false_default(),
        }
    }
}

impl Default for Permutation {
    fn default() -> Self {
        Permutation {
            permutations: permutations_default(),
            statistic: statistic_default(),
            alphas: alphas_default(),
            correction_alpha: zero_default(),
        }
    }
}

impl Param {
    pub fn new() -> Param {
        Param::default()
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            positive_label: self.data.positive_label.clone(),
            class_column: self.data.class_column.clone(),
            skip_header_lines: self.data.skip_header_lines,
            feature_type_row: self.data.feature_type_row,
            exclude_features: self.data.exclude_features.clone(),
        }
    }

    pub fn permutation_config(&self) -> PermutationConfig {
        PermutationConfig {
            n_permutations: self.permutation.permutations,
            statistic: self.permutation.statistic,
            seed: self.general.seed,
            threads: self.general.thread_number,
            alphas: self.permutation.alphas.clone(),
            correction_alpha: if self.permutation.correction_alpha > 0.0 {
                Some(self.permutation.correction_alpha)
            } else {
                None
            },
        }
    }
}

/// Read a YAML parameter file and validate it
pub fn get<P: AsRef<Path>>(param_file: P) -> Result<Param, ParamError> {
    let config = get_unchecked(param_file)?;

    validate(&config)?;

    Ok(config)
}

/// Read a YAML parameter file that command-line options will complete before validation
pub fn get_unchecked<P: AsRef<Path>>(param_file: P) -> Result<Param, ParamError> {
    let param_file_reader = File::open(param_file)?;
    let param_reader = BufReader::new(param_file_reader);

    let config: Param = serde_yaml::from_reader(param_reader)?;

    Ok(config)
}

pub fn validate(param: &Param) -> Result<(), ParamError> {
    if param.data.dataset.is_empty() {
        return Err(ParamError::Invalid("a dataset path is required".to_string()));
    }
    if param.data.output.is_empty() {
        return Err(ParamError::Invalid("an output location is required".to_string()));
    }

    if param.permutation.alphas.is_empty() {
        return Err(ParamError::Invalid("at least one alpha level is required".to_string()));
    }
    for &alpha in &param.permutation.alphas {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ParamError::Invalid(format!(
                "alpha={} must be in range (0, 1]",
                alpha
            )));
        }
    }

    let correction = param.permutation.correction_alpha;
    if !(0.0..=1.0).contains(&correction) {
        return Err(ParamError::Invalid(format!(
            "correction_alpha={} must be in range (0, 1], or 0 to disable the correction",
            correction
        )));
    }

    if param.permutation.permutations == 0 {
        warn!("permutations=0: only the observed labelling is evaluated and every p-value is 1");
    }

    if param.general.seed.is_none() {
        warn!("No seed given: results will not be reproducible across runs");
    }

    Ok(())
}

fn empty_string() -> String {
    String::new()
}

fn uzero_default() -> usize {
    0
}

fn zero_default() -> f64 {
    0.0
}

fn false_default() -> bool {
    false
}

fn log_level_default() -> String {
    "info".to_string()
}

fn positive_label_default() -> String {
    "Positive".to_string()
}

fn class_column_default() -> String {
    "Classification".to_string()
}

fn permutations_default() -> usize {
    1000
}

fn statistic_default() -> StatisticKind {
    StatisticKind::Mean
}

fn alphas_default() -> Vec<f64> {
    vec![0.05]
}
