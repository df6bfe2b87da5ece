//! Observation × feature table with a binary class label per observation.
//!
//! A [`Dataset`] is built once per run (usually through [`load_dataset`]) and is only read
//! afterwards. Values are stored densely, one row per observation and one column per feature,
//! so a feature column can be handed to the rank and statistic code as a contiguous view.

use ndarray::{Array2, ArrayView1};
use std::fmt;
use thiserror::Error;

mod loader;

pub use loader::{LoadOptions, load_dataset, read_dataset};

/// Errors raised while loading or assembling a dataset. All of them are fatal for a run.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error reading dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed tab-separated input: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset is empty: no header line found")]
    Empty,

    #[error("Missing class-label column: expected last column '{expected}', found '{found}'")]
    MissingClassColumn { expected: String, found: String },

    #[error("Feature-type row has {found} fields but the header has {expected}")]
    TypeRowLength { expected: usize, found: usize },

    #[error("Line {line}: expected {expected} fields, found {found}")]
    RowLength { line: u64, expected: usize, found: usize },

    #[error("Non-numeric value '{value}' for feature '{feature}' at line {line}")]
    NonNumeric { feature: String, line: u64, value: String },

    #[error("Dataset has no {0} observations")]
    MissingClass(ClassLabel),

    #[error("No features left to test after exclusion")]
    NoFeatures,

    #[error("Shape mismatch: {0}")]
    Shape(String),
}

/// Class of an observation: the Positive target or anything else (Unlabelled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassLabel {
    Positive,
    Other,
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLabel::Positive => write!(f, "Positive"),
            ClassLabel::Other => write!(f, "Unlabelled"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature names in column order.
    pub features: Vec<String>,
    /// Observations × features.
    pub values: Array2<f64>,
    /// One label per observation (row).
    pub labels: Vec<ClassLabel>,
}

impl Dataset {
    /// Assemble a dataset, checking that the shapes agree and that both classes are present.
    pub fn new(
        features: Vec<String>,
        values: Array2<f64>,
        labels: Vec<ClassLabel>,
    ) -> Result<Self, DatasetError> {
        let (n_obs, n_features) = values.dim();
        if n_features != features.len() {
            return Err(DatasetError::Shape(format!(
                "{} feature names for {} value columns",
                features.len(),
                n_features
            )));
        }
        if n_obs != labels.len() {
            return Err(DatasetError::Shape(format!(
                "{} labels for {} observations",
                labels.len(),
                n_obs
            )));
        }
        if features.is_empty() {
            return Err(DatasetError::NoFeatures);
        }
        for class in [ClassLabel::Positive, ClassLabel::Other] {
            if !labels.contains(&class) {
                return Err(DatasetError::MissingClass(class));
            }
        }

        Ok(Dataset {
            features,
            values,
            labels,
        })
    }

    pub fn n_observations(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Values of one feature across all observations.
    pub fn feature(&self, j: usize) -> ArrayView1<'_, f64> {
        self.values.column(j)
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f == name)
    }

    /// Row indices of the observations actually labelled Positive, ascending.
    pub fn positive_indices(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, &l)| if l == ClassLabel::Positive { Some(i) } else { None })
            .collect()
    }

    pub fn n_positive(&self) -> usize {
        self.labels
            .iter()
            .filter(|&&l| l == ClassLabel::Positive)
            .count()
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dataset: {} observations ({} Positive, {} Unlabelled) x {} features",
            self.n_observations(),
            self.n_positive(),
            self.n_observations() - self.n_positive(),
            self.n_features()
        )
    }
}
