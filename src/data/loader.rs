use crate::data::{ClassLabel, Dataset, DatasetError};
use log::{debug, info, warn};
use ndarray::Array2;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Feature-type codes marking columns that are never tested.
const IGNORED_TYPE_CODES: [&str; 2] = ["x", "r"];

/// How the tab-separated input is interpreted.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Label value identifying Positive observations; every other value is Unlabelled.
    pub positive_label: String,
    /// Expected name of the last header column.
    pub class_column: String,
    /// Header lines following the feature-name line that carry no observations.
    pub skip_header_lines: usize,
    /// Treat the first skipped header line as a feature-type row (`x`/`r` columns are dropped).
    /// Implies at least one skipped header line.
    pub feature_type_row: bool,
    /// Feature names removed before testing.
    pub exclude_features: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            positive_label: "Positive".to_string(),
            class_column: "Classification".to_string(),
            skip_header_lines: 0,
            feature_type_row: false,
            exclude_features: Vec::new(),
        }
    }
}

/// Load a dataset from a tab-separated file.
pub fn load_dataset<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Dataset, DatasetError> {
    let path = path.as_ref();
    info!("Loading dataset {}...", path.display());
    let file = File::open(path)?;
    let dataset = read_dataset(BufReader::new(file), options)?;
    info!("{}", dataset);
    Ok(dataset)
}

/// Parse a dataset from any tab-separated reader.
///
/// The first line holds the feature names, its last column being the class label. Every data
/// line must have exactly as many fields as the header.
pub fn read_dataset<R: Read>(reader: R, options: &LoadOptions) -> Result<Dataset, DatasetError> {
    let mut records = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader)
        .into_records();

    let header = records.next().ok_or(DatasetError::Empty)??;
    let names: Vec<String> = header.iter().map(String::from).collect();
    let n_columns = names.len();
    let class_name = names.last().cloned().unwrap_or_default();
    if n_columns < 2 || class_name != options.class_column {
        return Err(DatasetError::MissingClassColumn {
            expected: options.class_column.clone(),
            found: class_name,
        });
    }
    let class_idx = n_columns - 1;

    let skipped = if options.feature_type_row {
        options.skip_header_lines.max(1)
    } else {
        options.skip_header_lines
    };
    let mut ignored: HashSet<usize> = HashSet::new();
    for h in 0..skipped {
        let Some(record) = records.next() else {
            break;
        };
        let record = record?;
        if h == 0 && options.feature_type_row {
            if record.len() != n_columns {
                return Err(DatasetError::TypeRowLength {
                    expected: n_columns,
                    found: record.len(),
                });
            }
            for (j, code) in record.iter().take(class_idx).enumerate() {
                if IGNORED_TYPE_CODES.contains(&code) {
                    debug!("Ignoring feature '{}' (type code '{}')", names[j], code);
                    ignored.insert(j);
                }
            }
        }
    }

    for name in &options.exclude_features {
        if !name.is_empty() && !names[..class_idx].contains(name) {
            warn!("Feature '{}' requested for exclusion is not in the dataset", name);
        }
    }

    let selected: Vec<usize> = (0..class_idx)
        .filter(|j| !ignored.contains(j) && !options.exclude_features.contains(&names[*j]))
        .collect();
    let features: Vec<String> = selected.iter().map(|&j| names[j].clone()).collect();

    let mut flat: Vec<f64> = Vec::new();
    let mut labels: Vec<ClassLabel> = Vec::new();
    for record in records {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        if record.len() != n_columns {
            return Err(DatasetError::RowLength {
                line,
                expected: n_columns,
                found: record.len(),
            });
        }

        for &j in &selected {
            let raw = &record[j];
            let value = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DatasetError::NonNumeric {
                    feature: names[j].clone(),
                    line,
                    value: raw.to_string(),
                })?;
            // -0 is stored as 0 so equal values compare and print alike
            flat.push(if value == 0.0 { 0.0 } else { value });
        }

        labels.push(if record[class_idx] == options.positive_label {
            ClassLabel::Positive
        } else {
            ClassLabel::Other
        });
    }

    let values = Array2::from_shape_vec((labels.len(), features.len()), flat)
        .map_err(|e| DatasetError::Shape(e.to_string()))?;

    Dataset::new(features, values, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str, options: &LoadOptions) -> Result<Dataset, DatasetError> {
        read_dataset(text.as_bytes(), options)
    }

    #[test]
    fn test_read_basic() {
        let text = "a\tb\tClassification\n1\t2.5\tPositive\n3\t4\tUnlabelled\n5\t6\tPositive\n";
        let ds = read(text, &LoadOptions::default()).unwrap();
        assert_eq!(ds.features, vec!["a", "b"]);
        assert_eq!(ds.n_observations(), 3);
        assert_eq!(ds.positive_indices(), vec![0, 2]);
        assert_eq!(ds.feature(1).to_vec(), vec![2.5, 4.0, 6.0]);
    }

    #[test]
    fn test_any_other_label_is_unlabelled() {
        let text = "a\tClassification\n1\tPositive\n2\tNegative\n3\tpositive\n";
        let ds = read(text, &LoadOptions::default()).unwrap();
        assert_eq!(
            ds.labels,
            vec![ClassLabel::Positive, ClassLabel::Other, ClassLabel::Other]
        );
    }

    #[test]
    fn test_missing_class_column() {
        let text = "a\tb\n1\t2\n";
        let err = read(text, &LoadOptions::default()).unwrap_err();
        match err {
            DatasetError::MissingClassColumn { expected, found } => {
                assert_eq!(expected, "Classification");
                assert_eq!(found, "b");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = read("Classification\nPositive\n", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingClassColumn { .. }));

        assert!(matches!(
            read("", &LoadOptions::default()).unwrap_err(),
            DatasetError::Empty
        ));
    }

    #[test]
    fn test_non_numeric_value_names_feature_and_line() {
        let text = "a\tb\tClassification\n1\t2\tPositive\n3\tabc\tUnlabelled\n";
        let err = read(text, &LoadOptions::default()).unwrap_err();
        match err {
            DatasetError::NonNumeric { feature, line, value } => {
                assert_eq!(feature, "b");
                assert_eq!(line, 3);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let text = "a\tClassification\n1\tPositive\nnan\tUnlabelled\n";
        let err = read(text, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DatasetError::NonNumeric { line: 3, .. }));
    }

    #[test]
    fn test_row_length_mismatch() {
        let text = "a\tb\tClassification\n1\t2\tPositive\n3\tUnlabelled\n";
        let err = read(text, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::RowLength { line: 3, expected: 3, found: 2 }
        ));
    }

    #[test]
    fn test_excluded_features_are_not_parsed() {
        // The excluded column holds text, which would otherwise be a parse error.
        let text = "a\tname\tClassification\n1\tP1234\tPositive\n2\tQ5678\tUnlabelled\n";
        let options = LoadOptions {
            exclude_features: vec!["name".to_string(), "missing".to_string()],
            ..LoadOptions::default()
        };
        let ds = read(text, &options).unwrap();
        assert_eq!(ds.features, vec!["a"]);
    }

    #[test]
    fn test_skip_header_lines_with_type_row() {
        let text = "a\tb\tc\tClassification\n\
                    n\tx\tr\tx\n\
                    cat1\tcat2\tcat3\tcat4\n\
                    1\tid1\t0.5\tPositive\n\
                    2\tid2\t0.7\tUnlabelled\n";
        let options = LoadOptions {
            skip_header_lines: 2,
            feature_type_row: true,
            ..LoadOptions::default()
        };
        let ds = read(text, &options).unwrap();
        assert_eq!(ds.features, vec!["a"]);
        assert_eq!(ds.n_observations(), 2);

        let options = LoadOptions {
            skip_header_lines: 2,
            feature_type_row: false,
            exclude_features: vec!["b".to_string()],
            ..LoadOptions::default()
        };
        let ds = read(text, &options).unwrap();
        assert_eq!(ds.features, vec!["a", "c"]);
    }

    #[test]
    fn test_type_row_without_skip_count() {
        let text = "a\tb\tClassification\nn\tx\tx\n1\tid1\tPositive\n2\tid2\tUnlabelled\n";
        let options = LoadOptions {
            skip_header_lines: 0,
            feature_type_row: true,
            ..LoadOptions::default()
        };
        let ds = read(text, &options).unwrap();
        assert_eq!(ds.features, vec!["a"]);
        assert_eq!(ds.n_observations(), 2);
    }

    #[test]
    fn test_negative_zero_stored_as_zero() {
        let text = "a\tClassification\n-0\tPositive\n-0.0\tUnlabelled\n0\tUnlabelled\n";
        let ds = read(text, &LoadOptions::default()).unwrap();
        assert!(ds.feature(0).iter().all(|v| *v == 0.0 && v.is_sign_positive()));
    }

    #[test]
    fn test_blank_lines_ignored() {
        let text = "a\tClassification\n1\tPositive\n\n2\tUnlabelled\n\n";
        let ds = read(text, &LoadOptions::default()).unwrap();
        assert_eq!(ds.n_observations(), 2);
    }

    #[test]
    fn test_custom_class_column_and_marker() {
        let text = "a\tLabel\n1\ttarget\n2\tbackground\n";
        let options = LoadOptions {
            positive_label: "target".to_string(),
            class_column: "Label".to_string(),
            ..LoadOptions::default()
        };
        let ds = read(text, &options).unwrap();
        assert_eq!(ds.positive_indices(), vec![0]);
    }
}
