//! Multiple testing correction controlling the family-wise error rate
//! when every feature of a dataset is tested at once.

use anyhow::{Result, anyhow};

fn validate_p_values(p_values: &[f64]) -> Result<()> {
    if p_values.is_empty() {
        return Err(anyhow!("Empty p-value array"));
    }

    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }
    }

    Ok(())
}

/// Indices of `p_values` sorted ascending by p-value; equal p-values keep their input order
fn ascending_order(p_values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..p_values.len()).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));
    order
}

/// Apply the Holm-Bonferroni step-down procedure at family-wise level `alpha`
///
/// P-values are visited in ascending order; the one at rank `i` (1-based) of `m` is compared
/// against `alpha / (m + 1 - i)`. Features are significant until the first comparison fails;
/// that feature and every feature after it are not, whatever their own comparison gives.
///
/// # Arguments
/// * `p_values` - A slice of p-values, one per feature
/// * `alpha` - Family-wise significance level, in `(0, 1]`
///
/// # Returns
/// * `Result<Vec<bool>>` - Significance of each feature, in input order
///
/// # Example
/// ```
/// use feature_significance::testing::correction::holm_bonferroni_significance;
///
/// let p_values = vec![0.01, 0.04, 0.03];
/// let significant = holm_bonferroni_significance(&p_values, 0.05).unwrap();
/// assert_eq!(significant, vec![true, false, false]);
/// ```
pub fn holm_bonferroni_significance(p_values: &[f64], alpha: f64) -> Result<Vec<bool>> {
    validate_p_values(p_values)?;
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(anyhow!("Alpha must be in (0, 1], got {}", alpha));
    }

    let m = p_values.len();
    let mut significant = vec![false; m];

    for (i, &idx) in ascending_order(p_values).iter().enumerate() {
        let threshold = alpha / (m - i) as f64;
        if p_values[idx] > threshold {
            break;
        }
        significant[idx] = true;
    }

    Ok(significant)
}

/// Apply Holm-Bonferroni (step-down) adjustment to p-values
///
/// The adjusted p-value at rank `i` is `max(min(1, (m + 1 - j) * p_j))` over all ranks
/// `j <= i`, so that `adjusted <= alpha` reproduces [`holm_bonferroni_significance`].
///
/// # Arguments
/// * `p_values` - A slice of p-values to adjust
///
/// # Returns
/// * `Result<Vec<f64>>` - Vector of adjusted p-values
///
/// # Example
/// ```
/// use feature_significance::testing::correction::holm_bonferroni_correction;
///
/// let p_values = vec![0.01, 0.02, 0.03];
/// let adjusted = holm_bonferroni_correction(&p_values).unwrap();
/// assert!((adjusted[0] - 0.03).abs() < 1e-12);
/// assert!((adjusted[1] - 0.04).abs() < 1e-12);
/// assert!((adjusted[2] - 0.04).abs() < 1e-12);
/// ```
pub fn holm_bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;

    let m = p_values.len();
    let mut adjusted_p_values = vec![0.0; m];
    let mut running_max: f64 = 0.0;

    for (i, &idx) in ascending_order(p_values).iter().enumerate() {
        let adjusted = (p_values[idx] * (m - i) as f64).min(1.0);
        running_max = running_max.max(adjusted);
        adjusted_p_values[idx] = running_max;
    }

    Ok(adjusted_p_values)
}
