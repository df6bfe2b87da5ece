use ndarray::ArrayView1;

/// Membership mask of length `n` for the given group indices
pub fn group_mask(group_indices: &[usize], n: usize) -> Vec<bool> {
    let mut mask = vec![false; n];
    for &i in group_indices {
        mask[i] = true;
    }
    mask
}

/// Split a feature column into (in-group, out-of-group) values
pub fn split_by_mask(column: ArrayView1<'_, f64>, mask: &[bool]) -> (Vec<f64>, Vec<f64>) {
    let n_in = mask.iter().filter(|&&m| m).count();
    let mut inside = Vec::with_capacity(n_in);
    let mut outside = Vec::with_capacity(mask.len() - n_in);

    for (&value, &m) in column.iter().zip(mask) {
        if m {
            inside.push(value);
        } else {
            outside.push(value);
        }
    }

    (inside, outside)
}

/// Median of `values` (mean of the two middle values for an even count), NaN when empty.
/// Reorders the slice.
pub fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    values.sort_unstable_by(f64::total_cmp);
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// `C(n, k)`, saturating at `cap`
///
/// Each partial product `C(n - k + i, i)` is an integer, so the division is exact. Stops as soon
/// as the count exceeds `cap`, which keeps the arithmetic within `u128`.
pub fn n_choose_k_capped(n: usize, k: usize, cap: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let cap = cap as u128;
    let mut count: u128 = 1;
    for i in 1..=k as u128 {
        count = count * (n as u128 - k as u128 + i) / i;
        if count > cap {
            return cap as usize;
        }
    }
    count as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_split_by_mask() {
        let column = array![1.0, 2.0, 3.0, 4.0];
        let mask = group_mask(&[0, 3], 4);
        assert_eq!(mask, vec![true, false, false, true]);
        let (inside, outside) = split_by_mask(column.view(), &mask);
        assert_eq!(inside, vec![1.0, 4.0]);
        assert_eq!(outside, vec![2.0, 3.0]);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&mut [5.0]), 5.0);
        assert!(median(&mut []).is_nan());
    }

    #[test]
    fn test_n_choose_k_capped() {
        assert_eq!(n_choose_k_capped(4, 3, 1001), 4);
        assert_eq!(n_choose_k_capped(8, 4, 1001), 70);
        assert_eq!(n_choose_k_capped(8, 4, 51), 51);
        assert_eq!(n_choose_k_capped(5, 0, 10), 1);
        assert_eq!(n_choose_k_capped(5, 5, 10), 1);
        assert_eq!(n_choose_k_capped(3, 4, 10), 0);
        assert_eq!(n_choose_k_capped(30, 15, usize::MAX), 155_117_520);
        assert_eq!(n_choose_k_capped(10_000, 500, 1_000_001), 1_000_001);
    }
}
