//! Descriptive statistics helpers.
//!
//! All helpers return 0.0 on empty input instead of failing.

use std::cmp::Ordering;

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median (average of the two middle values for even-length input).
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation (divides by `n`).
///
/// Exactly 0.0 when every value is equal, whatever the rounding of the mean.
pub fn population_std_dev(values: &[f64]) -> f64 {
    let Some(first) = values.first() else {
        return 0.0;
    };
    if values.iter().all(|v| v == first) {
        return 0.0;
    }
    let mean = mean(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Percentiles with linear interpolation between the closest ranks,
/// sorting once. Each `p` is in `[0, 100]`.
pub fn percentiles(values: &[f64], ps: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return vec![0.0; ps.len()];
    }
    let sorted = sorted(values);
    ps.iter().map(|p| interpolate(&sorted, *p)).collect()
}

fn interpolate(sorted: &[f64], p: f64) -> f64 {
    let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Percentile rank of `score` within `values`, in `[0, 100]`.
///
/// Ties take the midpoint of the strict and weak ranks, nudged up by one
/// when the score is present in the data.
pub fn percentile_rank(values: &[f64], score: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let left = values.iter().filter(|v| **v < score).count();
    let right = values.iter().filter(|v| **v <= score).count();
    let present = usize::from(right > left);
    (left + right + present) as f64 * 50.0 / values.len() as f64
}

/// Rounds to a fixed number of decimals.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Rounds to two decimals.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(population_std_dev(&[]), 0.0);
        assert_eq!(percentile_rank(&[], 1.0), 0.0);
        assert_eq!(percentiles(&[], &[25.0, 75.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_mean_median_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < EPS);
        assert!((median(&values) - 4.5).abs() < EPS);
        assert!((population_std_dev(&values) - 2.0).abs() < EPS);
        assert!((median(&[3.0, 1.0, 2.0]) - 2.0).abs() < EPS);
    }

    #[test]
    fn test_std_dev_of_equal_fractions() {
        // the mean of these is not exactly 0.7
        assert_eq!(population_std_dev(&[0.7, 0.7, 0.7]), 0.0);
        assert_eq!(population_std_dev(&[0.1; 10]), 0.0);
        assert!(population_std_dev(&[0.7, 0.8]) > 0.0);
    }

    #[test]
    fn test_linear_percentile() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let expected = [1.0, 1.75, 2.5, 3.25, 4.0];
        let got = percentiles(&values, &[0.0, 25.0, 50.0, 75.0, 100.0]);
        for (g, e) in got.iter().zip(expected) {
            assert!((g - e).abs() < EPS);
        }
        assert!((percentiles(&[7.0], &[96.0])[0] - 7.0).abs() < EPS);
    }

    #[test]
    fn test_percentile_rank() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile_rank(&values, 3.0) - 75.0).abs() < EPS);
        assert!((percentile_rank(&values, 1.0) - 25.0).abs() < EPS);
        assert!((percentile_rank(&values, 0.0) - 0.0).abs() < EPS);
        assert!((percentile_rank(&values, 5.0) - 100.0).abs() < EPS);
        assert!((percentile_rank(&[5.0, 5.0, 5.0], 5.0) - 200.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round2(66.66666), 66.67);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round_to(2.3456, 1), 2.3);
    }
}
