//! Descriptive statistics shared by the chart and selection services.
//!
//! Quantiles use linear interpolation between order statistics at rank
//! `p * (n - 1)` (Hyndman & Fan type 7). Standard deviations divide by `n`
//! unless stated otherwise.

use crate::api::BoxPlotStatistic;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`).
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - m;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

/// Sample standard deviation (divides by `n - 1`); needs two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - m;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Copy and sort ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Linear-interpolation quantile of an ascending slice; `fraction` in `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], fraction: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&fraction) {
        return None;
    }
    let rank = fraction * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    let (lo, hi) = (sorted[lower], sorted[upper]);
    // Clamp so rounding never pushes the result outside its bracketing pair.
    Some((lo + (hi - lo) * weight).clamp(lo, hi))
}

/// Percentile (`0..=100`) of unsorted values.
pub fn percentile(values: &[f64], percent: f64) -> Option<f64> {
    quantile_sorted(&sorted(values), percent / 100.0)
}

/// Five-number summary plus mean, population std and count.
///
/// Returns `None` for an empty input so callers omit the group instead of
/// drawing a zero-width box.
pub fn compute_box_plot(values: &[f64], label: &str) -> Option<BoxPlotStatistic> {
    let sorted = sorted(values);
    let min = *sorted.first()?;
    let max = *sorted.last()?;

    Some(BoxPlotStatistic {
        batch: label.to_string(),
        min,
        q1: quantile_sorted(&sorted, 0.25)?,
        median: quantile_sorted(&sorted, 0.5)?,
        mean: mean(&sorted)?,
        q3: quantile_sorted(&sorted, 0.75)?,
        max,
        std: population_std(&sorted)?,
        count: sorted.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_value_box_plot() {
        let stats = compute_box_plot(&[10.0], "B1").unwrap();
        assert_eq!(stats.batch, "B1");
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.q1, 10.0);
        assert_eq!(stats.median, 10.0);
        assert_eq!(stats.mean, 10.0);
        assert_eq!(stats.q3, 10.0);
        assert_eq!(stats.max, 10.0);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.count, 1);
    }

    #[test]
    fn test_one_to_ten_box_plot() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let stats = compute_box_plot(&values, "B1").unwrap();

        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert!((stats.mean - 5.5).abs() < 1e-12);
        assert!((stats.median - 5.5).abs() < 1e-12);
        assert!((stats.q1 - 3.25).abs() < 1e-12);
        assert!((stats.q3 - 7.75).abs() < 1e-12);
        assert!((stats.std - 2.8723).abs() < 1e-4);
        assert_eq!(stats.count, 10);
    }

    #[test]
    fn test_empty_box_plot_is_omitted() {
        assert!(compute_box_plot(&[], "B1").is_none());
    }

    #[test]
    fn test_percentile_of_one_to_hundred() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        let p = percentile(&values, 2.5).unwrap();
        assert!((p - 3.475).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_bounds() {
        let values = vec![4.0, 1.0, 3.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 100.0), Some(4.0));
        assert_eq!(percentile(&values, 150.0), None);
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_sample_vs_population_std() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std(&values).unwrap() - 2.0).abs() < 1e-12);
        assert!((sample_std(&values).unwrap() - 2.138_089_935).abs() < 1e-6);
        assert_eq!(sample_std(&[1.0]), None);
    }

    proptest! {
        #[test]
        fn prop_box_plot_is_ordered(values in prop::collection::vec(-1.0e6f64..1.0e6, 1..60)) {
            let stats = compute_box_plot(&values, "P").unwrap();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(stats.min, min);
            prop_assert_eq!(stats.max, max);
            prop_assert!(stats.min <= stats.q1);
            prop_assert!(stats.q1 <= stats.median);
            prop_assert!(stats.median <= stats.q3);
            prop_assert!(stats.q3 <= stats.max);
            prop_assert_eq!(stats.count, values.len());
        }

        #[test]
        fn prop_box_plot_is_permutation_invariant(values in prop::collection::vec(0.0f64..30.0, 1..40)) {
            let forward = compute_box_plot(&values, "P").unwrap();
            let mut reversed = values.clone();
            reversed.reverse();
            let backward = compute_box_plot(&reversed, "P").unwrap();
            prop_assert_eq!(forward.min, backward.min);
            prop_assert_eq!(forward.q1, backward.q1);
            prop_assert_eq!(forward.median, backward.median);
            prop_assert_eq!(forward.q3, backward.q3);
            prop_assert_eq!(forward.max, backward.max);
            prop_assert_eq!(forward.mean, backward.mean);
            prop_assert_eq!(forward.std, backward.std);
        }
    }
}
