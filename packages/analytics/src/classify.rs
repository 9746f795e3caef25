//! Choropleth classification of per-neighbourhood counts.
//!
//! Natural breaks (Fisher-Jenks) is tried first over the distinct counts.
//! When it cannot produce the requested number of strictly increasing
//! classes, equal intervals over `[min, max]` are used instead, and when
//! every count is equal everything lands in class 0. The call itself never
//! fails.

use std::collections::BTreeMap;

use incident_map_analytics_models::{ClassificationMethod, ClassificationResult};
use thiserror::Error;

/// Why natural breaks could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BreaksError {
    /// Fewer distinct values than requested classes.
    #[error("{distinct} distinct values cannot form {requested} classes")]
    TooFewDistinctValues {
        /// Number of distinct input values.
        distinct: usize,
        /// Number of classes requested.
        requested: usize,
    },

    /// The computed edges are not strictly increasing.
    #[error("natural breaks produced non-increasing class edges")]
    NonIncreasingBreaks,
}

/// Bins `counts` into `num_classes` ordered classes.
///
/// A `num_classes` of 0 is treated as 1. An empty `counts` yields an empty
/// single-class result.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn classify(counts: &BTreeMap<i64, u64>, num_classes: usize) -> ClassificationResult {
    let num_classes = num_classes.max(1);

    let (Some(min), Some(max)) = (counts.values().min(), counts.values().max()) else {
        return ClassificationResult {
            method: ClassificationMethod::SingleClass,
            num_classes,
            breaks: Vec::new(),
            classes: BTreeMap::new(),
        };
    };

    let (method, breaks) = if min == max {
        (
            ClassificationMethod::SingleClass,
            vec![*min as f64, *max as f64],
        )
    } else {
        match natural_breaks(counts, num_classes) {
            Ok(breaks) => (ClassificationMethod::NaturalBreaks, breaks),
            Err(e) => {
                log::debug!("Falling back to equal intervals: {e}");
                (
                    ClassificationMethod::EqualInterval,
                    equal_interval_breaks(*min as f64, *max as f64, num_classes),
                )
            }
        }
    };

    let classes = counts
        .iter()
        .map(|(id, count)| (*id, class_index(&breaks, *count as f64, num_classes)))
        .collect();

    ClassificationResult {
        method,
        num_classes,
        breaks,
        classes,
    }
}

/// Fisher-Jenks natural breaks over the distinct values of `counts`.
///
/// Returns `num_classes + 1` edges: the minimum followed by each class's
/// upper bound.
///
/// # Errors
///
/// * [`BreaksError::TooFewDistinctValues`] if there are fewer distinct
///   values than classes
/// * [`BreaksError::NonIncreasingBreaks`] if the resulting edges are not
///   strictly increasing
#[allow(clippy::cast_precision_loss)]
pub fn natural_breaks(
    counts: &BTreeMap<i64, u64>,
    num_classes: usize,
) -> Result<Vec<f64>, BreaksError> {
    let mut distinct: Vec<u64> = counts.values().copied().collect();
    distinct.sort_unstable();
    distinct.dedup();

    if num_classes == 0 || distinct.len() < num_classes {
        return Err(BreaksError::TooFewDistinctValues {
            distinct: distinct.len(),
            requested: num_classes,
        });
    }

    let values: Vec<f64> = distinct.iter().map(|v| *v as f64).collect();
    let breaks = jenks_breaks(&values, num_classes);

    // The first class may hold only the minimum, so breaks[1] == breaks[0]
    // is allowed. Every later upper bound must increase.
    if breaks[1] < breaks[0] || breaks.windows(2).skip(1).any(|w| w[1] <= w[0]) {
        return Err(BreaksError::NonIncreasingBreaks);
    }

    Ok(breaks)
}

/// Fisher-Jenks dynamic program over sorted `values`.
///
/// Requires `1 <= k <= values.len()`.
fn jenks_breaks(values: &[f64], k: usize) -> Vec<f64> {
    let n = values.len();

    // lower_limits[i][j]: 1-based index of the first value in the last class
    // of the best split of the first i values into j classes.
    let mut lower_limits = vec![vec![0_usize; k + 1]; n + 1];
    let mut variances = vec![vec![f64::INFINITY; k + 1]; n + 1];

    for j in 1..=k {
        lower_limits[1][j] = 1;
        variances[1][j] = 0.0;
    }

    for i in 2..=n {
        let mut sum = 0.0;
        let mut sum_squares = 0.0;
        let mut weight = 0.0;
        let mut variance = 0.0;

        for m in 1..=i {
            let lower = i - m + 1;
            let value = values[lower - 1];

            weight += 1.0;
            sum += value;
            sum_squares += value * value;
            variance = sum_squares - sum * sum / weight;

            let before = lower - 1;
            if before != 0 {
                for j in 2..=k {
                    let candidate = variance + variances[before][j - 1];
                    if variances[i][j] >= candidate {
                        lower_limits[i][j] = lower;
                        variances[i][j] = candidate;
                    }
                }
            }
        }

        lower_limits[i][1] = 1;
        variances[i][1] = variance;
    }

    let mut breaks = vec![0.0; k + 1];
    breaks[0] = values[0];
    breaks[k] = values[n - 1];

    let mut upper = n;
    for class in (2..=k).rev() {
        let lower = lower_limits[upper][class];
        breaks[class - 1] = values[lower - 2];
        upper = lower - 1;
    }

    breaks
}

/// `num_classes + 1` evenly spaced edges from `min` to `max`.
#[allow(clippy::cast_precision_loss)]
fn equal_interval_breaks(min: f64, max: f64, num_classes: usize) -> Vec<f64> {
    let width = (max - min) / num_classes as f64;
    (0..=num_classes)
        .map(|i| {
            if i == num_classes {
                max
            } else {
                (i as f64).mul_add(width, min)
            }
        })
        .collect()
}

/// Index of the first class whose upper bound is at least `value`.
fn class_index(breaks: &[f64], value: f64, num_classes: usize) -> usize {
    breaks
        .iter()
        .skip(1)
        .position(|upper| value <= *upper)
        .unwrap_or(num_classes - 1)
        .min(num_classes - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(values: &[u64]) -> BTreeMap<i64, u64> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (i64::try_from(i).unwrap() + 1, *v))
            .collect()
    }

    #[test]
    fn natural_breaks_separates_clusters() {
        let counts = counts(&[1, 2, 3, 10, 11, 12, 20, 21, 22]);
        let result = classify(&counts, 3);

        assert_eq!(result.method, ClassificationMethod::NaturalBreaks);
        assert_eq!(result.breaks, vec![1.0, 3.0, 12.0, 22.0]);
        assert_eq!(result.class_of(1), Some(0));
        assert_eq!(result.class_of(3), Some(0));
        assert_eq!(result.class_of(4), Some(1));
        assert_eq!(result.class_of(6), Some(1));
        assert_eq!(result.class_of(7), Some(2));
        assert_eq!(result.class_of(9), Some(2));
    }

    #[test]
    fn natural_breaks_uses_distinct_values() {
        // Many repeated zeros must not stop three classes from forming.
        let counts = counts(&[0, 0, 0, 0, 0, 0, 5, 50, 51]);
        let breaks = natural_breaks(&counts, 3).unwrap();
        assert_eq!(breaks, vec![0.0, 0.0, 5.0, 51.0]);
    }

    #[test]
    fn all_equal_counts_are_one_class() {
        let counts = counts(&[4, 4, 4, 4]);
        let result = classify(&counts, 5);
        assert_eq!(result.method, ClassificationMethod::SingleClass);
        assert!(result.classes.values().all(|c| *c == 0));
        assert_eq!(result.classes.len(), 4);
    }

    #[test]
    fn all_zero_counts_are_one_class() {
        let counts = counts(&[0, 0, 0]);
        let result = classify(&counts, 6);
        assert_eq!(result.method, ClassificationMethod::SingleClass);
        assert!(result.classes.values().all(|c| *c == 0));
    }

    #[test]
    fn too_few_distinct_values_falls_back_to_equal_interval() {
        let counts = counts(&[0, 10, 10, 0, 10]);
        assert_eq!(
            natural_breaks(&counts, 4),
            Err(BreaksError::TooFewDistinctValues {
                distinct: 2,
                requested: 4
            })
        );

        let result = classify(&counts, 4);
        assert_eq!(result.method, ClassificationMethod::EqualInterval);
        assert_eq!(result.breaks, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        assert_eq!(result.class_of(1), Some(0));
        assert_eq!(result.class_of(2), Some(3));
    }

    #[test]
    fn class_indices_stay_in_range() {
        let counts = counts(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 100]);
        for num_classes in 1..=8 {
            let result = classify(&counts, num_classes);
            assert!(result.classes.values().all(|c| *c < num_classes));
            assert_eq!(result.breaks.len(), num_classes + 1);
        }
    }

    #[test]
    fn classes_are_monotonic_in_count() {
        let counts = counts(&[3, 9, 1, 40, 17, 2, 25, 8]);
        let result = classify(&counts, 4);
        let mut pairs: Vec<(u64, usize)> = counts
            .iter()
            .map(|(id, c)| (*c, result.class_of(*id).unwrap()))
            .collect();
        pairs.sort_unstable();
        assert!(pairs.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(pairs.first().unwrap().1, 0);
        assert_eq!(pairs.last().unwrap().1, 3);
    }

    #[test]
    fn zero_classes_is_treated_as_one() {
        let counts = counts(&[1, 2, 3]);
        let result = classify(&counts, 0);
        assert_eq!(result.num_classes, 1);
        assert!(result.classes.values().all(|c| *c == 0));
    }

    #[test]
    fn empty_counts_yield_empty_result() {
        let result = classify(&BTreeMap::new(), 5);
        assert!(result.classes.is_empty());
    }
}
