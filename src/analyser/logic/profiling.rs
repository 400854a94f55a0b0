//! Statistical profiling for single columns.
//!
//! Numeric columns (Integer, Float) get location and spread statistics;
//! every other column type gets frequency statistics. All aggregates skip
//! null positions.
//!
//! The formulas are fixed so results do not depend on a numeric library:
//! - mean: arithmetic mean with Neumaier-compensated summation
//! - std: sample standard deviation (n − 1 denominator), two-pass
//! - median / percentiles: linear interpolation between closest ranks,
//!   `rank = q × (n − 1)` over the sorted values
//! - mode / most common: highest frequency, ties go to the value seen
//!   first in row order

use super::types::{CategoricalStats, NumericStats};
use crate::analyser::dataset::{Column, Value, percent};

/// Compensated sum, stable for long columns of mixed magnitude.
fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for &v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            compensation += (sum - t) + v;
        } else {
            compensation += (v - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(stable_sum(values) / values.len() as f64)
    }
}

/// Sample standard deviation; undefined below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let squares: Vec<f64> = values.iter().map(|v| (v - m) * (v - m)).collect();
    Some((stable_sum(&squares) / (values.len() - 1) as f64).sqrt())
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Linear-interpolation quantile over already sorted values.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = q.clamp(0.0, 1.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let lo_v = *sorted.get(lo)?;
    let hi_v = *sorted.get(hi)?;
    Some(lo_v + (hi_v - lo_v) * (rank - lo as f64))
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile_sorted(&sorted(values), 0.5)
}

pub fn numeric_stats(column: &Column) -> NumericStats {
    let values = column.numeric_values();
    let ordered = sorted(&values);
    let missing = column.null_count();

    NumericStats {
        count: values.len(),
        missing,
        percent_missing: percent(missing, column.len()),
        mean: mean(&values),
        median: quantile_sorted(&ordered, 0.5),
        std: sample_std(&values),
        min: ordered.first().copied(),
        max: ordered.last().copied(),
        percentile_25: quantile_sorted(&ordered, 0.25),
        percentile_75: quantile_sorted(&ordered, 0.75),
    }
}

/// Most frequent non-null value and its count.
pub fn most_common(column: &Column) -> Option<(Value, usize)> {
    let mut best: Option<(Value, usize)> = None;
    for (value, count) in column.value_counts() {
        let better = best.as_ref().is_none_or(|(_, top)| count > *top);
        if better {
            best = Some((value, count));
        }
    }
    best
}

pub fn mode(column: &Column) -> Option<Value> {
    most_common(column).map(|(value, _)| value)
}

/// The `n` most frequent values, highest first.
pub fn top_values(column: &Column, n: usize) -> Vec<(Value, usize)> {
    let mut counts = column.value_counts();
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}

pub fn categorical_stats(column: &Column) -> CategoricalStats {
    let missing = column.null_count();
    let (most_common_value, most_common_count) = match most_common(column) {
        Some((value, count)) => (Some(value), count),
        None => (None, 0),
    };

    CategoricalStats {
        count: column.non_null_count(),
        missing,
        percent_missing: percent(missing, column.len()),
        unique_count: column.unique_count(),
        most_common_value,
        most_common_count,
        data_type: column.data_type(),
    }
}
