//! Numeric series for plot renderers.
//!
//! Rendering happens elsewhere; this module produces the numbers a
//! renderer draws from: histogram bins, box-plot quartiles and whiskers,
//! and x/y point pairs. Only Integer and Float columns can be plotted.

use super::profiling;
use super::types::{
    HISTOGRAM_BINS_RANGE, HistogramBin, PlotData, PlotKind, PlotMissing, PlotRequest,
};
use crate::analyser::dataset::{Column, Dataset};
use crate::error::{DataSummaryError, Result};

const WHISKER_IQR: f64 = 1.5;

/// # Errors
///
/// `ColumnNotFound`, `NonNumericColumn`, or `InvalidInput` when the series
/// is empty after missing-value handling, a y column is required but
/// absent from the request, or the histogram bin count is outside 5-100.
pub fn plot_data(dataset: &Dataset, request: &PlotRequest) -> Result<PlotData> {
    let x = numeric_column(dataset, &request.x_column)?;

    match request.kind {
        PlotKind::Histogram => {
            if !HISTOGRAM_BINS_RANGE.contains(&request.bins) {
                return Err(DataSummaryError::InvalidInput(format!(
                    "Histogram bins must be between {} and {}, got {}",
                    HISTOGRAM_BINS_RANGE.start(),
                    HISTOGRAM_BINS_RANGE.end(),
                    request.bins
                )));
            }
            let values = non_empty(x, series(x, request.missing))?;
            Ok(PlotData::Histogram {
                column: x.name().to_owned(),
                bins: histogram(&values, request.bins),
                mean: profiling::mean(&values),
                std: profiling::sample_std(&values),
            })
        }
        PlotKind::Boxplot => {
            let values = non_empty(x, series(x, request.missing))?;
            boxplot(x.name(), &values)
        }
        PlotKind::Scatter | PlotKind::Line => {
            let y_name = request.y_column.as_deref().ok_or_else(|| {
                DataSummaryError::InvalidInput(format!(
                    "{} plot requires a y column",
                    if request.kind == PlotKind::Line { "line" } else { "scatter" }
                ))
            })?;
            let y = numeric_column(dataset, y_name)?;
            let points = pairs(x, y, request.missing);
            if points.is_empty() {
                return Err(DataSummaryError::InvalidInput(format!(
                    "Columns '{}' and '{}' have no complete rows to plot",
                    x.name(),
                    y.name()
                )));
            }
            let (x_column, y_column) = (x.name().to_owned(), y.name().to_owned());
            Ok(if request.kind == PlotKind::Line {
                PlotData::Line {
                    x_column,
                    y_column,
                    points,
                }
            } else {
                PlotData::Scatter {
                    x_column,
                    y_column,
                    points,
                }
            })
        }
    }
}

fn numeric_column<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Column> {
    let column = dataset.require_column(name)?;
    if column.data_type().is_numeric() {
        Ok(column)
    } else {
        Err(DataSummaryError::NonNumericColumn {
            column: name.to_owned(),
            data_type: column.data_type().to_string(),
        })
    }
}

fn non_empty(column: &Column, values: Vec<f64>) -> Result<Vec<f64>> {
    if values.is_empty() {
        Err(DataSummaryError::InvalidInput(format!(
            "Column '{}' has no values to plot",
            column.name()
        )))
    } else {
        Ok(values)
    }
}

fn fill_value(column: &Column, missing: PlotMissing) -> Option<f64> {
    match missing {
        PlotMissing::Skip => None,
        PlotMissing::FillMean => profiling::mean(&column.numeric_values()),
        PlotMissing::FillMedian => profiling::median(&column.numeric_values()),
    }
}

/// Column values in row order with nulls skipped or filled.
fn series(column: &Column, missing: PlotMissing) -> Vec<f64> {
    let fill = fill_value(column, missing);
    (0..column.len())
        .filter_map(|row| column.numeric_at(row).or(fill))
        .collect()
}

/// Row-aligned pairs. Under `Skip` a row is dropped when either side is
/// null.
fn pairs(x: &Column, y: &Column, missing: PlotMissing) -> Vec<(f64, f64)> {
    let fill_x = fill_value(x, missing);
    let fill_y = fill_value(y, missing);
    (0..x.len().min(y.len()))
        .filter_map(|row| {
            Some((
                x.numeric_at(row).or(fill_x)?,
                y.numeric_at(row).or(fill_y)?,
            ))
        })
        .collect()
}

/// Equal-width bins over `[min, max]`; the last bin is closed on the right.
/// A constant series gets a unit-wide range centred on its value.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let bins = bins.max(1);
    let Some((mut lo, mut hi)) = values.iter().fold(None, |acc: Option<(f64, f64)>, &v| {
        Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
    }) else {
        return Vec::new();
    };
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0_usize; bins];
    for &v in values {
        let index = (((v - lo) / width).floor() as usize).min(bins - 1);
        if let Some(count) = counts.get_mut(index) {
            *count += 1;
        }
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

/// Whiskers reach the furthest values inside `1.5 × IQR` of the quartiles;
/// anything beyond is an outlier.
fn boxplot(column: &str, values: &[f64]) -> Result<PlotData> {
    let sorted = profiling::sorted(values);
    let quartiles = (
        profiling::quantile_sorted(&sorted, 0.25),
        profiling::quantile_sorted(&sorted, 0.5),
        profiling::quantile_sorted(&sorted, 0.75),
    );
    let (Some(q1), Some(median), Some(q3)) = quartiles else {
        return Err(DataSummaryError::InvalidInput(format!(
            "Column '{column}' has no values to plot"
        )));
    };

    let iqr = q3 - q1;
    let lower_fence = q1 - WHISKER_IQR * iqr;
    let upper_fence = q3 + WHISKER_IQR * iqr;
    let inside = |v: &&f64| **v >= lower_fence && **v <= upper_fence;

    let min = sorted.iter().find(inside).copied().unwrap_or(q1);
    let max = sorted.iter().rev().find(inside).copied().unwrap_or(q3);
    let outliers = sorted
        .iter()
        .filter(|v| !inside(v))
        .copied()
        .collect();

    Ok(PlotData::Boxplot {
        column: column.to_owned(),
        min,
        q1,
        median,
        q3,
        max,
        outliers,
    })
}
