use super::health;
use super::profiling;
use super::types::{
    CategoricalSummary, ColumnDetail, ColumnMetadata, CorrelationMatrix, DatasetOverview,
    NumericSummary, SummaryOptions, SummaryReport,
};
use crate::analyser::dataset::{Column, Dataset, percent};
use crate::error::Result;

/// Number of values listed in a categorical column's `value_counts`.
pub const TOP_VALUE_COUNT: usize = 10;

pub fn dataset_overview(dataset: &Dataset, sample_size: usize) -> DatasetOverview {
    let head = dataset.head(sample_size);
    DatasetOverview {
        row_count: dataset.row_count(),
        column_count: dataset.column_count(),
        columns: dataset.type_summary(),
        memory: dataset.memory_estimate(),
        sample_rows: (0..head.row_count()).map(|row| head.row(row)).collect(),
    }
}

/// Builds the statistical summary of `dataset`, optionally restricted to a
/// column subset.
///
/// # Errors
///
/// `ColumnsNotFound` when any requested column is absent.
pub fn summarize(dataset: &Dataset, options: &SummaryOptions) -> Result<SummaryReport> {
    let selected;
    let dataset = match &options.columns {
        Some(columns) => {
            selected = dataset.select(columns)?;
            &selected
        }
        None => dataset,
    };

    let numeric_summary = dataset
        .columns()
        .iter()
        .filter(|c| c.data_type().is_numeric())
        .map(|c| NumericSummary {
            name: c.name().to_owned(),
            stats: profiling::numeric_stats(c),
        })
        .collect();

    let categorical_summary = options.include_categorical.then(|| {
        dataset
            .columns()
            .iter()
            .filter(|c| !c.data_type().is_numeric())
            .map(|c| CategoricalSummary {
                name: c.name().to_owned(),
                stats: profiling::categorical_stats(c),
            })
            .collect()
    });

    let correlation_matrix = options
        .include_correlation
        .then(|| correlation_matrix(dataset));
    let data_quality = options
        .include_quality
        .then(|| health::data_quality_metrics(dataset));

    Ok(SummaryReport {
        row_count: dataset.row_count(),
        column_count: dataset.column_count(),
        numeric_summary,
        categorical_summary,
        correlation_matrix,
        data_quality,
    })
}

/// # Errors
///
/// `ColumnNotFound` naming the available columns.
pub fn describe_column(
    dataset: &Dataset,
    column_name: &str,
    sample_size: usize,
) -> Result<ColumnMetadata> {
    let column = dataset.require_column(column_name)?;
    Ok(column_metadata(column, sample_size))
}

pub fn describe_columns(dataset: &Dataset, sample_size: usize) -> Vec<ColumnMetadata> {
    dataset
        .columns()
        .iter()
        .map(|c| column_metadata(c, sample_size))
        .collect()
}

fn column_metadata(column: &Column, sample_size: usize) -> ColumnMetadata {
    let total = column.len();
    let null_count = column.null_count();
    let unique_count = column.unique_count();

    let detail = if column.data_type().is_numeric() {
        ColumnDetail::Numeric(profiling::numeric_stats(column))
    } else {
        let (most_common_value, most_common_count) = match profiling::most_common(column) {
            Some((value, count)) => (Some(value), count),
            None => (None, 0),
        };
        ColumnDetail::Categorical {
            most_common_value,
            most_common_count,
            value_counts: profiling::top_values(column, TOP_VALUE_COUNT),
        }
    };

    let sample_values = (0..total)
        .filter_map(|row| column.value(row))
        .take(sample_size)
        .collect();

    ColumnMetadata {
        column_name: column.name().to_owned(),
        data_type: column.data_type(),
        total_values: total,
        non_null_count: total - null_count,
        null_count,
        null_percentage: percent(null_count, total),
        unique_count,
        unique_percentage: percent(unique_count, total),
        detail,
        sample_values,
    }
}

/// Pearson correlation across the numeric columns of `dataset`, or of the
/// requested subset.
///
/// # Errors
///
/// `ColumnsNotFound` when any requested column is absent.
pub fn correlate(dataset: &Dataset, columns: Option<&[String]>) -> Result<CorrelationMatrix> {
    match columns {
        Some(columns) => Ok(correlation_matrix(&dataset.select(columns)?)),
        None => Ok(correlation_matrix(dataset)),
    }
}

/// Symmetric matrix with a unit diagonal. Fewer than two numeric columns
/// yields an empty matrix.
pub fn correlation_matrix(dataset: &Dataset) -> CorrelationMatrix {
    let numeric: Vec<&Column> = dataset
        .columns()
        .iter()
        .filter(|c| c.data_type().is_numeric())
        .collect();

    if numeric.len() < 2 {
        return CorrelationMatrix::default();
    }

    let n = numeric.len();
    let mut data = vec![vec![None; n]; n];
    for (i, x) in numeric.iter().enumerate() {
        if let Some(cell) = data.get_mut(i).and_then(|row| row.get_mut(i)) {
            *cell = Some(1.0);
        }
        for (j, y) in numeric.iter().enumerate().skip(i + 1) {
            let r = pearson(x, y);
            if let Some(cell) = data.get_mut(i).and_then(|row| row.get_mut(j)) {
                *cell = r;
            }
            if let Some(cell) = data.get_mut(j).and_then(|row| row.get_mut(i)) {
                *cell = r;
            }
        }
    }

    CorrelationMatrix {
        columns: numeric.iter().map(|c| c.name().to_owned()).collect(),
        data,
    }
}

/// Pairwise-complete Pearson coefficient: only rows where both columns hold
/// a value take part. `None` below two complete pairs or with zero variance.
pub fn pearson(x: &Column, y: &Column) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = (0..x.len().min(y.len()))
        .filter_map(|row| Some((x.numeric_at(row)?, y.numeric_at(row)?)))
        .unzip();

    if xs.len() < 2 {
        return None;
    }
    let mean_x = profiling::mean(&xs)?;
    let mean_y = profiling::mean(&ys)?;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (a, b) in xs.iter().zip(&ys) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}
