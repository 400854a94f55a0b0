use super::profiling;
use super::types::{ImputeOutcome, ImputeStrategy};
use crate::analyser::dataset::{Column, ColumnData, Dataset, Value};
use crate::error::Result;
use std::collections::HashSet;

/// Resolves nulls in `columns` (all columns when `None`) and returns the
/// processed copy. The input dataset is never modified.
///
/// Fill strategies leave all-null columns untouched and report them as
/// unresolved instead of failing.
///
/// # Errors
///
/// `ColumnsNotFound` when any requested column is absent.
pub fn impute(
    dataset: &Dataset,
    strategy: ImputeStrategy,
    columns: Option<&[String]>,
) -> Result<ImputeOutcome> {
    let targets: Vec<String> = match columns {
        Some(requested) => {
            dataset.check_columns(requested)?;
            let mut seen = HashSet::new();
            requested
                .iter()
                .filter(|name| seen.insert(name.as_str()))
                .cloned()
                .collect()
        }
        None => dataset.column_names(),
    };

    if strategy == ImputeStrategy::Skip {
        return Ok(drop_incomplete_rows(dataset, &targets));
    }

    let mut processed = dataset.clone();
    let mut unresolved_columns = Vec::new();
    let mut warnings = Vec::new();

    for name in &targets {
        let column = processed.require_column(name)?;
        if column.null_count() == 0 {
            continue;
        }
        match fill_column(column, strategy) {
            Some(filled) => processed = processed.replace_column(filled)?,
            None => {
                warnings.push(format!(
                    "Column '{name}' has no non-null values; {strategy} left it unchanged"
                ));
                unresolved_columns.push(name.clone());
            }
        }
    }

    Ok(ImputeOutcome {
        dataset: processed,
        rows_removed: 0,
        unresolved_columns,
        warnings,
    })
}

fn drop_incomplete_rows(dataset: &Dataset, targets: &[String]) -> ImputeOutcome {
    let columns: Vec<&Column> = targets.iter().filter_map(|n| dataset.column(n)).collect();
    let keep: Vec<bool> = (0..dataset.row_count())
        .map(|row| columns.iter().all(|c| !c.is_null(row)))
        .collect();
    let processed = dataset.filter_rows(&keep);

    ImputeOutcome {
        rows_removed: dataset.row_count() - processed.row_count(),
        dataset: processed,
        unresolved_columns: Vec::new(),
        warnings: Vec::new(),
    }
}

/// `None` when the strategy has nothing to fill from.
fn fill_column(column: &Column, strategy: ImputeStrategy) -> Option<Column> {
    let numeric = column.data_type().is_numeric();
    match strategy {
        ImputeStrategy::FillMean if numeric => {
            let mean = profiling::mean(&column.numeric_values())?;
            fill_with_value(column, &Value::Float(mean))
        }
        ImputeStrategy::FillMedian if numeric => {
            let median = profiling::median(&column.numeric_values())?;
            fill_with_value(column, &Value::Float(median))
        }
        ImputeStrategy::FillMean | ImputeStrategy::FillMedian | ImputeStrategy::FillMode => {
            let mode = profiling::mode(column)?;
            fill_with_value(column, &mode)
        }
        ImputeStrategy::ForwardFill => Some(column.with_data(propagate(column.data(), false))),
        ImputeStrategy::BackwardFill => Some(column.with_data(propagate(column.data(), true))),
        ImputeStrategy::Skip => Some(column.clone()),
    }
}

fn fill_nulls<T: Clone>(values: &[Option<T>], fill: &T) -> Vec<Option<T>> {
    values
        .iter()
        .map(|v| Some(v.clone().unwrap_or_else(|| fill.clone())))
        .collect()
}

/// Replaces nulls with `value`. An Integer column filled with a fractional
/// value is promoted to Float.
fn fill_with_value(column: &Column, value: &Value) -> Option<Column> {
    let data = match (column.data(), value) {
        (ColumnData::Integer(v), Value::Integer(x)) => ColumnData::Integer(fill_nulls(v, x)),
        (ColumnData::Integer(v), Value::Float(x)) => {
            if x.fract() == 0.0 && *x >= i64::MIN as f64 && *x <= i64::MAX as f64 {
                ColumnData::Integer(fill_nulls(v, &(*x as i64)))
            } else {
                ColumnData::Float(v.iter().map(|o| Some(o.map_or(*x, |i| i as f64))).collect())
            }
        }
        (ColumnData::Float(v), Value::Float(x)) => ColumnData::Float(fill_nulls(v, x)),
        (ColumnData::Float(v), Value::Integer(x)) => ColumnData::Float(fill_nulls(v, &(*x as f64))),
        (ColumnData::Boolean(v), Value::Boolean(x)) => ColumnData::Boolean(fill_nulls(v, x)),
        (ColumnData::Text(v), Value::Text(x)) => ColumnData::Text(fill_nulls(v, x)),
        (ColumnData::DateTime(v), Value::DateTime(x)) => ColumnData::DateTime(fill_nulls(v, x)),
        _ => return None,
    };
    Some(column.with_data(data))
}

fn carry<T: Clone>(values: &[Option<T>], backward: bool) -> Vec<Option<T>> {
    let mut last: Option<T> = None;
    let mut step = |v: &Option<T>| {
        if v.is_some() {
            last.clone_from(v);
        }
        last.clone()
    };
    if backward {
        let mut out: Vec<Option<T>> = values.iter().rev().map(&mut step).collect();
        out.reverse();
        out
    } else {
        values.iter().map(step).collect()
    }
}

/// Forward or backward fill. Nulls with no value on the carrying side
/// stay null.
fn propagate(data: &ColumnData, backward: bool) -> ColumnData {
    match data {
        ColumnData::Integer(v) => ColumnData::Integer(carry(v, backward)),
        ColumnData::Float(v) => ColumnData::Float(carry(v, backward)),
        ColumnData::Boolean(v) => ColumnData::Boolean(carry(v, backward)),
        ColumnData::Text(v) => ColumnData::Text(carry(v, backward)),
        ColumnData::DateTime(v) => ColumnData::DateTime(carry(v, backward)),
    }
}
