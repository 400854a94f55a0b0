//! Typed, immutable-once-loaded tabular dataset.
//!
//! A [`Dataset`] is an ordered list of uniquely named [`Column`]s of equal
//! length. Each column stores one [`ColumnData`] variant whose values are
//! `Option<T>`: the `Option` discriminant is the null marker, so missing
//! values never hide inside the data as sentinels.
//!
//! Datasets behave as values. Every transformation ([`Dataset::select`],
//! [`Dataset::take_rows`], [`Dataset::replace_column`], ...) returns a new
//! dataset and leaves the receiver untouched.
//!
//! ```
//! use data_summary::analyser::dataset::{Column, Dataset};
//!
//! let ds = Dataset::new(vec![
//!     Column::integer("age", vec![Some(25), Some(30), None]),
//!     Column::text("dept", vec![Some("A"), Some("B"), Some("A")]),
//! ])?;
//! assert_eq!(ds.row_count(), 3);
//! assert_eq!(ds.null_count(), 1);
//! # Ok::<(), data_summary::error::DataSummaryError>(())
//! ```

use crate::error::{DataSummaryError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::Hash;
use std::mem::size_of;

/// Canonical text form for datetime cells (ISO-8601 without zone).
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Integer,
    Float,
    Boolean,
    Text,
    DateTime,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::DateTime => "datetime",
        }
    }

    /// Integer and Float columns receive numeric statistics; everything else
    /// is summarised as categorical.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single non-null cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Integer(_) => DataType::Integer,
            Self::Float(_) => DataType::Float,
            Self::Boolean(_) => DataType::Boolean,
            Self::Text(_) => DataType::Text,
            Self::DateTime(_) => DataType::DateTime,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Boolean(_) | Self::Text(_) | Self::DateTime(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::DateTime(v) => write!(f, "{}", v.format(DATETIME_FORMAT)),
        }
    }
}

/// Column storage, one vector per closed type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Integer(_) => DataType::Integer,
            Self::Float(_) => DataType::Float,
            Self::Boolean(_) => DataType::Boolean,
            Self::Text(_) => DataType::Text,
            Self::DateTime(_) => DataType::DateTime,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Integer(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Boolean(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_null(&self, row: usize) -> bool {
        match self {
            Self::Integer(v) => v.get(row).is_none_or(Option::is_none),
            Self::Float(v) => v.get(row).is_none_or(Option::is_none),
            Self::Boolean(v) => v.get(row).is_none_or(Option::is_none),
            Self::Text(v) => v.get(row).is_none_or(Option::is_none),
            Self::DateTime(v) => v.get(row).is_none_or(Option::is_none),
        }
    }

    fn take(&self, rows: &[usize]) -> Self {
        match self {
            Self::Integer(v) => Self::Integer(take_values(v, rows)),
            Self::Float(v) => Self::Float(take_values(v, rows)),
            Self::Boolean(v) => Self::Boolean(take_values(v, rows)),
            Self::Text(v) => Self::Text(take_values(v, rows)),
            Self::DateTime(v) => Self::DateTime(take_values(v, rows)),
        }
    }
}

fn take_values<T: Clone>(values: &[Option<T>], rows: &[usize]) -> Vec<Option<T>> {
    rows.iter()
        .map(|&row| values.get(row).cloned().flatten())
        .collect()
}

/// Counts non-null values by key, returning `(first_row, count)` pairs in
/// first-seen order.
fn count_first_seen<'a, T: 'a, K: Hash + Eq>(
    values: &'a [Option<T>],
    key: impl Fn(&'a T) -> K,
) -> Vec<(usize, usize)> {
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for (row, value) in values.iter().enumerate() {
        let Some(value) = value else { continue };
        match slots.entry(key(value)) {
            Entry::Occupied(slot) => {
                if let Some(entry) = counts.get_mut(*slot.get()) {
                    entry.1 += 1;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(counts.len());
                counts.push((row, 1));
            }
        }
    }
    counts
}

fn float_key(v: &f64) -> u64 {
    // -0.0 and 0.0 compare equal, so they must share a key.
    if *v == 0.0 { 0.0_f64.to_bits() } else { v.to_bits() }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Builds a column. Float NaN values become nulls.
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        let data = match data {
            ColumnData::Float(values) => ColumnData::Float(
                values
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect(),
            ),
            other => other,
        };
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn integer(name: impl Into<String>, values: Vec<Option<i64>>) -> Self {
        Self::new(name, ColumnData::Integer(values))
    }

    pub fn float(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Float(values))
    }

    pub fn boolean(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        Self::new(name, ColumnData::Boolean(values))
    }

    pub fn text<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        )
    }

    pub fn datetime(name: impl Into<String>, values: Vec<Option<NaiveDateTime>>) -> Self {
        Self::new(name, ColumnData::DateTime(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.data.is_null(row)
    }

    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.data.is_null(row)).count()
    }

    pub fn non_null_count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// Cell at `row`, `None` when null or out of range.
    pub fn value(&self, row: usize) -> Option<Value> {
        match &self.data {
            ColumnData::Integer(v) => v.get(row).copied().flatten().map(Value::Integer),
            ColumnData::Float(v) => v.get(row).copied().flatten().map(Value::Float),
            ColumnData::Boolean(v) => v.get(row).copied().flatten().map(Value::Boolean),
            ColumnData::Text(v) => v.get(row).cloned().flatten().map(Value::Text),
            ColumnData::DateTime(v) => v.get(row).copied().flatten().map(Value::DateTime),
        }
    }

    /// Numeric view of `row` for Integer and Float columns.
    pub fn numeric_at(&self, row: usize) -> Option<f64> {
        match &self.data {
            ColumnData::Integer(v) => v.get(row).copied().flatten().map(|x| x as f64),
            ColumnData::Float(v) => v.get(row).copied().flatten(),
            ColumnData::Boolean(_) | ColumnData::Text(_) | ColumnData::DateTime(_) => None,
        }
    }

    /// Non-null values as `f64`, in row order. Empty for non-numeric columns.
    pub fn numeric_values(&self) -> Vec<f64> {
        match &self.data {
            ColumnData::Integer(v) => v.iter().flatten().map(|&x| x as f64).collect(),
            ColumnData::Float(v) => v.iter().flatten().copied().collect(),
            ColumnData::Boolean(_) | ColumnData::Text(_) | ColumnData::DateTime(_) => Vec::new(),
        }
    }

    /// Distinct non-null values with their frequencies, in first-seen row
    /// order.
    pub fn value_counts(&self) -> Vec<(Value, usize)> {
        let counts = match &self.data {
            ColumnData::Integer(v) => count_first_seen(v, |x| *x),
            ColumnData::Float(v) => count_first_seen(v, float_key),
            ColumnData::Boolean(v) => count_first_seen(v, |x| *x),
            ColumnData::Text(v) => count_first_seen(v, String::as_str),
            ColumnData::DateTime(v) => count_first_seen(v, |x| *x),
        };
        counts
            .into_iter()
            .filter_map(|(row, count)| self.value(row).map(|value| (value, count)))
            .collect()
    }

    pub fn unique_count(&self) -> usize {
        match &self.data {
            ColumnData::Integer(v) => count_first_seen(v, |x| *x).len(),
            ColumnData::Float(v) => count_first_seen(v, float_key).len(),
            ColumnData::Boolean(v) => count_first_seen(v, |x| *x).len(),
            ColumnData::Text(v) => count_first_seen(v, String::as_str).len(),
            ColumnData::DateTime(v) => count_first_seen(v, |x| *x).len(),
        }
    }

    /// New column holding the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            data: self.data.take(rows),
        }
    }

    /// Same name, different storage.
    pub fn with_data(&self, data: ColumnData) -> Self {
        Self::new(self.name.clone(), data)
    }

    /// Rough in-memory footprint: fixed-width slots plus string heap bytes.
    pub fn estimated_bytes(&self) -> usize {
        let len = self.len();
        match &self.data {
            ColumnData::Integer(_) => len * size_of::<Option<i64>>(),
            ColumnData::Float(_) => len * size_of::<Option<f64>>(),
            ColumnData::Boolean(_) => len * size_of::<Option<bool>>(),
            ColumnData::DateTime(_) => len * size_of::<Option<NaiveDateTime>>(),
            ColumnData::Text(v) => {
                len * size_of::<Option<String>>() + v.iter().flatten().map(String::len).sum::<usize>()
            }
        }
    }
}

/// Per-column type information reported on upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnTypeSummary {
    pub name: String,
    pub data_type: DataType,
    pub non_null_count: usize,
    pub null_count: usize,
    pub unique_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryEstimate {
    pub total_bytes: usize,
    pub total_mb: f64,
    pub per_column: Vec<(String, usize)>,
}

/// Ordered collection of equal-length, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Validates and wraps `columns`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when a name is empty or repeated, or when the
    /// columns differ in length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for column in &columns {
            if column.name().is_empty() {
                return Err(DataSummaryError::InvalidInput(
                    "column names must not be empty".to_owned(),
                ));
            }
            if !seen.insert(column.name()) {
                return Err(DataSummaryError::InvalidInput(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
            if column.len() != row_count {
                return Err(DataSummaryError::InvalidInput(format!(
                    "column '{}' has {} rows, expected {row_count}",
                    column.name(),
                    column.len()
                )));
            }
        }
        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// # Errors
    ///
    /// `ColumnNotFound`, listing the available columns.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| DataSummaryError::ColumnNotFound {
                column: name.to_owned(),
                available: self.column_names(),
            })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_owned()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.columns.is_empty()
    }

    /// Names from `requested` that are not columns of this dataset.
    pub fn missing_columns(&self, requested: &[String]) -> Vec<String> {
        requested
            .iter()
            .filter(|name| self.column(name).is_none())
            .cloned()
            .collect()
    }

    /// # Errors
    ///
    /// `ColumnsNotFound` naming every absent column.
    pub fn check_columns(&self, requested: &[String]) -> Result<()> {
        let missing = self.missing_columns(requested);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DataSummaryError::ColumnsNotFound { missing })
        }
    }

    /// Projection onto `requested`, in request order. Repeated names are
    /// kept once.
    ///
    /// # Errors
    ///
    /// `ColumnsNotFound` naming every absent column.
    pub fn select(&self, requested: &[String]) -> Result<Self> {
        self.check_columns(requested)?;
        let mut seen = HashSet::new();
        let columns = requested
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .filter_map(|name| self.column(name).cloned())
            .collect();
        Ok(Self {
            columns,
            row_count: self.row_count,
        })
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Self {
        let rows: Vec<usize> = (0..self.row_count.min(n)).collect();
        self.take_rows(&rows)
    }

    /// New dataset with the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            row_count: rows.len(),
        }
    }

    /// Rows whose mask entry is true. Positions past the mask are dropped.
    pub fn filter_rows(&self, keep: &[bool]) -> Self {
        let rows: Vec<usize> = keep
            .iter()
            .take(self.row_count)
            .enumerate()
            .filter_map(|(row, &k)| k.then_some(row))
            .collect();
        self.take_rows(&rows)
    }

    /// Swaps in `column` for the existing column with the same name.
    ///
    /// # Errors
    ///
    /// `ColumnNotFound` for an unknown name, `InvalidInput` for a length
    /// mismatch.
    pub fn replace_column(&self, column: Column) -> Result<Self> {
        if column.len() != self.row_count {
            return Err(DataSummaryError::InvalidInput(format!(
                "replacement column '{}' has {} rows, expected {}",
                column.name(),
                column.len(),
                self.row_count
            )));
        }
        let position = self
            .columns
            .iter()
            .position(|c| c.name() == column.name())
            .ok_or_else(|| DataSummaryError::ColumnNotFound {
                column: column.name().to_owned(),
                available: self.column_names(),
            })?;
        let mut columns = self.columns.clone();
        if let Some(slot) = columns.get_mut(position) {
            *slot = column;
        }
        Ok(Self {
            columns,
            row_count: self.row_count,
        })
    }

    /// Total null cells.
    pub fn null_count(&self) -> usize {
        self.columns.iter().map(Column::null_count).sum()
    }

    /// Null cells in `row`.
    pub fn row_null_count(&self, row: usize) -> usize {
        self.columns.iter().filter(|c| c.is_null(row)).count()
    }

    /// Cells of one row, `None` for nulls.
    pub fn row(&self, row: usize) -> Vec<Option<Value>> {
        self.columns.iter().map(|c| c.value(row)).collect()
    }

    pub fn estimated_bytes(&self) -> usize {
        self.columns.iter().map(Column::estimated_bytes).sum()
    }

    pub fn memory_estimate(&self) -> MemoryEstimate {
        let per_column: Vec<(String, usize)> = self
            .columns
            .iter()
            .map(|c| (c.name().to_owned(), c.estimated_bytes()))
            .collect();
        let total_bytes = per_column.iter().map(|(_, b)| b).sum::<usize>();
        MemoryEstimate {
            total_bytes,
            total_mb: round2(total_bytes as f64 / (1024.0 * 1024.0)),
            per_column,
        }
    }

    pub fn type_summary(&self) -> Vec<ColumnTypeSummary> {
        self.columns
            .iter()
            .map(|c| ColumnTypeSummary {
                name: c.name().to_owned(),
                data_type: c.data_type(),
                non_null_count: c.non_null_count(),
                null_count: c.null_count(),
                unique_count: c.unique_count(),
            })
            .collect()
    }
}

/// Rounds to two decimals, the precision every reported percentage uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole` as a percentage rounded to two decimals; 0 for an empty
/// whole.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}
