//! Row export to CSV or JSON text.

use crate::analyser::dataset::{Dataset, Value};
use crate::error::{DataSummaryError, Result};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = DataSummaryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(DataSummaryError::InvalidFormat(s.to_owned())),
        }
    }
}

/// Serialized rows plus what a caller needs to offer them as a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedRows {
    pub filename: String,
    pub format: ExportFormat,
    pub media_type: String,
    pub rows: usize,
    pub columns: usize,
    pub body: String,
}

/// `<stem>_export.<ext>` for the uploaded file name.
pub fn export_filename(original: &str, format: ExportFormat) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("data");
    format!("{stem}_export.{}", format.extension())
}

/// Serializes the first `limit` rows (all rows for `None` or `0`) of the
/// selected columns.
///
/// # Errors
///
/// `ColumnsNotFound` for unknown columns, `Csv`/`Json` if serialization
/// fails.
pub fn export_rows(
    dataset: &Dataset,
    original_filename: &str,
    columns: Option<&[String]>,
    limit: Option<usize>,
    format: ExportFormat,
) -> Result<ExportedRows> {
    let limited = match limit {
        Some(n) if n > 0 && n < dataset.row_count() => Cow::Owned(dataset.head(n)),
        _ => Cow::Borrowed(dataset),
    };
    let selected = match columns {
        Some(columns) => Cow::Owned(limited.select(columns)?),
        None => limited,
    };

    let body = match format {
        ExportFormat::Csv => to_csv(&selected)?,
        ExportFormat::Json => to_json(&selected)?,
    };

    Ok(ExportedRows {
        filename: export_filename(original_filename, format),
        format,
        media_type: format.media_type().to_owned(),
        rows: selected.row_count(),
        columns: selected.column_count(),
        body,
    })
}

/// Header row first; nulls are empty fields.
fn to_csv(dataset: &Dataset) -> Result<String> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(dataset.columns().iter().map(|c| c.name()))?;
        for row in 0..dataset.row_count() {
            writer.write_record(
                dataset
                    .row(row)
                    .iter()
                    .map(|cell| cell.as_ref().map(Value::to_string).unwrap_or_default()),
            )?;
        }
        writer.flush()?;
    }
    String::from_utf8(buffer).map_err(|e| DataSummaryError::InvalidInput(e.to_string()))
}

/// Pretty-printed array of row objects, keys in column order.
fn to_json(dataset: &Dataset) -> Result<String> {
    let names = dataset.column_names();
    let mut records = Vec::with_capacity(dataset.row_count());
    for row in 0..dataset.row_count() {
        let mut record = serde_json::Map::with_capacity(names.len());
        for (name, cell) in names.iter().zip(dataset.row(row)) {
            record.insert(name.clone(), serde_json::to_value(cell)?);
        }
        records.push(serde_json::Value::Object(record));
    }
    Ok(serde_json::to_string_pretty(&records)?)
}
