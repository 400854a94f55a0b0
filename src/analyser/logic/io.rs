use crate::analyser::dataset::{Column, ColumnData, DATETIME_FORMAT, Dataset};
use crate::config::UploadLimits;
use crate::error::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cell texts read as null, compared after trimming.
pub const NULL_TOKENS: [&str; 6] = ["", "NA", "N/A", "NaN", "null", "None"];

const DATETIME_FORMATS: [&str; 3] = [DATETIME_FORMAT, "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Loads a CSV file after checking it against the upload limits.
///
/// # Errors
///
/// `InvalidInput` when the file breaks a limit, `Io`/`Csv` when it cannot
/// be read.
pub fn load_csv(path: &Path, limits: &UploadLimits) -> Result<Dataset> {
    let size = std::fs::metadata(path)?.len();
    limits.check_file_size(size)?;
    let dataset = read_csv(File::open(path)?)?;
    limits.check_shape(dataset.row_count(), dataset.column_count())?;
    Ok(dataset)
}

/// Reads headed CSV and infers one type per column, trying integer, float,
/// boolean and datetime before falling back to text. A column with no
/// values at all becomes Float.
///
/// # Errors
///
/// `Csv` for malformed input, `InvalidInput` for empty or repeated headers.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record?;
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push((!NULL_TOKENS.contains(&field)).then(|| field.to_owned()));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column::new(name, infer(&raw)))
        .collect();
    Dataset::new(columns)
}

fn parse_all<T>(raw: &[Option<String>], parse: impl Fn(&str) -> Option<T>) -> Option<Vec<Option<T>>> {
    raw.iter()
        .map(|cell| match cell {
            Some(text) => parse(text).map(Some),
            None => Some(None),
        })
        .collect()
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn infer(raw: &[Option<String>]) -> ColumnData {
    if raw.iter().all(Option::is_none) {
        return ColumnData::Float(vec![None; raw.len()]);
    }
    if let Some(values) = parse_all(raw, |t| t.parse::<i64>().ok()) {
        return ColumnData::Integer(values);
    }
    if let Some(values) = parse_all(raw, |t| t.parse::<f64>().ok()) {
        return ColumnData::Float(values);
    }
    if let Some(values) = parse_all(raw, parse_bool) {
        return ColumnData::Boolean(values);
    }
    if let Some(values) = parse_all(raw, parse_datetime) {
        return ColumnData::DateTime(values);
    }
    ColumnData::Text(raw.to_vec())
}
