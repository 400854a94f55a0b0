//! Missing-value reporting.
//!
//! [`missing_report`] classifies every column by its share of nulls and turns
//! the classification into plain-language recommendations.
//! [`missing_statistics`] is the cheaper cell/row/column tally that the
//! imputation path reports before and after it runs.

use super::health::{missing_pattern, quality_rating};
use super::types::{
    ColumnMissing, ColumnMissingCount, MissingPattern, MissingStatistics, MissingValueReport,
    OverallMissing, RowMissing,
};
use crate::analyser::dataset::{Dataset, percent};

pub const NO_MISSING_MESSAGE: &str = "No missing values detected - data quality is excellent!";

pub fn missing_report(dataset: &Dataset) -> MissingValueReport {
    let total_rows = dataset.row_count();
    let mut columns_with_missing = Vec::new();
    let mut missing_summary = Vec::with_capacity(dataset.column_count());
    let mut missing_patterns = Vec::new();

    for column in dataset.columns() {
        let missing_count = column.null_count();
        let missing_percent = percent(missing_count, total_rows);

        missing_summary.push(ColumnMissing {
            name: column.name().to_owned(),
            missing_count,
            missing_percent,
            non_missing_count: total_rows - missing_count,
            data_type: column.data_type(),
            quality_rating: quality_rating(missing_percent),
        });

        if missing_count > 0 {
            columns_with_missing.push(column.name().to_owned());
            missing_patterns.push((column.name().to_owned(), missing_pattern(missing_percent)));
        }
    }

    let recommendations = recommendations(&missing_patterns);

    MissingValueReport {
        total_rows,
        total_columns: dataset.column_count(),
        columns_with_missing,
        missing_summary,
        missing_patterns,
        recommendations,
        statistics: missing_statistics(dataset),
    }
}

fn columns_with(patterns: &[(String, MissingPattern)], wanted: MissingPattern) -> Vec<&str> {
    patterns
        .iter()
        .filter(|(_, p)| *p == wanted)
        .map(|(name, _)| name.as_str())
        .collect()
}

/// One line per affected band, in severity order.
pub fn recommendations(patterns: &[(String, MissingPattern)]) -> Vec<String> {
    if patterns.is_empty() {
        return vec![NO_MISSING_MESSAGE.to_owned()];
    }

    let mut out = Vec::new();
    let high = columns_with(patterns, MissingPattern::HighMissing);
    if !high.is_empty() {
        out.push(format!(
            "Consider dropping or imputing columns with >50% missing values: {}",
            high.join(", ")
        ));
    }
    let moderate = columns_with(patterns, MissingPattern::ModerateMissing);
    if !moderate.is_empty() {
        out.push(format!(
            "Consider imputation strategies for columns with 20-50% missing values: {}",
            moderate.join(", ")
        ));
    }
    out
}

pub fn missing_statistics(dataset: &Dataset) -> MissingStatistics {
    let rows = dataset.row_count();
    let width = dataset.column_count();
    let total_cells = rows * width;
    let missing_cells = dataset.null_count();

    let mut rows_with_missing = 0;
    let mut rows_all_missing = 0;
    for row in 0..rows {
        let nulls = dataset.row_null_count(row);
        if nulls > 0 {
            rows_with_missing += 1;
        }
        if width > 0 && nulls == width {
            rows_all_missing += 1;
        }
    }

    let by_column = dataset
        .columns()
        .iter()
        .map(|c| {
            let missing_count = c.null_count();
            ColumnMissingCount {
                name: c.name().to_owned(),
                missing_count,
                missing_percentage: percent(missing_count, rows),
                non_missing_count: rows - missing_count,
            }
        })
        .collect();

    MissingStatistics {
        overall: OverallMissing {
            total_cells,
            missing_cells,
            missing_percentage: percent(missing_cells, total_cells),
        },
        by_row: RowMissing {
            rows_with_missing,
            rows_without_missing: rows - rows_with_missing,
            rows_all_missing,
        },
        by_column,
    }
}
