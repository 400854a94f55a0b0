use crate::analyser::dataset::{ColumnTypeSummary, DataType, Dataset, MemoryEstimate, Value};
use crate::error::DataSummaryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// OVERVIEW

/// Shape, types, footprint and leading rows of a freshly loaded dataset.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct DatasetOverview {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnTypeSummary>,
    pub memory: MemoryEstimate,
    pub sample_rows: Vec<Vec<Option<Value>>>,
}

// STATISTICS

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct NumericStats {
    pub count: usize,
    pub missing: usize,
    pub percent_missing: f64,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub percentile_25: Option<f64>,
    pub percentile_75: Option<f64>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct CategoricalStats {
    pub count: usize,
    pub missing: usize,
    pub percent_missing: f64,
    pub unique_count: usize,
    pub most_common_value: Option<Value>,
    pub most_common_count: usize,
    pub data_type: DataType,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct NumericSummary {
    pub name: String,
    pub stats: NumericStats,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct CategoricalSummary {
    pub name: String,
    pub stats: CategoricalStats,
}

/// Pearson coefficients over numeric columns. `data[i][j]` pairs
/// `columns[i]` with `columns[j]`; `None` marks an undefined coefficient
/// (fewer than two complete pairs, or zero variance).
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.data.get(i)?.get(j).copied().flatten()
    }
}

// QUALITY

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QualityRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityRating {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ColumnQuality {
    pub name: String,
    pub total_values: usize,
    pub missing_values: usize,
    pub percent_missing: f64,
    pub data_quality: QualityRating,
}

// SUMMARY

/// Which parts of a [`SummaryReport`] to compute.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct SummaryOptions {
    /// Restrict the report to these columns; `None` means all.
    pub columns: Option<Vec<String>>,
    pub include_categorical: bool,
    pub include_correlation: bool,
    pub include_quality: bool,
}

impl SummaryOptions {
    pub fn everything() -> Self {
        Self {
            columns: None,
            include_categorical: true,
            include_correlation: true,
            include_quality: true,
        }
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct SummaryReport {
    pub row_count: usize,
    pub column_count: usize,
    pub numeric_summary: Vec<NumericSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorical_summary: Option<Vec<CategoricalSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_matrix: Option<CorrelationMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<Vec<ColumnQuality>>,
}

impl SummaryReport {
    pub fn numeric(&self, name: &str) -> Option<&NumericStats> {
        self.numeric_summary
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.stats)
    }

    pub fn categorical(&self, name: &str) -> Option<&CategoricalStats> {
        self.categorical_summary
            .as_ref()?
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.stats)
    }
}

// COLUMN METADATA

#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnDetail {
    Numeric(NumericStats),
    Categorical {
        most_common_value: Option<Value>,
        most_common_count: usize,
        /// Ten most frequent values, ties in first-seen order.
        value_counts: Vec<(Value, usize)>,
    },
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ColumnMetadata {
    pub column_name: String,
    pub data_type: DataType,
    pub total_values: usize,
    pub non_null_count: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    pub unique_count: usize,
    pub unique_percentage: f64,
    pub detail: ColumnDetail,
    /// Leading non-null values in row order.
    pub sample_values: Vec<Value>,
}

// MISSING VALUES

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingPattern {
    LowMissing,
    ModerateMissing,
    HighMissing,
}

impl MissingPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LowMissing => "low_missing",
            Self::ModerateMissing => "moderate_missing",
            Self::HighMissing => "high_missing",
        }
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ColumnMissing {
    pub name: String,
    pub missing_count: usize,
    pub missing_percent: f64,
    pub non_missing_count: usize,
    pub data_type: DataType,
    pub quality_rating: QualityRating,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct OverallMissing {
    pub total_cells: usize,
    pub missing_cells: usize,
    pub missing_percentage: f64,
}

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct RowMissing {
    pub rows_with_missing: usize,
    pub rows_without_missing: usize,
    pub rows_all_missing: usize,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ColumnMissingCount {
    pub name: String,
    pub missing_count: usize,
    pub missing_percentage: f64,
    pub non_missing_count: usize,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct MissingStatistics {
    pub overall: OverallMissing,
    pub by_row: RowMissing,
    pub by_column: Vec<ColumnMissingCount>,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct MissingValueReport {
    pub total_rows: usize,
    pub total_columns: usize,
    pub columns_with_missing: Vec<String>,
    pub missing_summary: Vec<ColumnMissing>,
    /// Only columns with at least one missing value are classified.
    pub missing_patterns: Vec<(String, MissingPattern)>,
    pub recommendations: Vec<String>,
    pub statistics: MissingStatistics,
}

impl MissingValueReport {
    pub fn column(&self, name: &str) -> Option<&ColumnMissing> {
        self.missing_summary.iter().find(|c| c.name == name)
    }

    pub fn pattern(&self, name: &str) -> Option<MissingPattern> {
        self.missing_patterns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| *p)
    }
}

// IMPUTATION

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Skip,
    FillMean,
    FillMedian,
    FillMode,
    ForwardFill,
    BackwardFill,
}

impl ImputeStrategy {
    pub const ALL: [Self; 6] = [
        Self::Skip,
        Self::FillMean,
        Self::FillMedian,
        Self::FillMode,
        Self::ForwardFill,
        Self::BackwardFill,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::FillMean => "fill_mean",
            Self::FillMedian => "fill_median",
            Self::FillMode => "fill_mode",
            Self::ForwardFill => "forward_fill",
            Self::BackwardFill => "backward_fill",
        }
    }
}

impl fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImputeStrategy {
    type Err = DataSummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DataSummaryError::UnknownStrategy(s.to_owned()))
    }
}

/// Result of [`impute`](super::cleaning::impute).
#[derive(Clone, Debug, PartialEq)]
pub struct ImputeOutcome {
    pub dataset: Dataset,
    pub rows_removed: usize,
    /// All-null columns a fill strategy could not resolve.
    pub unresolved_columns: Vec<String>,
    pub warnings: Vec<String>,
}

// PLOT DATA

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    Histogram,
    Boxplot,
    Scatter,
    Line,
}

impl FromStr for PlotKind {
    type Err = DataSummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "histogram" => Ok(Self::Histogram),
            "boxplot" => Ok(Self::Boxplot),
            "scatter" => Ok(Self::Scatter),
            "line" => Ok(Self::Line),
            _ => Err(DataSummaryError::UnsupportedPlot(s.to_owned())),
        }
    }
}

/// How plot series treat nulls. Unlike [`ImputeStrategy`] this never
/// touches the stored dataset.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlotMissing {
    #[default]
    Skip,
    FillMean,
    FillMedian,
}

impl FromStr for PlotMissing {
    type Err = DataSummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "fill_mean" => Ok(Self::FillMean),
            "fill_median" => Ok(Self::FillMedian),
            _ => Err(DataSummaryError::UnknownStrategy(s.to_owned())),
        }
    }
}

pub const DEFAULT_HISTOGRAM_BINS: usize = 20;
/// Accepted histogram bin counts, inclusive.
pub const HISTOGRAM_BINS_RANGE: std::ops::RangeInclusive<usize> = 5..=100;

#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
pub struct PlotRequest {
    pub kind: PlotKind,
    pub x_column: String,
    #[serde(default)]
    pub y_column: Option<String>,
    #[serde(default = "default_bins")]
    pub bins: usize,
    #[serde(default)]
    pub missing: PlotMissing,
}

fn default_bins() -> usize {
    DEFAULT_HISTOGRAM_BINS
}

impl PlotRequest {
    pub fn histogram(column: impl Into<String>) -> Self {
        Self {
            kind: PlotKind::Histogram,
            x_column: column.into(),
            y_column: None,
            bins: DEFAULT_HISTOGRAM_BINS,
            missing: PlotMissing::Skip,
        }
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlotData {
    Histogram {
        column: String,
        bins: Vec<HistogramBin>,
        mean: Option<f64>,
        std: Option<f64>,
    },
    Boxplot {
        column: String,
        /// Lower whisker end; `max` is the upper one.
        min: f64,
        q1: f64,
        median: f64,
        q3: f64,
        max: f64,
        /// Values beyond 1.5 × IQR from the quartiles.
        outliers: Vec<f64>,
    },
    Scatter {
        x_column: String,
        y_column: String,
        points: Vec<(f64, f64)>,
    },
    Line {
        x_column: String,
        y_column: String,
        points: Vec<(f64, f64)>,
    },
}
