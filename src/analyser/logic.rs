pub mod analysis;
pub mod cleaning;
pub mod health;
pub mod io;
pub mod missing;
pub mod plots;
pub mod profiling;
pub mod types;

pub use analysis::{
    correlate, correlation_matrix, dataset_overview, describe_column, describe_columns, summarize,
};
pub use cleaning::impute;
pub use health::data_quality_metrics;
pub use io::{load_csv, read_csv};
pub use missing::{missing_report, missing_statistics};
pub use plots::plot_data;
pub use types::{
    CategoricalStats, ColumnDetail, ColumnMetadata, CorrelationMatrix, DatasetOverview,
    ImputeOutcome, ImputeStrategy, MissingPattern, MissingStatistics, MissingValueReport,
    NumericStats, PlotData, PlotKind, PlotMissing, PlotRequest, QualityRating, SummaryOptions,
    SummaryReport,
};
