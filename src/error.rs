//! Centralized error handling for data-summary.
//!
//! Every fallible operation in the crate returns [`Result<T>`], whose error
//! side is the [`DataSummaryError`] enum. Variants map one-to-one onto the
//! failure kinds the external API layer reports, so a caller can match on them
//! to pick a response status:
//!
//! ```
//! use data_summary::error::DataSummaryError;
//!
//! fn status_for(err: &DataSummaryError) -> u16 {
//!     if err.is_not_found() {
//!         404
//!     } else if err.is_client_error() {
//!         400
//!     } else {
//!         500
//!     }
//! }
//!
//! let err = DataSummaryError::SessionNotFound("abc".to_owned());
//! assert_eq!(status_for(&err), 404);
//! ```
//!
//! Standard library, CSV, JSON and configuration errors convert automatically through
//! `#[from]`, so the `?` operator works across those boundaries.

use thiserror::Error;

/// Main error type for data-summary operations.
#[derive(Debug, Error)]
pub enum DataSummaryError {
    /// Unknown or expired session id. The two causes are indistinguishable
    /// because an expired session is physically removed.
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    /// A single requested column is absent.
    #[error("Column '{column}' not found in dataset. Available columns: {}", .available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    /// One or more requested columns are absent.
    #[error("Columns not found: {}", .missing.join(", "))]
    ColumnsNotFound { missing: Vec<String> },

    #[error(
        "Unknown missing value strategy '{0}'. Supported strategies: skip, fill_mean, fill_median, fill_mode, forward_fill, backward_fill"
    )]
    UnknownStrategy(String),

    #[error("Invalid format '{0}'. Supported formats: csv, json")]
    InvalidFormat(String),

    /// Structurally inconsistent input, e.g. mismatched column lengths.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Column '{column}' is not numeric (type: {data_type}) and cannot be plotted")]
    NonNumericColumn { column: String, data_type: String },

    #[error("Unsupported plot type '{0}'. Supported types: histogram, boxplot, scatter, line")]
    UnsupportedPlot(String),

    /// A thread panicked while holding a store lock.
    #[error("Session store lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl DataSummaryError {
    /// True for the "addressed thing does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SessionNotFound(_) | Self::ColumnNotFound { .. } | Self::ColumnsNotFound { .. }
        )
    }

    /// True when the caller supplied something the engine rejects.
    pub fn is_client_error(&self) -> bool {
        self.is_not_found()
            || matches!(
                self,
                Self::UnknownStrategy(_)
                    | Self::InvalidFormat(_)
                    | Self::InvalidInput(_)
                    | Self::NonNumericColumn { .. }
                    | Self::UnsupportedPlot(_)
            )
    }

    pub(crate) fn poisoned<T>(err: &std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned(err.to_string())
    }
}

/// Result type alias for data-summary operations.
pub type Result<T> = std::result::Result<T, DataSummaryError>;
