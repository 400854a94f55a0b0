//! Process-start configuration.
//!
//! Settings come from an optional TOML file followed by `DATA_SUMMARY_*`
//! environment variables, later sources overriding earlier ones. Nested
//! keys use a double underscore, e.g. `DATA_SUMMARY_UPLOAD__MAX_ROWS=5000`.
//! Anything left unset keeps its default.

use crate::error::{DataSummaryError, Result};
use crate::session::{
    DEFAULT_CLEANUP_INTERVAL, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL, StoreConfig,
};
use ::config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no path is given.
pub const CONFIG_FILE_STEM: &str = "DataSummary";
pub const ENV_PREFIX: &str = "DATA_SUMMARY";

const MIB: u64 = 1024 * 1024;

/// Checks the upload layer applies before a dataset reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    pub max_file_bytes: u64,
    pub min_rows: usize,
    pub max_rows: usize,
    pub min_columns: usize,
    pub max_columns: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 100 * MIB,
            min_rows: 1,
            max_rows: 1_000_000,
            min_columns: 1,
            max_columns: 500,
        }
    }
}

impl UploadLimits {
    /// # Errors
    ///
    /// `InvalidInput` when `bytes` exceeds the limit.
    pub fn check_file_size(&self, bytes: u64) -> Result<()> {
        if bytes > self.max_file_bytes {
            return Err(DataSummaryError::InvalidInput(format!(
                "File too large: {:.2} MB exceeds the {:.2} MB limit",
                bytes as f64 / MIB as f64,
                self.max_file_bytes as f64 / MIB as f64
            )));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// `InvalidInput` when the row or column count is out of range.
    pub fn check_shape(&self, rows: usize, columns: usize) -> Result<()> {
        if rows < self.min_rows || rows > self.max_rows {
            return Err(DataSummaryError::InvalidInput(format!(
                "Dataset has {rows} rows; allowed range is {}-{}",
                self.min_rows, self.max_rows
            )));
        }
        if columns < self.min_columns || columns > self.max_columns {
            return Err(DataSummaryError::InvalidInput(format!(
                "Dataset has {columns} columns; allowed range is {}-{}",
                self.min_columns, self.max_columns
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Where log files go. Defaults to the platform data directory.
    pub directory: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub max_sessions: usize,
    pub session_ttl_secs: u64,
    pub cleanup_interval_secs: u64,
    /// Rows or values shown in previews and column samples.
    pub sample_size: usize,
    pub upload: UploadLimits,
    pub logging: LogSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            session_ttl_secs: DEFAULT_SESSION_TTL.as_secs(),
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL.as_secs(),
            sample_size: 5,
            upload: UploadLimits::default(),
            logging: LogSettings::default(),
        }
    }
}

impl AppSettings {
    /// Loads settings from `path` (required when given) or the optional
    /// `DataSummary.toml`, then the environment.
    ///
    /// # Errors
    ///
    /// `Config` for unreadable or mistyped sources, `InvalidInput` for
    /// values that fail validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => ConfigFile::from(path).required(true),
            None => ConfigFile::with_name(CONFIG_FILE_STEM).required(false),
        };
        let settings: Self = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    ///
    /// `InvalidInput` naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(DataSummaryError::InvalidInput(msg.to_owned()));
        if self.max_sessions == 0 {
            return invalid("max_sessions must be at least 1");
        }
        if self.session_ttl_secs == 0 {
            return invalid("session_ttl_secs must be non-zero");
        }
        if self.cleanup_interval_secs == 0 {
            return invalid("cleanup_interval_secs must be non-zero");
        }
        if self.upload.min_rows > self.upload.max_rows {
            return invalid("upload.min_rows exceeds upload.max_rows");
        }
        if self.upload.min_columns > self.upload.max_columns {
            return invalid("upload.min_columns exceeds upload.max_columns");
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_sessions: self.max_sessions,
            ttl: self.session_ttl(),
            cleanup_interval: self.cleanup_interval(),
        }
    }
}
