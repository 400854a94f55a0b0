//! Logging setup for data-summary.
//!
//! Events go to the console and to two daily-rotated files in the log
//! directory: `data-summary.<date>.log` with everything the filter lets
//! through, and `error.<date>.log` with warnings and errors only. Ten files
//! of each kind are retained.
//!
//! ```no_run
//! use data_summary::config::LogSettings;
//! use data_summary::logging;
//!
//! let dir = logging::init(&LogSettings::default())?;
//! tracing::info!(log_dir = %dir.display(), "Ready");
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::config::LogSettings;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const LOG_FILE_PREFIX: &str = "data-summary";
const ERROR_FILE_PREFIX: &str = "error";
const MAX_LOG_FILES: usize = 10;

/// Resolves the log directory and creates it if needed.
///
/// Uses `settings.directory` when set, otherwise the platform data directory:
/// - Windows: `%LOCALAPPDATA%/data-summary/logs`
/// - macOS: `~/Library/Application Support/data-summary/logs`
/// - Linux: `~/.local/share/data-summary/logs`
///
/// # Errors
///
/// Returns error if no data directory is known or the directory cannot be
/// created.
pub fn get_log_dir(settings: &LogSettings) -> Result<PathBuf> {
    let log_dir = match &settings.directory {
        Some(dir) => dir.clone(),
        None => dirs::data_local_dir()
            .context("Failed to determine data directory")?
            .join("data-summary")
            .join("logs"),
    };

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// `RUST_LOG` when set, else the configured level.
fn env_filter(settings: &LogSettings) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .with_context(|| format!("Invalid log level '{}'", settings.level))
}

fn daily_appender(dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("Failed to create {prefix} file appender"))
}

/// Installs the global subscriber and returns the log directory.
///
/// # Errors
///
/// Returns error if the log directory or appenders cannot be created, the
/// level is not a valid filter, or a global subscriber is already set.
pub fn init(settings: &LogSettings) -> Result<PathBuf> {
    let log_dir = get_log_dir(settings)?;
    let all_logs_appender = daily_appender(&log_dir, LOG_FILE_PREFIX)?;
    let error_logs_appender = daily_appender(&log_dir, ERROR_FILE_PREFIX)?;

    // Console output goes to stderr; stdout carries command results.
    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(all_logs_appender);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(error_logs_appender)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter(settings)?)
        .with(console_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    tracing::info!(log_dir = %log_dir.display(), "Logging initialized");

    Ok(log_dir)
}

/// Path of today's combined log file.
///
/// # Errors
///
/// See [`get_log_dir`].
pub fn get_current_log_path(settings: &LogSettings) -> Result<PathBuf> {
    let today = chrono::Local::now().format("%Y-%m-%d");
    Ok(get_log_dir(settings)?.join(format!("{LOG_FILE_PREFIX}.{today}.log")))
}
