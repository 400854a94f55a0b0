//! # data-summary command line
//!
//! Loads one CSV file through the upload checks, stores it as a session in
//! an in-process [`SessionService`], runs the requested operation and prints
//! the result as JSON:
//!
//! ```bash
//! data-summary summary sales.csv --columns price,quantity
//! data-summary impute sales.csv --strategy fill_median --output cleaned.csv
//! data-summary export sales.csv --format json --limit 100
//! ```
//!
//! Settings come from `--config`, `DataSummary.toml` and `DATA_SUMMARY_*`
//! environment variables; see [`data_summary::config`].

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Allow println! in main binary

mod cli;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use data_summary::config::AppSettings;
use data_summary::logging;
use data_summary::service::SessionService;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let settings =
        AppSettings::load(cli.config.as_deref()).context("Failed to load settings")?;
    logging::init(&settings.logging)?;

    let service = SessionService::new(&settings)?;
    let result = cli::run_command(cli.command, &service, &settings.upload);
    service.close();

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}
