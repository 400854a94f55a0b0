//! # data-summary
//!
//! Keeps uploaded tabular datasets in memory for the length of a client
//! session and answers statistical questions about them: summaries, column
//! profiles, missing-value reports, imputation, correlation, plot series and
//! row export.
//!
//! ## Quick Start
//!
//! ```no_run
//! use data_summary::analyser::logic::{self, SummaryOptions};
//! use data_summary::config::AppSettings;
//! use data_summary::service::SessionService;
//! use data_summary::session::FileKind;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let settings = AppSettings::load(None)?;
//! let dataset = logic::load_csv(Path::new("data.csv"), &settings.upload)?;
//!
//! let service = SessionService::new(&settings)?;
//! let created = service.create(dataset, "data.csv", FileKind::Csv)?;
//! let report = service.summarize(created.session_id(), &SummaryOptions::everything())?;
//! println!("{} numeric columns", report.data.numeric_summary.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`analyser`]: the column-typed [`Dataset`](analyser::dataset::Dataset)
//!   and the pure analysis functions in [`analyser::logic`]
//! - [`session`]: the bounded, expiring session store
//! - [`service`]: session-level operations combining the two
//! - [`export`]: CSV and JSON row export
//! - [`config`]: settings loaded at process start
//! - [`logging`]: tracing subscriber setup
//! - [`error`]: the crate error type

#![warn(clippy::all, rust_2018_idioms)]

pub mod analyser;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod service;
pub mod session;
