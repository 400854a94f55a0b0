//! Dataset model and the statistics engine that reads it.
//!
//! - [`dataset`]: typed columns with out-of-band nulls
//! - [`logic`]: pure analysis functions (summaries, missing values,
//!   imputation, correlation, plot data, CSV ingestion)

pub mod dataset;
pub mod logic;
