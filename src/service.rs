//! Session-level orchestration.
//!
//! [`SessionService`] resolves a session through the [`SessionStore`], runs
//! the analysis on the snapshot it got back, and for `handle_missing` writes
//! the processed dataset back with `replace`. Every analysis result is
//! wrapped in a [`SessionResponse`] carrying the session id, the uploaded
//! file name and the time the call took.

use crate::analyser::dataset::Dataset;
use crate::analyser::logic::{
    self, ColumnMetadata, CorrelationMatrix, DatasetOverview, ImputeStrategy, MissingStatistics,
    MissingValueReport, PlotData, PlotRequest, SummaryOptions, SummaryReport,
};
use crate::config::AppSettings;
use crate::error::Result;
use crate::export::{self, ExportFormat, ExportedRows};
use crate::session::{FileKind, SessionRecord, SessionStore, SessionSummary};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::info;

/// Analysis result plus the session it was computed for.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct SessionResponse<T> {
    pub session_id: String,
    pub filename: String,
    #[serde(with = "duration_serde")]
    pub processing_time: Duration,
    #[serde(flatten)]
    pub data: T,
}

mod duration_serde {
    use serde::{Serializer, ser::SerializeStruct as _};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Duration", 2)?;
        state.serialize_field("secs", &duration.as_secs())?;
        state.serialize_field("nanos", &duration.subsec_nanos())?;
        state.end()
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct CreatedSession {
    pub summary: SessionSummary,
    pub overview: DatasetOverview,
}

impl CreatedSession {
    pub fn session_id(&self) -> &str {
        &self.summary.session_id
    }
}

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct DeletedSession {
    pub session_id: String,
    pub filename: String,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ColumnsDescription {
    pub columns: Vec<ColumnMetadata>,
}

/// What `handle_missing` did, with missing-value statistics either side.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct HandleMissingOutcome {
    pub strategy: ImputeStrategy,
    pub columns_processed: Vec<String>,
    pub rows_removed: usize,
    pub unresolved_columns: Vec<String>,
    pub warnings: Vec<String>,
    pub original_statistics: MissingStatistics,
    pub processed_statistics: MissingStatistics,
    pub new_row_count: usize,
}

#[derive(Debug)]
pub struct SessionService {
    store: SessionStore,
    sample_size: usize,
}

impl SessionService {
    /// Builds the store from `settings` and starts its sweeper.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an unusable store configuration, `Io` if the
    /// sweeper thread cannot be spawned.
    pub fn new(settings: &AppSettings) -> Result<Self> {
        let store = SessionStore::new(settings.store_config())?;
        Ok(Self::with_store(store, settings.sample_size))
    }

    pub fn with_store(store: SessionStore, sample_size: usize) -> Self {
        Self { store, sample_size }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Stores `dataset` and returns its summary with an overview.
    ///
    /// # Errors
    ///
    /// `LockPoisoned` only; a full store evicts instead of failing.
    pub fn create(
        &self,
        dataset: Dataset,
        filename: &str,
        file_kind: FileKind,
    ) -> Result<CreatedSession> {
        let record = self.store.create(dataset, filename, file_kind)?;
        Ok(CreatedSession {
            overview: logic::dataset_overview(&record.dataset, self.sample_size),
            summary: record.summary(),
        })
    }

    /// # Errors
    ///
    /// `LockPoisoned` only.
    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        self.store.list()
    }

    /// # Errors
    ///
    /// `SessionNotFound` for an unknown or expired id.
    pub fn delete(&self, session_id: &str) -> Result<DeletedSession> {
        let record = self.store.delete(session_id)?;
        Ok(DeletedSession {
            session_id: record.id,
            filename: record.original_filename,
        })
    }

    /// # Errors
    ///
    /// `SessionNotFound`, or `ColumnsNotFound` for an unknown column filter.
    pub fn summarize(
        &self,
        session_id: &str,
        options: &SummaryOptions,
    ) -> Result<SessionResponse<SummaryReport>> {
        self.respond(session_id, "summarize", |record| {
            logic::summarize(&record.dataset, options)
        })
    }

    /// # Errors
    ///
    /// `SessionNotFound`, or `ColumnNotFound` listing the available columns.
    pub fn describe_column(
        &self,
        session_id: &str,
        column: &str,
    ) -> Result<SessionResponse<ColumnMetadata>> {
        self.respond(session_id, "describe_column", |record| {
            logic::describe_column(&record.dataset, column, self.sample_size)
        })
    }

    /// # Errors
    ///
    /// `SessionNotFound`.
    pub fn describe_columns(&self, session_id: &str) -> Result<SessionResponse<ColumnsDescription>> {
        self.respond(session_id, "describe_columns", |record| {
            Ok(ColumnsDescription {
                columns: logic::describe_columns(&record.dataset, self.sample_size),
            })
        })
    }

    /// # Errors
    ///
    /// `SessionNotFound`.
    pub fn missing_report(&self, session_id: &str) -> Result<SessionResponse<MissingValueReport>> {
        self.respond(session_id, "missing_report", |record| {
            Ok(logic::missing_report(&record.dataset))
        })
    }

    /// # Errors
    ///
    /// `SessionNotFound`, or `ColumnsNotFound` for an unknown column filter.
    pub fn correlation(
        &self,
        session_id: &str,
        columns: Option<&[String]>,
    ) -> Result<SessionResponse<CorrelationMatrix>> {
        self.respond(session_id, "correlation", |record| {
            logic::correlate(&record.dataset, columns)
        })
    }

    /// # Errors
    ///
    /// `SessionNotFound`, plus the column errors of
    /// [`plot_data`](crate::analyser::logic::plot_data).
    pub fn plot_data(
        &self,
        session_id: &str,
        request: &PlotRequest,
    ) -> Result<SessionResponse<PlotData>> {
        self.respond(session_id, "plot_data", |record| {
            logic::plot_data(&record.dataset, request)
        })
    }

    /// Imputes nulls and stores the processed dataset in place of the
    /// session's current one. Concurrent calls on one session are not
    /// merged: the last `replace` wins.
    ///
    /// # Errors
    ///
    /// `SessionNotFound`, `UnknownStrategy`, or `ColumnsNotFound`. The stored
    /// dataset is untouched on any error.
    pub fn handle_missing(
        &self,
        session_id: &str,
        strategy: &str,
        columns: Option<&[String]>,
    ) -> Result<SessionResponse<HandleMissingOutcome>> {
        self.respond(session_id, "handle_missing", |record| {
            let strategy: ImputeStrategy = strategy.parse()?;
            let original_statistics = logic::missing_statistics(&record.dataset);
            let outcome = logic::impute(&record.dataset, strategy, columns)?;
            let processed_statistics = logic::missing_statistics(&outcome.dataset);
            let new_row_count = outcome.dataset.row_count();
            self.store.replace(session_id, outcome.dataset)?;

            Ok(HandleMissingOutcome {
                strategy,
                columns_processed: columns
                    .map(<[String]>::to_vec)
                    .unwrap_or_else(|| record.dataset.column_names()),
                rows_removed: outcome.rows_removed,
                unresolved_columns: outcome.unresolved_columns,
                warnings: outcome.warnings,
                original_statistics,
                processed_statistics,
                new_row_count,
            })
        })
    }

    /// Serializes rows of the session's dataset. `limit` of `None` or `0`
    /// exports every row.
    ///
    /// # Errors
    ///
    /// `SessionNotFound`, `InvalidFormat`, or `ColumnsNotFound`.
    pub fn export(
        &self,
        session_id: &str,
        columns: Option<&[String]>,
        limit: Option<usize>,
        format: &str,
    ) -> Result<ExportedRows> {
        let started = Instant::now();
        let record = self.store.get(session_id)?;
        let format: ExportFormat = format.parse()?;
        let exported = export::export_rows(
            &record.dataset,
            &record.original_filename,
            columns,
            limit,
            format,
        )?;
        info!(
            session_id,
            format = %format,
            rows_exported = exported.rows,
            columns_exported = exported.columns,
            elapsed_ms = elapsed_ms(started),
            "Rows exported"
        );
        Ok(exported)
    }

    /// Stops the store's sweeper. Stored sessions stay readable.
    pub fn close(&self) {
        self.store.close();
    }

    fn respond<T>(
        &self,
        session_id: &str,
        operation: &'static str,
        run: impl FnOnce(&SessionRecord) -> Result<T>,
    ) -> Result<SessionResponse<T>> {
        let started = Instant::now();
        let record = self.store.get(session_id)?;
        let data = run(&record)?;
        let processing_time = started.elapsed();
        info!(
            session_id,
            filename = %record.original_filename,
            operation,
            elapsed_ms = elapsed_ms(started),
            "Session operation completed"
        );
        Ok(SessionResponse {
            session_id: record.id,
            filename: record.original_filename,
            processing_time,
            data,
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
