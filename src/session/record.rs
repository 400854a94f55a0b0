use crate::analyser::dataset::Dataset;
use crate::error::{DataSummaryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Upload container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Csv,
    Xlsx,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    /// Detects the kind from the file extension, ignoring case.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for any other extension.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = filename
            .trim()
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx") => Ok(Self::Xlsx),
            _ => Err(DataSummaryError::InvalidInput(format!(
                "Unsupported file type for '{filename}'. Allowed types: CSV, XLSX"
            ))),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read view of a stored session, taken under its lock.
///
/// The dataset is shared with the store; a later `replace` swaps the
/// store's pointer and leaves this snapshot intact.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: String,
    pub dataset: Arc<Dataset>,
    pub original_filename: String,
    pub file_kind: FileKind,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub byte_size_estimate: usize,
}

impl SessionRecord {
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            filename: self.original_filename.clone(),
            file_kind: self.file_kind,
            created_at: self.created_at,
            last_accessed_at: self.last_accessed_at,
            row_count: self.dataset.row_count(),
            column_count: self.dataset.column_count(),
            byte_size_estimate: self.byte_size_estimate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub filename: String,
    pub file_kind: FileKind,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub row_count: usize,
    pub column_count: usize,
    pub byte_size_estimate: usize,
}
