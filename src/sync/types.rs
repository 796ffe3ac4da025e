//! Sync types for JSONL export/import.
//!
//! This module defines the record types used in JSONL files. Each record
//! wraps a form result with the form it belongs to and sync metadata.

use serde::{Deserialize, Serialize};

use crate::model::FormResult;

/// Tagged union for JSONL records.
///
/// Each line in a JSONL file is one of these record types, discriminated by the `type` field:
/// `{"type":"form_result","form_id":"survey",...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncRecord {
    /// A form result with sync metadata.
    FormResult(FormResultRecord),
}

/// Form result with sync metadata.
///
/// The store-assigned id is local to one database and is never exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormResultRecord {
    /// Form the result belongs to.
    pub form_id: String,
    /// The form result data.
    #[serde(flatten)]
    pub data: FormResult,
    /// SHA256 hash of `(form_id, data)` (for change detection).
    pub content_hash: String,
    /// ISO8601 timestamp when this record was exported.
    pub exported_at: String,
}

/// Statistics for an export operation.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ExportStats {
    /// Number of forms exported.
    pub forms: usize,
    /// Number of form results exported.
    pub form_results: usize,
}

impl ExportStats {
    /// Returns true if nothing was exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.form_results == 0
    }
}

/// Statistics for an import operation.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportStats {
    /// Number of new form results created.
    pub created: usize,
    /// Number of records skipped because an identical result already exists.
    pub skipped: usize,
    /// Number of records rejected (hash mismatch or invalid answers).
    pub invalid: usize,
}

impl ImportStats {
    /// Total records processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.created + self.skipped + self.invalid
    }
}

/// Sync-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Storage failure, passed through with its original category.
    #[error(transparent)]
    Storage(#[from] crate::error::Error),

    /// No form results to export.
    #[error("No form results to export for {0}")]
    NothingToExport(String),

    /// JSONL file not found.
    #[error("JSONL file not found: {0}")]
    FileNotFound(String),

    /// Invalid record format.
    #[error("Invalid record at line {line}: {message}")]
    InvalidRecord {
        /// Line number (1-indexed).
        line: usize,
        /// Error message.
        message: String,
    },
}

impl From<SyncError> for crate::error::Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Io(e) => Self::Io(e),
            SyncError::Json(e) => Self::Json(e),
            SyncError::Storage(e) => e,
            other => Self::Sync(other.to_string()),
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;
