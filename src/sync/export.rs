//! JSONL export functionality.
//!
//! # Snapshot Mode
//!
//! An export file represents the current state of the exported forms, not a
//! log of changes; it is overwritten on every export.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::storage::sqlite::SqliteStorage;
use crate::sync::file::write_jsonl;
use crate::sync::hash::form_result_hash;
use crate::sync::types::{ExportStats, FormResultRecord, SyncError, SyncRecord, SyncResult};

/// Exporter for JSONL sync files.
pub struct Exporter<'a> {
    storage: &'a SqliteStorage,
}

impl<'a> Exporter<'a> {
    /// Create a new exporter reading from `storage`.
    #[must_use]
    pub fn new(storage: &'a SqliteStorage) -> Self {
        Self { storage }
    }

    /// Export the form results of one form to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NothingToExport`] if the form has no results,
    /// or an error if the query or the file write fails.
    pub fn export_form(&self, form_id: &str, path: &Path) -> SyncResult<ExportStats> {
        self.export_forms(&[form_id.to_string()], path)
    }

    /// Export every form that has at least one result to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NothingToExport`] if the database is empty,
    /// or an error if a query or the file write fails.
    pub fn export_all(&self, path: &Path) -> SyncResult<ExportStats> {
        let form_ids = self.storage.list_form_ids()?;
        if form_ids.is_empty() {
            return Err(SyncError::NothingToExport("any form".to_string()));
        }
        self.export_forms(&form_ids, path)
    }

    fn export_forms(&self, form_ids: &[String], path: &Path) -> SyncResult<ExportStats> {
        let now = Utc::now().to_rfc3339();
        let mut stats = ExportStats::default();
        let mut records = Vec::new();

        for form_id in form_ids {
            let results = self.storage.get_form_results_by_form_id(form_id)?;
            if results.is_empty() {
                continue;
            }

            stats.forms += 1;
            stats.form_results += results.len();

            for mut data in results {
                data.id = None;
                records.push(SyncRecord::FormResult(FormResultRecord {
                    form_id: form_id.clone(),
                    content_hash: form_result_hash(form_id, &data),
                    data,
                    exported_at: now.clone(),
                }));
            }
        }

        if stats.is_empty() {
            return Err(SyncError::NothingToExport(form_ids.join(", ")));
        }

        write_jsonl(path, &records)?;
        info!(
            forms = stats.forms,
            form_results = stats.form_results,
            path = %path.display(),
            "Exported form results"
        );

        Ok(stats)
    }
}

/// Default export file for a form: `<form_id>.jsonl` in the current
/// directory, with characters unsafe in file names replaced by `_`.
#[must_use]
pub fn default_export_path(form_id: &str) -> PathBuf {
    let name: String = form_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    PathBuf::from(format!("{name}.jsonl"))
}
