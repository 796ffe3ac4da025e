//! JSONL import functionality.
//!
//! Records are verified against their content hash and added as new form
//! results. Each stored form result matching a record's hash absorbs one
//! record, so importing the same file twice is harmless while identical
//! submissions inside one file are all kept.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::Error;
use crate::storage::sqlite::SqliteStorage;
use crate::sync::file::read_jsonl;
use crate::sync::hash::form_result_hash;
use crate::sync::types::{FormResultRecord, ImportStats, SyncRecord, SyncResult};

/// Importer for JSONL sync files.
pub struct Importer<'a> {
    storage: &'a mut SqliteStorage,
    actor: String,
    /// Per form, how many stored results carry each hash and have not yet
    /// been matched by a record. Loaded lazily from the database.
    unmatched: HashMap<String, HashMap<String, usize>>,
}

impl<'a> Importer<'a> {
    /// Create a new importer writing as `actor`.
    #[must_use]
    pub fn new(storage: &'a mut SqliteStorage, actor: &str) -> Self {
        Self {
            storage,
            actor: actor.to_string(),
            unmatched: HashMap::new(),
        }
    }

    /// Import records from a JSONL file.
    ///
    /// Each record is stored in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a line is not a valid
    /// record, or the database fails.
    pub fn import(&mut self, path: &Path) -> SyncResult<ImportStats> {
        let records = read_jsonl(path)?;
        let mut stats = ImportStats::default();

        for record in records {
            match record {
                SyncRecord::FormResult(rec) => self.import_form_result(rec, &mut stats)?,
            }
        }

        Ok(stats)
    }

    fn import_form_result(&mut self, rec: FormResultRecord, stats: &mut ImportStats) -> SyncResult<()> {
        let hash = form_result_hash(&rec.form_id, &rec.data);
        if hash != rec.content_hash {
            warn!(form_id = %rec.form_id, "Skipping record with mismatched content hash");
            stats.invalid += 1;
            return Ok(());
        }

        if let Some(remaining) = self.unmatched_for(&rec.form_id)?.get_mut(&hash) {
            if *remaining > 0 {
                *remaining -= 1;
                debug!(form_id = %rec.form_id, "Skipping record already stored");
                stats.skipped += 1;
                return Ok(());
            }
        }

        match self
            .storage
            .import_form_result(&rec.form_id, &rec.data, &self.actor)
        {
            Ok(()) => {
                stats.created += 1;
                Ok(())
            }
            Err(Error::EmptyOptionSet { elem_key }) => {
                warn!(form_id = %rec.form_id, elem_key = %elem_key, "Skipping record with empty option set");
                stats.invalid += 1;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn unmatched_for(&mut self, form_id: &str) -> SyncResult<&mut HashMap<String, usize>> {
        if !self.unmatched.contains_key(form_id) {
            let mut counts: HashMap<String, usize> = HashMap::new();
            for result in self.storage.get_form_results_by_form_id(form_id)? {
                *counts.entry(form_result_hash(form_id, &result)).or_default() += 1;
            }
            self.unmatched.insert(form_id.to_string(), counts);
        }

        Ok(self.unmatched.entry(form_id.to_string()).or_default())
    }
}
