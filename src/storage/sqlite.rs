//! SQLite storage implementation.
//!
//! This module provides the main storage backend for formstore using SQLite.
//! It follows the MutationContext pattern for transaction discipline and audit logging.

use crate::error::Result;
use crate::model::FormResult;
use crate::storage::events::{insert_event, Event, EventType};
use crate::storage::form_result::{insert_form_result, select_form_results_by_form_id};
use crate::storage::schema::apply_schema;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Context for a mutation operation, tracking side effects.
///
/// Mutation closures record audit events here; they are written just
/// before the transaction commits.
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Actor performing the operation.
    pub actor: String,
    /// Events to write at the end of the transaction.
    pub events: Vec<Event>,
}

impl MutationContext {
    /// Create a new mutation context.
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            events: Vec::new(),
        }
    }

    /// Record an event with a free-form comment.
    pub fn record_comment(
        &mut self,
        entity_type: &str,
        entity_id: &str,
        event_type: EventType,
        comment: &str,
    ) {
        self.events.push(
            Event::new(entity_type, entity_id, event_type, &self.actor).with_comment(comment),
        );
    }
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// This method:
    /// 1. Begins an IMMEDIATE transaction (for write locking)
    /// 2. Executes the mutation closure
    /// 3. Writes audit events
    /// 4. Commits (or rolls back on error)
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, actor: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op, actor);

        let result = f(&tx, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;

        debug!(op = %ctx.op_name, actor = %ctx.actor, events = ctx.events.len(), "Mutation committed");

        Ok(result)
    }

    // ======================
    // Form Result Operations
    // ======================

    /// Store a form result and its answers under `form_id`.
    ///
    /// The form result and all of its answers are written in one
    /// transaction. The generated id stays internal; `result` is not
    /// modified.
    ///
    /// # Errors
    ///
    /// Returns an error if a choice answer has no options or any insert
    /// fails. Nothing is written in either case.
    pub fn add_form_result(&mut self, form_id: &str, result: &FormResult, actor: &str) -> Result<()> {
        self.store_form_result("add_form_result", form_id, result, actor, EventType::FormResultCreated)
    }

    /// Store a form result read from an export file.
    ///
    /// Same as [`SqliteStorage::add_form_result`], but audited as an import.
    ///
    /// # Errors
    ///
    /// Returns an error if a choice answer has no options or any insert fails.
    pub fn import_form_result(
        &mut self,
        form_id: &str,
        result: &FormResult,
        actor: &str,
    ) -> Result<()> {
        self.store_form_result(
            "import_form_result",
            form_id,
            result,
            actor,
            EventType::FormResultImported,
        )
    }

    fn store_form_result(
        &mut self,
        op: &str,
        form_id: &str,
        result: &FormResult,
        actor: &str,
        event_type: EventType,
    ) -> Result<()> {
        self.mutate(op, actor, |tx, ctx| {
            let id = insert_form_result(tx, form_id, result)?;
            ctx.record_comment("form_result", &id.to_string(), event_type, form_id);
            Ok(())
        })
    }

    /// Get all form results of a form, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_form_results_by_form_id(&self, form_id: &str) -> Result<Vec<FormResult>> {
        select_form_results_by_form_id(&self.conn, form_id)
    }

    /// List the distinct form ids that have at least one stored result.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_form_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT form_id FROM form_result ORDER BY form_id ASC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{Answer, ElementResult};
    use crate::storage::events::get_events;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeSet;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn row_count(storage: &SqliteStorage, table: &str) -> i64 {
        storage
            .conn()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_open_memory() {
        let storage = SqliteStorage::open_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_open_file_applies_schema() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("formstore.db");

        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            storage
                .add_form_result("f1", &FormResult::new(at(1)), "test-actor")
                .unwrap();
        }

        let storage = SqliteStorage::open_with_timeout(&path, Some(100)).unwrap();
        assert_eq!(storage.get_form_results_by_form_id("f1").unwrap().len(), 1);
    }

    #[test]
    fn test_text_answer_round_trip() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let result = FormResult::new(at(1_000)).with_answer(ElementResult::text("q1", "hello"));

        storage.add_form_result("f1", &result, "test-actor").unwrap();

        let loaded = storage.get_form_results_by_form_id("f1").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].element_results.len(), 1);
        let answer = loaded[0].answer("q1").unwrap();
        assert_eq!(answer.value(), Some("hello"));
        assert!(answer.option_ids().is_none());
    }

    #[test]
    fn test_choice_answer_round_trip() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let result = FormResult::new(at(1_000))
            .with_answer(ElementResult::choice("q2", ["o2", "o1"]).unwrap());

        storage.add_form_result("f1", &result, "test-actor").unwrap();

        let loaded = storage.get_form_results_by_form_id("f1").unwrap();
        let answer = loaded[0].answer("q2").unwrap();
        let expected: BTreeSet<String> = ["o1", "o2"].into_iter().map(String::from).collect();
        assert_eq!(answer.option_ids(), Some(&expected));
        assert!(answer.value().is_none());
    }

    #[test]
    fn test_results_most_recent_first() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let a = FormResult::new(at(1_000)).with_answer(ElementResult::text("q", "A"));
        let b = FormResult::new(at(2_000)).with_answer(ElementResult::text("q", "B"));

        storage.add_form_result("f1", &a, "test-actor").unwrap();
        storage.add_form_result("f1", &b, "test-actor").unwrap();

        let loaded = storage.get_form_results_by_form_id("f1").unwrap();
        let values: Vec<_> = loaded
            .iter()
            .map(|r| r.answer("q").unwrap().value().unwrap())
            .collect();
        assert_eq!(values, vec!["B", "A"]);
        assert_eq!(loaded[0].create_time, at(2_000));
    }

    #[test]
    fn test_empty_answer_set() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        storage
            .add_form_result("f1", &FormResult::new(at(1_000)), "test-actor")
            .unwrap();

        assert_eq!(row_count(&storage, "form_result"), 1);
        assert_eq!(row_count(&storage, "element_result"), 0);

        let loaded = storage.get_form_results_by_form_id("f1").unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].element_results.is_empty());
    }

    #[test]
    fn test_cross_form_isolation() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let result = FormResult::new(at(1_000)).with_answer(ElementResult::text("q1", "hello"));

        storage.add_form_result("f1", &result, "test-actor").unwrap();

        assert!(storage.get_form_results_by_form_id("f2").unwrap().is_empty());
        assert_eq!(storage.get_form_results_by_form_id("f1").unwrap().len(), 1);
    }

    #[test]
    fn test_idempotent_read() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let result = FormResult::new(at(1_000))
            .with_answer(ElementResult::text("q1", "hello"))
            .with_answer(ElementResult::choice("q2", ["o1", "o2"]).unwrap());
        storage.add_form_result("f1", &result, "test-actor").unwrap();
        storage
            .add_form_result("f1", &FormResult::new(at(2_000)), "test-actor")
            .unwrap();

        let first = storage.get_form_results_by_form_id("f1").unwrap();
        let second = storage.get_form_results_by_form_id("f1").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_option_set_rolls_back() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let mut result = FormResult::new(at(1_000));
        result.insert_answer(ElementResult {
            elem_key: "q".to_string(),
            answer: Answer::Choice(BTreeSet::new()),
        });

        let err = storage
            .add_form_result("f1", &result, "test-actor")
            .unwrap_err();
        assert!(matches!(err, Error::EmptyOptionSet { .. }));
        assert_eq!(row_count(&storage, "form_result"), 0);
        assert_eq!(row_count(&storage, "events"), 0);
    }

    #[test]
    fn test_failed_detail_insert_rolls_back() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .conn()
            .execute_batch(
                "CREATE TRIGGER reject_q2 BEFORE INSERT ON element_result
                 WHEN NEW.elem_key = 'q2'
                 BEGIN SELECT RAISE(ABORT, 'rejected q2'); END;",
            )
            .unwrap();

        // q1 is written before q2 fails
        let result = FormResult::new(at(1_000))
            .with_answer(ElementResult::text("q1", "hello"))
            .with_answer(ElementResult::choice("q2", ["o1"]).unwrap());

        let err = storage
            .add_form_result("f1", &result, "test-actor")
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(row_count(&storage, "form_result"), 0);
        assert_eq!(row_count(&storage, "element_result"), 0);
        assert_eq!(row_count(&storage, "events"), 0);
    }

    #[test]
    fn test_add_records_audit_event() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .add_form_result("f1", &FormResult::new(at(1_000)), "alice")
            .unwrap();

        let id: i64 = storage
            .conn()
            .query_row("SELECT id FROM form_result", [], |row| row.get(0))
            .unwrap();
        let events = get_events(storage.conn(), "form_result", &id.to_string(), None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::FormResultCreated);
        assert_eq!(events[0].actor, "alice");
        assert_eq!(events[0].comment.as_deref(), Some("f1"));
    }

    #[test]
    fn test_import_records_import_event() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .import_form_result("f1", &FormResult::new(at(1_000)), "bob")
            .unwrap();

        let id: i64 = storage
            .conn()
            .query_row("SELECT id FROM form_result", [], |row| row.get(0))
            .unwrap();
        let events = get_events(storage.conn(), "form_result", &id.to_string(), None).unwrap();
        assert_eq!(events[0].event_type, EventType::FormResultImported);
    }

    #[test]
    fn test_list_form_ids() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        for form_id in ["survey-b", "survey-a", "survey-b"] {
            storage
                .add_form_result(form_id, &FormResult::new(at(1)), "test-actor")
                .unwrap();
        }

        assert_eq!(storage.list_form_ids().unwrap(), vec!["survey-a", "survey-b"]);
    }
}
