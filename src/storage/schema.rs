//! Database schema definitions.
//!
//! Two tables hold the submissions: `form_result` (one row per submission)
//! and `element_result` (one row per text answer, one row per selected
//! option of a choice answer).

use rusqlite::{Connection, Result};

/// Current schema version, recorded in `schema_migrations`.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the formstore database.
///
/// Note: `create_time` is stored as INTEGER (Unix milliseconds).
pub const SCHEMA_SQL: &str = r"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Core Tables
-- ====================

-- Form results: one row per submission
CREATE TABLE IF NOT EXISTS form_result (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    create_time INTEGER NOT NULL,
    form_id TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_form_result_form_created ON form_result(form_id, create_time DESC);

-- Element results: text answers use `value`, choice answers use one row per `option_id`
CREATE TABLE IF NOT EXISTS element_result (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    form_result_id INTEGER NOT NULL,
    elem_key TEXT NOT NULL,
    value TEXT,
    option_id TEXT,
    CHECK ((value IS NULL) <> (option_id IS NULL)),
    FOREIGN KEY (form_result_id) REFERENCES form_result(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_element_result_form_result ON element_result(form_result_id);

-- ====================
-- Audit
-- ====================

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    actor TEXT NOT NULL,
    comment TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);
CREATE INDEX IF NOT EXISTS idx_events_created ON events(created_at DESC);
";

/// Apply pragmas and the schema, and record the schema version.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}
