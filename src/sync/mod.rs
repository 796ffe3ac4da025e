//! JSONL sync operations.
//!
//! This module moves form results between databases via JSONL files:
//!
//! - **Export**: form results of one or all forms → one JSONL file
//! - **Import**: JSONL file → SQLite, skipping results already present
//! - **Hashing**: SHA256 content hashing for integrity and de-duplication
//!
//! # File Format
//!
//! Each line holds one record with a `type` tag:
//! ```json
//! {"type":"form_result","form_id":"survey","create_time":"2025-01-20T10:00:00Z","element_results":[{"elem_key":"q1","text":"hello"}],"content_hash":"abc","exported_at":"2025-01-20T10:05:00Z"}
//! ```

mod export;
mod file;
mod hash;
mod import;
mod types;

pub use export::{default_export_path, Exporter};
pub use file::{atomic_write, read_jsonl, write_jsonl};
pub use hash::{content_hash, form_result_hash};
pub use import::Importer;
pub use types::{
    ExportStats, FormResultRecord, ImportStats, SyncError, SyncRecord, SyncResult,
};
