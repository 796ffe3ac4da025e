//! Command implementations.

pub mod completions;
pub mod init;
pub mod list;
pub mod submit;
pub mod sync;
pub mod version;

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use std::path::PathBuf;

/// Open the database, failing with [`Error::NotInitialized`] when it does not exist yet.
fn open_storage(db_path: Option<&PathBuf>) -> Result<SqliteStorage> {
    let db_path = resolve_db_path(db_path.map(|p| p.as_path())).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    SqliteStorage::open(&db_path)
}
