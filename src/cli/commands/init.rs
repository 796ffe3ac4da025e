//! Initialize the formstore database.
//!
//! The database lives at `~/.formstore/data/formstore.db` unless `--db`,
//! `FORMSTORE_DB` or `FORMSTORE_TEST_DB` point elsewhere. Init creates the
//! parent directory and applies the schema; every other command refuses to
//! run until this has happened.

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use crate::storage::schema::CURRENT_SCHEMA_VERSION;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    schema_version: i32,
    reinitialized: bool,
}

/// Execute the init command.
///
/// With `force`, an existing database (and its WAL side files) is removed
/// and recreated empty.
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if the database exists and `force`
/// is not set, or an error if the directory or database cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(|p| p.as_path()))
        .ok_or_else(|| Error::Config("Could not determine the database location".to_string()))?;

    let existed = db_path.exists();
    if existed && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    if existed {
        remove_database(&db_path)?;
    }

    SqliteStorage::open(&db_path)?;
    info!(path = %db_path.display(), "Initialized database");

    if crate::is_silent() {
        println!("{}", db_path.display());
        return Ok(());
    }

    if json {
        let output = InitOutput {
            database: db_path,
            schema_version: CURRENT_SCHEMA_VERSION,
            reinitialized: existed,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        if existed {
            println!("Reinitialized formstore database");
        } else {
            println!("Initialized formstore database");
        }
        println!("  Database: {}", db_path.display());
        println!();
        println!("Next: formstore submit <FORM_ID> --text KEY=VALUE");
    }

    Ok(())
}

fn remove_database(db_path: &Path) -> Result<()> {
    fs::remove_file(db_path)?;

    for suffix in ["-wal", "-shm"] {
        let mut side = db_path.as_os_str().to_owned();
        side.push(suffix);
        let side = PathBuf::from(side);
        if side.exists() {
            fs::remove_file(side)?;
        }
    }

    Ok(())
}
