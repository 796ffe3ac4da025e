//! Configuration management.
//!
//! This module resolves where the database lives and who is acting.
//!
//! # Architecture
//!
//! formstore keeps a single database per user at
//! `~/.formstore/data/formstore.db`. The path can be overridden per call
//! (`--db`), per environment (`FORMSTORE_DB`), or redirected to an isolated
//! test database (`FORMSTORE_TEST_DB=1`).

use std::path::{Path, PathBuf};

/// Environment variable holding an explicit database path.
pub const DB_ENV: &str = "FORMSTORE_DB";

/// Environment variable enabling the isolated test database.
pub const TEST_DB_ENV: &str = "FORMSTORE_TEST_DB";

/// Environment variable holding the actor name.
pub const ACTOR_ENV: &str = "FORMSTORE_ACTOR";

const DB_FILE_NAME: &str = "formstore.db";

/// Get the global formstore directory location (`~/.formstore/`).
#[must_use]
pub fn global_formstore_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".formstore"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `FORMSTORE_TEST_DB=1` (or any value other
/// than empty, `0` or `false`).
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var(TEST_DB_ENV)
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Get the test database path (`~/.formstore/test/formstore.db`).
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_formstore_dir().map(|dir| dir.join("test").join(DB_FILE_NAME))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `FORMSTORE_TEST_DB` environment variable → uses test database
/// 3. `FORMSTORE_DB` environment variable
/// 4. Global location: `~/.formstore/data/formstore.db`
///
/// # Returns
///
/// Returns the path to the database file, or `None` if no location found.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    if let Ok(db_path) = std::env::var(DB_ENV) {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_formstore_dir().map(|dir| dir.join("data").join(DB_FILE_NAME))
}

/// Get the default actor name.
///
/// Priority:
/// 1. `FORMSTORE_ACTOR` environment variable
/// 2. Git user name
/// 3. System username
/// 4. "unknown"
#[must_use]
pub fn default_actor() -> String {
    if let Ok(actor) = std::env::var(ACTOR_ENV) {
        if !actor.is_empty() {
            return actor;
        }
    }

    if let Ok(output) = std::process::Command::new("git")
        .args(["config", "user.name"])
        .output()
    {
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !name.is_empty() {
                return name;
            }
        }
    }

    if let Ok(user) = std::env::var("USER") {
        return user;
    }

    "unknown".to_string()
}
