//! Sync command implementations (JSONL export/import).

use crate::cli::ExportArgs;
use crate::config::default_actor;
use crate::error::Result;
use crate::sync::{default_export_path, Exporter, Importer};
use std::path::{Path, PathBuf};

use super::open_storage;

/// Export file used by `export --all` when no `--output` is given.
const ALL_FORMS_FILE: &str = "formstore.jsonl";

/// Execute the export command.
///
/// # Errors
///
/// Returns an error if the database is not initialized, there is nothing
/// to export, or the file cannot be written.
pub fn export(args: &ExportArgs, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;
    let exporter = Exporter::new(&storage);

    let (path, stats) = match (&args.form_id, args.all) {
        (Some(form_id), false) => {
            let path = args
                .output
                .clone()
                .unwrap_or_else(|| default_export_path(form_id));
            let stats = exporter.export_form(form_id, &path)?;
            (path, stats)
        }
        _ => {
            let path = args
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(ALL_FORMS_FILE));
            let stats = exporter.export_all(&path)?;
            (path, stats)
        }
    };

    if crate::is_silent() {
        println!("{}", path.display());
        return Ok(());
    }

    if json {
        let output = serde_json::json!({
            "success": true,
            "path": path.display().to_string(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Export complete");
        println!();
        println!("  Forms:        {}", stats.forms);
        println!("  Form results: {}", stats.form_results);
        println!("  Location:     {}", path.display());
    }

    Ok(())
}

/// Execute the import command.
///
/// # Errors
///
/// Returns an error if the database is not initialized, the file is
/// missing or malformed, or a write fails.
pub fn import(
    file: &Path,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut storage = open_storage(db_path)?;
    let actor = actor.map(ToString::to_string).unwrap_or_else(default_actor);

    let stats = Importer::new(&mut storage, &actor).import(file)?;

    if crate::is_silent() {
        println!("{}", stats.created);
        return Ok(());
    }

    if json {
        let output = serde_json::json!({
            "success": true,
            "path": file.display().to_string(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Import complete: {}", file.display());
        println!();
        println!("  Created: {}", stats.created);
        println!("  Skipped: {} (already stored)", stats.skipped);
        if stats.invalid > 0 {
            println!("  Invalid: {} (see warnings)", stats.invalid);
        }
        println!();
        println!("  Total: {} records", stats.total());
    }

    Ok(())
}
