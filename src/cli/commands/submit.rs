//! Submit command: store one form result.

use crate::cli::SubmitArgs;
use crate::config::default_actor;
use crate::error::Result;
use crate::model::FormResult;
use crate::validate::build_form_result;
use serde::Serialize;
use std::path::PathBuf;

use super::open_storage;

#[derive(Serialize)]
struct SubmitOutput<'a> {
    form_id: &'a str,
    dry_run: bool,
    answers: usize,
    rows: usize,
    #[serde(flatten)]
    form_result: &'a FormResult,
}

/// Execute the submit command.
///
/// # Errors
///
/// Returns an error if an answer is malformed, a choice has no options,
/// the database is not initialized, or the write fails.
pub fn execute(
    args: &SubmitArgs,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let result = build_form_result(&args.text, &args.choice, args.at.as_deref())?;
    let dry_run = crate::is_dry_run();

    if !dry_run {
        let mut storage = open_storage(db_path)?;
        let actor = actor.map(ToString::to_string).unwrap_or_else(default_actor);
        storage.add_form_result(&args.form_id, &result, &actor)?;
    }

    if crate::is_silent() {
        println!("{}", result.create_time.to_rfc3339());
        return Ok(());
    }

    if json {
        let output = SubmitOutput {
            form_id: &args.form_id,
            dry_run,
            answers: result.element_results.len(),
            rows: result.detail_row_count(),
            form_result: &result,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        let verb = if dry_run { "Would store" } else { "Stored" };
        println!(
            "{verb} form result for {} ({} answers, {} rows)",
            args.form_id,
            result.element_results.len(),
            result.detail_row_count()
        );
        println!("  Created: {}", result.create_time.to_rfc3339());
    }

    Ok(())
}
