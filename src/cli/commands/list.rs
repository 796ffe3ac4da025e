//! List commands: form results of one form, and the forms with results.

use crate::error::Result;
use crate::model::{Answer, FormResult};
use crate::validate::find_similar_ids;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::open_storage;

#[derive(Serialize)]
struct ListOutput<'a> {
    form_id: &'a str,
    count: usize,
    form_results: &'a [FormResult],
}

#[derive(Serialize)]
struct FormsOutput<'a> {
    count: usize,
    forms: &'a [String],
}

/// Execute `list <FORM_ID>`.
///
/// # Errors
///
/// Returns an error if the database is not initialized or the query fails.
pub fn execute(form_id: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;
    let results = storage.get_form_results_by_form_id(form_id)?;

    if crate::is_csv() {
        print_csv(&results);
    } else if json {
        let output = ListOutput {
            form_id,
            count: results.len(),
            form_results: &results,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if results.is_empty() {
        println!("No form results found for {form_id}.");
        let suggestions = find_similar_ids(form_id, &storage.list_form_ids()?, 3);
        if !suggestions.is_empty() {
            println!("Did you mean: {}?", suggestions.join(", "));
        }
    } else {
        print_table(form_id, &results);
    }

    Ok(())
}

/// Execute `forms`.
///
/// # Errors
///
/// Returns an error if the database is not initialized or the query fails.
pub fn execute_forms(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;
    let forms = storage.list_form_ids()?;

    if crate::is_csv() {
        println!("form_id");
        for form_id in &forms {
            println!("{}", crate::csv_escape(form_id));
        }
    } else if json {
        let output = FormsOutput {
            count: forms.len(),
            forms: &forms,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if forms.is_empty() {
        println!("No form results stored yet.");
    } else {
        for form_id in &forms {
            println!("{form_id}");
        }
    }

    Ok(())
}

/// One line per answer; choice options are joined with `;`. A form result
/// without answers still gets one line with the answer columns empty.
fn print_csv(results: &[FormResult]) {
    println!("form_result_id,create_time,elem_key,kind,value");
    for result in results {
        let id = result.id.map(|id| id.to_string()).unwrap_or_default();
        let created = result.create_time.to_rfc3339();
        if result.element_results.is_empty() {
            println!("{id},{created},,,");
            continue;
        }
        for answer in result.element_results.values() {
            let (kind, value) = match &answer.answer {
                Answer::Text(text) => ("text", text.clone()),
                Answer::Choice(opts) => ("choice", opts.iter().cloned().collect::<Vec<_>>().join(";")),
            };
            println!(
                "{id},{created},{},{kind},{}",
                crate::csv_escape(&answer.elem_key),
                crate::csv_escape(&value)
            );
        }
    }
}

fn print_table(form_id: &str, results: &[FormResult]) {
    println!(
        "{} ({} found):",
        format!("Form results for {form_id}").bold(),
        results.len()
    );

    for result in results {
        println!();
        let id = result.id.map(|id| format!("#{id}")).unwrap_or_default();
        println!(
            "{} {}",
            id.cyan(),
            result.create_time.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string().dimmed()
        );

        if result.element_results.is_empty() {
            println!("  {}", "(no answers)".dimmed());
            continue;
        }

        for answer in result.element_results.values() {
            match &answer.answer {
                Answer::Text(text) => println!("  {}: {text}", answer.elem_key.bold()),
                Answer::Choice(opts) => {
                    let opts: Vec<&str> = opts.iter().map(String::as_str).collect();
                    println!(
                        "  {}: {}",
                        answer.elem_key.bold(),
                        format!("[{}]", opts.join(", ")).yellow()
                    );
                }
            }
        }
    }
}
