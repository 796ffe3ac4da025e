//! Form result persistence.
//!
//! Maps [`FormResult`] onto the `form_result` / `element_result` tables and
//! back. A text answer occupies one `element_result` row; a choice answer
//! occupies one row per selected option. On read, the rows of each element
//! key are grouped again and the answer shape is decided from the raw rows.
//!
//! The functions here take a plain `&Connection`, so they run the same way
//! on a connection or inside a transaction.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Answer, ElementResult, FormResult};

const INSERT_FORM_RESULT: &str =
    "INSERT INTO form_result (create_time, form_id) VALUES (?1, ?2) RETURNING id";

const INSERT_ELEMENT_RESULT: &str =
    "INSERT INTO element_result (form_result_id, elem_key, value, option_id) VALUES (?1, ?2, ?3, ?4)";

const SELECT_FORM_RESULTS_BY_FORM_ID: &str = "SELECT id, create_time FROM form_result
     WHERE form_id = ?1
     ORDER BY create_time DESC, id DESC";

const SELECT_ELEMENT_ROWS_BY_FORM_RESULT_ID: &str = "SELECT elem_key, value, option_id
     FROM element_result
     WHERE form_result_id = ?1
     ORDER BY id ASC";

/// Insert a form result and all of its answers.
///
/// The generated id is returned by the same statement that inserts the
/// `form_result` row. Every answer is checked before the first statement
/// runs, so a rejected form result writes nothing.
///
/// # Errors
///
/// Returns [`Error::EmptyOptionSet`] for a choice answer without options,
/// or the database error of the first failing statement.
pub fn insert_form_result(conn: &Connection, form_id: &str, result: &FormResult) -> Result<i64> {
    for answer in result.element_results.values() {
        if answer.option_ids().is_some_and(BTreeSet::is_empty) {
            return Err(Error::EmptyOptionSet {
                elem_key: answer.elem_key.clone(),
            });
        }
    }

    let id: i64 = conn.query_row(
        INSERT_FORM_RESULT,
        rusqlite::params![result.create_time.timestamp_millis(), form_id],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare_cached(INSERT_ELEMENT_RESULT)?;
    for answer in result.element_results.values() {
        match &answer.answer {
            Answer::Text(value) => {
                stmt.execute(rusqlite::params![id, answer.elem_key, value, None::<&str>])?;
            }
            Answer::Choice(option_ids) => {
                for option_id in option_ids {
                    stmt.execute(rusqlite::params![
                        id,
                        answer.elem_key,
                        None::<&str>,
                        option_id
                    ])?;
                }
            }
        }
    }

    debug!(
        form_id,
        form_result_id = id,
        rows = result.detail_row_count(),
        "Inserted form result"
    );

    Ok(id)
}

/// Load every form result of a form, newest first, with its answers.
///
/// Results sharing a creation time come back in reverse insertion order.
///
/// # Errors
///
/// Returns an error if a query fails or a stored timestamp is out of range.
pub fn select_form_results_by_form_id(conn: &Connection, form_id: &str) -> Result<Vec<FormResult>> {
    let mut stmt = conn.prepare(SELECT_FORM_RESULTS_BY_FORM_ID)?;
    let mut results = stmt
        .query_map([form_id], map_form_result_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut detail_stmt = conn.prepare_cached(SELECT_ELEMENT_ROWS_BY_FORM_RESULT_ID)?;
    for result in &mut results {
        let Some(id) = result.id else { continue };
        let rows = detail_stmt
            .query_map([id], map_detail_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        result.element_results = assemble_element_results(rows);
    }

    debug!(form_id, count = results.len(), "Loaded form results");

    Ok(results)
}

// ===========
// Row mapping
// ===========

/// Map a `(id, create_time)` row to a form result without answers.
///
/// # Errors
///
/// Returns an error if a column is missing or the timestamp is out of range.
pub fn map_form_result_row(row: &Row<'_>) -> rusqlite::Result<FormResult> {
    let id: i64 = row.get(0)?;
    let create_time = millis_to_datetime(row.get(1)?, 1)?;

    let mut result = FormResult::new(create_time);
    result.id = Some(id);
    Ok(result)
}

/// One raw `element_result` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub elem_key: String,
    pub value: Option<String>,
    pub option_id: Option<String>,
}

/// Map an `(elem_key, value, option_id)` row.
///
/// # Errors
///
/// Returns an error if a column is missing or has the wrong type.
pub fn map_detail_row(row: &Row<'_>) -> rusqlite::Result<DetailRow> {
    Ok(DetailRow {
        elem_key: row.get(0)?,
        value: row.get(1)?,
        option_id: row.get(2)?,
    })
}

/// The rows stored under one element key of one form result.
#[derive(Debug, Clone, Default)]
pub struct DetailGroup {
    elem_key: String,
    values: Vec<String>,
    option_ids: BTreeSet<String>,
    has_choice: bool,
}

impl DetailGroup {
    /// Start an empty group for an element key.
    #[must_use]
    pub fn new(elem_key: String) -> Self {
        Self {
            elem_key,
            ..Self::default()
        }
    }

    /// Add a row to the group.
    pub fn push(&mut self, row: DetailRow) {
        if let Some(option_id) = row.option_id {
            self.has_choice = true;
            self.option_ids.insert(option_id);
        } else if let Some(value) = row.value {
            self.values.push(value);
        }
    }

    /// Turn the group into an answer.
    ///
    /// Any option row makes the group a choice answer, and text rows in the
    /// same group are then dropped. A text group with several rows joins
    /// the values with `,`.
    #[must_use]
    pub fn into_element_result(self) -> ElementResult {
        let answer = if self.has_choice {
            Answer::Choice(self.option_ids)
        } else {
            Answer::Text(self.values.join(","))
        };

        ElementResult {
            elem_key: self.elem_key,
            answer,
        }
    }
}

/// Group raw rows by element key and rebuild one answer per key.
#[must_use]
pub fn assemble_element_results<I>(rows: I) -> BTreeMap<String, ElementResult>
where
    I: IntoIterator<Item = DetailRow>,
{
    let mut groups: BTreeMap<String, DetailGroup> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.elem_key.clone())
            .or_insert_with_key(|key| DetailGroup::new(key.clone()))
            .push(row);
    }

    groups
        .into_iter()
        .map(|(key, group)| (key, group.into_element_result()))
        .collect()
}

fn millis_to_datetime(millis: i64, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(column, millis))
}
