//! Command-line input parsing for answers and timestamps.
//!
//! Answers arrive as `KEY=VALUE` (free text) or `KEY=OPT[,OPT...]`
//! (choice). Malformed input is rejected with an
//! [`Error::InvalidArgument`] whose message names the offending flag, so
//! [`Error::hint`] can point at the expected syntax.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{ElementResult, FormResult};

/// Split `KEY=REST` on the first `=`, trimming the key.
fn split_key<'a>(input: &'a str, flag: &str) -> Result<(&'a str, &'a str)> {
    let (key, rest) = input
        .split_once('=')
        .ok_or_else(|| Error::InvalidArgument(format!("{flag} expects KEY=..., got '{input}'")))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "{flag} has an empty element key in '{input}'"
        )));
    }

    Ok((key, rest))
}

/// Parse a `--text KEY=VALUE` argument.
///
/// Everything after the first `=` is the value, kept verbatim (it may be
/// empty or contain further `=` and `,`).
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if there is no `=` or the key is empty.
pub fn parse_text_arg(input: &str) -> Result<ElementResult> {
    let (key, value) = split_key(input, "--text")?;
    Ok(ElementResult::text(key, value))
}

/// Parse a `--choice KEY=OPT[,OPT...]` argument.
///
/// Option ids are trimmed and de-duplicated; blank entries are ignored.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if there is no `=` or the key is
/// empty, and [`Error::EmptyOptionSet`] if no option id remains.
pub fn parse_choice_arg(input: &str) -> Result<ElementResult> {
    let (key, opts) = split_key(input, "--choice")?;
    let options = opts.split(',').map(str::trim).filter(|o| !o.is_empty());
    ElementResult::choice(key, options)
}

/// Parse an RFC 3339 timestamp into UTC.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the input is not RFC 3339.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidArgument(format!("invalid timestamp '{input}': {e}")))
}

/// Build a form result from raw `--text` and `--choice` arguments.
///
/// # Errors
///
/// Returns an error if any argument is malformed, or if the same element
/// key is answered twice.
pub fn build_form_result(
    texts: &[String],
    choices: &[String],
    at: Option<&str>,
) -> Result<FormResult> {
    let create_time = match at {
        Some(ts) => parse_timestamp(ts)?,
        None => Utc::now(),
    };

    let mut result = FormResult::new(create_time);
    let parsed = texts
        .iter()
        .map(|t| parse_text_arg(t))
        .chain(choices.iter().map(|c| parse_choice_arg(c)));

    for answer in parsed {
        let answer = answer?;
        let key = answer.elem_key.clone();
        if result.insert_answer(answer).is_some() {
            return Err(Error::InvalidArgument(format!(
                "element '{key}' is answered more than once"
            )));
        }
    }

    Ok(result)
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Find known form ids close to a searched one.
///
/// Returns up to `max` suggestions with edit distance ≤ 3, sorted by
/// distance then alphabetically.
pub fn find_similar_ids(searched: &str, existing: &[String], max: usize) -> Vec<String> {
    let mut candidates: Vec<(usize, &str)> = existing
        .iter()
        .map(|id| (levenshtein_distance(searched, id), id.as_str()))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    candidates
        .into_iter()
        .take(max)
        .map(|(_, id)| id.to_string())
        .collect()
}
