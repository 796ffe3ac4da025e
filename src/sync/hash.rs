//! Content hashing for sync operations.
//!
//! A record's hash covers the form id and the form result without its
//! local id, so the same submission hashes identically in any database.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::FormResult;

/// Compute a SHA256 hash of a serializable value.
///
/// The value is first serialized to JSON, then hashed.
///
/// # Panics
///
/// Panics if the value cannot be serialized to JSON. This should never happen
/// for our data types which are all serializable.
#[must_use]
pub fn content_hash<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_string(value).expect("serialization should not fail");
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash a form result as it appears in an export.
///
/// The store-assigned id is ignored.
#[must_use]
pub fn form_result_hash(form_id: &str, result: &FormResult) -> String {
    #[derive(Serialize)]
    struct Hashed<'a> {
        form_id: &'a str,
        create_time: i64,
        element_results: Vec<&'a crate::model::ElementResult>,
    }

    content_hash(&Hashed {
        form_id,
        create_time: result.create_time.timestamp_millis(),
        element_results: result.element_results.values().collect(),
    })
}
