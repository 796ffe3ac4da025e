//! Data models for formstore.
//!
//! This module contains the submission model:
//! - FormResult (one submission to a form)
//! - ElementResult (the answer for a single form element)
//! - Answer (free text or a set of selected option ids)

pub mod form_result;

pub use form_result::{Answer, ElementResult, FormResult};
