//! Form result model for formstore.
//!
//! A form result is one submission to a form. It holds the answers given
//! for each element of the form, keyed by element key.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The answer given for a single form element.
///
/// Text and choice answers are mutually exclusive: a choice answer carries
/// the selected option ids and no text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    /// Free-text input.
    Text(String),
    /// Selected option ids of a single- or multi-select element.
    Choice(BTreeSet<String>),
}

/// An element result: the answer for one element of a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementResult {
    /// Key of the form element this answer belongs to
    pub elem_key: String,

    /// The answer itself
    #[serde(flatten)]
    pub answer: Answer,
}

impl ElementResult {
    /// Create a free-text answer.
    pub fn text(elem_key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            elem_key: elem_key.into(),
            answer: Answer::Text(value.into()),
        }
    }

    /// Create a choice answer from the selected option ids.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyOptionSet`] if no option id is given. An empty
    /// selection would persist zero rows and could never be read back.
    pub fn choice<I, S>(elem_key: impl Into<String>, option_ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let elem_key = elem_key.into();
        let option_ids: BTreeSet<String> = option_ids.into_iter().map(Into::into).collect();
        if option_ids.is_empty() {
            return Err(Error::EmptyOptionSet { elem_key });
        }

        Ok(Self {
            elem_key,
            answer: Answer::Choice(option_ids),
        })
    }

    /// Text value, if this is a free-text answer.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match &self.answer {
            Answer::Text(value) => Some(value),
            Answer::Choice(_) => None,
        }
    }

    /// Selected option ids, if this is a choice answer.
    #[must_use]
    pub fn option_ids(&self) -> Option<&BTreeSet<String>> {
        match &self.answer {
            Answer::Text(_) => None,
            Answer::Choice(ids) => Some(ids),
        }
    }

    /// Whether this answer is a choice answer.
    #[must_use]
    pub fn is_choice(&self) -> bool {
        matches!(self.answer, Answer::Choice(_))
    }

    /// Number of `element_result` rows this answer occupies in storage.
    #[must_use]
    pub fn row_count(&self) -> usize {
        match &self.answer {
            Answer::Text(_) => 1,
            Answer::Choice(ids) => ids.len(),
        }
    }
}

/// A form result (one submission to a form).
///
/// The owning form is not part of the model: it is given when the result is
/// stored and used to look results up again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormResult {
    /// Store-assigned identifier, `None` until persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Creation timestamp (millisecond precision)
    pub create_time: DateTime<Utc>,

    /// Answers keyed by element key
    #[serde(default, with = "element_results_as_list")]
    pub element_results: BTreeMap<String, ElementResult>,
}

impl FormResult {
    /// Create an empty, unsaved form result.
    ///
    /// The timestamp is truncated to milliseconds, the precision it is
    /// stored with.
    #[must_use]
    pub fn new(create_time: DateTime<Utc>) -> Self {
        Self {
            id: None,
            create_time: create_time.trunc_subsecs(3),
            element_results: BTreeMap::new(),
        }
    }

    /// Create an empty, unsaved form result stamped with the current time.
    #[must_use]
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// Add an answer, replacing and returning any answer with the same key.
    pub fn insert_answer(&mut self, answer: ElementResult) -> Option<ElementResult> {
        self.element_results.insert(answer.elem_key.clone(), answer)
    }

    /// Builder-style variant of [`FormResult::insert_answer`].
    #[must_use]
    pub fn with_answer(mut self, answer: ElementResult) -> Self {
        self.insert_answer(answer);
        self
    }

    /// Look up the answer for an element key.
    #[must_use]
    pub fn answer(&self, elem_key: &str) -> Option<&ElementResult> {
        self.element_results.get(elem_key)
    }

    /// Number of `element_result` rows this submission occupies in storage.
    #[must_use]
    pub fn detail_row_count(&self) -> usize {
        self.element_results.values().map(ElementResult::row_count).sum()
    }
}

/// Serialize the answer map as a plain list; the element key already lives
/// inside each entry.
mod element_results_as_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::ElementResult;

    pub fn serialize<S>(
        map: &BTreeMap<String, ElementResult>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, ElementResult>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let list = Vec::<ElementResult>::deserialize(deserializer)?;
        Ok(list
            .into_iter()
            .map(|answer| (answer.elem_key.clone(), answer))
            .collect())
    }
}
