//! Filter sets - typed, conjunctive predicates over analyzed records

use crate::record::AnalyzedRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a filter set is internally inconsistent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Lower length bound exceeds the upper bound
    #[error("minLength ({min}) cannot be greater than maxLength ({max})")]
    ConflictingLengths {
        /// Requested minimum length
        min: usize,
        /// Requested maximum length
        max: usize,
    },

    /// containsCharacter was not exactly one character
    #[error("containsCharacter must be a single character, got {0:?}")]
    NotSingleCharacter(String),
}

/// A bundle of optional filters, applied as a logical AND
///
/// Field order is the serialization order. Absent filters are omitted from
/// JSON output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    /// Exact match on the palindrome flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_palindrome: Option<bool>,

    /// Inclusive lower bound on length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    /// Inclusive upper bound on length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Exact match on word count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,

    /// Case-insensitive containment of a single character
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains_character: Option<char>,
}

impl FilterSet {
    /// True when no filter is present
    pub fn is_empty(&self) -> bool {
        self.is_palindrome.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.word_count.is_none()
            && self.contains_character.is_none()
    }

    /// Check that the length bounds do not contradict each other
    pub fn check_lengths(&self) -> Result<(), FilterError> {
        match (self.min_length, self.max_length) {
            (Some(min), Some(max)) if min > max => {
                Err(FilterError::ConflictingLengths { min, max })
            }
            _ => Ok(()),
        }
    }

    /// Set `contains_character` from raw text, lower-casing it
    ///
    /// Rejects anything that is not exactly one character.
    pub fn set_contains_character(&mut self, raw: &str) -> Result<(), FilterError> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                self.contains_character = Some(lowercase_char(c));
                Ok(())
            }
            _ => Err(FilterError::NotSingleCharacter(raw.to_string())),
        }
    }

    /// Evaluate every present filter against a record
    ///
    /// Stores may push some predicates down into their query language, but
    /// the result must agree with this function.
    pub fn matches(&self, record: &AnalyzedRecord) -> bool {
        let props = &record.properties;

        self.is_palindrome.map_or(true, |p| props.is_palindrome == p)
            && self.min_length.map_or(true, |min| props.length >= min)
            && self.max_length.map_or(true, |max| props.length <= max)
            && self.word_count.map_or(true, |n| props.word_count == n)
            && self
                .contains_character
                .map_or(true, |c| contains_ignoring_case(&record.value, c))
    }
}

/// Lower-case a single character, keeping it when folding would expand it
pub fn lowercase_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Case-insensitive containment of `needle` in `haystack`
pub fn contains_ignoring_case(haystack: &str, needle: char) -> bool {
    let needle = lowercase_char(needle);
    haystack.chars().any(|c| lowercase_char(c) == needle)
}
