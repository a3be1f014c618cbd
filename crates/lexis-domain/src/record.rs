//! Record module - an analyzed string as the store keeps it

use crate::analysis::{content_hash, Properties};
use chrono::{DateTime, Utc};
use std::fmt;

/// Content-addressed identifier for a record
///
/// The id is the lowercase hex SHA-256 of the record's value, so it can be
/// derived from the value alone and two equal values always share an id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// Derive the id of a string value
    ///
    /// # Examples
    ///
    /// ```
    /// use lexis_domain::RecordId;
    ///
    /// let id = RecordId::for_value("hello");
    /// assert_eq!(id.as_str().len(), 64);
    /// assert_eq!(id, RecordId::for_value("hello"));
    /// ```
    pub fn for_value(value: &str) -> Self {
        Self(content_hash(value))
    }

    /// Wrap an already computed hash
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Get the hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An analyzed string record
///
/// Records are immutable once created; only `updated_at` is bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedRecord {
    /// Content hash of `value`
    pub id: RecordId,

    /// The original string
    pub value: String,

    /// Computed properties
    pub properties: Properties,

    /// When this record was created
    pub created_at: DateTime<Utc>,

    /// When this record was last touched
    pub updated_at: DateTime<Utc>,
}

impl AnalyzedRecord {
    /// Create a new record, taking its id from the properties' hash
    pub fn new(value: String, properties: Properties, created_at: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::from_hash(properties.hash.clone()),
            value,
            properties,
            created_at,
            updated_at: created_at,
        }
    }
}
