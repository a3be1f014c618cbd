//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{AnalyzedRecord, FilterSet, Properties, RecordId};

/// Trait for storing and retrieving analyzed strings
///
/// Implemented by the infrastructure layer (lexis-store)
pub trait RecordStore {
    /// Error type for store operations
    type Error;

    /// Get a record by its content hash
    fn get_by_id(&self, id: &RecordId) -> Result<Option<AnalyzedRecord>, Self::Error>;

    /// Get a record by its original value
    fn get_by_value(&self, value: &str) -> Result<Option<AnalyzedRecord>, Self::Error>;

    /// Persist a new record
    ///
    /// Must fail when either `id` or `value` is already stored. The
    /// uniqueness check and the insert must be atomic.
    fn create(
        &mut self,
        id: &RecordId,
        value: &str,
        properties: Properties,
    ) -> Result<AnalyzedRecord, Self::Error>;

    /// List records matching every present filter, in creation order
    fn list_filtered(&self, filters: &FilterSet) -> Result<Vec<AnalyzedRecord>, Self::Error>;

    /// Delete a record by value, returning false if it was absent
    fn delete(&mut self, value: &str) -> Result<bool, Self::Error>;

    /// Number of stored records
    fn count(&self) -> Result<usize, Self::Error>;
}
