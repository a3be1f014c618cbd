//! Lexis Domain Layer
//!
//! This crate contains the core logic and domain model for Lexis, the string
//! analyzer service. Everything here is synchronous and side-effect free;
//! persistence and HTTP live in other crates.
//!
//! ## Key Concepts
//!
//! - **Properties**: Deterministic facts computed from a string (hash, length,
//!   palindrome flag, word count, character frequency)
//! - **AnalyzedRecord**: A persisted string plus its properties, identified by
//!   the SHA-256 of its content
//! - **FilterSet**: Typed, conjunctive predicates over records
//! - **Query Interpreter**: Heuristic translation of plain English phrases
//!   into a FilterSet
//!
//! ## Architecture
//!
//! - Pure logic only, no I/O
//! - Storage is reached through the [`traits::RecordStore`] trait
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod filter;
pub mod query;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use analysis::{analyze, Properties};
pub use filter::{FilterError, FilterSet};
pub use query::{interpret, parse, Interpretation, QueryError};
pub use record::{AnalyzedRecord, RecordId};
pub use traits::RecordStore;
