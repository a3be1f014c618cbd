//! Lexis Storage Layer
//!
//! Implements the RecordStore trait on top of SQLite.
//!
//! # Architecture
//!
//! - One `strings` table, keyed by the SHA-256 of the value
//! - UNIQUE constraints on both `id` and `value`; creates run in a transaction
//! - Character frequency maps are stored as JSON text
//!
//! # Examples
//!
//! ```no_run
//! use lexis_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for record operations
//! ```

#![warn(missing_docs)]

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use lexis_domain::{AnalyzedRecord, FilterSet, Properties, RecordId, RecordStore};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A record with the same id or value already exists
    #[error("String already exists in the system")]
    Duplicate,

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Character frequency map could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

const SELECT_COLUMNS: &str = "SELECT id, value, length, is_palindrome, unique_characters, \
     word_count, character_frequency, created_at, updated_at FROM strings";

/// SQLite-based implementation of RecordStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share one store across tasks by
/// wrapping it in a mutex, or give each thread its own SqliteStore.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lexis_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("strings.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        info!("Opened string store at {}", path.display());
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn timestamp_to_str(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn str_to_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
        DateTime::parse_from_rfc3339(s)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| StoreError::InvalidData(format!("Bad timestamp {:?}: {}", s, e)))
    }

    fn frequency_to_json(frequency: &BTreeMap<char, usize>) -> Result<String, StoreError> {
        Ok(serde_json::to_string(frequency)?)
    }

    fn json_to_frequency(json: &str) -> Result<BTreeMap<char, usize>, StoreError> {
        let raw: BTreeMap<String, usize> = serde_json::from_str(json)?;
        raw.into_iter()
            .map(|(key, count)| {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok((c, count)),
                    _ => Err(StoreError::InvalidData(format!(
                        "Frequency key is not a single character: {:?}",
                        key
                    ))),
                }
            })
            .collect()
    }

    fn to_sql_error(column: usize, e: StoreError) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    }

    /// Map a row selected with SELECT_COLUMNS to a record
    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<AnalyzedRecord> {
        let id: String = row.get(0)?;
        let frequency_json: String = row.get(6)?;
        let created_at: String = row.get(7)?;
        let updated_at: String = row.get(8)?;

        let character_frequency =
            Self::json_to_frequency(&frequency_json).map_err(|e| Self::to_sql_error(6, e))?;

        Ok(AnalyzedRecord {
            id: RecordId::from_hash(id.clone()),
            value: row.get(1)?,
            properties: Properties {
                length: row.get::<_, i64>(2)? as usize,
                is_palindrome: row.get(3)?,
                unique_character_count: row.get::<_, i64>(4)? as usize,
                word_count: row.get::<_, i64>(5)? as usize,
                hash: id,
                character_frequency,
            },
            created_at: Self::str_to_timestamp(&created_at).map_err(|e| Self::to_sql_error(7, e))?,
            updated_at: Self::str_to_timestamp(&updated_at).map_err(|e| Self::to_sql_error(8, e))?,
        })
    }

    /// Unique constraint violations mean a concurrent create won the race
    fn map_insert_error(e: rusqlite::Error) -> StoreError {
        match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                StoreError::Duplicate
            }
            other => StoreError::Database(other),
        }
    }

    fn get_one(&self, column: &str, key: &str) -> Result<Option<AnalyzedRecord>, StoreError> {
        let sql = format!("{} WHERE {} = ?1", SELECT_COLUMNS, column);
        let record = self
            .conn
            .query_row(&sql, params![key], Self::row_to_record)
            .optional()?;
        Ok(record)
    }
}

impl RecordStore for SqliteStore {
    type Error = StoreError;

    fn get_by_id(&self, id: &RecordId) -> Result<Option<AnalyzedRecord>, Self::Error> {
        self.get_one("id", id.as_str())
    }

    fn get_by_value(&self, value: &str) -> Result<Option<AnalyzedRecord>, Self::Error> {
        self.get_one("value", value)
    }

    fn create(
        &mut self,
        id: &RecordId,
        value: &str,
        properties: Properties,
    ) -> Result<AnalyzedRecord, Self::Error> {
        if id.as_str() != properties.hash {
            return Err(StoreError::InvalidData(format!(
                "Record id {} does not match content hash {}",
                id, properties.hash
            )));
        }

        let frequency_json = Self::frequency_to_json(&properties.character_frequency)?;
        let now = Utc::now().trunc_subsecs(6);
        let timestamp = Self::timestamp_to_str(&now);

        let tx = self.conn.transaction()?;

        let exists: bool = tx
            .query_row(
                "SELECT 1 FROM strings WHERE id = ?1 OR value = ?2",
                params![id.as_str(), value],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if exists {
            debug!("Rejecting duplicate string {}", id);
            return Err(StoreError::Duplicate);
        }

        tx.execute(
            "INSERT INTO strings (id, value, length, is_palindrome, unique_characters, word_count,
                                  character_frequency, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id.as_str(),
                value,
                properties.length as i64,
                properties.is_palindrome,
                properties.unique_character_count as i64,
                properties.word_count as i64,
                &frequency_json,
                &timestamp,
                &timestamp,
            ],
        )
        .map_err(Self::map_insert_error)?;

        tx.commit()?;
        debug!("Stored string {}", id);

        Ok(AnalyzedRecord {
            id: id.clone(),
            value: value.to_string(),
            properties,
            created_at: now,
            updated_at: now,
        })
    }

    fn list_filtered(&self, filters: &FilterSet) -> Result<Vec<AnalyzedRecord>, Self::Error> {
        let mut sql = format!("{} WHERE 1=1", SELECT_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(is_palindrome) = filters.is_palindrome {
            sql.push_str(" AND is_palindrome = ?");
            params.push(Box::new(is_palindrome));
        }

        if let Some(min_length) = filters.min_length {
            sql.push_str(" AND length >= ?");
            params.push(Box::new(sql_bound(min_length)));
        }

        if let Some(max_length) = filters.max_length {
            sql.push_str(" AND length <= ?");
            params.push(Box::new(sql_bound(max_length)));
        }

        if let Some(word_count) = filters.word_count {
            sql.push_str(" AND word_count = ?");
            params.push(Box::new(sql_bound(word_count)));
        }

        sql.push_str(" ORDER BY seq");

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let records = stmt
            .query_map(&param_refs[..], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        // SQLite's lower() only folds ASCII, so character containment is
        // checked here rather than in SQL.
        Ok(records
            .into_iter()
            .filter(|record| filters.matches(record))
            .collect())
    }

    fn delete(&mut self, value: &str) -> Result<bool, Self::Error> {
        let deleted = self
            .conn
            .execute("DELETE FROM strings WHERE value = ?1", params![value])?;

        debug!("Deleted {} row(s)", deleted);

        Ok(deleted > 0)
    }

    fn count(&self) -> Result<usize, Self::Error> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM strings", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Widen a filter bound to SQLite's integer type
///
/// Bounds past `i64::MAX` clamp there. No stored length or word count can
/// reach it, so the comparison keeps its meaning.
fn sql_bound(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
