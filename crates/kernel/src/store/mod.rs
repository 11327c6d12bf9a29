//! Storage collaborators.
//!
//! Services talk to storage only through the traits here. Rows travel as JSON
//! objects with snake_case column names, the shape `row_to_json` produces.

pub mod memory;
pub mod postgres;
pub mod schema;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::filter::{ExecutionSpec, Predicate};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A stored row.
pub type Row = serde_json::Map<String, JsonValue>;

/// One window of a listing plus the unwindowed match count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPage {
    pub rows: Vec<Row>,
    pub total: u64,
}

/// Storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A key or unique constraint rejected the write.
    #[error("{table}: conflicting row ({detail})")]
    Conflict { table: String, detail: String },

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("'{0}' is a read-only relation")]
    ReadOnly(String),

    #[error("{table} row has no '{key}' value")]
    MissingKey { table: String, key: String },

    #[error("row decoding failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Runs compiled listings.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Rows of `table` matching `predicate`, ordered and windowed per `spec`.
    async fn execute(
        &self,
        table: &str,
        predicate: &Predicate,
        spec: &ExecutionSpec,
    ) -> Result<RowPage, StoreError>;
}

/// Computes per-column aggregates for facet extraction.
#[async_trait]
pub trait AggregationExecutor: Send + Sync {
    /// Distinct non-null values of every column of `table` not in `excluded`.
    async fn distinct_per_column(
        &self,
        table: &str,
        excluded: &[&str],
    ) -> Result<BTreeMap<String, Vec<JsonValue>>, StoreError>;
}

/// Keyed persistence.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, table: &str, key: &JsonValue) -> Result<Option<Row>, StoreError>;

    async fn exists(&self, table: &str, key: &JsonValue) -> Result<bool, StoreError>;

    /// Whether any row of `table` matches `predicate`.
    async fn exists_matching(&self, table: &str, predicate: &Predicate)
    -> Result<bool, StoreError>;

    /// Insert a new row. Fails with [`StoreError::Conflict`] on a key or
    /// unique-group collision.
    async fn insert(&self, table: &str, row: Row) -> Result<(), StoreError>;

    /// Replace the row with the same key. Returns false when none exists.
    async fn update(&self, table: &str, row: Row) -> Result<bool, StoreError>;

    /// Returns false when no row had `key`.
    async fn delete(&self, table: &str, key: &JsonValue) -> Result<bool, StoreError>;
}

/// Everything the services need from storage.
pub trait Store: QueryExecutor + AggregationExecutor + RecordStore {}

impl<T: QueryExecutor + AggregationExecutor + RecordStore + ?Sized> Store for T {}

/// Decode a row into a record type.
pub fn from_row<T: serde::de::DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    Ok(serde_json::from_value(JsonValue::Object(row))?)
}

/// Encode a record type as a row.
pub fn to_row<T: serde::Serialize>(record: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(record)? {
        JsonValue::Object(row) => Ok(row),
        other => Err(StoreError::Decode(serde::de::Error::custom(format!(
            "expected a JSON object, found {other}"
        )))),
    }
}
