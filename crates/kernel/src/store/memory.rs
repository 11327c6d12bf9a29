//! In-process store.
//!
//! Evaluates predicate trees directly against rows held in memory. Joined
//! relations are assembled on read and cannot be written.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;

use super::schema::{self, TableSpec};
use super::{AggregationExecutor, QueryExecutor, RecordStore, Row, RowPage, StoreError};
use crate::filter::value::sort_order;
use crate::filter::{ExecutionSpec, Predicate, SortDirection, Window};

type Table = BTreeMap<String, Row>;

/// Store backed by in-process maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, BTreeMap::len)
    }

    /// Snapshot of every row of a table or joined relation.
    fn rows(&self, spec: &TableSpec) -> Vec<Row> {
        let tables = self.tables.read();
        match &spec.join {
            None => tables
                .get(spec.name)
                .map(|t| t.values().cloned().collect())
                .unwrap_or_default(),
            Some(join) => {
                let (Some(primary), Some(extension)) =
                    (tables.get(join.primary), tables.get(join.extension))
                else {
                    return Vec::new();
                };
                primary
                    .iter()
                    .filter_map(|(key, row)| {
                        let ext = extension.get(key)?;
                        let mut joined = row.clone();
                        for (column, value) in ext {
                            if column != join.on {
                                joined.insert(column.clone(), value.clone());
                            }
                        }
                        Some(joined)
                    })
                    .collect()
            }
        }
    }
}

fn table_spec(table: &str) -> Result<&'static TableSpec, StoreError> {
    schema::table(table).ok_or_else(|| StoreError::UnknownTable(table.to_string()))
}

fn writable_spec(table: &str) -> Result<&'static TableSpec, StoreError> {
    let spec = table_spec(table)?;
    if spec.join.is_some() {
        return Err(StoreError::ReadOnly(table.to_string()));
    }
    Ok(spec)
}

/// Map key for a JSON key value.
fn key_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn row_key(spec: &TableSpec, row: &Row) -> Result<String, StoreError> {
    row.get(spec.key)
        .and_then(key_string)
        .ok_or_else(|| StoreError::MissingKey {
            table: spec.name.to_string(),
            key: spec.key.to_string(),
        })
}

/// Whether `a` and `b` agree on every column of `group`, nulls included.
fn same_group(group: &[&str], a: &Row, b: &Row) -> bool {
    group.iter().all(|column| {
        let a = a.get(*column).unwrap_or(&JsonValue::Null);
        let b = b.get(*column).unwrap_or(&JsonValue::Null);
        a == b
    })
}

fn check_unique(spec: &TableSpec, table: &Table, key: &str, row: &Row) -> Result<(), StoreError> {
    for group in spec.unique {
        let clash = table
            .iter()
            .any(|(other_key, other)| other_key != key && same_group(group, row, other));
        if clash {
            return Err(StoreError::Conflict {
                table: spec.name.to_string(),
                detail: format!("duplicate ({})", group.join(", ")),
            });
        }
    }
    Ok(())
}

fn compare_rows(a: &Row, b: &Row, spec: &ExecutionSpec) -> Ordering {
    let primary = sort_order(a.get(spec.sort.column), b.get(spec.sort.column));
    let primary = match spec.sort.direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| sort_order(a.get(spec.sort.tiebreaker), b.get(spec.sort.tiebreaker)))
}

#[async_trait]
impl QueryExecutor for MemoryStore {
    async fn execute(
        &self,
        table: &str,
        predicate: &Predicate,
        spec: &ExecutionSpec,
    ) -> Result<RowPage, StoreError> {
        let table_spec = table_spec(table)?;
        let mut matched: Vec<Row> = self
            .rows(table_spec)
            .into_iter()
            .filter(|row| predicate.matches(row))
            .collect();
        matched.sort_by(|a, b| compare_rows(a, b, spec));

        let total = matched.len() as u64;
        let rows = match spec.window {
            Window::All => matched,
            Window::Page { offset, limit } => {
                let offset = usize::try_from(offset).unwrap_or(usize::MAX);
                let limit = usize::try_from(limit).unwrap_or(usize::MAX);
                matched.into_iter().skip(offset).take(limit).collect()
            }
        };
        Ok(RowPage { rows, total })
    }
}

#[async_trait]
impl AggregationExecutor for MemoryStore {
    async fn distinct_per_column(
        &self,
        table: &str,
        excluded: &[&str],
    ) -> Result<BTreeMap<String, Vec<JsonValue>>, StoreError> {
        let spec = table_spec(table)?;
        let mut result: BTreeMap<String, Vec<JsonValue>> = BTreeMap::new();
        for row in self.rows(spec) {
            for (column, value) in row {
                if excluded.contains(&column.as_str()) || value.is_null() {
                    continue;
                }
                let values = result.entry(column).or_default();
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, table: &str, key: &JsonValue) -> Result<Option<Row>, StoreError> {
        let spec = table_spec(table)?;
        let Some(key) = key_string(key) else {
            return Ok(None);
        };
        if spec.join.is_some() {
            return Ok(self
                .rows(spec)
                .into_iter()
                .find(|row| row.get(spec.key).and_then(key_string).as_deref() == Some(key.as_str())));
        }
        Ok(self
            .tables
            .read()
            .get(spec.name)
            .and_then(|t| t.get(&key))
            .cloned())
    }

    async fn exists(&self, table: &str, key: &JsonValue) -> Result<bool, StoreError> {
        Ok(self.get(table, key).await?.is_some())
    }

    async fn exists_matching(
        &self,
        table: &str,
        predicate: &Predicate,
    ) -> Result<bool, StoreError> {
        let spec = table_spec(table)?;
        Ok(self.rows(spec).iter().any(|row| predicate.matches(row)))
    }

    async fn insert(&self, table: &str, row: Row) -> Result<(), StoreError> {
        let spec = writable_spec(table)?;
        let key = row_key(spec, &row)?;
        let mut tables = self.tables.write();
        let rows = tables.entry(spec.name).or_default();
        if rows.contains_key(&key) {
            return Err(StoreError::Conflict {
                table: spec.name.to_string(),
                detail: format!("{} {key} already exists", spec.key),
            });
        }
        check_unique(spec, rows, &key, &row)?;
        rows.insert(key, row);
        Ok(())
    }

    async fn update(&self, table: &str, row: Row) -> Result<bool, StoreError> {
        let spec = writable_spec(table)?;
        let key = row_key(spec, &row)?;
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(spec.name) else {
            return Ok(false);
        };
        if !rows.contains_key(&key) {
            return Ok(false);
        }
        check_unique(spec, rows, &key, &row)?;
        rows.insert(key, row);
        Ok(true)
    }

    async fn delete(&self, table: &str, key: &JsonValue) -> Result<bool, StoreError> {
        let spec = writable_spec(table)?;
        let Some(key) = key_string(key) else {
            return Ok(false);
        };
        Ok(self
            .tables
            .write()
            .get_mut(spec.name)
            .is_some_and(|rows| rows.remove(&key).is_some()))
    }
}
