//! PostgreSQL store.
//!
//! Listings are translated to SQL by [`PredicateQueryBuilder`] and rows come
//! back through `row_to_json`. Writes go through `jsonb_populate_record`, so a
//! row's JSON shape is the only mapping between records and columns.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sea_query::{Alias, PostgresQueryBuilder, Query};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use sqlx::types::Json;

use super::schema::{self, TableSpec};
use super::{AggregationExecutor, QueryExecutor, RecordStore, Row, RowPage, StoreError};
use crate::filter::sql::{condition, quote_ident, row_to_json};
use crate::filter::{ExecutionSpec, FilterValue, Predicate, PredicateQueryBuilder};

/// First statement of a listing transaction, so the count and the page see
/// one snapshot.
const LISTING_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
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

/// Predicate selecting the row with `key`, or `None` for a null key.
fn key_predicate(spec: &TableSpec, key: &JsonValue) -> Option<Predicate> {
    FilterValue::from_json(key).map(|value| Predicate::In {
        field: spec.key,
        values: vec![value],
    })
}

fn decode_rows(values: Vec<JsonValue>) -> Result<Vec<Row>, StoreError> {
    values
        .into_iter()
        .map(|value| Ok(serde_json::from_value::<Row>(value)?))
        .collect()
}

fn write_error(table: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict {
            table: table.to_string(),
            detail: db.message().to_string(),
        },
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl QueryExecutor for PgStore {
    async fn execute(
        &self,
        table: &str,
        predicate: &Predicate,
        spec: &ExecutionSpec,
    ) -> Result<RowPage, StoreError> {
        let table_spec = table_spec(table)?;
        let builder = PredicateQueryBuilder::new(table_spec.name, predicate);

        let mut tx = self.pool.begin().await?;
        sqlx::query(LISTING_ISOLATION).execute(&mut *tx).await?;

        let count_sql = builder.build_count();
        let total: i64 = sqlx::query_scalar(&count_sql).fetch_one(&mut *tx).await?;

        let main_sql = builder.build(spec);
        let rows: Vec<JsonValue> = sqlx::query_scalar(&row_to_json(&main_sql))
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(table, total, returned = rows.len(), "executed listing");
        Ok(RowPage {
            rows: decode_rows(rows)?,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl AggregationExecutor for PgStore {
    async fn distinct_per_column(
        &self,
        table: &str,
        excluded: &[&str],
    ) -> Result<BTreeMap<String, Vec<JsonValue>>, StoreError> {
        let spec = table_spec(table)?;
        let relation = quote_ident(spec.name);
        let sql = format!(
            "SELECT key, jsonb_agg(DISTINCT value) \
             FROM {relation}, jsonb_each(to_jsonb({relation})) \
             WHERE NOT (key = ANY($1)) AND jsonb_typeof(value) <> 'null' \
             GROUP BY key"
        );
        let excluded: Vec<String> = excluded.iter().map(|c| c.to_string()).collect();

        let rows: Vec<(String, Json<Vec<JsonValue>>)> = sqlx::query_as(&sql)
            .bind(&excluded)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(column, Json(values))| (column, values))
            .collect())
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn get(&self, table: &str, key: &JsonValue) -> Result<Option<Row>, StoreError> {
        let spec = table_spec(table)?;
        let Some(predicate) = key_predicate(spec, key) else {
            return Ok(None);
        };
        let sql = PredicateQueryBuilder::new(spec.name, &predicate).build_select();
        let row: Option<JsonValue> = sqlx::query_scalar(&row_to_json(&sql))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(serde_json::from_value::<Row>).transpose()?)
    }

    async fn exists(&self, table: &str, key: &JsonValue) -> Result<bool, StoreError> {
        let spec = table_spec(table)?;
        match key_predicate(spec, key) {
            Some(predicate) => self.exists_matching(table, &predicate).await,
            None => Ok(false),
        }
    }

    async fn exists_matching(
        &self,
        table: &str,
        predicate: &Predicate,
    ) -> Result<bool, StoreError> {
        let spec = table_spec(table)?;
        let sql = PredicateQueryBuilder::new(spec.name, predicate).build_exists();
        Ok(sqlx::query_scalar(&sql).fetch_one(&self.pool).await?)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<(), StoreError> {
        let spec = writable_spec(table)?;
        let relation = quote_ident(spec.name);
        let columns = row
            .keys()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {relation} ({columns}) \
             SELECT {columns} FROM jsonb_populate_record(NULL::{relation}, $1)"
        );
        sqlx::query(&sql)
            .bind(Json(&row))
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(table, e))?;
        tracing::debug!(table, "inserted row");
        Ok(())
    }

    async fn update(&self, table: &str, row: Row) -> Result<bool, StoreError> {
        let spec = writable_spec(table)?;
        if row.get(spec.key).is_none_or(JsonValue::is_null) {
            return Err(StoreError::MissingKey {
                table: table.to_string(),
                key: spec.key.to_string(),
            });
        }
        let relation = quote_ident(spec.name);
        let key = quote_ident(spec.key);
        let columns = row
            .keys()
            .filter(|c| c.as_str() != spec.key)
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>();
        if columns.is_empty() {
            return self.exists(table, &row[spec.key]).await;
        }
        let columns = columns.join(", ");
        let sql = format!(
            "UPDATE {relation} SET ({columns}) = \
             (SELECT {columns} FROM jsonb_populate_record(NULL::{relation}, $1)) \
             WHERE {key} = (SELECT {key} FROM jsonb_populate_record(NULL::{relation}, $1))"
        );
        let result = sqlx::query(&sql)
            .bind(Json(&row))
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(table, e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, table: &str, key: &JsonValue) -> Result<bool, StoreError> {
        let spec = writable_spec(table)?;
        let Some(predicate) = key_predicate(spec, key) else {
            return Ok(false);
        };
        let sql = Query::delete()
            .from_table(Alias::new(spec.name))
            .and_where(condition(spec.name, &predicate))
            .to_string(PostgresQueryBuilder);
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listings_read_one_snapshot() {
        assert!(LISTING_ISOLATION.starts_with("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ"));
        assert!(LISTING_ISOLATION.ends_with("READ ONLY"));
    }
}
