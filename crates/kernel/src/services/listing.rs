//! Plumbing shared by the entity services.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::filter::facets::facets;
use crate::filter::{EntityCatalog, FacetResult, ListResult, PageRequest, Predicate, resolve};
use crate::models::Person;
use crate::store::{Store, StoreError, from_row, schema, to_row};

/// Resolve `request` for `catalog` and run `predicate`, decoding each row.
pub(crate) async fn fetch_page<T: DeserializeOwned>(
    store: &dyn Store,
    catalog: &EntityCatalog,
    predicate: &Predicate,
    request: &PageRequest,
) -> ServiceResult<ListResult<T>> {
    let spec = resolve(catalog, request)?;
    let page = store.execute(catalog.table, predicate, &spec).await?;
    debug!(
        entity = %catalog.entity,
        returned = page.rows.len(),
        total = page.total,
        "listed rows"
    );
    let rows = page
        .rows
        .into_iter()
        .map(from_row)
        .collect::<Result<Vec<T>, _>>()?;
    Ok(ListResult::new(rows, page.total))
}

/// Every row matching `predicate`, in the catalog's default order.
pub(crate) async fn fetch_all<T: DeserializeOwned>(
    store: &dyn Store,
    catalog: &EntityCatalog,
    predicate: &Predicate,
) -> ServiceResult<Vec<T>> {
    Ok(fetch_page(store, catalog, predicate, &PageRequest::default())
        .await?
        .rows)
}

pub(crate) async fn filterables(
    store: &dyn Store,
    catalog: &EntityCatalog,
) -> ServiceResult<FacetResult> {
    Ok(facets(store, catalog.table, catalog.excluded_columns).await?)
}

pub(crate) async fn load<T: DeserializeOwned>(
    store: &dyn Store,
    table: &str,
    key: &JsonValue,
) -> ServiceResult<Option<T>> {
    match store.get(table, key).await? {
        Some(row) => Ok(Some(from_row(row)?)),
        None => Ok(None),
    }
}

/// Load a record or fail with [`ServiceError::NotFound`].
pub(crate) async fn require<T: DeserializeOwned>(
    store: &dyn Store,
    table: &str,
    entity: &'static str,
    key: &JsonValue,
) -> ServiceResult<T> {
    load(store, table, key)
        .await?
        .ok_or_else(|| ServiceError::not_found(entity, display_key(key)))
}

/// Insert a record, reporting key collisions as [`ServiceError::DuplicateKey`].
pub(crate) async fn insert<T: Serialize>(
    store: &dyn Store,
    table: &str,
    entity: &'static str,
    key: &JsonValue,
    record: &T,
) -> ServiceResult<()> {
    match store.insert(table, to_row(record)?).await {
        Ok(()) => Ok(()),
        Err(StoreError::Conflict { .. }) => Err(ServiceError::duplicate(entity, display_key(key))),
        Err(err) => Err(err.into()),
    }
}

/// Replace a stored record, failing with [`ServiceError::NotFound`] when it
/// vanished in the meantime.
pub(crate) async fn replace<T: Serialize>(
    store: &dyn Store,
    table: &str,
    entity: &'static str,
    key: &JsonValue,
    record: &T,
) -> ServiceResult<()> {
    if store.update(table, to_row(record)?).await? {
        Ok(())
    } else {
        Err(ServiceError::not_found(entity, display_key(key)))
    }
}

pub(crate) async fn remove(
    store: &dyn Store,
    table: &str,
    entity: &'static str,
    key: &JsonValue,
) -> ServiceResult<String> {
    if !store.delete(table, key).await? {
        return Err(ServiceError::not_found(entity, display_key(key)));
    }
    Ok(format!("Deleted {entity} {}", display_key(key)))
}

/// Display name of the person with `id_number`, if they exist.
pub(crate) async fn person_name(
    store: &dyn Store,
    id_number: Option<i32>,
) -> ServiceResult<Option<String>> {
    let Some(id) = id_number else {
        return Ok(None);
    };
    let person: Option<Person> = load(store, schema::PEOPLE, &JsonValue::from(id)).await?;
    Ok(person.map(|p| p.display_name()))
}

pub(crate) fn display_key(key: &JsonValue) -> String {
    match key {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
