//! Sort and page resolution.
//!
//! A [`PageRequest`] arrives from the client loosely typed; [`resolve`] checks
//! it against the entity's sort allow-list and turns it into an
//! [`ExecutionSpec`] that storage adapters can run without further checks.

use serde::{Deserialize, Serialize};

use super::catalog::EntityCatalog;

/// Page size that requests every matching row.
pub const UNPAGINATED: i64 = -1;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Client paging parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page_num: i64,
    /// Rows per page, or [`UNPAGINATED`].
    pub page_size: i64,
    /// Client sort name; the entity default when absent.
    pub sort_on: Option<String>,
    pub asc: bool,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_num: 0,
            page_size: UNPAGINATED,
            sort_on: None,
            asc: true,
        }
    }
}

impl PageRequest {
    /// A windowed request sorted by the entity default.
    pub fn page(page_num: i64, page_size: i64) -> Self {
        Self {
            page_num,
            page_size,
            ..Default::default()
        }
    }

    /// Sort by `sort_on` in the given direction.
    pub fn sorted(mut self, sort_on: impl Into<String>, asc: bool) -> Self {
        self.sort_on = Some(sort_on.into());
        self.asc = asc;
        self
    }
}

/// Resolved ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: &'static str,
    pub direction: SortDirection,
    /// Key column breaking ties so pages are stable.
    pub tiebreaker: &'static str,
}

/// Slice of the sorted result to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    All,
    Page { offset: u64, limit: u64 },
}

/// Everything a query executor needs besides the predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSpec {
    pub sort: SortSpec,
    pub window: Window,
}

/// Errors in client paging parameters.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PagingError {
    #[error("cannot sort {entity} on '{column}'")]
    InvalidSortColumn { entity: String, column: String },

    #[error("invalid page specification: page {page_num}, size {page_size}")]
    InvalidPageSpec { page_num: i64, page_size: i64 },
}

/// Validate `request` against `catalog` and build the execution spec.
pub fn resolve(catalog: &EntityCatalog, request: &PageRequest) -> Result<ExecutionSpec, PagingError> {
    let sort_on = request.sort_on.as_deref().unwrap_or(catalog.default_sort);
    let column = catalog
        .sort_column(sort_on)
        .ok_or_else(|| PagingError::InvalidSortColumn {
            entity: catalog.entity.to_string(),
            column: sort_on.to_string(),
        })?;

    let sort = SortSpec {
        column,
        direction: if request.asc {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        },
        tiebreaker: catalog.key_column,
    };

    let invalid = || PagingError::InvalidPageSpec {
        page_num: request.page_num,
        page_size: request.page_size,
    };

    let window = if request.page_size == UNPAGINATED {
        Window::All
    } else {
        if request.page_size <= 0 || request.page_num < 0 {
            return Err(invalid());
        }
        let limit = u64::try_from(request.page_size).map_err(|_| invalid())?;
        let page = u64::try_from(request.page_num).map_err(|_| invalid())?;
        let offset = page.checked_mul(limit).ok_or_else(invalid)?;
        // PostgreSQL takes BIGINT offsets.
        if i64::try_from(offset).is_err() {
            return Err(invalid());
        }
        Window::Page { offset, limit }
    };

    Ok(ExecutionSpec { sort, window })
}

/// A listing result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResult<T> {
    pub rows: Vec<T>,
    /// Rows matching the predicate, across all pages.
    pub total: u64,
    /// True when `rows` is empty.
    pub empty: bool,
}

impl<T> ListResult<T> {
    pub fn new(rows: Vec<T>, total: u64) -> Self {
        let empty = rows.is_empty();
        Self { rows, total, empty }
    }
}
