//! Listing engine.
//!
//! This module provides:
//! - Criteria: typed filter criteria per entity
//! - Compile: criteria to predicate tree compilation
//! - Paging: sort/page resolution into an execution spec
//! - Facets: distinct values per filterable column
//! - PredicateQueryBuilder: SeaQuery-based SQL generation

pub mod catalog;
pub mod compile;
pub mod criteria;
pub mod facets;
pub mod paging;
pub mod predicate;
pub mod sql;
pub mod value;

pub use catalog::{Entity, EntityCatalog};
pub use compile::Compile;
pub use criteria::{
    HouseChangeRequestCriteria, HouseCriteria, HousesCupPointsCriteria, NoCriteria,
    STAFF_ROLES, StudentCriteria, UserCriteria,
};
pub use facets::{FacetResult, FacetValue};
pub use paging::{
    ExecutionSpec, ListResult, PageRequest, PagingError, SortDirection, SortSpec, UNPAGINATED,
    Window, resolve,
};
pub use predicate::Predicate;
pub use sql::PredicateQueryBuilder;
pub use value::FilterValue;
