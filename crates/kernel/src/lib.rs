//! Maat registry kernel.
//!
//! Criteria compilation, paging and facet extraction over the registry's
//! entities, the student status rules, and the entity services built on
//! them. The `maat` binary is thin operator tooling over this library.

pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod models;
pub mod services;
pub mod store;
pub mod validate;
