//! Criteria compilation.
//!
//! Compilation is pure and total: every criteria value yields a predicate,
//! and fully-empty criteria yield [`Predicate::True`].

use chrono::{NaiveDate, TimeZone, Utc};

use super::catalog::{
    EntityCatalog, HOUSE_CHANGE_REQUESTS, HOUSES, HOUSES_CUP, STUDENTS, USERS,
};
use super::criteria::{
    HouseChangeRequestCriteria, HouseCriteria, HousesCupPointsCriteria, NoCriteria,
    StudentCriteria, UserCriteria,
};
use super::predicate::Predicate;
use super::value::FilterValue;

/// Criteria that compile to a predicate over an entity's relation.
pub trait Compile {
    fn compile(&self) -> Predicate;
}

/// `field IN values`, vacuous when `values` is empty.
pub fn list_clause<V>(field: &'static str, values: &[V]) -> Predicate
where
    V: Clone + Into<FilterValue>,
{
    if values.is_empty() {
        return Predicate::True;
    }
    Predicate::In {
        field,
        values: values.iter().cloned().map(Into::into).collect(),
    }
}

/// Array column overlaps `values`, vacuous when `values` is empty.
pub fn array_clause<V>(field: &'static str, values: &[V]) -> Predicate
where
    V: Clone + Into<FilterValue>,
{
    if values.is_empty() {
        return Predicate::True;
    }
    Predicate::AnyIn {
        field,
        values: values.iter().cloned().map(Into::into).collect(),
    }
}

/// Inclusive range, vacuous when both bounds are absent.
pub fn range_clause<V: Into<FilterValue>>(
    field: &'static str,
    start: Option<V>,
    end: Option<V>,
) -> Predicate {
    if start.is_none() && end.is_none() {
        return Predicate::True;
    }
    Predicate::Range {
        field,
        start: start.map(Into::into),
        end: end.map(Into::into),
    }
}

/// Date range over a timestamp column, in UTC. The end day is included in full.
pub fn timestamp_range_clause(
    field: &'static str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Predicate {
    let at = |day: NaiveDate, h: u32, m: u32, s: u32, micro: u32| {
        day.and_hms_micro_opt(h, m, s, micro)
            .map(|t| FilterValue::Timestamp(Utc.from_utc_datetime(&t)))
    };
    let start = start.and_then(|day| at(day, 0, 0, 0, 0));
    let end = end.and_then(|day| at(day, 23, 59, 59, 999_999));
    range_clause(field, start, end)
}

/// Case-insensitive substring search OR-ed across the catalog's text columns.
pub fn search_clause(catalog: &EntityCatalog, search: Option<&str>) -> Predicate {
    let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) else {
        return Predicate::True;
    };
    if catalog.searchable_columns.is_empty() {
        return Predicate::True;
    }
    Predicate::any(catalog.searchable_columns.iter().map(|&field| {
        Predicate::Contains {
            field,
            needle: needle.to_string(),
        }
    }))
}

/// `a IN values OR b IN values`, vacuous when `values` is empty.
pub fn either_clause<V>(a: &'static str, b: &'static str, values: &[V]) -> Predicate
where
    V: Clone + Into<FilterValue>,
{
    if values.is_empty() {
        return Predicate::True;
    }
    Predicate::any([list_clause(a, values), list_clause(b, values)])
}

impl Compile for StudentCriteria {
    fn compile(&self) -> Predicate {
        Predicate::all([
            list_clause("gender", &self.gender),
            list_clause("program", &self.program),
            list_clause("house", &self.house),
            list_clause("cohort", &self.year),
            list_clause("experience", &self.experience),
            list_clause("do_group", &self.do_group),
            list_clause("status", &self.status),
            range_clause("date_assigned_to_house", self.start_date, self.end_date),
            search_clause(&STUDENTS, self.search_string.as_deref()),
        ])
    }
}

impl Compile for UserCriteria {
    fn compile(&self) -> Predicate {
        Predicate::all([
            list_clause("house", &self.house),
            array_clause("roles", &self.roles),
            range_clause("date_assigned_to_house", self.start_date, self.end_date),
            search_clause(&USERS, self.search_string.as_deref()),
        ])
    }
}

impl Compile for HouseChangeRequestCriteria {
    fn compile(&self) -> Predicate {
        Predicate::all([
            list_clause("target_house", &self.target_house),
            list_clause("old_house", &self.old_house),
            either_clause("target_house", "old_house", &self.either_house),
            list_clause("status", &self.status),
            range_clause("request_date", self.start_date, self.end_date),
            search_clause(&HOUSE_CHANGE_REQUESTS, self.search_string.as_deref()),
        ])
    }
}

impl Compile for HousesCupPointsCriteria {
    fn compile(&self) -> Predicate {
        Predicate::all([
            list_clause("house", &self.house),
            range_clause("points", self.start_points, self.end_points),
            timestamp_range_clause("date", self.start_date, self.end_date),
            list_clause("academic_year", &self.academic_year),
            search_clause(&HOUSES_CUP, self.search_string.as_deref()),
        ])
    }
}

impl Compile for HouseCriteria {
    fn compile(&self) -> Predicate {
        Predicate::all([
            array_clause("active_years", &self.active_years),
            search_clause(&HOUSES, self.search_string.as_deref()),
        ])
    }
}

impl Compile for NoCriteria {
    fn compile(&self) -> Predicate {
        Predicate::True
    }
}
