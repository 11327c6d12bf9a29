//! Scalar values carried by predicate nodes and their comparison rules.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Filter value types.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Integer value.
    Integer(i64),
    /// Float value.
    Float(f64),
    /// Boolean value.
    Boolean(bool),
    /// String value.
    Text(String),
    /// Calendar date, compared as midnight UTC against timestamps.
    Date(NaiveDate),
    /// Point in time.
    Timestamp(DateTime<Utc>),
}

impl FilterValue {
    /// JSON form of the value, shaped the way rows store it.
    pub fn to_json(&self) -> JsonValue {
        match self {
            FilterValue::Integer(i) => JsonValue::from(*i),
            FilterValue::Float(f) => JsonValue::from(*f),
            FilterValue::Boolean(b) => JsonValue::Bool(*b),
            FilterValue::Text(s) => JsonValue::String(s.clone()),
            FilterValue::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            FilterValue::Timestamp(t) => {
                JsonValue::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
        }
    }

    /// Build a filter value from a stored JSON scalar.
    ///
    /// Returns `None` for null, arrays and objects.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Bool(b) => Some(FilterValue::Boolean(*b)),
            JsonValue::Number(n) => n
                .as_i64()
                .map(FilterValue::Integer)
                .or_else(|| n.as_f64().map(FilterValue::Float)),
            JsonValue::String(s) => Some(FilterValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Convert to string representation for SQL.
    pub fn as_sql_value(&self) -> sea_query::Value {
        match self {
            FilterValue::Integer(i) => (*i).into(),
            FilterValue::Float(f) => (*f).into(),
            FilterValue::Boolean(b) => (*b).into(),
            FilterValue::Text(s) => s.clone().into(),
            FilterValue::Date(d) => d.format("%Y-%m-%d").to_string().into(),
            FilterValue::Timestamp(t) => t.to_rfc3339_opts(SecondsFormat::Micros, true).into(),
        }
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(i64::from(value))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Boolean(value)
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(value: NaiveDate) -> Self {
        FilterValue::Date(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        FilterValue::Timestamp(value)
    }
}

impl From<uuid::Uuid> for FilterValue {
    fn from(value: uuid::Uuid) -> Self {
        FilterValue::Text(value.to_string())
    }
}

/// Compare two stored JSON scalars.
///
/// Strings that both read as dates or timestamps compare as instants. Values
/// of different kinds are incomparable.
pub fn compare_json(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (JsonValue::String(x), JsonValue::String(y)) => match (parse_instant(x), parse_instant(y)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => Some(x.cmp(y)),
        },
        (JsonValue::Bool(x), JsonValue::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used for sorting rows.
///
/// Missing and null values sort after everything else, the way PostgreSQL
/// orders NULLs in ascending sorts.
pub fn sort_order(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_json(a, b).unwrap_or_else(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Read a string as a date (`yyyy-MM-dd`) or an RFC 3339 timestamp.
pub(crate) fn parse_instant(value: &str) -> Option<NaiveDateTime> {
    if value.len() < 10 || !value.as_bytes()[0].is_ascii_digit() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_utc());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
