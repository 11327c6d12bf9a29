//! Abstract predicate tree produced by criteria compilation.
//!
//! Execution adapters either evaluate the tree directly against rows
//! ([`Predicate::matches`]) or translate it to SQL (see [`super::sql`]).

use std::cmp::Ordering;

use serde_json::Value as JsonValue;

use super::value::{FilterValue, compare_json};
use crate::store::Row;

/// A boolean predicate over named row fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every row.
    True,
    /// Matches no row.
    False,
    /// All children match.
    And(Vec<Predicate>),
    /// At least one child matches.
    Or(Vec<Predicate>),
    /// The field equals one of the values.
    In {
        field: &'static str,
        values: Vec<FilterValue>,
    },
    /// The array-valued field holds at least one of the values.
    AnyIn {
        field: &'static str,
        values: Vec<FilterValue>,
    },
    /// Inclusive interval; an absent bound is unbounded.
    Range {
        field: &'static str,
        start: Option<FilterValue>,
        end: Option<FilterValue>,
    },
    /// Case-insensitive substring match on a text field.
    Contains {
        field: &'static str,
        needle: String,
    },
    /// The field is absent or null.
    IsNull { field: &'static str },
}

impl Predicate {
    /// Conjunction of `parts`, dropping vacuous children.
    pub fn all(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut children: Vec<Predicate> = parts
            .into_iter()
            .filter(|p| !matches!(p, Predicate::True))
            .collect();
        if children.iter().any(|p| matches!(p, Predicate::False)) {
            return Predicate::False;
        }
        match children.len() {
            0 => Predicate::True,
            1 => children.remove(0),
            _ => Predicate::And(children),
        }
    }

    /// Disjunction of `parts`, dropping unsatisfiable children. An empty
    /// disjunction matches nothing.
    pub fn any(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut children: Vec<Predicate> = parts
            .into_iter()
            .filter(|p| !matches!(p, Predicate::False))
            .collect();
        if children.iter().any(|p| matches!(p, Predicate::True)) {
            return Predicate::True;
        }
        match children.len() {
            0 => Predicate::False,
            1 => children.remove(0),
            _ => Predicate::Or(children),
        }
    }

    /// Equality on a single field.
    pub fn equals(field: &'static str, value: impl Into<FilterValue>) -> Self {
        Predicate::In {
            field,
            values: vec![value.into()],
        }
    }

    /// Equality when `value` is present, otherwise a null check.
    pub fn eq_or_null<V: Into<FilterValue>>(field: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => Predicate::equals(field, v),
            None => Predicate::IsNull { field },
        }
    }

    /// Whether this predicate places no restriction on rows.
    pub fn is_vacuous(&self) -> bool {
        matches!(self, Predicate::True)
    }

    /// Evaluate against a stored row.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::True => true,
            Predicate::False => false,
            Predicate::And(children) => children.iter().all(|p| p.matches(row)),
            Predicate::Or(children) => children.iter().any(|p| p.matches(row)),
            Predicate::In { field, values } => match present(row, field) {
                Some(stored) => contains_value(values, stored),
                None => false,
            },
            Predicate::AnyIn { field, values } => match present(row, field) {
                Some(JsonValue::Array(items)) => {
                    items.iter().any(|item| contains_value(values, item))
                }
                _ => false,
            },
            Predicate::Range { field, start, end } => {
                let Some(stored) = present(row, field) else {
                    return false;
                };
                let above = start.as_ref().is_none_or(|s| {
                    matches!(
                        compare_json(stored, &s.to_json()),
                        Some(Ordering::Greater | Ordering::Equal)
                    )
                });
                let below = end.as_ref().is_none_or(|e| {
                    matches!(
                        compare_json(stored, &e.to_json()),
                        Some(Ordering::Less | Ordering::Equal)
                    )
                });
                above && below
            }
            Predicate::Contains { field, needle } => match present(row, field) {
                Some(JsonValue::String(text)) => {
                    text.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },
            Predicate::IsNull { field } => present(row, field).is_none(),
        }
    }
}

fn present<'a>(row: &'a Row, field: &str) -> Option<&'a JsonValue> {
    row.get(field).filter(|v| !v.is_null())
}

fn contains_value(values: &[FilterValue], stored: &JsonValue) -> bool {
    values
        .iter()
        .any(|v| compare_json(stored, &v.to_json()) == Some(Ordering::Equal))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: JsonValue) -> Row {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("row fixture must be an object"),
        }
    }

    #[test]
    fn all_of_nothing_is_true() {
        assert_eq!(Predicate::all(Vec::new()), Predicate::True);
        assert_eq!(Predicate::all([Predicate::True, Predicate::True]), Predicate::True);
    }

    #[test]
    fn any_of_nothing_is_false() {
        assert_eq!(Predicate::any(Vec::new()), Predicate::False);
        assert_eq!(Predicate::any([Predicate::False]), Predicate::False);
        assert!(!Predicate::any(Vec::new()).matches(&row(json!({ "house": "Horus" }))));
    }

    #[test]
    fn false_absorbs_a_conjunction() {
        let p = Predicate::all([Predicate::equals("house", "Horus"), Predicate::False]);
        assert_eq!(p, Predicate::False);
        let q = Predicate::any([Predicate::False, Predicate::equals("house", "Horus")]);
        assert_eq!(q, Predicate::equals("house", "Horus"));
    }

    #[test]
    fn all_collapses_single_child() {
        let p = Predicate::all([Predicate::True, Predicate::equals("house", "Sphinx")]);
        assert_eq!(p, Predicate::equals("house", "Sphinx"));
    }

    #[test]
    fn in_matches_members_only() {
        let p = Predicate::In {
            field: "house",
            values: vec!["Sphinx".into(), "Horus".into()],
        };
        assert!(p.matches(&row(json!({"house": "Horus"}))));
        assert!(!p.matches(&row(json!({"house": "Anubis"}))));
        assert!(!p.matches(&row(json!({"house": null}))));
    }

    #[test]
    fn any_in_checks_array_elements() {
        let p = Predicate::AnyIn {
            field: "roles",
            values: vec!["ROLE_TA".into()],
        };
        assert!(p.matches(&row(json!({"roles": ["ROLE_STUDENT", "ROLE_TA"]}))));
        assert!(!p.matches(&row(json!({"roles": ["ROLE_STUDENT"]}))));
        assert!(!p.matches(&row(json!({"roles": "ROLE_TA"}))));
    }

    #[test]
    fn open_ranges() {
        let only_start = Predicate::Range {
            field: "points",
            start: Some(5.into()),
            end: None,
        };
        assert!(only_start.matches(&row(json!({"points": 5}))));
        assert!(!only_start.matches(&row(json!({"points": 4}))));

        let inverted = Predicate::Range {
            field: "points",
            start: Some(10.into()),
            end: Some(1.into()),
        };
        assert!(!inverted.matches(&row(json!({"points": 5}))));
    }

    #[test]
    fn contains_ignores_case() {
        let p = Predicate::Contains {
            field: "first_name",
            needle: "ALI".to_string(),
        };
        assert!(p.matches(&row(json!({"first_name": "Alice"}))));
        assert!(!p.matches(&row(json!({"first_name": "Bob"}))));
    }

    #[test]
    fn null_check_treats_missing_as_null() {
        let p = Predicate::IsNull { field: "old_house" };
        assert!(p.matches(&row(json!({}))));
        assert!(p.matches(&row(json!({"old_house": null}))));
        assert!(!p.matches(&row(json!({"old_house": "Horus"}))));
    }
}
