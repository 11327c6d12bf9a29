//! Facet extraction: the distinct values of every filterable column.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::store::{AggregationExecutor, StoreError};

/// One distinct column value. Orders booleans before integers before text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum FacetValue {
    Boolean(bool),
    Integer(i64),
    Text(String),
}

impl FacetValue {
    fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Bool(b) => Some(FacetValue::Boolean(*b)),
            JsonValue::Number(n) => Some(
                n.as_i64()
                    .map(FacetValue::Integer)
                    .unwrap_or_else(|| FacetValue::Text(n.to_string())),
            ),
            JsonValue::String(s) => Some(FacetValue::Text(s.clone())),
            JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }
}

/// Column name to its sorted distinct values.
pub type FacetResult = BTreeMap<String, BTreeSet<FacetValue>>;

/// Normalise raw per-column values into a [`FacetResult`].
///
/// Array values contribute their elements. Nulls are dropped, a column left
/// with no values is omitted, and `excluded` columns never appear.
pub fn normalize(raw: BTreeMap<String, Vec<JsonValue>>, excluded: &[&str]) -> FacetResult {
    raw.into_iter()
        .filter(|(column, _)| !excluded.contains(&column.as_str()))
        .filter_map(|(column, values)| {
            let set: BTreeSet<FacetValue> = values
                .iter()
                .flat_map(|v| match v {
                    JsonValue::Array(items) => items.iter().collect::<Vec<_>>(),
                    other => vec![other],
                })
                .filter_map(FacetValue::from_json)
                .collect();
            (!set.is_empty()).then_some((column, set))
        })
        .collect()
}

/// Distinct values per column of `table`, over the unfiltered relation.
pub async fn facets<A: AggregationExecutor + ?Sized>(
    aggregator: &A,
    table: &str,
    excluded: &[&str],
) -> Result<FacetResult, StoreError> {
    let raw = aggregator.distinct_per_column(table, excluded).await?;
    let result = normalize(raw, excluded);
    tracing::debug!(table, columns = result.len(), "extracted facets");
    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(pairs: &[(&str, JsonValue)]) -> BTreeMap<String, Vec<JsonValue>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_array().cloned().unwrap_or_default()))
            .collect()
    }

    #[test]
    fn values_are_sorted_and_deduplicated() {
        let result = normalize(raw(&[("house", json!(["Sphinx", "Horus", "Sphinx"]))]), &[]);
        let values: Vec<_> = result["house"].iter().cloned().collect();
        assert_eq!(
            values,
            vec![
                FacetValue::Text("Horus".to_string()),
                FacetValue::Text("Sphinx".to_string())
            ]
        );
    }

    #[test]
    fn nulls_and_null_only_columns_vanish() {
        let result = normalize(
            raw(&[("gender", json!(["F", null])), ("do_group", json!([null]))]),
            &[],
        );
        assert_eq!(result["gender"].len(), 1);
        assert!(!result.contains_key("do_group"));
    }

    #[test]
    fn exclusions_are_reapplied() {
        let result = normalize(raw(&[("email", json!(["a@b"])), ("program", json!(["CS"]))]), &["email"]);
        assert!(!result.contains_key("email"));
        assert!(result.contains_key("program"));
    }

    #[test]
    fn array_columns_contribute_elements() {
        let result = normalize(raw(&[("active_years", json!([[2023, 2024], [2024]]))]), &[]);
        let years: Vec<_> = result["active_years"].iter().cloned().collect();
        assert_eq!(years, vec![FacetValue::Integer(2023), FacetValue::Integer(2024)]);
    }

    #[test]
    fn serialises_as_plain_values() {
        let result = normalize(raw(&[("enabled", json!([true, false]))]), &[]);
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"enabled": [false, true]}));
    }
}
