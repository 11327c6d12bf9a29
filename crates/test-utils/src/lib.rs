//! Maat test utilities.
//!
//! Builders for client-shaped (camelCase) JSON payloads, so integration
//! tests exercise the same deserialisation path a caller would.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value as JsonValue, json};

/// Client payload for a student.
pub fn student(id_number: i32, first_name: &str, last_name: &str) -> Payload {
    Payload::new(json!({
        "idNumber": id_number,
        "firstName": first_name,
        "lastName": last_name,
    }))
}

/// A student with every field the status rules look at, but no house or
/// group: resolves to no status.
pub fn complete_student(id_number: i32, first_name: &str, last_name: &str) -> Payload {
    student(id_number, first_name, last_name)
        .with("email", format!("{}@student.maat.local", first_name.to_lowercase()))
        .with("gender", "F")
        .with("nationality", "EG")
        .with("program", "History")
        .with("cohort", 2024)
        .with("experience", 0)
}

/// Client payload for a staff user.
pub fn user(id_number: i32, first_name: &str, last_name: &str, roles: &[&str]) -> Payload {
    Payload::new(json!({
        "idNumber": id_number,
        "firstName": first_name,
        "lastName": last_name,
        "roles": roles,
    }))
}

/// Client payload for a house.
pub fn house(name: &str) -> Payload {
    Payload::new(json!({ "name": name }))
}

/// Client payload for a house change request.
pub fn house_change_request(student: i32, target_house: &str) -> Payload {
    Payload::new(json!({
        "student": student,
        "targetHouse": target_house,
    }))
}

/// Client payload for a points award at `date`.
pub fn points(date: DateTime<Utc>, house: &str, points: i32) -> Payload {
    Payload::new(json!({
        "date": date,
        "house": house,
        "points": points,
    }))
}

/// A date in the `yyyy-MM-dd` form clients send.
pub fn date(year: i32, month: u32, day: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// A JSON object payload under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    fields: Map<String, JsonValue>,
}

impl Payload {
    fn new(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(fields) => Self { fields },
            _ => Self { fields: Map::new() },
        }
    }

    /// Set a camelCase field.
    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Remove a field, leaving it to the receiver's default.
    pub fn without(mut self, key: &str) -> Self {
        self.fields.remove(key);
        self
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.fields.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_use_camel_case() {
        let payload = complete_student(5, "Nefer", "Titi").with("doGroup", "G1");
        let value = payload.to_json();
        assert_eq!(value["idNumber"], json!(5));
        assert_eq!(value["email"], json!("nefer@student.maat.local"));
        assert_eq!(value["doGroup"], json!("G1"));
    }

    #[test]
    fn without_drops_a_field() {
        let value = student(5, "Nefer", "Titi").without("lastName").to_json();
        assert!(value.get("lastName").is_none());
    }

    #[test]
    fn client_dates() {
        assert_eq!(date(2024, 9, 1), "2024-09-01");
        assert_eq!(date(2024, 2, 30), "");
    }
}
