//! Storage relations known to the stores.
//!
//! Mirrors `migrations/0001_schema.sql`.

/// A relation assembled by joining an extension table onto a primary table.
#[derive(Debug)]
pub struct JoinSpec {
    pub primary: &'static str,
    pub extension: &'static str,
    /// Column shared by both tables.
    pub on: &'static str,
}

/// A table or view.
#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    pub key: &'static str,
    /// Column groups that must be unique together. Nulls compare equal.
    pub unique: &'static [&'static [&'static str]],
    /// Set for read-only joined relations.
    pub join: Option<JoinSpec>,
}

pub const PEOPLE: &str = "people";
pub const STUDENT_PROFILES: &str = "student_profiles";
pub const STUDENT_RECORDS: &str = "student_records";
pub const HOUSES: &str = "houses";
pub const HOUSE_CHANGE_REQUESTS: &str = "house_change_requests";
pub const HOUSES_CUP: &str = "houses_cup";
pub const ROLES: &str = "roles";
pub const PERMISSIONS: &str = "permissions";
pub const HOUSE_CHANGE_REQUEST_SETTINGS: &str = "house_change_request_settings";

pub static TABLES: &[TableSpec] = &[
    TableSpec {
        name: PEOPLE,
        key: "id_number",
        unique: &[],
        join: None,
    },
    TableSpec {
        name: STUDENT_PROFILES,
        key: "id_number",
        unique: &[],
        join: None,
    },
    TableSpec {
        name: STUDENT_RECORDS,
        key: "id_number",
        unique: &[],
        join: Some(JoinSpec {
            primary: PEOPLE,
            extension: STUDENT_PROFILES,
            on: "id_number",
        }),
    },
    TableSpec {
        name: HOUSES,
        key: "name",
        unique: &[],
        join: None,
    },
    TableSpec {
        name: HOUSE_CHANGE_REQUESTS,
        key: "id",
        unique: &[&["student", "old_house", "target_house", "explanation"]],
        join: None,
    },
    TableSpec {
        name: HOUSES_CUP,
        key: "date",
        unique: &[],
        join: None,
    },
    TableSpec {
        name: ROLES,
        key: "role",
        unique: &[],
        join: None,
    },
    TableSpec {
        name: PERMISSIONS,
        key: "role",
        unique: &[],
        join: None,
    },
    TableSpec {
        name: HOUSE_CHANGE_REQUEST_SETTINGS,
        key: "id",
        unique: &[],
        join: None,
    },
];

/// Look up a relation by name.
pub fn table(name: &str) -> Option<&'static TableSpec> {
    TABLES.iter().find(|t| t.name == name)
}
