//! Static per-entity listing metadata.
//!
//! Each entity declares the relation it is listed from, its natural key, the
//! columns hidden from facet extraction, the client sort names it accepts and
//! the text columns free-text search runs over.

use std::fmt;
use std::str::FromStr;

/// The entity types exposed by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    House,
    Student,
    User,
    HouseChangeRequest,
    HousesCupPoints,
    Role,
    Permissions,
}

impl Entity {
    /// Every entity, in display order.
    pub const ALL: [Entity; 7] = [
        Entity::House,
        Entity::Student,
        Entity::User,
        Entity::HouseChangeRequest,
        Entity::HousesCupPoints,
        Entity::Role,
        Entity::Permissions,
    ];

    /// Listing metadata for this entity.
    pub fn catalog(self) -> &'static EntityCatalog {
        match self {
            Entity::House => &HOUSES,
            Entity::Student => &STUDENTS,
            Entity::User => &USERS,
            Entity::HouseChangeRequest => &HOUSE_CHANGE_REQUESTS,
            Entity::HousesCupPoints => &HOUSES_CUP,
            Entity::Role => &ROLES,
            Entity::Permissions => &PERMISSIONS,
        }
    }

    /// Command-line / path name of the entity.
    pub fn as_str(self) -> &'static str {
        match self {
            Entity::House => "houses",
            Entity::Student => "students",
            Entity::User => "users",
            Entity::HouseChangeRequest => "house-change-requests",
            Entity::HousesCupPoints => "houses-cup",
            Entity::Role => "roles",
            Entity::Permissions => "permissions",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Entity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Entity::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Entity::ALL.iter().map(|e| e.as_str()).collect();
                format!("unknown entity '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Listing metadata for one entity.
#[derive(Debug)]
pub struct EntityCatalog {
    pub entity: Entity,
    /// Relation rows are read from.
    pub table: &'static str,
    /// Natural key column, used as the ordering tiebreaker.
    pub key_column: &'static str,
    /// Columns never reported by facet extraction.
    pub excluded_columns: &'static [&'static str],
    /// Accepted sort names mapped to storage columns.
    pub sortable_columns: &'static [(&'static str, &'static str)],
    /// Text columns searched by a free-text criterion.
    pub searchable_columns: &'static [&'static str],
    /// Sort name used when the caller gives none.
    pub default_sort: &'static str,
}

impl EntityCatalog {
    /// Storage column for a client sort name.
    pub fn sort_column(&self, sort_on: &str) -> Option<&'static str> {
        self.sortable_columns
            .iter()
            .find(|(name, _)| *name == sort_on)
            .map(|(_, column)| *column)
    }
}

const PERSON_SORTS: &[(&str, &str)] = &[
    ("idNumber", "id_number"),
    ("firstName", "first_name"),
    ("linkName", "link_name"),
    ("lastName", "last_name"),
    ("email", "email"),
    ("house", "house"),
    ("dateAssignedToHouse", "date_assigned_to_house"),
];

const PERSON_SEARCH: &[&str] = &["first_name", "link_name", "last_name", "email"];

pub static HOUSES: EntityCatalog = EntityCatalog {
    entity: Entity::House,
    table: "houses",
    key_column: "name",
    excluded_columns: &["population", "housekeeper", "prefects"],
    sortable_columns: &[
        ("name", "name"),
        ("housekeeper", "housekeeper"),
        ("population", "population"),
    ],
    searchable_columns: &["name"],
    default_sort: "name",
};

pub static STUDENTS: EntityCatalog = EntityCatalog {
    entity: Entity::Student,
    table: "student_records",
    key_column: "id_number",
    excluded_columns: &[
        "id_number",
        "first_name",
        "last_name",
        "link_name",
        "email",
        "birthday",
        "date_assigned_to_house",
    ],
    sortable_columns: &[
        ("idNumber", "id_number"),
        ("firstName", "first_name"),
        ("linkName", "link_name"),
        ("lastName", "last_name"),
        ("email", "email"),
        ("house", "house"),
        ("dateAssignedToHouse", "date_assigned_to_house"),
        ("gender", "gender"),
        ("birthday", "birthday"),
        ("nationality", "nationality"),
        ("program", "program"),
        ("year", "cohort"),
        ("houseYear", "house_cohort"),
        ("experience", "experience"),
        ("doGroup", "do_group"),
        ("status", "status"),
    ],
    searchable_columns: PERSON_SEARCH,
    default_sort: "lastName",
};

pub static USERS: EntityCatalog = EntityCatalog {
    entity: Entity::User,
    table: "people",
    key_column: "id_number",
    excluded_columns: &[
        "id_number",
        "first_name",
        "last_name",
        "link_name",
        "email",
        "date_assigned_to_house",
    ],
    sortable_columns: PERSON_SORTS,
    searchable_columns: PERSON_SEARCH,
    default_sort: "lastName",
};

pub static HOUSE_CHANGE_REQUESTS: EntityCatalog = EntityCatalog {
    entity: Entity::HouseChangeRequest,
    table: "house_change_requests",
    key_column: "id",
    excluded_columns: &[
        "id",
        "student",
        "explanation",
        "denial_explanation",
        "request_date",
        "decided_date",
    ],
    sortable_columns: &[
        ("student", "student"),
        ("targetHouse", "target_house"),
        ("oldHouse", "old_house"),
        ("requestDate", "request_date"),
        ("status", "status"),
        ("decidedDate", "decided_date"),
    ],
    searchable_columns: &["explanation", "denial_explanation"],
    default_sort: "decidedDate",
};

pub static HOUSES_CUP: EntityCatalog = EntityCatalog {
    entity: Entity::HousesCupPoints,
    table: "houses_cup",
    key_column: "date",
    excluded_columns: &["date", "student", "assigning_user", "explanation", "points"],
    sortable_columns: &[
        ("date", "date"),
        ("student", "student"),
        ("assigningUser", "assigning_user"),
        ("house", "house"),
        ("points", "points"),
        ("academicYear", "academic_year"),
    ],
    searchable_columns: &["explanation", "house"],
    default_sort: "date",
};

pub static ROLES: EntityCatalog = EntityCatalog {
    entity: Entity::Role,
    table: "roles",
    key_column: "role",
    excluded_columns: &[],
    sortable_columns: &[("role", "role")],
    searchable_columns: &[],
    default_sort: "role",
};

pub static PERMISSIONS: EntityCatalog = EntityCatalog {
    entity: Entity::Permissions,
    table: "permissions",
    key_column: "role",
    excluded_columns: &[],
    sortable_columns: &[("role", "role")],
    searchable_columns: &[],
    default_sort: "role",
};
