//! Client filter criteria, one struct per entity.
//!
//! Every key is optional on the wire. An empty list places no restriction,
//! an absent range bound is unbounded and a blank search string is ignored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Roles a user listing is restricted to when the client names none.
pub const STAFF_ROLES: [&str; 6] = [
    "ROLE_ADMIN",
    "ROLE_TEACHER",
    "ROLE_STUDY_ADVISOR",
    "ROLE_TA",
    "ROLE_HOUSE_KEEPER",
    "ROLE_PREFECT",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentCriteria {
    pub gender: Vec<String>,
    pub program: Vec<String>,
    pub house: Vec<String>,
    /// Cohort years.
    pub year: Vec<i32>,
    pub experience: Vec<i32>,
    pub do_group: Vec<String>,
    pub status: Vec<String>,
    /// Lower bound on the date the student joined their house.
    pub start_date: Option<NaiveDate>,
    /// Upper bound on the date the student joined their house.
    pub end_date: Option<NaiveDate>,
    pub search_string: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserCriteria {
    pub house: Vec<String>,
    /// Matches users holding any of these roles.
    pub roles: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search_string: Option<String>,
}

impl Default for UserCriteria {
    fn default() -> Self {
        Self {
            house: Vec::new(),
            roles: STAFF_ROLES.iter().map(|r| r.to_string()).collect(),
            start_date: None,
            end_date: None,
            search_string: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HouseChangeRequestCriteria {
    pub target_house: Vec<String>,
    pub old_house: Vec<String>,
    /// Matches when either the target or the old house is listed.
    pub either_house: Vec<String>,
    pub status: Vec<String>,
    /// Lower bound on the request date.
    pub start_date: Option<NaiveDate>,
    /// Upper bound on the request date.
    pub end_date: Option<NaiveDate>,
    pub search_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HousesCupPointsCriteria {
    pub house: Vec<String>,
    pub start_points: Option<i32>,
    pub end_points: Option<i32>,
    pub start_date: Option<NaiveDate>,
    /// Inclusive: awards made at any time on this day match.
    pub end_date: Option<NaiveDate>,
    pub academic_year: Vec<i32>,
    pub search_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HouseCriteria {
    /// Matches houses active in any of these years.
    pub active_years: Vec<i32>,
    pub search_string: Option<String>,
}

/// Roles and permissions have nothing to filter on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoCriteria {}
