//! Houses cup point awards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Award record (table `houses_cup`), keyed by the award instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousesCupPoints {
    pub date: DateTime<Utc>,
    pub student: Option<i32>,
    pub assigning_user: Option<i32>,
    pub explanation: Option<String>,
    pub house: String,
    pub points: i32,
    /// Derived from `date`.
    pub academic_year: i32,
}

/// Client input for awarding or correcting points.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HousesCupPointsInput {
    /// Defaults to now on creation.
    pub date: Option<DateTime<Utc>>,
    pub student: Option<i32>,
    pub assigning_user: Option<i32>,
    pub explanation: Option<String>,
    pub house: Option<String>,
    pub points: i32,
}

/// Award projection with people resolved to names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HousesCupPointsSummary {
    pub date: DateTime<Utc>,
    pub student: Option<String>,
    pub assigning_user: Option<String>,
    pub explanation: Option<String>,
    pub house: String,
    pub points: i32,
    pub academic_year: i32,
}

impl HousesCupPointsSummary {
    pub fn new(
        award: HousesCupPoints,
        student: Option<String>,
        assigning_user: Option<String>,
    ) -> Self {
        Self {
            date: award.date,
            student,
            assigning_user,
            explanation: award.explanation,
            house: award.house,
            points: award.points,
            academic_year: award.academic_year,
        }
    }
}

/// Points summed per house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HouseTotal {
    pub house: String,
    pub points: i64,
}

/// Points summed per student within a house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentTotal {
    pub student: Option<i32>,
    pub points: i64,
}
