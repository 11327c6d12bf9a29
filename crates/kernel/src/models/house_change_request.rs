//! Requests by students to move to another house.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validate::ValidationError;

/// Decision state of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    #[default]
    Undecided,
    Approved,
    Denied,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Undecided => "UNDECIDED",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Denied => "DENIED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "UNDECIDED" => Ok(RequestStatus::Undecided),
            "APPROVED" => Ok(RequestStatus::Approved),
            "DENIED" => Ok(RequestStatus::Denied),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// Request record (table `house_change_requests`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseChangeRequest {
    pub id: Uuid,
    /// Id number of the requesting student.
    pub student: i32,
    pub target_house: String,
    pub old_house: Option<String>,
    pub explanation: Option<String>,
    pub request_date: NaiveDate,
    pub status: RequestStatus,
    pub denial_explanation: Option<String>,
    /// Stamped once, when the request first leaves `UNDECIDED`.
    pub decided_date: Option<NaiveDate>,
}

/// Validated replacement values for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestChanges {
    pub student: i32,
    pub target_house: String,
    pub old_house: Option<String>,
    pub explanation: Option<String>,
    pub request_date: NaiveDate,
    pub status: RequestStatus,
    pub denial_explanation: Option<String>,
}

impl HouseChangeRequest {
    /// A fresh request with a newly generated id.
    pub fn new(changes: RequestChanges, today: NaiveDate) -> Self {
        let mut request = Self {
            id: Uuid::now_v7(),
            student: changes.student,
            target_house: changes.target_house.clone(),
            old_house: None,
            explanation: None,
            request_date: changes.request_date,
            status: RequestStatus::Undecided,
            denial_explanation: None,
            decided_date: None,
        };
        request.apply(changes, today);
        request
    }

    /// Overwrite the mutable fields. Leaving `UNDECIDED` stamps
    /// `decided_date` with `today`.
    pub fn apply(&mut self, changes: RequestChanges, today: NaiveDate) {
        if changes.status != RequestStatus::Undecided && self.status == RequestStatus::Undecided {
            self.decided_date = Some(today);
        }
        self.student = changes.student;
        self.target_house = changes.target_house;
        self.old_house = changes.old_house;
        self.explanation = changes.explanation;
        self.request_date = changes.request_date;
        self.status = changes.status;
        self.denial_explanation = changes.denial_explanation;
    }
}

/// Client input for creating or replacing a request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HouseChangeRequestInput {
    pub student: i32,
    pub target_house: Option<String>,
    /// Defaults to the student's current house.
    pub old_house: Option<String>,
    pub explanation: Option<String>,
    /// `yyyy-MM-dd`; defaults to today.
    pub request_date: Option<String>,
    /// Defaults to `UNDECIDED`.
    pub status: Option<String>,
    pub denial_explanation: Option<String>,
}

/// Request projection carrying the student's name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseChangeRequestSummary {
    pub id: Uuid,
    pub student: i32,
    pub student_name: Option<String>,
    pub target_house: String,
    pub old_house: Option<String>,
    pub explanation: Option<String>,
    pub request_date: NaiveDate,
    pub status: RequestStatus,
    pub denial_explanation: Option<String>,
    pub decided_date: Option<NaiveDate>,
}

impl HouseChangeRequestSummary {
    pub fn new(request: HouseChangeRequest, student_name: Option<String>) -> Self {
        Self {
            id: request.id,
            student: request.student,
            student_name,
            target_house: request.target_house,
            old_house: request.old_house,
            explanation: request.explanation,
            request_date: request.request_date,
            status: request.status,
            denial_explanation: request.denial_explanation,
            decided_date: request.decided_date,
        }
    }
}

/// Singleton row controlling whether requests are accepted
/// (table `house_change_request_settings`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseChangeRequestSettings {
    pub id: i32,
    pub enabled: bool,
}

impl HouseChangeRequestSettings {
    pub const ID: i32 = 1;
}

impl Default for HouseChangeRequestSettings {
    fn default() -> Self {
        Self {
            id: Self::ID,
            enabled: true,
        }
    }
}
