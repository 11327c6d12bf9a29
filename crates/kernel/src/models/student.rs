//! Students: a [`Person`] plus a [`StudentProfile`] sharing its id number.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::house::HouseSummary;
use super::person::{Person, display_name};
use super::status::{StatusInputs, StudentStatus, derive_status};

/// Student-only columns (table `student_profiles`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id_number: i32,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub program: Option<String>,
    /// Year the student enrolled.
    pub cohort: Option<i32>,
    /// Year the student joined their house.
    pub house_cohort: Option<i32>,
    pub experience: Option<i32>,
    /// Discussion/orientation group.
    pub do_group: Option<String>,
    pub status: Option<StudentStatus>,
}

/// A person joined with their student profile (relation `student_records`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id_number: i32,
    pub first_name: Option<String>,
    pub link_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
    pub date_assigned_to_house: Option<NaiveDate>,
    pub house: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub program: Option<String>,
    pub cohort: Option<i32>,
    pub house_cohort: Option<i32>,
    pub experience: Option<i32>,
    pub do_group: Option<String>,
    pub status: Option<StudentStatus>,
}

impl StudentRecord {
    pub fn join(person: Person, profile: StudentProfile) -> Self {
        Self {
            id_number: person.id_number,
            first_name: person.first_name,
            link_name: person.link_name,
            last_name: person.last_name,
            email: person.email,
            enabled: person.enabled,
            date_assigned_to_house: person.date_assigned_to_house,
            house: person.house,
            roles: person.roles,
            gender: profile.gender,
            birthday: profile.birthday,
            nationality: profile.nationality,
            program: profile.program,
            cohort: profile.cohort,
            house_cohort: profile.house_cohort,
            experience: profile.experience,
            do_group: profile.do_group,
            status: profile.status,
        }
    }

    /// Split into the rows of the two underlying tables.
    pub fn split(self) -> (Person, StudentProfile) {
        let person = Person {
            id_number: self.id_number,
            first_name: self.first_name,
            link_name: self.link_name,
            last_name: self.last_name,
            email: self.email,
            enabled: self.enabled,
            date_assigned_to_house: self.date_assigned_to_house,
            house: self.house,
            roles: self.roles,
        };
        let profile = StudentProfile {
            id_number: self.id_number,
            gender: self.gender,
            birthday: self.birthday,
            nationality: self.nationality,
            program: self.program,
            cohort: self.cohort,
            house_cohort: self.house_cohort,
            experience: self.experience,
            do_group: self.do_group,
            status: self.status,
        };
        (person, profile)
    }

    pub fn display_name(&self) -> String {
        display_name(self.first_name.as_deref(), self.last_name.as_deref())
    }

    pub fn status_inputs(&self) -> StatusInputs<'_> {
        StatusInputs {
            house: self.house.as_deref(),
            do_group: self.do_group.as_deref(),
            email: self.email.as_deref(),
            gender: self.gender.as_deref(),
            nationality: self.nationality.as_deref(),
            first_name: self.first_name.as_deref(),
            last_name: self.last_name.as_deref(),
            program: self.program.as_deref(),
            cohort: self.cohort,
            experience: self.experience,
        }
    }

    /// Re-derive `status` from the current fields.
    pub fn refresh_status(&mut self) {
        self.status = derive_status(&self.status_inputs());
    }
}

/// Client input for creating or replacing a student.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentInput {
    pub id_number: i32,
    pub first_name: Option<String>,
    pub link_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub house: Option<String>,
    pub gender: Option<String>,
    /// `yyyy-MM-dd`.
    pub birthday: Option<String>,
    pub nationality: Option<String>,
    pub program: Option<String>,
    pub cohort: Option<i32>,
    pub house_cohort: Option<i32>,
    pub experience: Option<i32>,
    pub do_group: Option<String>,
}

/// Flat student projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id_number: i32,
    pub first_name: Option<String>,
    pub link_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
    pub date_assigned_to_house: Option<NaiveDate>,
    pub roles: Vec<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub program: Option<String>,
    pub house: Option<String>,
    pub cohort: Option<i32>,
    pub house_cohort: Option<i32>,
    pub experience: Option<i32>,
    pub do_group: Option<String>,
    pub status: Option<StudentStatus>,
}

impl From<StudentRecord> for StudentSummary {
    fn from(record: StudentRecord) -> Self {
        Self {
            id_number: record.id_number,
            first_name: record.first_name,
            link_name: record.link_name,
            last_name: record.last_name,
            email: record.email,
            enabled: record.enabled,
            date_assigned_to_house: record.date_assigned_to_house,
            roles: record.roles,
            gender: record.gender,
            birthday: record.birthday,
            nationality: record.nationality,
            program: record.program,
            house: record.house,
            cohort: record.cohort,
            house_cohort: record.house_cohort,
            experience: record.experience,
            do_group: record.do_group,
            status: record.status,
        }
    }
}

/// Student projection with the house expanded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentWithHouse {
    pub id_number: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
    pub roles: Vec<String>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub program: Option<String>,
    pub house: Option<HouseSummary>,
    pub cohort: Option<i32>,
    pub experience: Option<i32>,
    pub do_group: Option<String>,
    pub status: Option<StudentStatus>,
}

impl StudentWithHouse {
    pub fn new(record: StudentRecord, house: Option<HouseSummary>) -> Self {
        Self {
            id_number: record.id_number,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            enabled: record.enabled,
            roles: record.roles,
            gender: record.gender,
            nationality: record.nationality,
            program: record.program,
            house,
            cohort: record.cohort,
            experience: record.experience,
            do_group: record.do_group,
            status: record.status,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> StudentRecord {
        StudentRecord {
            id_number: 1001,
            first_name: Some("Nefer".to_string()),
            link_name: None,
            last_name: Some("Titi".to_string()),
            email: Some("nefer@student.maat.local".to_string()),
            enabled: true,
            date_assigned_to_house: None,
            house: None,
            roles: vec!["ROLE_STUDENT".to_string()],
            gender: Some("F".to_string()),
            birthday: None,
            nationality: Some("EG".to_string()),
            program: Some("History".to_string()),
            cohort: Some(2024),
            house_cohort: None,
            experience: Some(0),
            do_group: None,
            status: None,
        }
    }

    #[test]
    fn split_then_join_is_identity() {
        let original = record();
        let (person, profile) = original.clone().split();
        assert_eq!(person.id_number, profile.id_number);
        assert_eq!(StudentRecord::join(person, profile), original);
    }

    #[test]
    fn refresh_status_follows_the_house() {
        let mut student = record();
        student.refresh_status();
        assert_eq!(student.status, None);

        student.house = Some("Horus".to_string());
        student.refresh_status();
        assert_eq!(student.status, Some(StudentStatus::InHouse));
    }

    #[test]
    fn stored_row_uses_snake_case_and_status_labels() {
        let mut student = record();
        student.do_group = Some("G1".to_string());
        student.refresh_status();
        let row = serde_json::to_value(&student).unwrap();
        assert_eq!(row["do_group"], json!("G1"));
        assert_eq!(row["status"], json!("READY FOR HOUSE"));
    }

    #[test]
    fn summary_uses_camel_case() {
        let summary = StudentSummary::from(record());
        let value = serde_json::to_value(summary).unwrap();
        assert_eq!(value["idNumber"], json!(1001));
        assert_eq!(value["firstName"], json!("Nefer"));
        assert!(value.get("first_name").is_none());
    }
}
