//! Student status derivation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a student stands in the house assignment process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudentStatus {
    #[serde(rename = "INHOUSE")]
    InHouse,
    #[serde(rename = "READY FOR HOUSE")]
    ReadyForHouse,
    #[serde(rename = "MISSING CANVAS INFO")]
    MissingCanvasInfo,
    #[serde(rename = "MISSING OSIRIS INFO")]
    MissingOsirisInfo,
    #[serde(rename = "MISSING INFORMATION")]
    MissingInformation,
}

impl StudentStatus {
    pub const ALL: [StudentStatus; 5] = [
        StudentStatus::InHouse,
        StudentStatus::ReadyForHouse,
        StudentStatus::MissingCanvasInfo,
        StudentStatus::MissingOsirisInfo,
        StudentStatus::MissingInformation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StudentStatus::InHouse => "INHOUSE",
            StudentStatus::ReadyForHouse => "READY FOR HOUSE",
            StudentStatus::MissingCanvasInfo => "MISSING CANVAS INFO",
            StudentStatus::MissingOsirisInfo => "MISSING OSIRIS INFO",
            StudentStatus::MissingInformation => "MISSING INFORMATION",
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StudentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(())
    }
}

/// The student fields status derivation looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusInputs<'a> {
    pub house: Option<&'a str>,
    pub do_group: Option<&'a str>,
    pub email: Option<&'a str>,
    pub gender: Option<&'a str>,
    pub nationality: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub program: Option<&'a str>,
    pub cohort: Option<i32>,
    pub experience: Option<i32>,
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Derive a student's status. The first matching rule wins; `None` means
/// the record is complete but not yet grouped.
pub fn derive_status(inputs: &StatusInputs<'_>) -> Option<StudentStatus> {
    let has_email = present(inputs.email);
    let has_gender = present(inputs.gender);
    let has_nationality = present(inputs.nationality);

    if present(inputs.house) {
        return Some(StudentStatus::InHouse);
    }
    if present(inputs.do_group) {
        return Some(StudentStatus::ReadyForHouse);
    }
    if !has_email && !(has_gender && has_nationality) {
        return Some(StudentStatus::MissingInformation);
    }
    if !has_email {
        return Some(StudentStatus::MissingCanvasInfo);
    }
    if !has_gender || !has_nationality {
        return Some(StudentStatus::MissingOsirisInfo);
    }
    let core_missing = !present(inputs.first_name)
        || !present(inputs.last_name)
        || !present(inputs.program)
        || inputs.cohort.is_none()
        || inputs.experience.is_none();
    if core_missing {
        return Some(StudentStatus::MissingInformation);
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn complete() -> StatusInputs<'static> {
        StatusInputs {
            house: None,
            do_group: None,
            email: Some("a@student.maat.local"),
            gender: Some("F"),
            nationality: Some("NL"),
            first_name: Some("Ann"),
            last_name: Some("Bee"),
            program: Some("CS"),
            cohort: Some(2024),
            experience: Some(1),
        }
    }

    #[test]
    fn house_alone_is_in_house() {
        let inputs = StatusInputs {
            house: Some("Horus"),
            ..Default::default()
        };
        assert_eq!(derive_status(&inputs), Some(StudentStatus::InHouse));
    }

    #[test]
    fn group_without_house_is_ready() {
        let inputs = StatusInputs {
            do_group: Some("G7"),
            ..Default::default()
        };
        assert_eq!(derive_status(&inputs), Some(StudentStatus::ReadyForHouse));
    }

    #[test]
    fn missing_email_and_personal_data() {
        let inputs = StatusInputs {
            email: None,
            gender: None,
            ..complete()
        };
        assert_eq!(derive_status(&inputs), Some(StudentStatus::MissingInformation));
    }

    #[test]
    fn missing_email_only() {
        let inputs = StatusInputs {
            email: None,
            ..complete()
        };
        assert_eq!(derive_status(&inputs), Some(StudentStatus::MissingCanvasInfo));
    }

    #[test]
    fn missing_registry_data_only() {
        let inputs = StatusInputs {
            nationality: Some("  "),
            ..complete()
        };
        assert_eq!(derive_status(&inputs), Some(StudentStatus::MissingOsirisInfo));
    }

    #[test]
    fn missing_core_fields() {
        let inputs = StatusInputs {
            experience: None,
            ..complete()
        };
        assert_eq!(derive_status(&inputs), Some(StudentStatus::MissingInformation));
    }

    #[test]
    fn complete_record_has_no_status() {
        assert_eq!(derive_status(&complete()), None);
    }

    #[test]
    fn labels_round_trip() {
        for status in StudentStatus::ALL {
            assert_eq!(status.as_str().parse::<StudentStatus>(), Ok(status));
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::json!(status.as_str())
            );
        }
    }
}
