//! People: the core record shared by staff users and students.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Role every student account carries.
pub const ROLE_STUDENT: &str = "ROLE_STUDENT";

/// Person record (table `people`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id_number: i32,
    pub first_name: Option<String>,
    pub link_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
    /// Set when the person joins a house and whenever the house changes.
    pub date_assigned_to_house: Option<NaiveDate>,
    pub house: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Person {
    /// "First Last", skipping absent parts.
    pub fn display_name(&self) -> String {
        display_name(self.first_name.as_deref(), self.last_name.as_deref())
    }

    /// Move the person to `house`, stamping the assignment date on change.
    pub fn assign_house(&mut self, house: Option<String>, today: NaiveDate) {
        if house.is_some() && house != self.house {
            self.date_assigned_to_house = Some(today);
        }
        self.house = house;
    }
}

pub(crate) fn display_name(first: Option<&str>, last: Option<&str>) -> String {
    [first, last]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Client input for creating or replacing a staff user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub id_number: i32,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub link_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub house: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Flat user projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id_number: i32,
    pub first_name: Option<String>,
    pub link_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
    pub date_assigned_to_house: Option<NaiveDate>,
    pub roles: Vec<String>,
    pub house: Option<String>,
}

impl From<Person> for UserSummary {
    fn from(person: Person) -> Self {
        Self {
            id_number: person.id_number,
            first_name: person.first_name,
            link_name: person.link_name,
            last_name: person.last_name,
            email: person.email,
            enabled: person.enabled,
            date_assigned_to_house: person.date_assigned_to_house,
            roles: person.roles,
            house: person.house,
        }
    }
}
