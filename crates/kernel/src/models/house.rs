//! Houses.

use serde::{Deserialize, Serialize};

use super::person::Person;

/// House record (table `houses`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub name: String,
    /// Id number of the staff member keeping the house.
    pub housekeeper: Option<i32>,
    #[serde(default)]
    pub prefects: Vec<i32>,
    pub population: Option<i32>,
    #[serde(default)]
    pub active_years: Vec<i32>,
}

impl House {
    /// Overwrite every mutable field from `input`. The name is kept.
    pub fn apply(&mut self, input: HouseInput) {
        self.housekeeper = input.housekeeper;
        self.prefects = input.prefects;
        self.population = input.population;
        self.active_years = input.active_years;
    }
}

/// Client input for creating or replacing a house.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HouseInput {
    pub name: String,
    pub housekeeper: Option<i32>,
    pub prefects: Vec<i32>,
    pub population: Option<i32>,
    pub active_years: Vec<i32>,
}

impl From<HouseInput> for House {
    fn from(input: HouseInput) -> Self {
        Self {
            name: input.name,
            housekeeper: input.housekeeper,
            prefects: input.prefects,
            population: input.population,
            active_years: input.active_years,
        }
    }
}

/// House projection with the housekeeper and prefects resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseSummary {
    pub name: String,
    pub house_keeper_name: Option<String>,
    pub house_keeper_id_number: Option<i32>,
    pub house_keeper_email: Option<String>,
    /// `[id number, name, email]` per prefect.
    pub prefects: Vec<Vec<String>>,
    pub population: Option<i32>,
    pub active_years: Vec<i32>,
}

impl HouseSummary {
    pub fn new(house: House, housekeeper: Option<&Person>, prefects: &[Person]) -> Self {
        let mut active_years = house.active_years;
        active_years.sort_unstable();
        Self {
            name: house.name,
            house_keeper_name: housekeeper.map(Person::display_name),
            house_keeper_id_number: housekeeper.map(|p| p.id_number),
            house_keeper_email: housekeeper.and_then(|p| p.email.clone()),
            prefects: prefects
                .iter()
                .map(|p| {
                    vec![
                        p.id_number.to_string(),
                        p.display_name(),
                        p.email.clone().unwrap_or_default(),
                    ]
                })
                .collect(),
            population: house.population,
            active_years,
        }
    }
}
