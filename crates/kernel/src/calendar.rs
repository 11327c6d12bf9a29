//! Academic year resolution.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

/// Maps a date to the academic year it falls in.
pub trait AcademicCalendar: Send + Sync {
    fn academic_year_of(&self, date: NaiveDate) -> i32;
}

/// Academic years that start on the same day every calendar year.
///
/// A year is labelled by the calendar year it starts in: with a `09-01` start,
/// 2025-03-10 belongs to academic year 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedStartCalendar {
    month: u32,
    day: u32,
}

impl FixedStartCalendar {
    /// Returns `None` unless `month`/`day` name a real calendar day.
    pub fn new(month: u32, day: u32) -> Option<Self> {
        // 2000 is a leap year, so 02-29 is accepted.
        NaiveDate::from_ymd_opt(2000, month, day).map(|_| Self { month, day })
    }
}

impl FromStr for FixedStartCalendar {
    type Err = String;

    /// Parse an `MM-DD` start day.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("'{s}' is not a valid MM-DD academic year start");
        let (month, day) = s.trim().split_once('-').ok_or_else(invalid)?;
        let month = month.parse().map_err(|_| invalid())?;
        let day = day.parse().map_err(|_| invalid())?;
        Self::new(month, day).ok_or_else(invalid)
    }
}

impl AcademicCalendar for FixedStartCalendar {
    fn academic_year_of(&self, date: NaiveDate) -> i32 {
        if (date.month(), date.day()) >= (self.month, self.day) {
            date.year()
        } else {
            date.year() - 1
        }
    }
}
