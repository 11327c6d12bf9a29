//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

use crate::calendar::FixedStartCalendar;
use crate::validate::ValidationRules;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Email domain student accounts must use (default: student.maat.local).
    pub student_email_domain: String,

    /// Email domain staff accounts must use (default: maat.local).
    pub staff_email_domain: String,

    /// First day of the academic year, from ACADEMIC_YEAR_START (`MM-DD`).
    /// Unset means points cannot be awarded.
    pub academic_year_start: Option<FixedStartCalendar>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let student_email_domain = env::var("STUDENT_EMAIL_DOMAIN")
            .unwrap_or_else(|_| "student.maat.local".to_string())
            .to_lowercase();

        let staff_email_domain = env::var("STAFF_EMAIL_DOMAIN")
            .unwrap_or_else(|_| "maat.local".to_string())
            .to_lowercase();

        let academic_year_start = match env::var("ACADEMIC_YEAR_START") {
            Ok(value) => Some(
                value
                    .parse::<FixedStartCalendar>()
                    .map_err(anyhow::Error::msg)
                    .context("ACADEMIC_YEAR_START must be MM-DD")?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            database_max_connections,
            student_email_domain,
            staff_email_domain,
            academic_year_start,
        })
    }

    /// Validation rules for the configured email domains.
    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules::new(&self.student_email_domain, &self.staff_email_domain)
    }
}
