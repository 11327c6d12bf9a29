//! Field validation and input sanitising.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Letters first, then letters, combining marks, spaces, apostrophes,
/// hyphens and periods.
#[allow(clippy::expect_used)]
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\p{L}[\p{L}\p{M} '\-.]*$").expect("valid regex literal")
});

#[allow(clippy::expect_used)]
static ROLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ROLE_[A-Z_]+$").expect("valid regex literal"));

#[allow(clippy::expect_used)]
static EMAIL_LOCAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+\-]+$").expect("valid regex literal"));

const MAX_NAME_LEN: usize = 100;
const MAX_ID_NUMBER: i64 = 9_999_999;

/// Input validation failures.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} number {id} is not valid")]
    InvalidIdNumber { kind: AccountKind, id: i64 },

    #[error("Email {email} for {kind} {id} is not a valid {kind} email.")]
    InvalidEmail {
        kind: AccountKind,
        id: i64,
        email: String,
    },

    #[error("{field} {value} for {kind} {id} is not a valid name.")]
    InvalidName {
        field: &'static str,
        value: String,
        kind: AccountKind,
        id: i64,
    },

    #[error("Date {0} is not valid. Check that it is in the proper format yyyy-MM-dd")]
    InvalidDate(String),

    #[error("Status {0} is not valid")]
    InvalidStatus(String),

    #[error("Role {0} is not valid")]
    InvalidRole(String),

    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Which account rules apply to a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Student,
    Staff,
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AccountKind::Student => "student",
            AccountKind::Staff => "staff",
        })
    }
}

/// The identity fields validated for every person.
#[derive(Debug, Clone, Copy)]
pub struct PersonFields<'a> {
    pub id_number: i64,
    pub first_name: Option<&'a str>,
    pub link_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
}

/// Validation rules that depend on configuration.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    student_domain: String,
    staff_domain: String,
}

impl ValidationRules {
    pub fn new(student_domain: impl Into<String>, staff_domain: impl Into<String>) -> Self {
        Self {
            student_domain: student_domain.into().to_lowercase(),
            staff_domain: staff_domain.into().to_lowercase(),
        }
    }

    /// Whether `email` belongs to the domain configured for `kind`.
    /// An absent email is valid.
    pub fn email_is_valid(&self, kind: AccountKind, email: Option<&str>) -> bool {
        let Some(email) = email else {
            return true;
        };
        let domain = match kind {
            AccountKind::Student => &self.student_domain,
            AccountKind::Staff => &self.staff_domain,
        };
        match email.rsplit_once('@') {
            Some((local, host)) => EMAIL_LOCAL_RE.is_match(local) && host.eq_ignore_ascii_case(domain),
            None => false,
        }
    }

    /// Check a person's identity fields, reporting the first failure.
    pub fn validate_person(
        &self,
        kind: AccountKind,
        person: PersonFields<'_>,
    ) -> Result<(), ValidationError> {
        let id = person.id_number;
        if !id_number_is_valid(id) {
            return Err(ValidationError::InvalidIdNumber { kind, id });
        }
        if !self.email_is_valid(kind, person.email) {
            return Err(ValidationError::InvalidEmail {
                kind,
                id,
                email: person.email.unwrap_or_default().to_string(),
            });
        }
        for (field, value) in [
            ("First name", person.first_name),
            ("Link name", person.link_name),
            ("Last name", person.last_name),
        ] {
            if !name_is_valid(value) {
                return Err(ValidationError::InvalidName {
                    field,
                    value: value.unwrap_or_default().to_string(),
                    kind,
                    id,
                });
            }
        }
        Ok(())
    }
}

/// Positive with at most seven digits.
pub fn id_number_is_valid(id: i64) -> bool {
    (1..=MAX_ID_NUMBER).contains(&id)
}

/// An absent name is valid.
pub fn name_is_valid(name: Option<&str>) -> bool {
    match name {
        None => true,
        Some(name) => name.chars().count() <= MAX_NAME_LEN && NAME_RE.is_match(name),
    }
}

/// Within 1900-01-01 ..= 2100-12-31.
pub fn date_is_valid(date: NaiveDate) -> bool {
    let earliest = NaiveDate::from_ymd_opt(1900, 1, 1);
    let latest = NaiveDate::from_ymd_opt(2100, 12, 31);
    matches!((earliest, latest), (Some(lo), Some(hi)) if (lo..=hi).contains(&date))
}

/// Parse a client `yyyy-MM-dd` date and range-check it.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .filter(|d| date_is_valid(*d))
        .ok_or_else(|| ValidationError::InvalidDate(value.to_string()))
}

/// Range-check an already typed date.
pub fn check_date(date: NaiveDate) -> Result<NaiveDate, ValidationError> {
    if date_is_valid(date) {
        Ok(date)
    } else {
        Err(ValidationError::InvalidDate(date.to_string()))
    }
}

pub fn role_name_is_valid(role: &str) -> bool {
    ROLE_RE.is_match(role)
}

/// Replace a leading carriage return or line feed with a space.
pub fn sanitize_explanation(text: Option<String>) -> Option<String> {
    text.map(|t| replace_leading(t, &['\r', '\n']))
}

/// As [`sanitize_explanation`], also replacing a leading `;`.
pub fn sanitize_denial_explanation(text: Option<String>) -> Option<String> {
    text.map(|t| replace_leading(t, &['\r', '\n', ';']))
}

fn replace_leading(mut text: String, chars: &[char]) -> String {
    if let Some(first) = text.chars().next()
        && chars.contains(&first)
    {
        text.replace_range(..first.len_utf8(), " ");
    }
    text
}

/// Trim and drop blank strings.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
