//! Records, form inputs and the small enums shared by the flow and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Channel the session code is delivered through.
#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    #[default]
    Email,
    Phone,
}

impl ContactType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of company requesting the verification.
#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Company {
    Films,
    Retail,
    Finance,
    Other,
}

impl Company {
    /// Parse the lowercase wire tag. Anything else is not a company.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "films" => Some(Self::Films),
            "retail" => Some(Self::Retail),
            "finance" => Some(Self::Finance),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Films => "films",
            Self::Retail => "retail",
            Self::Finance => "finance",
            Self::Other => "other",
        }
    }

    /// Human readable label shown on the admin view.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Films => "Film company",
            Self::Retail => "Retail",
            Self::Finance => "Finance",
            Self::Other => "Other",
        }
    }

    /// Film companies must also provide the screening the person is attending.
    #[must_use]
    pub const fn requires_screening(self) -> bool {
        matches!(self, Self::Films)
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a flow in the collect → confirm → issued sequence.
#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Collect,
    Confirm,
    Issued,
}

impl Step {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collect => "collect",
            Self::Confirm => "confirm",
            Self::Issued => "issued",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw first-step input, exactly as the user typed it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplicantForm {
    pub name: String,
    pub age: String,
    pub contact: String,
    pub contact_type: ContactType,
    pub company: String,
}

/// First-step input that passed validation.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub name: String,
    pub age: String,
    pub contact: String,
    pub contact_type: ContactType,
    pub company: Company,
}

/// Raw second-step input.
///
/// The photo itself never reaches the core; only whether one was attached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfirmationForm {
    pub code: String,
    pub photo_present: bool,
    pub movie_name: String,
    pub movie_date: String,
    pub movie_time: String,
}

/// Screening details recorded for film companies.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Screening {
    pub movie_name: String,
    pub movie_date: String,
    pub movie_time: String,
}

/// A completed verification. Immutable once stored.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub name: String,
    pub age: String,
    pub contact: String,
    pub contact_type: ContactType,
    pub company: Company,
    pub verification_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screening: Option<Screening>,
    pub created_at: DateTime<Utc>,
}

impl VerificationRecord {
    #[must_use]
    pub fn new(
        applicant: Applicant,
        verification_code: String,
        screening: Option<Screening>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: applicant.name,
            age: applicant.age,
            contact: applicant.contact,
            contact_type: applicant.contact_type,
            company: applicant.company,
            verification_code,
            screening,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn company_parse_accepts_wire_tags_only() {
        assert_eq!(Company::parse("films"), Some(Company::Films));
        assert_eq!(Company::parse("retail"), Some(Company::Retail));
        assert_eq!(Company::parse("finance"), Some(Company::Finance));
        assert_eq!(Company::parse("other"), Some(Company::Other));
        assert_eq!(Company::parse("Films"), None);
        assert_eq!(Company::parse(""), None);
    }

    #[test]
    fn only_films_require_screening() {
        assert!(Company::Films.requires_screening());
        assert!(!Company::Retail.requires_screening());
        assert!(!Company::Finance.requires_screening());
        assert!(!Company::Other.requires_screening());
    }

    #[test]
    fn record_serializes_camel_case_without_screening() -> Result<()> {
        let applicant = Applicant {
            name: "Ivan".to_string(),
            age: "25".to_string(),
            contact: "a@b.com".to_string(),
            contact_type: ContactType::Email,
            company: Company::Retail,
        };
        let record = VerificationRecord::new(applicant, "AB12CD".to_string(), None, Utc::now());
        let value = serde_json::to_value(&record)?;
        let code = value
            .get("verificationCode")
            .and_then(serde_json::Value::as_str)
            .context("missing verificationCode")?;
        assert_eq!(code, "AB12CD");
        assert_eq!(
            value.get("contactType").and_then(serde_json::Value::as_str),
            Some("email")
        );
        assert!(value.get("screening").is_none());
        Ok(())
    }

    #[test]
    fn contact_type_defaults_to_email() {
        assert_eq!(ContactType::default(), ContactType::Email);
        assert_eq!(ContactType::Phone.to_string(), "phone");
    }
}
