use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;
use crate::validation::ValidationErrors;

/// Account role; fixed once the profile is created
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Council,
    Contractor,
}

string_enum!(UserRole, "user role" {
    Council => "council",
    Contractor => "contractor",
});

/// User profile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub role: UserRole,
    pub username: String,
    pub email: Option<String>,
    pub full_name: String,
    pub company_name: String,
    pub phone: String,
    pub address: String,
    pub experience_years: i32,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Company name for contractors, full name for councils, username as the
    /// last resort.
    pub fn display_name(&self) -> String {
        let candidates: &[&str] = match self.role {
            UserRole::Contractor => &[self.company_name.as_str(), self.full_name.as_str()],
            UserRole::Council => &[self.full_name.as_str()],
        };

        candidates
            .iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or(self.username.as_str())
            .to_string()
    }

    pub fn is_council(&self) -> bool {
        self.role == UserRole::Council
    }

    pub fn is_contractor(&self) -> bool {
        self.role == UserRole::Contractor
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            role: self.role,
            display_name: self.display_name(),
            is_verified: self.is_verified,
        }
    }
}

/// Compact user reference embedded in other responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub role: UserRole,
    pub display_name: String,
    pub is_verified: bool,
}

/// Token identity plus the stored profile, if any
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub profile: Option<User>,
}

/// Request DTO for creating or updating the caller's profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertProfileRequest {
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub experience_years: Option<i32>,
}

impl UpsertProfileRequest {
    /// `creating` is true when no profile exists yet, in which case a role is
    /// mandatory.
    pub fn validate(&self, creating: bool) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if creating {
            errors.check(
                self.role.is_some(),
                "role",
                "role is required when creating a profile",
            );
        }
        if let Some(username) = &self.username {
            errors.require_text(username, "username");
        }
        if let Some(years) = self.experience_years {
            errors.check(years >= 0, "experience_years", "experience_years cannot be negative");
        }
        errors.into_result()
    }
}

impl UpsertProfileRequest {
    /// Applies the present mutable fields; the role is never touched here.
    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(full_name) = self.full_name {
            user.full_name = full_name;
        }
        if let Some(company_name) = self.company_name {
            user.company_name = company_name;
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        if let Some(address) = self.address {
            user.address = address;
        }
        if let Some(years) = self.experience_years {
            user.experience_years = years;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole, company: &str, full: &str) -> User {
        User {
            id: Uuid::new_v4(),
            role,
            username: "jdoe".into(),
            email: None,
            full_name: full.into(),
            company_name: company.into(),
            phone: String::new(),
            address: String::new(),
            experience_years: 0,
            is_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_contractor_display_prefers_company() {
        assert_eq!(user(UserRole::Contractor, "Acme Pipes", "Jane Doe").display_name(), "Acme Pipes");
        assert_eq!(user(UserRole::Contractor, "", "Jane Doe").display_name(), "Jane Doe");
        assert_eq!(user(UserRole::Contractor, " ", "").display_name(), "jdoe");
    }

    #[test]
    fn test_council_display_ignores_company() {
        assert_eq!(user(UserRole::Council, "Acme", "Leeds Council").display_name(), "Leeds Council");
        assert_eq!(user(UserRole::Council, "Acme", "").display_name(), "jdoe");
    }

    #[test]
    fn test_role_round_trips_through_str() {
        assert_eq!("council".parse::<UserRole>().unwrap(), UserRole::Council);
        assert_eq!(UserRole::Contractor.to_string(), "contractor");
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_profile_creation_requires_role() {
        let err = UpsertProfileRequest::default().validate(true).unwrap_err();
        assert_eq!(err.fields()[0].field, "role");
        assert!(UpsertProfileRequest::default().validate(false).is_ok());
    }

    #[test]
    fn test_negative_experience_rejected() {
        let req = UpsertProfileRequest {
            experience_years: Some(-1),
            ..Default::default()
        };
        assert_eq!(req.validate(false).unwrap_err().fields()[0].field, "experience_years");
    }
}
