use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;
use crate::validation::ValidationErrors;

/// Team status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    #[default]
    Forming,
    Active,
    Completed,
    Disbanded,
}

string_enum!(TeamStatus, "team status" {
    Forming => "forming",
    Active => "active",
    Completed => "completed",
    Disbanded => "disbanded",
});

impl TeamStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Forming => "Forming",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Disbanded => "Disbanded",
        }
    }
}

/// Role a contractor holds inside a team
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Lead,
    #[default]
    Member,
    Specialist,
}

string_enum!(MemberRole, "member role" {
    Lead => "lead",
    Member => "member",
    Specialist => "specialist",
});

impl MemberRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lead => "Lead Contractor",
            Self::Member => "Team Member",
            Self::Specialist => "Specialist",
        }
    }
}

/// Contractor team entity; one per project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorTeam {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub lead_contractor_id: Option<Uuid>,
    pub status: TeamStatus,
    pub notes: String,
    pub assigned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Team membership entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Uuid,
    pub team_id: Uuid,
    pub contractor_id: Uuid,
    pub role: MemberRole,
    pub assigned_at: DateTime<Utc>,
}

/// Request DTO for creating a team by hand
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamRequest {
    pub project_id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateTeamRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            errors.require_text(name, "name");
        }
        errors.into_result()
    }
}

/// Request DTO for updating a team
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTeamRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<TeamStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub lead_contractor_id: Option<Uuid>,
}

impl UpdateTeamRequest {
    /// A new lead must already be on the team.
    pub fn validate(&self, members: &[TeamMember]) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            errors.require_text(name, "name");
        }
        if let Some(lead) = self.lead_contractor_id {
            errors.check(
                members.iter().any(|m| m.contractor_id == lead),
                "lead_contractor_id",
                "The lead contractor must be a member of the team.",
            );
        }
        errors.into_result()
    }

    pub fn apply(self, team: &mut ContractorTeam) {
        if let Some(name) = self.name {
            team.name = name;
        }
        if let Some(status) = self.status {
            team.status = status;
        }
        if let Some(notes) = self.notes {
            team.notes = notes;
        }
        if let Some(lead) = self.lead_contractor_id {
            team.lead_contractor_id = Some(lead);
        }
    }
}

/// Request DTO for adding a member by hand
#[derive(Debug, Clone, Deserialize)]
pub struct AddTeamMemberRequest {
    pub contractor_id: Uuid,
    #[serde(default)]
    pub role: Option<MemberRole>,
}

/// Member line in a team response
#[derive(Debug, Clone, Serialize)]
pub struct TeamMemberResponse {
    pub contractor_id: Uuid,
    pub display_name: String,
    pub role: MemberRole,
    pub role_label: &'static str,
    pub assigned_at: DateTime<Utc>,
}

/// Team with its roster
#[derive(Debug, Clone, Serialize)]
pub struct TeamResponse {
    #[serde(flatten)]
    pub team: ContractorTeam,
    pub project_title: String,
    pub members: Vec<TeamMemberResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_must_be_member() {
        let team_id = Uuid::new_v4();
        let member = TeamMember {
            id: Uuid::new_v4(),
            team_id,
            contractor_id: Uuid::new_v4(),
            role: MemberRole::Member,
            assigned_at: Utc::now(),
        };

        let outsider = UpdateTeamRequest {
            lead_contractor_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(outsider.validate(std::slice::from_ref(&member)).is_err());

        let insider = UpdateTeamRequest {
            lead_contractor_id: Some(member.contractor_id),
            ..Default::default()
        };
        assert!(insider.validate(&[member]).is_ok());
    }

    #[test]
    fn test_default_member_role() {
        assert_eq!(MemberRole::default(), MemberRole::Member);
        assert_eq!(MemberRole::Lead.label(), "Lead Contractor");
    }
}
