//! Team formation for awarded contractors
//!
//! A project has at most one team. The first award creates it, every
//! winning contractor joins it once, and the first one to join becomes lead.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::WorkflowError;
use crate::domain::{ContractorTeam, MemberRole, Project, TeamMember, TeamStatus};

/// A team together with its memberships
#[derive(Debug, Clone, Serialize)]
pub struct TeamRoster {
    pub team: ContractorTeam,
    pub members: Vec<TeamMember>,
}

impl TeamRoster {
    pub fn has_member(&self, contractor_id: Uuid) -> bool {
        self.member(contractor_id).is_some()
    }

    pub fn member(&self, contractor_id: Uuid) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.contractor_id == contractor_id)
    }

    pub fn lead(&self) -> Option<&TeamMember> {
        self.team.lead_contractor_id.and_then(|id| self.member(id))
    }
}

/// What enrolling a winner changed
#[derive(Debug, Clone, Serialize)]
pub struct Formation {
    pub roster: TeamRoster,
    pub team_created: bool,
    pub member_added: Option<TeamMember>,
    pub lead_assigned: bool,
}

pub fn default_team_name(project_title: &str) -> String {
    format!("{} Team", project_title)
}

/// Fresh team for `project`, assigned by its council.
pub fn new_team(project: &Project, name: Option<String>, now: DateTime<Utc>) -> ContractorTeam {
    ContractorTeam {
        id: Uuid::new_v4(),
        project_id: project.id,
        name: name.unwrap_or_else(|| default_team_name(&project.title)),
        lead_contractor_id: None,
        status: TeamStatus::Forming,
        notes: String::new(),
        assigned_by: Some(project.council_id),
        created_at: now,
        updated_at: now,
    }
}

/// Puts `contractor_id` on the project team, creating the team if needed.
///
/// Idempotent per contractor: an existing member is left as is.
pub fn enroll_winner(
    project: &Project,
    roster: Option<TeamRoster>,
    contractor_id: Uuid,
    now: DateTime<Utc>,
) -> Formation {
    let (mut roster, team_created) = match roster {
        Some(roster) => (roster, false),
        None => (
            TeamRoster {
                team: new_team(project, None, now),
                members: Vec::new(),
            },
            true,
        ),
    };

    let member_added = add_member(&mut roster, contractor_id, MemberRole::Member, now).ok();

    let lead_assigned = roster.team.lead_contractor_id.is_none();
    if lead_assigned {
        roster.team.lead_contractor_id = Some(contractor_id);
        roster.team.updated_at = now;
    }

    Formation {
        roster,
        team_created,
        member_added,
        lead_assigned,
    }
}

pub fn add_member(
    roster: &mut TeamRoster,
    contractor_id: Uuid,
    role: MemberRole,
    now: DateTime<Utc>,
) -> Result<TeamMember, WorkflowError> {
    if roster.has_member(contractor_id) {
        return Err(WorkflowError::AlreadyMember { contractor_id });
    }
    let member = TeamMember {
        id: Uuid::new_v4(),
        team_id: roster.team.id,
        contractor_id,
        role,
        assigned_at: now,
    };
    roster.members.push(member.clone());
    Ok(member)
}

/// Removes a member; removing the lead leaves the team without one.
pub fn remove_member(
    roster: &mut TeamRoster,
    contractor_id: Uuid,
    now: DateTime<Utc>,
) -> Result<TeamMember, WorkflowError> {
    let idx = roster
        .members
        .iter()
        .position(|m| m.contractor_id == contractor_id)
        .ok_or(WorkflowError::NotMember { contractor_id })?;
    let removed = roster.members.remove(idx);
    if roster.team.lead_contractor_id == Some(contractor_id) {
        roster.team.lead_contractor_id = None;
        roster.team.updated_at = now;
    }
    Ok(removed)
}
