//! Manual team management
//!
//! Teams are normally formed by accepting bids; these commands let the
//! owning council adjust them afterwards.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::{
    ActivityKind, AddTeamMemberRequest, CreateTeamRequest, NewActivity, Project, TeamMemberResponse,
    TeamResponse, UpdateTeamRequest, User,
};
use crate::error::{ApiError, ApiResult};
use crate::repo;
use crate::services::{ActivityRecorder, RedisCache};
use crate::workflow::{team_formation, TeamRoster};

#[derive(Clone)]
pub struct TeamService {
    db: PgPool,
    cache: RedisCache,
    activity: ActivityRecorder,
}

/// Attaches project title and member display names to rosters.
async fn describe(conn: &mut PgConnection, rosters: Vec<TeamRoster>) -> ApiResult<Vec<TeamResponse>> {
    let user_ids: Vec<Uuid> = rosters
        .iter()
        .flat_map(|r| r.members.iter().map(|m| m.contractor_id))
        .collect();
    let users = repo::users::find_many(&mut *conn, &user_ids).await?;

    let mut responses = Vec::with_capacity(rosters.len());
    for roster in rosters {
        let project_title = repo::projects::find(&mut *conn, roster.team.project_id)
            .await?
            .map(|p| p.title)
            .unwrap_or_default();
        let members = roster
            .members
            .iter()
            .map(|m| TeamMemberResponse {
                contractor_id: m.contractor_id,
                display_name: users
                    .iter()
                    .find(|u| u.id == m.contractor_id)
                    .map(User::display_name)
                    .unwrap_or_else(|| "Unknown contractor".to_string()),
                role: m.role,
                role_label: m.role.label(),
                assigned_at: m.assigned_at,
            })
            .collect();
        responses.push(TeamResponse {
            team: roster.team,
            project_title,
            members,
        });
    }
    Ok(responses)
}

async fn describe_one(conn: &mut PgConnection, roster: TeamRoster) -> ApiResult<TeamResponse> {
    describe(conn, vec![roster])
        .await?
        .pop()
        .ok_or_else(|| ApiError::not_found("Team"))
}

/// Locks a team's project and reads the roster under that lock, for its
/// owning council only. Awards extend teams while holding the same project
/// lock, so the roster cannot change until the caller commits. Must run
/// inside a transaction.
async fn lock_owned(
    conn: &mut PgConnection,
    team_id: Uuid,
    council: &User,
) -> ApiResult<(TeamRoster, Project)> {
    let project_id = repo::teams::find(&mut *conn, team_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Team"))?
        .team
        .project_id;
    let project = repo::projects::lock(&mut *conn, project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    if !project.is_owned_by(council.id) {
        return Err(ApiError::forbidden("Only the owning council can manage this team"));
    }
    let roster = repo::teams::find(&mut *conn, team_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Team"))?;
    Ok((roster, project))
}

impl TeamService {
    pub fn new(db: PgPool, cache: RedisCache, activity: ActivityRecorder) -> Self {
        Self { db, cache, activity }
    }

    pub async fn create(&self, council: &User, req: CreateTeamRequest) -> ApiResult<TeamResponse> {
        req.validate()?;
        let mut tx = self.db.begin().await?;

        let project = repo::projects::lock(&mut *tx, req.project_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Project"))?;
        if !project.is_owned_by(council.id) {
            return Err(ApiError::forbidden("Only the owning council can form a team"));
        }
        if repo::teams::find_for_project(&mut *tx, project.id).await?.is_some() {
            return Err(ApiError::conflict("This project already has a team"));
        }

        let mut team = team_formation::new_team(&project, req.name, Utc::now());
        if let Some(notes) = req.notes {
            team.notes = notes;
        }
        repo::teams::insert(&mut *tx, &team).await?;
        tx.commit().await?;

        tracing::info!(team_id = %team.id, project_id = %project.id, "Team created");
        self.activity.record(NewActivity::new(
            council.id,
            ActivityKind::TeamCreated,
            format!("Created team '{}' for project '{}'", team.name, project.title),
        ));
        self.cache.invalidate_project(project.id).await;

        Ok(TeamResponse {
            team,
            project_title: project.title,
            members: Vec::new(),
        })
    }

    pub async fn update(
        &self,
        council: &User,
        team_id: Uuid,
        req: UpdateTeamRequest,
    ) -> ApiResult<TeamResponse> {
        let mut tx = self.db.begin().await?;
        let (mut roster, project) = lock_owned(&mut *tx, team_id, council).await?;

        req.validate(&roster.members)?;
        req.apply(&mut roster.team);
        repo::teams::update(&mut *tx, &roster.team).await?;
        tx.commit().await?;

        self.activity.record(NewActivity::new(
            council.id,
            ActivityKind::TeamUpdated,
            format!("Updated team '{}'", roster.team.name),
        ));
        self.cache.invalidate_project(project.id).await;

        let mut conn = self.db.acquire().await?;
        describe_one(&mut conn, roster).await
    }

    pub async fn add_member(
        &self,
        council: &User,
        team_id: Uuid,
        req: AddTeamMemberRequest,
    ) -> ApiResult<TeamResponse> {
        let mut tx = self.db.begin().await?;
        let (mut roster, project) = lock_owned(&mut *tx, team_id, council).await?;

        let contractor = repo::users::find(&mut *tx, req.contractor_id)
            .await?
            .filter(User::is_contractor)
            .ok_or_else(|| ApiError::invalid("contractor_id", "No contractor with this id."))?;

        let member = team_formation::add_member(
            &mut roster,
            contractor.id,
            req.role.unwrap_or_default(),
            Utc::now(),
        )?;
        repo::teams::insert_member(&mut *tx, &member).await?;
        tx.commit().await?;

        self.activity.record(NewActivity::new(
            council.id,
            ActivityKind::TeamMemberAdded,
            format!(
                "Added {} to team '{}' as {}",
                contractor.display_name(),
                roster.team.name,
                member.role.label()
            ),
        ));
        self.cache.invalidate_project(project.id).await;

        let mut conn = self.db.acquire().await?;
        describe_one(&mut conn, roster).await
    }

    /// Removing the lead leaves the team without one.
    pub async fn remove_member(
        &self,
        council: &User,
        team_id: Uuid,
        contractor_id: Uuid,
    ) -> ApiResult<TeamResponse> {
        let mut tx = self.db.begin().await?;
        let (mut roster, project) = lock_owned(&mut *tx, team_id, council).await?;

        let had_lead = roster.team.lead_contractor_id;
        team_formation::remove_member(&mut roster, contractor_id, Utc::now())?;
        repo::teams::delete_member(&mut *tx, team_id, contractor_id).await?;
        if roster.team.lead_contractor_id != had_lead {
            repo::teams::update(&mut *tx, &roster.team).await?;
        }
        tx.commit().await?;

        self.activity.record(NewActivity::new(
            council.id,
            ActivityKind::TeamMemberRemoved,
            format!("Removed a member from team '{}'", roster.team.name),
        ));
        self.cache.invalidate_project(project.id).await;

        let mut conn = self.db.acquire().await?;
        describe_one(&mut conn, roster).await
    }

    /// Team detail for its owning council or any of its members.
    pub async fn get(&self, user: &User, team_id: Uuid) -> ApiResult<TeamResponse> {
        let mut conn = self.db.acquire().await?;
        let roster = repo::teams::find(&mut conn, team_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Team"))?;

        let allowed = if user.is_council() {
            repo::projects::find(&mut conn, roster.team.project_id)
                .await?
                .is_some_and(|p| p.is_owned_by(user.id))
        } else {
            roster.has_member(user.id)
        };
        if !allowed {
            return Err(ApiError::not_found("Team"));
        }

        describe_one(&mut conn, roster).await
    }

    /// Teams on the council's projects, or the teams a contractor is on.
    pub async fn list_for(&self, user: &User) -> ApiResult<Vec<TeamResponse>> {
        let mut conn = self.db.acquire().await?;
        let rosters = if user.is_council() {
            repo::teams::list_for_council(&mut conn, user.id).await?
        } else {
            repo::teams::list_for_contractor(&mut conn, user.id).await?
        };
        describe(&mut conn, rosters).await
    }
}
