//! Contractor team routes

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::{CurrentUser, RequireCouncil};
use crate::domain::{AddTeamMemberRequest, CreateTeamRequest, TeamResponse, UpdateTeamRequest};
use crate::error::ApiResult;

/// GET /teams
///
/// Councils get the teams of their projects, contractors the teams they are on.
pub async fn list_teams(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<DataResponse<Vec<TeamResponse>>> {
    Ok(DataResponse::new(state.teams.list_for(&user).await?))
}

/// POST /teams
pub async fn create_team(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTeamRequest>,
) -> ApiResult<Created<TeamResponse>> {
    tracing::info!(user_id = %council.id, project_id = %req.project_id, "Creating team");
    Ok(Created(state.teams.create(&council, req).await?))
}

/// GET /teams/:team_id
pub async fn get_team(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<DataResponse<TeamResponse>> {
    Ok(DataResponse::new(state.teams.get(&user, team_id).await?))
}

/// PUT /teams/:team_id
pub async fn update_team(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path(team_id): Path<Uuid>,
    Json(req): Json<UpdateTeamRequest>,
) -> ApiResult<DataResponse<TeamResponse>> {
    Ok(DataResponse::new(state.teams.update(&council, team_id, req).await?))
}

/// POST /teams/:team_id/members
pub async fn add_member(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path(team_id): Path<Uuid>,
    Json(req): Json<AddTeamMemberRequest>,
) -> ApiResult<DataResponse<TeamResponse>> {
    tracing::info!(team_id = %team_id, contractor_id = %req.contractor_id, "Adding team member");
    Ok(DataResponse::new(state.teams.add_member(&council, team_id, req).await?))
}

/// DELETE /teams/:team_id/members/:contractor_id
pub async fn remove_member(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path((team_id, contractor_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<DataResponse<TeamResponse>> {
    tracing::info!(team_id = %team_id, contractor_id = %contractor_id, "Removing team member");
    let team = state.teams.remove_member(&council, team_id, contractor_id).await?;
    Ok(DataResponse::new(team))
}
