//! Project routes
//!
//! Councils manage their own projects; contractors browse public ones.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, NoContent, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::{CurrentUser, RequireContractor, RequireCouncil};
use crate::domain::{
    ActivityKind, AvailableProjectQuery, CreateProjectRequest, NewActivity, Project, ProjectDetailResponse, ProjectQuery,
    ProjectStatus, UpdateProjectRequest, User,
};
use crate::error::{ApiError, ApiResult};
use crate::reporting::AvailableProject;
use crate::repo;

/// Councils see only their own projects, contractors only listed public
/// ones. Anything else reads as missing.
pub(crate) fn ensure_can_view(project: &Project, user: &User) -> ApiResult<()> {
    let visible = if user.is_council() {
        project.is_owned_by(user.id)
    } else {
        project.is_visible_to_contractors()
    };
    if visible {
        Ok(())
    } else {
        Err(ApiError::not_found("Project"))
    }
}

pub(crate) fn ensure_owner(project: &Project, user: &User) -> ApiResult<()> {
    if !project.is_owned_by(user.id) {
        return Err(ApiError::forbidden("Only the owning council can change this project"));
    }
    Ok(())
}

pub(crate) async fn load_project(state: &AppState, project_id: Uuid) -> ApiResult<Project> {
    let mut conn = state.db.acquire().await?;
    repo::projects::find(&mut conn, project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))
}

/// POST /projects
pub async fn create_project(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Created<Project>> {
    req.validate()?;
    tracing::info!(user_id = %council.id, title = %req.title, "Creating project");

    let now = Utc::now();
    let mut conn = state.db.acquire().await?;
    let project = repo::projects::insert(
        &mut conn,
        &Project {
            id: Uuid::new_v4(),
            council_id: council.id,
            title: req.title,
            description: req.description,
            location: req.location,
            budget_range: req.budget_range.unwrap_or_default(),
            start_date: req.start_date,
            end_date: req.end_date,
            status: req.status.unwrap_or_default(),
            is_public: req.is_public.unwrap_or(true),
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    let mut entries = vec![NewActivity::new(
        council.id,
        ActivityKind::ProjectCreated,
        format!("Created project '{}'", project.title),
    )];
    if project.status == ProjectStatus::Published {
        entries.push(NewActivity::new(
            council.id,
            ActivityKind::ProjectPublished,
            format!("Published project '{}'", project.title),
        ));
    }
    state.activity.record_all(entries);

    Ok(Created(project))
}

/// GET /projects
pub async fn list_projects(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProjectQuery>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Paginated<Project>> {
    let (limit, offset) = pagination.limit_offset();
    let mut conn = state.db.acquire().await?;

    let (projects, total) = if user.is_council() {
        repo::projects::list_for_council(&mut conn, user.id, query.status, limit, offset).await?
    } else {
        repo::projects::list_public(&mut conn, query.status, limit, offset).await?
    };

    Ok(Paginated::new(projects, &pagination, total))
}

/// GET /projects/available
///
/// Published projects a contractor can still bid on, with their open
/// package counts.
pub async fn list_available(
    RequireContractor(contractor): RequireContractor,
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableProjectQuery>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Paginated<AvailableProject>> {
    query.validate()?;
    tracing::debug!(user_id = %contractor.id, sort = ?query.sort, "Listing available projects");

    let (limit, offset) = pagination.limit_offset();
    let mut conn = state.db.acquire().await?;
    let (projects, total) =
        repo::projects::list_available(&mut conn, &query, Utc::now(), limit, offset).await?;

    Ok(Paginated::new(projects, &pagination, total))
}

/// GET /projects/:project_id
pub async fn get_project(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<DataResponse<ProjectDetailResponse>> {
    let project = load_project(&state, project_id).await?;
    ensure_can_view(&project, &user)?;

    let mut conn = state.db.acquire().await?;
    let packages = repo::packages::list_with_counts(&mut conn, project.id).await?;

    Ok(DataResponse::new(ProjectDetailResponse {
        status_label: project.status.label(),
        duration_days: project.duration_days(),
        project,
        packages,
    }))
}

/// PUT /projects/:project_id
pub async fn update_project(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<DataResponse<Project>> {
    let mut tx = state.db.begin().await?;
    let mut project = repo::projects::lock(&mut *tx, project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    ensure_owner(&project, &council)?;
    req.validate(&project)?;

    let previous_status = project.status;
    req.apply(&mut project);
    let project = repo::projects::update(&mut *tx, &project).await?;
    tx.commit().await?;

    tracing::info!(project_id = %project.id, status = %project.status, "Project updated");
    let mut entries = vec![NewActivity::new(
        council.id,
        ActivityKind::ProjectUpdated,
        format!("Updated project '{}'", project.title),
    )];
    if project.status == ProjectStatus::Published && previous_status != ProjectStatus::Published {
        entries.push(NewActivity::new(
            council.id,
            ActivityKind::ProjectPublished,
            format!("Published project '{}'", project.title),
        ));
    }
    state.activity.record_all(entries);
    state.cache.invalidate_project(project.id).await;

    Ok(DataResponse::new(project))
}

/// DELETE /projects/:project_id
pub async fn delete_project(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<NoContent> {
    let project = load_project(&state, project_id).await?;
    ensure_owner(&project, &council)?;

    let mut conn = state.db.acquire().await?;
    repo::projects::delete(&mut conn, project.id).await?;

    tracing::info!(project_id = %project.id, "Project deleted");
    state.activity.record(NewActivity::new(
        council.id,
        ActivityKind::ProjectDeleted,
        format!("Deleted project '{}'", project.title),
    ));
    state.cache.invalidate_project(project.id).await;

    Ok(NoContent)
}
