//! Work package routes

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use sqlx::PgConnection;
use std::sync::Arc;
use uuid::Uuid;

use super::projects::{ensure_can_view, ensure_owner, load_project};
use crate::api::{Created, DataResponse, NoContent};
use crate::app::AppState;
use crate::auth::{CurrentUser, RequireCouncil};
use crate::domain::{
    ActivityKind, CreatePackageRequest, NewActivity, Package, PackageResponse, Project,
    UpdatePackageRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::repo;

async fn load_package(state: &AppState, package_id: Uuid) -> ApiResult<(Package, Project)> {
    let mut conn = state.db.acquire().await?;
    let package = repo::packages::find(&mut conn, package_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Package"))?;
    let project = repo::projects::find(&mut conn, package.project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    Ok((package, project))
}

/// Locks the package's project and then the package, the same order bid
/// awards use. Must run inside a transaction.
async fn lock_package(conn: &mut PgConnection, package_id: Uuid) -> ApiResult<(Package, Project)> {
    let project_id = repo::packages::find(&mut *conn, package_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Package"))?
        .project_id;
    let project = repo::projects::lock(&mut *conn, project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    let package = repo::packages::lock(&mut *conn, package_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Package"))?;
    Ok((package, project))
}

/// POST /projects/:project_id/packages
pub async fn create_package(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreatePackageRequest>,
) -> ApiResult<Created<Package>> {
    let now = Utc::now();
    let project = load_project(&state, project_id).await?;
    ensure_owner(&project, &council)?;
    req.validate(now)?;

    let mut conn = state.db.acquire().await?;
    let package = repo::packages::insert(
        &mut conn,
        &Package {
            id: Uuid::new_v4(),
            project_id: project.id,
            title: req.title,
            description: req.description,
            package_type: req.package_type,
            estimated_cost: req.estimated_cost,
            deadline: req.deadline,
            status: Default::default(),
            awarded_bid_id: None,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!(package_id = %package.id, project_id = %project.id, "Package created");
    state.activity.record(NewActivity::new(
        council.id,
        ActivityKind::PackageCreated,
        format!("Added package '{}' to project '{}'", package.title, project.title),
    ));
    state.cache.invalidate_project(project.id).await;

    Ok(Created(package))
}

/// GET /projects/:project_id/packages
pub async fn list_packages(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<DataResponse<Vec<PackageResponse>>> {
    let project = load_project(&state, project_id).await?;
    ensure_can_view(&project, &user)?;

    let mut conn = state.db.acquire().await?;
    let packages = repo::packages::list_with_counts(&mut conn, project.id).await?;
    Ok(DataResponse::new(packages))
}

/// GET /packages/:package_id
pub async fn get_package(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(package_id): Path<Uuid>,
) -> ApiResult<DataResponse<Package>> {
    let (package, project) = load_package(&state, package_id).await?;
    ensure_can_view(&project, &user).map_err(|_| ApiError::not_found("Package"))?;
    Ok(DataResponse::new(package))
}

/// PUT /packages/:package_id
pub async fn update_package(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path(package_id): Path<Uuid>,
    Json(req): Json<UpdatePackageRequest>,
) -> ApiResult<DataResponse<Package>> {
    let mut tx = state.db.begin().await?;
    let (mut package, project) = lock_package(&mut *tx, package_id).await?;
    ensure_owner(&project, &council)?;
    req.validate(&package, Utc::now())?;

    req.apply(&mut package);
    let package = repo::packages::update(&mut *tx, &package).await?;
    tx.commit().await?;

    tracing::info!(package_id = %package.id, status = %package.status, "Package updated");
    state.activity.record(NewActivity::new(
        council.id,
        ActivityKind::PackageUpdated,
        format!("Updated package '{}'", package.title),
    ));
    state.cache.invalidate_project(project.id).await;

    Ok(DataResponse::new(package))
}

/// DELETE /packages/:package_id
///
/// Awarded packages stay; they anchor the accepted bid and the team.
pub async fn delete_package(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path(package_id): Path<Uuid>,
) -> ApiResult<NoContent> {
    let mut tx = state.db.begin().await?;
    let (package, project) = lock_package(&mut *tx, package_id).await?;
    ensure_owner(&project, &council)?;
    if package.awarded_bid_id.is_some() {
        return Err(ApiError::conflict("An awarded package cannot be deleted"));
    }

    repo::packages::delete(&mut *tx, package.id).await?;
    tx.commit().await?;

    state.activity.record(NewActivity::new(
        council.id,
        ActivityKind::PackageDeleted,
        format!("Deleted package '{}'", package.title),
    ));
    state.cache.invalidate_project(project.id).await;

    Ok(NoContent)
}
