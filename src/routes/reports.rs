//! Report routes

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, NoContent, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::{CurrentUser, RequireCouncil};
use crate::domain::{GenerateReportRequest, Report, ReportKind, ReportResponse, UpdateReportRequest};
use crate::error::ApiResult;
use crate::reporting::ReportData;

/// GET /projects/:project_id/reports/:kind
///
/// Computed data only; nothing is stored.
pub async fn project_report(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Path((project_id, kind)): Path<(Uuid, ReportKind)>,
) -> ApiResult<DataResponse<ReportData>> {
    tracing::info!(user_id = %council.id, project_id = %project_id, kind = %kind, "Computing report");
    let data = state.reports.project_report(&council, project_id, kind).await?;
    Ok(DataResponse::new(data))
}

/// POST /reports
pub async fn generate_report(
    RequireCouncil(council): RequireCouncil,
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateReportRequest>,
) -> ApiResult<Created<ReportResponse>> {
    Ok(Created(state.reports.generate(&council, req).await?))
}

/// GET /reports
pub async fn list_reports(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Paginated<Report>> {
    let (limit, offset) = pagination.limit_offset();
    let (reports, total) = state.reports.list(&user, limit, offset).await?;
    Ok(Paginated::new(reports, &pagination, total))
}

/// GET /reports/:report_id
pub async fn get_report(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<Uuid>,
) -> ApiResult<DataResponse<ReportResponse>> {
    Ok(DataResponse::new(state.reports.get(&user, report_id).await?))
}

/// PUT /reports/:report_id
pub async fn update_report(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<Uuid>,
    Json(req): Json<UpdateReportRequest>,
) -> ApiResult<DataResponse<Report>> {
    Ok(DataResponse::new(state.reports.update_text(&user, report_id, req).await?))
}

/// DELETE /reports/:report_id
pub async fn delete_report(
    user: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<Uuid>,
) -> ApiResult<NoContent> {
    state.reports.delete(&user, report_id).await?;
    Ok(NoContent)
}
