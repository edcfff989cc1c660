//! Report generation and storage
//!
//! Stored reports only carry a title and free text; their data is always
//! computed from the live project, going through the Redis cache.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    ActivityKind, GenerateReportRequest, NewActivity, Report, ReportKind, ReportResponse,
    UpdateReportRequest, User,
};
use crate::error::{ApiError, ApiResult};
use crate::reporting::{ProjectSnapshot, ReportData};
use crate::repo;
use crate::services::cache::keys;
use crate::services::{ActivityRecorder, RedisCache};

#[derive(Clone)]
pub struct ReportService {
    db: PgPool,
    cache: RedisCache,
    activity: ActivityRecorder,
}

impl ReportService {
    pub fn new(db: PgPool, cache: RedisCache, activity: ActivityRecorder) -> Self {
        Self { db, cache, activity }
    }

    async fn snapshot(&self, project_id: Uuid) -> ApiResult<Option<ProjectSnapshot>> {
        let mut conn = self.db.acquire().await?;
        Ok(repo::snapshot::load(&mut conn, project_id).await?)
    }

    async fn compute_and_cache(&self, kind: ReportKind, snapshot: &ProjectSnapshot) -> ReportData {
        let data = ReportData::compute(kind, snapshot, Utc::now());
        if let Err(e) = self.cache.set(&keys::report(kind, snapshot.project.id), &data).await {
            tracing::warn!(project_id = %snapshot.project.id, error = %e, "Failed to cache report");
        }
        data
    }

    /// Report data for a project the council owns, served from cache when
    /// nothing has changed since it was computed.
    pub async fn project_report(
        &self,
        council: &User,
        project_id: Uuid,
        kind: ReportKind,
    ) -> ApiResult<ReportData> {
        let project = {
            let mut conn = self.db.acquire().await?;
            repo::projects::find(&mut conn, project_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Project"))?
        };
        if !project.is_owned_by(council.id) {
            return Err(ApiError::forbidden("Only the owning council can view project reports"));
        }

        if let Some(data) = self.cache.get(&keys::report(kind, project_id)).await {
            return Ok(data);
        }
        let snapshot = self
            .snapshot(project_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Project"))?;
        Ok(self.compute_and_cache(kind, &snapshot).await)
    }

    /// Stores a generated report and returns it with its data.
    pub async fn generate(&self, council: &User, req: GenerateReportRequest) -> ApiResult<ReportResponse> {
        let snapshot = self
            .snapshot(req.project_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Project"))?;
        if !snapshot.project.is_owned_by(council.id) {
            return Err(ApiError::forbidden("Only the owning council can generate reports"));
        }

        let kind = req.report_type;
        let title = &snapshot.project.title;
        let now = Utc::now();
        let mut conn = self.db.acquire().await?;
        let report = repo::reports::insert(
            &mut conn,
            &Report {
                id: Uuid::new_v4(),
                title: kind.generated_title(title),
                report_type: kind,
                content: kind.generated_content(title),
                project_id: Some(snapshot.project.id),
                package_id: None,
                bid_id: None,
                created_by: Some(council.id),
                created_at: now,
                updated_at: now,
            },
        )
        .await?;

        tracing::info!(report_id = %report.id, project_id = %req.project_id, kind = %kind, "Report generated");
        self.activity.record(NewActivity::new(
            council.id,
            ActivityKind::ReportGenerated,
            format!("Generated '{}'", report.title),
        ));

        let data = self.compute_and_cache(kind, &snapshot).await;
        Ok(ReportResponse {
            report,
            data: Some(data),
        })
    }

    pub async fn list(&self, user: &User, limit: i64, offset: i64) -> ApiResult<(Vec<Report>, i64)> {
        let mut conn = self.db.acquire().await?;
        Ok(repo::reports::list_for_creator(&mut conn, user.id, limit, offset).await?)
    }

    async fn load_own(&self, user: &User, report_id: Uuid) -> ApiResult<Report> {
        let mut conn = self.db.acquire().await?;
        repo::reports::find(&mut conn, report_id)
            .await?
            .filter(|r| r.created_by == Some(user.id))
            .ok_or_else(|| ApiError::not_found("Report"))
    }

    /// A stored report with data computed from the project as it is now.
    /// Data is absent once the project has been deleted.
    pub async fn get(&self, user: &User, report_id: Uuid) -> ApiResult<ReportResponse> {
        let report = self.load_own(user, report_id).await?;

        let data = match report.project_id {
            Some(project_id) => match self.cache.get(&keys::report(report.report_type, project_id)).await {
                Some(data) => Some(data),
                None => match self.snapshot(project_id).await? {
                    Some(snapshot) => Some(self.compute_and_cache(report.report_type, &snapshot).await),
                    None => None,
                },
            },
            None => None,
        };

        Ok(ReportResponse { report, data })
    }

    pub async fn update_text(
        &self,
        user: &User,
        report_id: Uuid,
        req: UpdateReportRequest,
    ) -> ApiResult<Report> {
        req.validate()?;
        let mut report = self.load_own(user, report_id).await?;
        if let Some(title) = req.title {
            report.title = title;
        }
        if let Some(content) = req.content {
            report.content = content;
        }

        let mut conn = self.db.acquire().await?;
        let report = repo::reports::update_text(&mut conn, &report).await?;

        self.activity.record(NewActivity::new(
            user.id,
            ActivityKind::ReportUpdated,
            format!("Updated '{}'", report.title),
        ));
        Ok(report)
    }

    pub async fn delete(&self, user: &User, report_id: Uuid) -> ApiResult<()> {
        let report = self.load_own(user, report_id).await?;
        let mut conn = self.db.acquire().await?;
        repo::reports::delete(&mut conn, report.id).await?;

        self.activity.record(NewActivity::new(
            user.id,
            ActivityKind::ReportDeleted,
            format!("Deleted '{}'", report.title),
        ));
        Ok(())
    }
}
