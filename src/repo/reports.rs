use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{decode, decode_all};
use crate::domain::Report;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReportRow {
    id: Uuid,
    title: String,
    report_type: String,
    content: String,
    project_id: Option<Uuid>,
    package_id: Option<Uuid>,
    bid_id: Option<Uuid>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReportRow> for Report {
    type Error = sqlx::Error;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            report_type: decode("report_type", &row.report_type)?,
            content: row.content,
            project_id: row.project_id,
            package_id: row.package_id,
            bid_id: row.bid_id,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COLUMNS: &str = "id, title, report_type, content, project_id, package_id, bid_id, \
                       created_by, created_at, updated_at";

pub async fn find(conn: &mut PgConnection, id: Uuid) -> Result<Option<Report>, sqlx::Error> {
    let row = sqlx::query_as::<_, ReportRow>(&format!("SELECT {COLUMNS} FROM reports WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.map(Report::try_from).transpose()
}

pub async fn insert(conn: &mut PgConnection, report: &Report) -> Result<Report, sqlx::Error> {
    let row = sqlx::query_as::<_, ReportRow>(&format!(
        r#"
        INSERT INTO reports (id, title, report_type, content, project_id, package_id, bid_id,
                             created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(report.id)
    .bind(&report.title)
    .bind(report.report_type.as_str())
    .bind(&report.content)
    .bind(report.project_id)
    .bind(report.package_id)
    .bind(report.bid_id)
    .bind(report.created_by)
    .fetch_one(conn)
    .await?;
    row.try_into()
}

pub async fn update_text(conn: &mut PgConnection, report: &Report) -> Result<Report, sqlx::Error> {
    let row = sqlx::query_as::<_, ReportRow>(&format!(
        r#"
        UPDATE reports SET title = $2, content = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(report.id)
    .bind(&report.title)
    .bind(&report.content)
    .fetch_one(conn)
    .await?;
    row.try_into()
}

pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reports WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Reports created by a user, newest first
pub async fn list_for_creator(
    conn: &mut PgConnection,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Report>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE created_by = $1")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

    let rows = sqlx::query_as::<_, ReportRow>(&format!(
        "SELECT {COLUMNS} FROM reports WHERE created_by = $1 \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    Ok((decode_all(rows)?, total))
}
