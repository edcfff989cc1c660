use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{decode, decode_all};
use crate::domain::{AvailableProjectQuery, AvailableSort, Project, ProjectStatus};
use crate::reporting::AvailableProject;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProjectRow {
    id: Uuid,
    council_id: Uuid,
    title: String,
    description: String,
    location: String,
    budget_range: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    is_public: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = sqlx::Error;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            council_id: row.council_id,
            title: row.title,
            description: row.description,
            location: row.location,
            budget_range: row.budget_range,
            start_date: row.start_date,
            end_date: row.end_date,
            status: decode("status", &row.status)?,
            is_public: row.is_public,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AvailableRow {
    #[sqlx(flatten)]
    project: ProjectRow,
    open_packages: i64,
    closing_soon: i64,
    next_deadline: Option<DateTime<Utc>>,
}

const COLUMNS: &str = "id, council_id, title, description, location, budget_range, start_date, \
                       end_date, status, is_public, created_at, updated_at";

pub async fn find(conn: &mut PgConnection, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {COLUMNS} FROM projects WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    row.map(Project::try_from).transpose()
}

/// Loads the project row with `FOR UPDATE`, serialising awards on it.
pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {COLUMNS} FROM projects WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    row.map(Project::try_from).transpose()
}

pub async fn insert(conn: &mut PgConnection, project: &Project) -> Result<Project, sqlx::Error> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        r#"
        INSERT INTO projects (id, council_id, title, description, location, budget_range,
                              start_date, end_date, status, is_public)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(project.id)
    .bind(project.council_id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(&project.location)
    .bind(&project.budget_range)
    .bind(project.start_date)
    .bind(project.end_date)
    .bind(project.status.as_str())
    .bind(project.is_public)
    .fetch_one(conn)
    .await?;
    row.try_into()
}

pub async fn update(conn: &mut PgConnection, project: &Project) -> Result<Project, sqlx::Error> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        r#"
        UPDATE projects
        SET title = $2, description = $3, location = $4, budget_range = $5, start_date = $6,
            end_date = $7, status = $8, is_public = $9, updated_at = NOW()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(project.id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(&project.location)
    .bind(&project.budget_range)
    .bind(project.start_date)
    .bind(project.end_date)
    .bind(project.status.as_str())
    .bind(project.is_public)
    .fetch_one(conn)
    .await?;
    row.try_into()
}

pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Projects owned by a council, newest first
pub async fn list_for_council(
    conn: &mut PgConnection,
    council_id: Uuid,
    status: Option<ProjectStatus>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Project>, i64), sqlx::Error> {
    let status = status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM projects WHERE council_id = $1 AND ($2::text IS NULL OR status = $2)",
    )
    .bind(council_id)
    .bind(status)
    .fetch_one(&mut *conn)
    .await?;

    let rows = sqlx::query_as::<_, ProjectRow>(&format!(
        r#"
        SELECT {COLUMNS} FROM projects
        WHERE council_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(council_id)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    Ok((decode_all(rows)?, total))
}

/// Public projects in a contractor-visible status, newest first
pub async fn list_public(
    conn: &mut PgConnection,
    status: Option<ProjectStatus>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Project>, i64), sqlx::Error> {
    let status = status.map(|s| s.as_str());
    let filter = "is_public AND status IN ('published', 'in_progress') \
                  AND ($1::text IS NULL OR status = $1)";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM projects WHERE {filter}"))
        .bind(status)
        .fetch_one(&mut *conn)
        .await?;

    let rows = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {COLUMNS} FROM projects WHERE {filter} ORDER BY created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    Ok((decode_all(rows)?, total))
}

/// Every project a council owns, newest first
pub async fn all_for_council(
    conn: &mut PgConnection,
    council_id: Uuid,
) -> Result<Vec<Project>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {COLUMNS} FROM projects WHERE council_id = $1 ORDER BY created_at DESC"
    ))
    .bind(council_id)
    .fetch_all(conn)
    .await?;
    decode_all(rows)
}

/// Public published projects with at least one open package, with the
/// open-package counts a contractor needs to pick one.
pub async fn list_available(
    conn: &mut PgConnection,
    query: &AvailableProjectQuery,
    now: DateTime<Utc>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<AvailableProject>, i64), sqlx::Error> {
    let from = r#"
        FROM projects pr
        JOIN (
            SELECT project_id,
                   COUNT(*) AS open_packages,
                   COUNT(*) FILTER (WHERE deadline BETWEEN $1 AND $1 + INTERVAL '7 days') AS closing_soon,
                   MIN(deadline) FILTER (WHERE deadline >= $1) AS next_deadline
            FROM packages
            WHERE status = 'open'
            GROUP BY project_id
        ) o ON o.project_id = pr.id
        WHERE pr.is_public AND pr.status = 'published'
          AND ($2::text IS NULL OR LOWER(pr.location) = LOWER($2))
          AND ($3::text IS NULL OR pr.title ILIKE '%' || $3 || '%'
                                OR pr.description ILIKE '%' || $3 || '%')
          AND ($4::text IS NULL OR EXISTS (
                SELECT 1 FROM packages x WHERE x.project_id = pr.id AND x.package_type = $4))
          AND ($5::numeric IS NULL OR EXISTS (
                SELECT 1 FROM packages x WHERE x.project_id = pr.id AND x.estimated_cost >= $5))
          AND ($6::numeric IS NULL OR EXISTS (
                SELECT 1 FROM packages x WHERE x.project_id = pr.id AND x.estimated_cost <= $6))
    "#;
    let order = match query.sort {
        AvailableSort::Newest => "pr.created_at DESC",
        AvailableSort::Oldest => "pr.created_at ASC",
        AvailableSort::Deadline => "o.next_deadline ASC NULLS LAST, pr.created_at DESC",
    };
    let package_type = query.package_type.map(|t| t.as_str());

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {from}"))
        .bind(now)
        .bind(query.location())
        .bind(query.search())
        .bind(package_type)
        .bind(query.min_budget)
        .bind(query.max_budget)
        .fetch_one(&mut *conn)
        .await?;

    let rows = sqlx::query_as::<_, AvailableRow>(&format!(
        r#"
        SELECT pr.id, pr.council_id, pr.title, pr.description, pr.location, pr.budget_range,
               pr.start_date, pr.end_date, pr.status, pr.is_public, pr.created_at, pr.updated_at,
               o.open_packages, o.closing_soon, o.next_deadline
        {from}
        ORDER BY {order}
        LIMIT $7 OFFSET $8
        "#
    ))
    .bind(now)
    .bind(query.location())
    .bind(query.search())
    .bind(package_type)
    .bind(query.min_budget)
    .bind(query.max_budget)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    let projects = rows
        .into_iter()
        .map(|row| {
            Ok(AvailableProject {
                project: Project::try_from(row.project)?,
                open_packages: row.open_packages,
                closing_soon: row.closing_soon,
                next_deadline: row.next_deadline,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    Ok((projects, total))
}

/// Projects whose reports show this user: owned, bid on, or staffed.
pub async fn ids_involving_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT id FROM projects WHERE council_id = $1
        UNION
        SELECT p.project_id FROM packages p JOIN bids b ON b.package_id = p.id
        WHERE b.contractor_id = $1
        UNION
        SELECT t.project_id FROM contractor_teams t JOIN team_members m ON m.team_id = t.id
        WHERE m.contractor_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
}
