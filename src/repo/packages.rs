use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{decode, decode_all};
use crate::domain::{Package, PackageResponse};
use crate::reporting::AwardedPackage;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PackageRow {
    id: Uuid,
    project_id: Uuid,
    title: String,
    description: String,
    package_type: String,
    estimated_cost: Option<Decimal>,
    deadline: DateTime<Utc>,
    status: String,
    awarded_bid_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PackageRow> for Package {
    type Error = sqlx::Error;

    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            package_type: decode("package_type", &row.package_type)?,
            estimated_cost: row.estimated_cost,
            deadline: row.deadline,
            status: decode("status", &row.status)?,
            awarded_bid_id: row.awarded_bid_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PackageCountRow {
    #[sqlx(flatten)]
    package: PackageRow,
    bid_count: i64,
    active_bid_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct AwardedRow {
    #[sqlx(flatten)]
    package: PackageRow,
    project_title: String,
    bid_id: Uuid,
    bid_amount: Decimal,
    duration_days: i32,
    awarded_at: Option<DateTime<Utc>>,
}

const COLUMNS: &str = "id, project_id, title, description, package_type, estimated_cost, \
                       deadline, status, awarded_bid_id, created_at, updated_at";

pub async fn find(conn: &mut PgConnection, id: Uuid) -> Result<Option<Package>, sqlx::Error> {
    let row = sqlx::query_as::<_, PackageRow>(&format!(
        "SELECT {COLUMNS} FROM packages WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    row.map(Package::try_from).transpose()
}

pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<Package>, sqlx::Error> {
    let row = sqlx::query_as::<_, PackageRow>(&format!(
        "SELECT {COLUMNS} FROM packages WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    row.map(Package::try_from).transpose()
}

pub async fn list_for_project(
    conn: &mut PgConnection,
    project_id: Uuid,
) -> Result<Vec<Package>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PackageRow>(&format!(
        "SELECT {COLUMNS} FROM packages WHERE project_id = $1 ORDER BY created_at"
    ))
    .bind(project_id)
    .fetch_all(conn)
    .await?;
    decode_all(rows)
}

/// Packages of a project with their total and still-active bid counts
pub async fn list_with_counts(
    conn: &mut PgConnection,
    project_id: Uuid,
) -> Result<Vec<PackageResponse>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PackageCountRow>(
        r#"
        SELECT p.id, p.project_id, p.title, p.description, p.package_type, p.estimated_cost,
               p.deadline, p.status, p.awarded_bid_id, p.created_at, p.updated_at,
               COUNT(b.id) AS bid_count,
               COUNT(b.id) FILTER (WHERE b.status IN ('submitted', 'under_review')) AS active_bid_count
        FROM packages p
        LEFT JOIN bids b ON b.package_id = p.id
        WHERE p.project_id = $1
        GROUP BY p.id
        ORDER BY p.created_at
        "#,
    )
    .bind(project_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter()
        .map(|row| {
            let package = Package::try_from(row.package)?;
            Ok(PackageResponse {
                package_type_label: package.package_type.label(),
                package,
                bid_count: row.bid_count,
                active_bid_count: row.active_bid_count,
            })
        })
        .collect()
}

/// Every package across a council's projects
pub async fn all_for_council(
    conn: &mut PgConnection,
    council_id: Uuid,
) -> Result<Vec<Package>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PackageRow>(
        r#"
        SELECT p.id, p.project_id, p.title, p.description, p.package_type, p.estimated_cost,
               p.deadline, p.status, p.awarded_bid_id, p.created_at, p.updated_at
        FROM packages p
        JOIN projects pr ON pr.id = p.project_id
        WHERE pr.council_id = $1
        ORDER BY p.created_at DESC
        "#,
    )
    .bind(council_id)
    .fetch_all(conn)
    .await?;
    decode_all(rows)
}

/// Contracted packages whose winning bid belongs to `contractor_id`
pub async fn awarded_to(
    conn: &mut PgConnection,
    contractor_id: Uuid,
) -> Result<Vec<AwardedPackage>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AwardedRow>(
        r#"
        SELECT p.id, p.project_id, p.title, p.description, p.package_type, p.estimated_cost,
               p.deadline, p.status, p.awarded_bid_id, p.created_at, p.updated_at,
               pr.title AS project_title, b.id AS bid_id, b.bid_amount, b.duration_days,
               b.reviewed_at AS awarded_at
        FROM packages p
        JOIN bids b ON b.id = p.awarded_bid_id
        JOIN projects pr ON pr.id = p.project_id
        WHERE b.contractor_id = $1 AND p.status IN ('awarded', 'in_progress', 'completed')
        ORDER BY p.created_at DESC
        "#,
    )
    .bind(contractor_id)
    .fetch_all(conn)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(AwardedPackage {
                package: Package::try_from(row.package)?,
                project_title: row.project_title,
                bid_id: row.bid_id,
                bid_amount: row.bid_amount,
                duration_days: row.duration_days,
                awarded_at: row.awarded_at,
            })
        })
        .collect()
}

pub async fn insert(conn: &mut PgConnection, package: &Package) -> Result<Package, sqlx::Error> {
    let row = sqlx::query_as::<_, PackageRow>(&format!(
        r#"
        INSERT INTO packages (id, project_id, title, description, package_type, estimated_cost,
                              deadline, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(package.id)
    .bind(package.project_id)
    .bind(&package.title)
    .bind(&package.description)
    .bind(package.package_type.as_str())
    .bind(package.estimated_cost)
    .bind(package.deadline)
    .bind(package.status.as_str())
    .fetch_one(conn)
    .await?;
    row.try_into()
}

/// Persists the council-editable columns. The award reference is left
/// alone; see [`award`].
pub async fn update(conn: &mut PgConnection, package: &Package) -> Result<Package, sqlx::Error> {
    let row = sqlx::query_as::<_, PackageRow>(&format!(
        r#"
        UPDATE packages
        SET title = $2, description = $3, package_type = $4, estimated_cost = $5,
            deadline = $6, status = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(package.id)
    .bind(&package.title)
    .bind(&package.description)
    .bind(package.package_type.as_str())
    .bind(package.estimated_cost)
    .bind(package.deadline)
    .bind(package.status.as_str())
    .fetch_one(conn)
    .await?;
    row.try_into()
}

/// Records the winning bid. Only matches a package that is still open and
/// unawarded, so a stale caller gets `RowNotFound` instead of overwriting an
/// earlier award.
pub async fn award(conn: &mut PgConnection, package: &Package) -> Result<Package, sqlx::Error> {
    let row = sqlx::query_as::<_, PackageRow>(&format!(
        r#"
        UPDATE packages
        SET status = $2, awarded_bid_id = $3, updated_at = NOW()
        WHERE id = $1 AND status = 'open' AND awarded_bid_id IS NULL
        RETURNING {COLUMNS}
        "#
    ))
    .bind(package.id)
    .bind(package.status.as_str())
    .bind(package.awarded_bid_id)
    .fetch_one(conn)
    .await?;
    row.try_into()
}

pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM packages WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
