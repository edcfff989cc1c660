use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{decode, decode_all};
use crate::domain::{Bid, BidStatus, ContractorTrackRecord};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BidRow {
    id: Uuid,
    package_id: Uuid,
    contractor_id: Uuid,
    bid_amount: Decimal,
    duration_days: i32,
    proposal_text: String,
    status: String,
    review_notes: String,
    reviewed_by: Option<Uuid>,
    submitted_at: Option<DateTime<Utc>>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BidRow> for Bid {
    type Error = sqlx::Error;

    fn try_from(row: BidRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            package_id: row.package_id,
            contractor_id: row.contractor_id,
            bid_amount: row.bid_amount,
            duration_days: row.duration_days,
            proposal_text: row.proposal_text,
            status: decode("status", &row.status)?,
            review_notes: row.review_notes,
            reviewed_by: row.reviewed_by,
            submitted_at: row.submitted_at,
            reviewed_at: row.reviewed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COLUMNS: &str = "b.id, b.package_id, b.contractor_id, b.bid_amount, b.duration_days, \
                       b.proposal_text, b.status, b.review_notes, b.reviewed_by, b.submitted_at, \
                       b.reviewed_at, b.created_at, b.updated_at";

pub async fn find(conn: &mut PgConnection, id: Uuid) -> Result<Option<Bid>, sqlx::Error> {
    let row = sqlx::query_as::<_, BidRow>(&format!("SELECT {COLUMNS} FROM bids b WHERE b.id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.map(Bid::try_from).transpose()
}

pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<Bid>, sqlx::Error> {
    let row = sqlx::query_as::<_, BidRow>(&format!(
        "SELECT {COLUMNS} FROM bids b WHERE b.id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    row.map(Bid::try_from).transpose()
}

pub async fn exists_for(
    conn: &mut PgConnection,
    package_id: Uuid,
    contractor_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM bids WHERE package_id = $1 AND contractor_id = $2)",
    )
    .bind(package_id)
    .bind(contractor_id)
    .fetch_one(conn)
    .await
}

pub async fn insert(conn: &mut PgConnection, bid: &Bid) -> Result<Bid, sqlx::Error> {
    let row = sqlx::query_as::<_, BidRow>(&format!(
        r#"
        INSERT INTO bids AS b (id, package_id, contractor_id, bid_amount, duration_days,
                               proposal_text, status, submitted_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(bid.id)
    .bind(bid.package_id)
    .bind(bid.contractor_id)
    .bind(bid.bid_amount)
    .bind(bid.duration_days)
    .bind(&bid.proposal_text)
    .bind(bid.status.as_str())
    .bind(bid.submitted_at)
    .fetch_one(conn)
    .await?;
    row.try_into()
}

/// Persists terms, status and review stamps.
pub async fn update(conn: &mut PgConnection, bid: &Bid) -> Result<Bid, sqlx::Error> {
    let row = sqlx::query_as::<_, BidRow>(&format!(
        r#"
        UPDATE bids AS b
        SET bid_amount = $2, duration_days = $3, proposal_text = $4, status = $5,
            review_notes = $6, reviewed_by = $7, submitted_at = $8, reviewed_at = $9,
            updated_at = NOW()
        WHERE b.id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(bid.id)
    .bind(bid.bid_amount)
    .bind(bid.duration_days)
    .bind(&bid.proposal_text)
    .bind(bid.status.as_str())
    .bind(&bid.review_notes)
    .bind(bid.reviewed_by)
    .bind(bid.submitted_at)
    .bind(bid.reviewed_at)
    .fetch_one(conn)
    .await?;
    row.try_into()
}

pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM bids WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// A contractor's own bids, newest first
pub async fn list_for_contractor(
    conn: &mut PgConnection,
    contractor_id: Uuid,
    status: Option<BidStatus>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Bid>, i64), sqlx::Error> {
    let status = status.map(|s| s.as_str());
    let filter = "b.contractor_id = $1 AND ($2::text IS NULL OR b.status = $2)";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM bids b WHERE {filter}"))
        .bind(contractor_id)
        .bind(status)
        .fetch_one(&mut *conn)
        .await?;

    let rows = sqlx::query_as::<_, BidRow>(&format!(
        "SELECT {COLUMNS} FROM bids b WHERE {filter} ORDER BY b.created_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(contractor_id)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    Ok((decode_all(rows)?, total))
}

/// Bids across every project a council owns, most recently submitted first
pub async fn list_for_council(
    conn: &mut PgConnection,
    council_id: Uuid,
    status: Option<BidStatus>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Bid>, i64), sqlx::Error> {
    let status = status.map(|s| s.as_str());
    let from = "FROM bids b \
                JOIN packages pk ON pk.id = b.package_id \
                JOIN projects pr ON pr.id = pk.project_id \
                WHERE pr.council_id = $1 AND ($2::text IS NULL OR b.status = $2)";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {from}"))
        .bind(council_id)
        .bind(status)
        .fetch_one(&mut *conn)
        .await?;

    let rows = sqlx::query_as::<_, BidRow>(&format!(
        "SELECT {COLUMNS} {from} ORDER BY b.submitted_at DESC NULLS LAST LIMIT $3 OFFSET $4"
    ))
    .bind(council_id)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    Ok((decode_all(rows)?, total))
}

/// Every bid a contractor has placed
pub async fn all_for_contractor(
    conn: &mut PgConnection,
    contractor_id: Uuid,
) -> Result<Vec<Bid>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BidRow>(&format!(
        "SELECT {COLUMNS} FROM bids b WHERE b.contractor_id = $1 ORDER BY b.created_at DESC"
    ))
    .bind(contractor_id)
    .fetch_all(conn)
    .await?;
    decode_all(rows)
}

/// Every bid on the packages of a council's projects
pub async fn all_for_council(
    conn: &mut PgConnection,
    council_id: Uuid,
) -> Result<Vec<Bid>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BidRow>(&format!(
        "SELECT {COLUMNS} FROM bids b \
         JOIN packages pk ON pk.id = b.package_id \
         JOIN projects pr ON pr.id = pk.project_id \
         WHERE pr.council_id = $1 ORDER BY b.created_at DESC"
    ))
    .bind(council_id)
    .fetch_all(conn)
    .await?;
    decode_all(rows)
}

/// Bids on one package, cheapest first, then earliest submission
pub async fn list_for_package(
    conn: &mut PgConnection,
    package_id: Uuid,
) -> Result<Vec<Bid>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BidRow>(&format!(
        "SELECT {COLUMNS} FROM bids b WHERE b.package_id = $1 \
         ORDER BY b.bid_amount ASC, b.submitted_at ASC NULLS LAST"
    ))
    .bind(package_id)
    .fetch_all(conn)
    .await?;
    decode_all(rows)
}

pub async fn list_for_project(
    conn: &mut PgConnection,
    project_id: Uuid,
) -> Result<Vec<Bid>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BidRow>(&format!(
        "SELECT {COLUMNS} FROM bids b JOIN packages pk ON pk.id = b.package_id \
         WHERE pk.project_id = $1 ORDER BY b.created_at"
    ))
    .bind(project_id)
    .fetch_all(conn)
    .await?;
    decode_all(rows)
}

pub async fn track_record(
    conn: &mut PgConnection,
    contractor_id: Uuid,
) -> Result<ContractorTrackRecord, sqlx::Error> {
    let (total_bids, accepted_bids, pending_bids): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (WHERE status = 'accepted'),
               COUNT(*) FILTER (WHERE status IN ('submitted', 'under_review'))
        FROM bids
        WHERE contractor_id = $1
        "#,
    )
    .bind(contractor_id)
    .fetch_one(conn)
    .await?;

    Ok(ContractorTrackRecord {
        total_bids,
        accepted_bids,
        pending_bids,
    })
}
