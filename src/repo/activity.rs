use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{decode, decode_all};
use crate::domain::{ActivityLog, NewActivity};

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ActivityRow {
    id: Uuid,
    user_id: Uuid,
    action: String,
    details: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityLog {
    type Error = sqlx::Error;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            action: decode("action", &row.action)?,
            details: row.details,
            created_at: row.created_at,
        })
    }
}

pub async fn insert(conn: &mut PgConnection, entry: &NewActivity) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO activity_logs (user_id, action, details) VALUES ($1, $2, $3)")
        .bind(entry.user_id)
        .bind(entry.kind.as_str())
        .bind(&entry.details)
        .execute(conn)
        .await?;
    Ok(())
}

/// A user's own log, newest first
pub async fn list_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ActivityLog>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

    let rows = sqlx::query_as::<_, ActivityRow>(
        r#"
        SELECT id, user_id, action, details, created_at
        FROM activity_logs
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;

    Ok((decode_all(rows)?, total))
}
