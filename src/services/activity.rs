//! Activity log writer
//!
//! Entries are written after the primary action has committed, on a spawned
//! task. A failed write is logged and dropped; it never reaches the caller.

use futures::future::join_all;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{ActivityLog, NewActivity};
use crate::repo;

#[derive(Clone)]
pub struct ActivityRecorder {
    db: PgPool,
}

impl ActivityRecorder {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn record(&self, entry: NewActivity) {
        self.record_all(vec![entry]);
    }

    /// Writes every entry concurrently in the background.
    pub fn record_all(&self, entries: Vec<NewActivity>) {
        if entries.is_empty() {
            return;
        }
        let db = self.db.clone();

        tokio::spawn(async move {
            join_all(entries.iter().map(|entry| write_entry(&db, entry))).await;
        });
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ActivityLog>, i64), sqlx::Error> {
        let mut conn = self.db.acquire().await?;
        repo::activity::list_for_user(&mut conn, user_id, limit, offset).await
    }
}

async fn write_entry(db: &PgPool, entry: &NewActivity) {
    let result = async {
        let mut conn = db.acquire().await?;
        repo::activity::insert(&mut conn, entry).await
    }
    .await;

    match result {
        Ok(()) => tracing::info!(
            user_id = %entry.user_id,
            action = %entry.kind,
            "Activity recorded"
        ),
        Err(e) => tracing::warn!(
            user_id = %entry.user_id,
            action = %entry.kind,
            error = %e,
            "Failed to record activity"
        ),
    }
}
