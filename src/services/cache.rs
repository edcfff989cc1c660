//! Redis cache for computed report data.
//!
//! Values are stored as JSON with a TTL. Every write that changes a
//! project's packages, bids or team drops that project's report keys, so a
//! hit is never older than the last write plus Redis propagation.

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

/// Redis cache client with connection pooling.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    default_ttl: Duration,
}

impl RedisCache {
    pub async fn new(redis_url: &str, default_ttl_seconds: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        tracing::info!("Redis cache connected");

        Ok(Self {
            conn,
            default_ttl: Duration::from_secs(default_ttl_seconds),
        })
    }

    /// Get a value from cache. Misses, Redis failures and stale encodings
    /// all read as `None`.
    #[instrument(skip(self), fields(cache_hit))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone();

        let hit = match conn.get::<_, Option<String>>(key).await {
            Ok(Some(data)) => match serde_json::from_str(&data) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = key, error = %e, "Failed to deserialize cached value");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!(key = key, error = %e, "Redis get error");
                None
            }
        };

        tracing::Span::current().record("cache_hit", hit.is_some());
        debug!(key = key, hit = hit.is_some(), "Cache lookup");
        hit
    }

    /// Set a value in cache with the default TTL.
    #[instrument(skip(self, value))]
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut conn = self.conn.clone();

        let data = serde_json::to_string(value).context("Failed to serialize value for cache")?;

        conn.set_ex::<_, _, ()>(key, data, self.default_ttl.as_secs())
            .await
            .context("Failed to set cache value")?;

        debug!(key = key, ttl_secs = self.default_ttl.as_secs(), "Cached value");
        Ok(())
    }

    /// Delete the given keys; returns how many existed.
    #[instrument(skip(self), fields(count = keys.len()))]
    pub async fn delete(&self, keys: &[String]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let deleted: usize = conn.del(keys).await.context("Failed to delete cache keys")?;

        debug!(deleted = deleted, "Cache delete");
        Ok(deleted)
    }

    /// Drops every cached report of a project. Failures are logged only.
    pub async fn invalidate_project(&self, project_id: Uuid) {
        self.invalidate_projects(&[project_id]).await;
    }

    /// Drops every cached report of each project in one round trip.
    pub async fn invalidate_projects(&self, project_ids: &[Uuid]) {
        let keys: Vec<String> = project_ids
            .iter()
            .flat_map(|id| keys::project_reports(*id))
            .collect();
        if let Err(e) = self.delete(&keys).await {
            warn!(projects = project_ids.len(), error = %e, "Failed to invalidate report cache");
        }
    }

    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis health check failed")?;
        Ok(())
    }
}

/// Cache key builders.
pub mod keys {
    use uuid::Uuid;

    use crate::domain::ReportKind;

    /// Computed data of one report kind for one project
    pub fn report(kind: ReportKind, project_id: Uuid) -> String {
        format!("report:{}:project:{}", kind, project_id)
    }

    /// Every key a project's reports can be cached under
    pub fn project_reports(project_id: Uuid) -> Vec<String> {
        ReportKind::ALL
            .iter()
            .map(|kind| report(*kind, project_id))
            .collect()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_report_key_shape() {
            assert_eq!(
                report(ReportKind::Financial, Uuid::nil()),
                "report:financial:project:00000000-0000-0000-0000-000000000000"
            );
        }

        #[test]
        fn test_project_reports_covers_every_cached_kind() {
            let project_id = Uuid::new_v4();
            let other = Uuid::new_v4();
            let keys = project_reports(project_id);

            assert_eq!(keys.len(), ReportKind::ALL.len());
            for kind in ReportKind::ALL {
                assert!(keys.contains(&report(*kind, project_id)));
                assert!(!keys.contains(&report(*kind, other)));
            }
        }
    }
}
