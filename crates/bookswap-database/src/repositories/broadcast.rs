//! Broadcast repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bookswap_core::result::AppResult;
use bookswap_entity::broadcast::{Broadcast, BroadcastPatch, NewBroadcast};

use crate::error::db_error;
use crate::store::BroadcastStore;

const COLUMNS: &str =
    "id, title, message, type, priority, target_audience, active, created_by, created_at, expires_at";

/// Repository for the `broadcasts` table.
#[derive(Debug, Clone)]
pub struct BroadcastRepository {
    pool: PgPool,
}

impl BroadcastRepository {
    /// Create a new broadcast repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BroadcastStore for BroadcastRepository {
    async fn find_active(&self, now: DateTime<Utc>) -> AppResult<Vec<Broadcast>> {
        sqlx::query_as::<_, Broadcast>(&format!(
            "SELECT {COLUMNS} FROM broadcasts \
             WHERE active = TRUE AND (expires_at IS NULL OR expires_at > $1) \
             ORDER BY created_at DESC"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list active broadcasts", e))
    }

    async fn find_recent(&self, limit: i64) -> AppResult<Vec<Broadcast>> {
        sqlx::query_as::<_, Broadcast>(&format!(
            "SELECT {COLUMNS} FROM broadcasts ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list broadcasts", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Broadcast>> {
        sqlx::query_as::<_, Broadcast>(&format!(
            "SELECT {COLUMNS} FROM broadcasts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to load broadcast", e))
    }

    async fn create(&self, input: &NewBroadcast) -> AppResult<Broadcast> {
        sqlx::query_as::<_, Broadcast>(&format!(
            "INSERT INTO broadcasts (title, message, type, priority, target_audience, created_by, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.message)
        .bind(input.broadcast_type.as_str())
        .bind(input.priority.as_str())
        .bind(input.target_audience.as_str())
        .bind(input.created_by)
        .bind(input.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to create broadcast", e))
    }

    async fn update(&self, id: Uuid, patch: &BroadcastPatch) -> AppResult<Option<Broadcast>> {
        sqlx::query_as::<_, Broadcast>(&format!(
            "UPDATE broadcasts SET \
                title = COALESCE($2, title), \
                message = COALESCE($3, message), \
                priority = COALESCE($4, priority), \
                target_audience = COALESCE($5, target_audience), \
                active = COALESCE($6, active), \
                expires_at = CASE WHEN $8 THEN NULL ELSE COALESCE($7, expires_at) END \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.message.as_deref())
        .bind(patch.priority.map(|p| p.as_str()))
        .bind(patch.target_audience.map(|a| a.as_str()))
        .bind(patch.active)
        .bind(patch.expires_at)
        .bind(patch.clear_expiry)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update broadcast", e))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM broadcasts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete broadcast", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE broadcasts SET active = FALSE \
             WHERE active = TRUE AND expires_at IS NOT NULL AND expires_at < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to deactivate expired broadcasts", e))?;
        Ok(result.rows_affected())
    }
}
