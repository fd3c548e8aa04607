//! Broadcast view repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use bookswap_core::result::AppResult;

use crate::error::db_error;
use crate::store::BroadcastViewStore;

/// Repository for the `broadcast_views` table.
#[derive(Debug, Clone)]
pub struct BroadcastViewRepository {
    pool: PgPool,
}

impl BroadcastViewRepository {
    /// Create a new broadcast view repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BroadcastViewStore for BroadcastViewRepository {
    async fn record_view(&self, broadcast_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO broadcast_views (broadcast_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (broadcast_id, user_id) DO NOTHING",
        )
        .bind(broadcast_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record broadcast view", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove_view(&self, broadcast_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM broadcast_views WHERE broadcast_id = $1 AND user_id = $2")
                .bind(broadcast_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Failed to remove broadcast view", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn viewed_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar("SELECT broadcast_id FROM broadcast_views WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list broadcast views", e))
    }

    async fn delete_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM broadcast_views WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete broadcast views", e))?;
        Ok(result.rows_affected())
    }
}
