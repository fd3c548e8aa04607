//! PostgreSQL connection pool management.

use std::time::Duration;

use sqlx::postgres::{PgListener, PgPool, PgPoolOptions};
use tracing::info;

use bookswap_core::config::DatabaseConfig;
use bookswap_core::error::AppError;
use bookswap_core::resilience::{RetryPolicy, retry_with_connection};

use crate::error::db_error;

/// Wrapper around the sqlx PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    /// The underlying sqlx connection pool.
    pool: PgPool,
}

impl DatabasePool {
    /// Connect using the pool settings from configuration.
    ///
    /// Connection failures at startup are retried a few times with a
    /// doubling delay before giving up.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            url = %mask_password(&config.url),
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let policy = RetryPolicy::exponential(3, Duration::from_millis(500), Duration::from_secs(4));
        let pool = retry_with_connection("database.connect", &policy, || async {
            PgPoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
                .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
                .connect(&config.url)
                .await
                .map_err(|e| db_error("Failed to connect to database", e))
        })
        .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Open a dedicated `LISTEN` connection for change notifications.
    pub async fn listener(&self, channel: &str) -> Result<PgListener, AppError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| db_error("Failed to open listener connection", e))?;
        listener
            .listen(channel)
            .await
            .map_err(|e| db_error("Failed to LISTEN on channel", e))?;
        info!(channel, "Listening for database notifications");
        Ok(listener)
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| db_error("Health check failed", e))
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Mask the password portion of a database URL for safe logging.
fn mask_password(url: &str) -> String {
    let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
    let Some(at_pos) = url.rfind('@') else {
        return url.to_string();
    };
    match url[scheme_end..at_pos].find(':') {
        Some(rel) => {
            let colon = scheme_end + rel;
            format!("{}:****{}", &url[..colon], &url[at_pos..])
        }
        None => url.to_string(),
    }
}
