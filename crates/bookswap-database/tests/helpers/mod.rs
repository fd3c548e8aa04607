//! Shared helpers for repository integration tests.
//!
//! The tests need a disposable PostgreSQL database. Point
//! `BOOKSWAP_TEST_DATABASE_URL` at one to run them; without it every test
//! returns early.

#![allow(dead_code)]

use std::str::FromStr;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

/// Environment variable holding the test database URL.
pub const TEST_DATABASE_URL: &str = "BOOKSWAP_TEST_DATABASE_URL";

/// Schema without any BookSwap tables.
const EMPTY_SCHEMA: &str = "bookswap_unprovisioned";

/// A migrated test database.
pub struct TestDb {
    /// Pool with the BookSwap tables on its search path.
    pub pool: PgPool,
}

impl TestDb {
    /// Connect and migrate, or `None` when no test database is configured.
    pub async fn connect() -> Option<Self> {
        let Ok(url) = std::env::var(TEST_DATABASE_URL) else {
            eprintln!("{TEST_DATABASE_URL} not set, skipping database test");
            return None;
        };

        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .expect("Failed to connect to test database");

        bookswap_database::migration::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        Some(Self { pool })
    }

    /// A pool whose search path holds no BookSwap tables, so every query
    /// hits `undefined_table`.
    pub async fn unprovisioned_pool(&self) -> PgPool {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {EMPTY_SCHEMA}"))
            .execute(&self.pool)
            .await
            .expect("Failed to create empty schema");

        let url = std::env::var(TEST_DATABASE_URL).expect("test database URL");
        let options = PgConnectOptions::from_str(&url)
            .expect("Invalid test database URL")
            .options([("search_path", EMPTY_SCHEMA)]);

        PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to connect with empty search path")
    }
}
