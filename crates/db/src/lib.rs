//! PostgreSQL storage for the custody ledger.
//!
//! [`PgCustodyStore`] implements every port from `custody_core::ports` on top
//! of the repositories in [`repositories`].

use std::time::Duration;

use custody_core::config::{parse_or, ConfigError};
use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod models;
pub mod repositories;
pub mod store;

pub use store::{PgCustodyStore, PgTransaction};

pub type DbPool = sqlx::PgPool;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

/// Connection settings for the ledger database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Applied as `lock_timeout` to every arrangement transaction.
    pub lock_timeout: Duration,
}

impl DbConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Default    |
    /// |----------------------|------------|
    /// | `DATABASE_URL`       | (required) |
    /// | `DB_MAX_CONNECTIONS` | `10`       |
    /// | `DB_LOCK_TIMEOUT_MS` | `5000`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let lock_timeout_ms = parse_or(
            &lookup,
            "DB_LOCK_TIMEOUT_MS",
            DEFAULT_LOCK_TIMEOUT_MS,
            "a duration in milliseconds",
        )?;

        Ok(Self {
            database_url,
            max_connections: parse_or(
                &lookup,
                "DB_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
                "a positive integer",
            )?,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        })
    }
}

/// Create a connection pool from `config`.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
}

/// Round-trip a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
