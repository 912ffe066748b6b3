//! Persistence collaborator for users and refresh-token sessions.
//!
//! The Auth Service talks to storage only through the [`UserStore`] and
//! [`SessionStore`] traits. Two implementations are provided:
//!
//! - [`repositories::PgStore`] -- PostgreSQL via `sqlx`.
//! - [`repositories::MemoryStore`] -- a single-lock in-memory map, used for
//!   local development and tests.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod models;
pub mod repositories;

pub use error::StoreError;
pub use repositories::{MemoryStore, PgStore, SessionStore, UserStore};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Run a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
