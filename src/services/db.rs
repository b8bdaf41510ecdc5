//! Database pool and schema management
//!
//! Domain functions in `crate::domain` take a generic sqlx `Executor`, so they
//! can be called with either `&PgPool` or a transaction connection. The
//! capture workflow only ever issues single statements, so it calls them with
//! the pool directly.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::{Error, LogErr, Result};

const MAX_CONNECTIONS: u32 = 5;

/// Connect to Postgres.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
        .log_as("Failed to connect to database", Error::Persistence)
}

/// Apply the embedded migrations under `migrations/`.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .log_as("Failed to run migrations", Error::Persistence)?;
    log::info!("Database schema is up to date");
    Ok(())
}
