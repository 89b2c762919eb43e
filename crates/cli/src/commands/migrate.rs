//! Database migration command.
//!
//! Applies the SQL files in the workspace `migrations/` directory, which are
//! embedded at compile time.
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use thiserror::Error;

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../../migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
