//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect using `ADMIN_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(tidemark_admin::db::create_pool(&database_url).await?)
}

/// Failure to reach the database.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}
