//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions with
//! stricter security settings (SameSite=Strict, 24hr expiry).

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "tidemark_admin_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// # Arguments
///
/// * `pool` - `PostgreSQL` connection pool
/// * `config` - Admin configuration (for determining HTTPS mode)
///
/// # Panics
///
/// Panics if the schema name or table name is invalid, which the hardcoded
/// `tower_sessions.session` never is.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore> {
    // Table is created by the admin_users migration
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("tower_sessions")
        .expect("valid schema name")
        .with_table_name("session")
        .expect("valid table name");

    let is_secure = config.is_https();

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
