//! Database operations for the admin panel.
//!
//! # Tables
//!
//! - `refund_requests` / `refund_items` - Refund workflow state
//! - `orders`, `order_items`, `shipping_addresses` - Read-only order context
//! - `products` - Stock counters touched by restocking
//! - `users` / `reward_transactions` - Loyalty balances and their ledger
//! - `admin_users` - Admin authentication
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations live in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p tidemark-cli -- migrate
//! ```

pub mod admin_users;
pub mod orders;
pub mod refund_hooks;
pub mod refund_items;
pub mod refunds;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_users::AdminUserRepository;
pub use orders::OrderRepository;
pub use refund_hooks::PgRefundHooks;
pub use refund_items::RefundItemRepository;
pub use refunds::{PgRefundStore, RefundRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, everything else to `Database`.
    pub(crate) fn from_unique(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }
}

/// `ILIKE` pattern matching `q` anywhere, with wildcards in `q` escaped.
pub(crate) fn like_pattern(q: &str) -> String {
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("linen"), "%linen%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }
}
