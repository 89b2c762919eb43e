//! Admin user repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tidemark_core::{AdminUserId, Email};

use super::RepositoryError;
use crate::models::admin_user::{AdminRole, AdminUser};

const ADMIN_USER_COLUMNS: &str = "id, email, name, role, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: AdminUserId,
    email: String,
    name: String,
    role: AdminRole,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            name: row.name,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: AdminUserRow,
    password_hash: String,
}

/// Repository for admin user database operations.
pub struct AdminUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an admin user and their stored password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {ADMIN_USER_COLUMNS}, password_hash FROM admin_users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Create a new admin user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        role: AdminRole,
        password_hash: &str,
    ) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "INSERT INTO admin_users (email, name, role, password_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ADMIN_USER_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(role)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email"))?;

        row.try_into()
    }
}
