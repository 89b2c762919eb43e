//! Admin user management commands.
//!
//! ```bash
//! tidemark admin create -e admin@example.com -n "Admin Name" -r super_admin -p '<password>'
//! ```

use thiserror::Error;

use tidemark_admin::services::{AdminAuthService, AuthError};
use tidemark_core::AdminRole;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    #[error("Admin user already exists with email: {0}")]
    UserExists(String),

    #[error(transparent)]
    Auth(AuthError),
}

/// Create a new admin user and return its ID.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: &str,
) -> Result<i32, AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;

    let pool = connect().await?;

    tracing::info!("Creating admin user: {} ({})", email, role);

    let user = AdminAuthService::new(&pool)
        .create_admin(email, name, role, password)
        .await
        .map_err(|e| match e {
            AuthError::UserAlreadyExists => AdminError::UserExists(email.to_owned()),
            other => AdminError::Auth(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id.as_i32())
}
