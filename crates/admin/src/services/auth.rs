//! Admin authentication service.
//!
//! Email + password login for the admin panel. Passwords are stored as
//! Argon2id PHC strings.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use thiserror::Error;

use tidemark_core::{AdminRole, Email, EmailError};

use crate::db::RepositoryError;
use crate::db::admin_users::AdminUserRepository;
use crate::models::AdminUser;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Unknown email or wrong password. The two are never distinguished.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("admin user already exists")]
    UserAlreadyExists,

    #[error("weak password: {0}")]
    WeakPassword(String),

    #[error("password hashing failed")]
    PasswordHash,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: AdminUserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: AdminUserRepository::new(pool),
        }
    }

    /// Verify an email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidCredentials` if the user doesn't exist or
    /// the password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Create an admin user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn create_admin(
        &self,
        email: &str,
        name: &str,
        role: AdminRole,
        password: &str,
    ) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create(&email, name, role, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_malformed_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("longenough").is_ok());
    }
}
