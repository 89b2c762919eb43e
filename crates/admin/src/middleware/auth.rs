//! Authentication extractors and session helpers for admin.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentAdmin, FlashMessage, session_keys};

/// Login page path anonymous requests are sent to.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires admin authentication.
///
/// Anonymous HTML requests are redirected to [`LOGIN_PATH`]; requests
/// without a session layer get 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Rejection for the admin extractors.
#[derive(Debug)]
pub enum AdminAuthRejection {
    RedirectToLogin,
    Unauthorized,
    /// Logged in, but the role may only read.
    ReadOnly,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::ReadOnly => (
                StatusCode::FORBIDDEN,
                "Your account has read-only access",
            )
                .into_response(),
        }
    }
}

async fn session_admin(parts: &Parts) -> Result<CurrentAdmin, AdminAuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AdminAuthRejection::Unauthorized)?;

    let admin: CurrentAdmin = session
        .get(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .ok_or(AdminAuthRejection::RedirectToLogin)?;

    set_sentry_user(admin.id, Some(admin.email.as_str()));
    Ok(admin)
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_admin(parts).await.map(Self)
    }
}

/// Extractor for handlers that change data: bulk actions and edits.
///
/// Viewers get 403.
pub struct RequireWriteAccess(pub CurrentAdmin);

impl<S> FromRequestParts<S> for RequireWriteAccess
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = session_admin(parts).await?;
        if !admin.role.can_write() {
            tracing::warn!(admin_id = %admin.id, role = ?admin.role, "Write attempt by read-only admin");
            return Err(AdminAuthRejection::ReadOnly);
        }
        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the current admin.
///
/// Used by the login page to skip the form for an active session.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Store the logged-in admin in the session.
///
/// The session id is cycled first so a pre-login id can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Log out: drop everything in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await?;
    clear_sentry_user();
    Ok(())
}

/// Queue messages for the next page load.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flash(
    session: &Session,
    messages: impl IntoIterator<Item = FlashMessage>,
) -> Result<(), tower_sessions::session::Error> {
    let mut pending: Vec<FlashMessage> = session
        .get(session_keys::FLASH_MESSAGES)
        .await?
        .unwrap_or_default();
    pending.extend(messages);
    session.insert(session_keys::FLASH_MESSAGES, pending).await
}

/// Take and clear pending messages. Each message is shown once.
///
/// A session error yields no messages rather than failing the page.
pub async fn take_flash(session: &Session) -> Vec<FlashMessage> {
    match session
        .remove::<Vec<FlashMessage>>(session_keys::FLASH_MESSAGES)
        .await
    {
        Ok(messages) => messages.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        }
    }
}
