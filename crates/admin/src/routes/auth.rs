//! Authentication route handlers for admin.
//!
//! Email + password login; the session stores a `CurrentAdmin`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::{AdminAuthService, AuthError};
use crate::state::AppState;

/// Login form.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// `?error=` on the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
}

/// Operator-facing text for a `?error=` code.
fn login_error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Please enter the correct email and password for a staff account.",
        "session" => "Could not start a session. Please try again.",
        _ => "Login failed. Please try again.",
    }
}

/// Display the login page, or skip it for an active session.
///
/// GET /login
pub async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        error: query.error.as_deref().map(login_error_message),
    }
    .into_response()
}

/// Handle login form submission.
///
/// POST /login
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let auth = AdminAuthService::new(state.pool());

    let user = match auth.login(&form.email, &form.password).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => {
            tracing::warn!("Admin login failed: invalid credentials");
            return Redirect::to("/login?error=credentials").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Admin login failed");
            return Redirect::to("/login?error=unknown").into_response();
        }
    };

    let current = CurrentAdmin {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    };

    if let Err(e) = set_current_admin(&session, &current).await {
        tracing::error!("Failed to set session: {}", e);
        return Redirect::to("/login?error=session").into_response();
    }

    tracing::info!(admin_id = %current.id, "Admin logged in");
    Redirect::to("/").into_response()
}

/// Logout and clear session.
///
/// POST /logout
pub async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!("Failed to clear session on logout: {}", e);
    }
    Redirect::to("/login")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_form_debug_redacts_password() {
        let form = LoginForm {
            email: "ops@tidemark.test".to_string(),
            password: "hunter2hunter2".to_string(),
        };
        let debug = format!("{form:?}");
        assert!(debug.contains("ops@tidemark.test"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_login_error_messages() {
        assert!(login_error_message("credentials").contains("correct email and password"));
        assert_eq!(
            login_error_message("whatever"),
            "Login failed. Please try again."
        );
    }
}
