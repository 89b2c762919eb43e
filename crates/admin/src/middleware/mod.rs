//! HTTP middleware for admin: session storage and authentication extractors.

pub mod auth;
pub mod session;

pub use auth::{
    AdminAuthRejection, LOGIN_PATH, OptionalAdminAuth, RequireAdminAuth, RequireWriteAccess,
    clear_current_admin, push_flash, set_current_admin, take_flash,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
