//! Session-stored types: the logged-in admin and one-shot flash messages.

use serde::{Deserialize, Serialize};

use tidemark_core::{AdminUserId, Email};

use super::admin_user::AdminRole;

/// Session-stored admin identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's database ID.
    pub id: AdminUserId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role/permission level.
    pub role: AdminRole,
}

/// Severity of an operator-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl MessageLevel {
    /// CSS class suffix used by the templates.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A message shown once on the next page the admin loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl FlashMessage {
    #[must_use]
    pub fn new(level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(MessageLevel::Success, text)
    }

    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(MessageLevel::Warning, text)
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageLevel::Error, text)
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for pending flash messages.
    pub const FLASH_MESSAGES: &str = "flash_messages";
}
