//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Dashboard
//! GET  /                          - Section overview and refund counts
//!
//! # Auth (email + password)
//! GET  /login                     - Login page
//! POST /login                     - Verify credentials
//! POST /logout                    - Logout
//!
//! # Refunds
//! GET  /refunds                   - Refund request list (filters, search, date drill-down)
//! POST /refunds/actions           - Run a bulk action on the selected refunds
//! GET  /refunds/{id}              - Refund detail with inline items
//! POST /refunds/{id}              - Save editable fields
//!
//! # Refund items (read-only)
//! GET  /refund-items              - Refund item list
//! GET  /refund-items/{id}         - Refund item detail
//!
//! # Orders (read-only)
//! GET  /orders                    - Order list
//! GET  /orders/{id}               - Order detail with items and addresses
//! GET  /order-items               - Order item list
//! GET  /shipping-addresses        - Shipping address list
//! ```
//!
//! `/health`, `/health/ready` and `/static` are mounted in `main`.

pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod refund_items;
pub mod refunds;

use askama::Template;
use axum::{
    Router,
    response::Html,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;

use tidemark_core::AdminRole;

use crate::middleware::push_flash;
use crate::models::refund::PAGE_SIZE;
use crate::models::{CurrentAdmin, FlashMessage};
use crate::registry::AdminRegistry;
use crate::state::AppState;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/refunds", get(refunds::index))
        .route("/refunds/actions", post(refunds::run_action))
        .route("/refunds/{id}", get(refunds::show).post(refunds::update))
        .route("/refund-items", get(refund_items::index))
        .route("/refund-items/{id}", get(refund_items::show))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/order-items", get(orders::items))
        .route("/shipping-addresses", get(orders::addresses))
}

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub can_write: bool,
    pub is_super_admin: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.to_string(),
            can_write: admin.role.can_write(),
            is_super_admin: admin.role == AdminRole::SuperAdmin,
        }
    }
}

/// Navigation entry.
#[derive(Debug, Clone)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
    pub active: bool,
}

/// Everything `base.html` needs: who is logged in, the nav and pending
/// messages.
#[derive(Debug, Clone)]
pub struct Layout {
    pub admin_user: AdminUserView,
    pub nav: Vec<NavItem>,
    pub messages: Vec<FlashMessage>,
}

impl Layout {
    #[must_use]
    pub fn new(
        admin: &CurrentAdmin,
        registry: &AdminRegistry,
        active_section: &str,
        messages: Vec<FlashMessage>,
    ) -> Self {
        let nav = registry
            .sections()
            .iter()
            .map(|s| NavItem {
                label: s.label,
                path: s.path,
                active: s.key == active_section,
            })
            .collect();

        Self {
            admin_user: AdminUserView::from(admin),
            nav,
            messages,
        }
    }
}

/// `?page=` and `?q=` shared by every list page.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

/// Pagination links for a list page.
#[derive(Debug, Clone)]
pub struct Pagination {
    /// 1-based.
    pub page: i64,
    pub pages: i64,
    pub total: i64,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pagination {
    /// `params` are the other query parameters to preserve, already
    /// filtered to non-empty values.
    #[must_use]
    pub fn new(path: &str, params: &[(&str, String)], page: i64, per_page: i64, total: i64) -> Self {
        let pages = if total == 0 {
            1
        } else {
            (total + per_page - 1) / per_page
        };
        let link = |p: i64| {
            let mut query = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("page", &p.to_string());
            format!("{path}?{}", query.finish())
        };

        Self {
            page,
            pages,
            total,
            prev_url: (page > 1).then(|| link(page - 1)),
            next_url: (page < pages).then(|| link(page + 1)),
        }
    }

    #[must_use]
    pub const fn has_pages(&self) -> bool {
        self.pages > 1
    }
}

/// Highest page whose row offset still fits in an `i64`.
pub const MAX_PAGE: i64 = i64::MAX / PAGE_SIZE;

/// Parse `?page=`; missing, malformed or out-of-range values mean page 1.
#[must_use]
pub fn page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| (1..=MAX_PAGE).contains(p))
        .unwrap_or(1)
}

/// Non-empty, trimmed search query.
#[must_use]
pub fn search_term(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|q| !q.is_empty())
        .map(ToString::to_string)
}

/// Queue flash messages; a session failure is logged, not raised.
pub async fn notify(session: &Session, messages: impl IntoIterator<Item = FlashMessage>) {
    if let Err(e) = push_flash(session, messages).await {
        tracing::warn!("Failed to store flash message: {}", e);
    }
}

/// Render a template, logging and degrading to a plain error on failure.
pub fn render_html<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number() {
        assert_eq!(page_number(None), 1);
        assert_eq!(page_number(Some("3")), 3);
        assert_eq!(page_number(Some("0")), 1);
        assert_eq!(page_number(Some("-2")), 1);
        assert_eq!(page_number(Some("abc")), 1);
        assert_eq!(page_number(Some(&MAX_PAGE.to_string())), MAX_PAGE);
        assert_eq!(page_number(Some(&(MAX_PAGE + 1).to_string())), 1);
        assert_eq!(page_number(Some("9223372036854775807")), 1);
        assert_eq!(page_number(Some("99999999999999999999")), 1);
    }

    #[test]
    fn test_pagination_links_preserve_params() {
        let params = [("status", "COMPLETED".to_string()), ("q", "ana lee".to_string())];
        let pagination = Pagination::new("/refunds", &params, 2, 100, 250);
        assert_eq!(pagination.pages, 3);
        assert_eq!(
            pagination.prev_url.as_deref(),
            Some("/refunds?status=COMPLETED&q=ana+lee&page=1")
        );
        assert_eq!(
            pagination.next_url.as_deref(),
            Some("/refunds?status=COMPLETED&q=ana+lee&page=3")
        );
    }

    #[test]
    fn test_pagination_single_page() {
        let pagination = Pagination::new("/orders", &[], 1, 100, 0);
        assert_eq!(pagination.pages, 1);
        assert!(!pagination.has_pages());
        assert!(pagination.prev_url.is_none());
        assert!(pagination.next_url.is_none());
    }

    #[test]
    fn test_search_term_trims_and_drops_empty() {
        assert_eq!(search_term(Some("  maria ")), Some("maria".to_string()));
        assert_eq!(search_term(Some("   ")), None);
        assert_eq!(search_term(None), None);
    }
}
