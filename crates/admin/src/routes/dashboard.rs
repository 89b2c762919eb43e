//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    db::RefundRepository,
    error::AppError,
    filters,
    middleware::{RequireAdminAuth, take_flash},
    registry::AdminSection,
    state::AppState,
};

use super::{Layout, render_html};

/// One tile in the refund status overview.
#[derive(Debug, Clone)]
pub struct StatusCountView {
    pub label: &'static str,
    /// Value for the `?status=` filter.
    pub key: &'static str,
    pub count: i64,
}

/// A dashboard group and its sections.
#[derive(Debug, Clone)]
pub struct SectionGroupView {
    pub heading: &'static str,
    pub sections: Vec<AdminSection>,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub status_counts: Vec<StatusCountView>,
    pub groups: Vec<SectionGroupView>,
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip(admin, state, session))]
pub async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let counts = RefundRepository::new(state.pool()).count_by_status().await?;
    let status_counts = counts
        .into_iter()
        .map(|(status, count)| StatusCountView {
            label: status.label(),
            key: status.as_str(),
            count,
        })
        .collect();

    let registry = state.registry();
    let groups = registry
        .groups()
        .into_iter()
        .map(|heading| SectionGroupView {
            heading,
            sections: registry.in_group(heading).cloned().collect(),
        })
        .collect();

    let template = DashboardTemplate {
        layout: Layout::new(&admin, registry, "", take_flash(&session).await),
        status_counts,
        groups,
    };

    Ok(render_html(&template))
}
