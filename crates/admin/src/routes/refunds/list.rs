//! Refund request list page handler.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    components::data_table::{
        BulkAction, DataTableConfig, DateDrilldown, FilterLink, TableColumn, query_string,
        refunds_table_config,
    },
    db::RefundRepository,
    error::AppError,
    filters,
    middleware::{RequireAdminAuth, take_flash},
    models::refund::PAGE_SIZE,
    state::AppState,
};

use super::super::{Layout, Pagination, render_html};
use super::types::{RefundRowView, RefundsQuery};

const PATH: &str = "/refunds";

/// A sidebar filter with its links.
#[derive(Debug, Clone)]
pub struct FilterView {
    pub label: String,
    pub links: Vec<FilterLink>,
}

/// Refund list page template.
#[derive(Template)]
#[template(path = "refunds/index.html")]
pub struct RefundsIndexTemplate {
    pub layout: Layout,
    pub table_id: String,
    pub columns: Vec<TableColumn>,
    pub filters: Vec<FilterView>,
    pub bulk_actions: Vec<BulkAction>,
    pub search_placeholder: String,
    pub empty_icon: String,
    pub empty_title: String,
    pub drill_back: Option<FilterLink>,
    pub drill_links: Vec<FilterLink>,
    pub refunds: Vec<RefundRowView>,
    pub pagination: Pagination,
    pub search_value: String,
    /// This page's URL, posted back as `next` by the action form.
    pub current_url: String,
    pub can_write: bool,
}

/// Refund list page handler.
///
/// GET /refunds
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<RefundsQuery>,
) -> Result<Html<String>, AppError> {
    let repo = RefundRepository::new(state.pool());
    let filter = query.to_filter(Utc::now());
    let (refunds, total) = repo.list(&filter).await?;

    let drilldown = DateDrilldown {
        year: filter.year,
        month: filter.month,
        years: if filter.year.is_none() {
            repo.years().await?
        } else {
            Vec::new()
        },
        months: match (filter.year, filter.month) {
            (Some(year), None) => repo.months(year).await?,
            _ => Vec::new(),
        },
    };

    let params = query.preserved();
    let config: DataTableConfig = refunds_table_config().with_selected(|key| match key {
        "status" => filter.status.map(|s| s.as_str()),
        "reason" => filter.reason.map(|r| r.as_str()),
        "created" => query.created().map(|c| c.key()),
        _ => None,
    });
    let filters = config
        .filters
        .iter()
        .map(|f| FilterView {
            label: f.label.clone(),
            links: f.links(PATH, &params),
        })
        .collect();

    let page = query.page();
    let mut current_params = params.clone();
    if page > 1 {
        current_params.push(("page", page.to_string()));
    }

    let template = RefundsIndexTemplate {
        layout: Layout::new(
            &admin,
            state.registry(),
            "refunds",
            take_flash(&session).await,
        ),
        table_id: config.table_id,
        columns: config.columns,
        filters,
        bulk_actions: config.bulk_actions,
        search_placeholder: config.search_placeholder,
        empty_icon: config.empty_icon,
        empty_title: config.empty_title,
        drill_back: drilldown.back_link(PATH, &params),
        drill_links: drilldown.links(PATH, &params),
        refunds: refunds.iter().map(RefundRowView::from).collect(),
        pagination: Pagination::new(PATH, &params, page, PAGE_SIZE, total),
        search_value: filter.search.clone().unwrap_or_default(),
        current_url: format!("{PATH}{}", query_string(&current_params)),
        can_write: admin.role.can_write(),
    };

    Ok(render_html(&template))
}
