//! Refund item pages. Read-only: items are edited inline on their refund.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::Html,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use tidemark_core::{Money, RefundItemId};

use crate::{
    components::data_table::{TableColumn, refund_items_table_config},
    db::RefundItemRepository,
    error::AppError,
    filters,
    middleware::{RequireAdminAuth, take_flash},
    models::refund::{PAGE_SIZE, RefundItem, RefundItemFilter},
    state::AppState,
};

use super::refunds::FilterView;
use super::{Layout, Pagination, page_number, render_html, search_term};

const PATH: &str = "/refund-items";

/// Refund item list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct RefundItemsQuery {
    pub condition_acceptable: Option<String>,
    pub restocked: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
}

fn yes_no(raw: Option<&str>) -> Option<bool> {
    match raw {
        Some("yes") => Some(true),
        Some("no") => Some(false),
        _ => None,
    }
}

impl RefundItemsQuery {
    #[must_use]
    pub fn to_filter(&self) -> RefundItemFilter {
        let page = page_number(self.page.as_deref());
        RefundItemFilter {
            condition_acceptable: yes_no(self.condition_acceptable.as_deref()),
            restocked: yes_no(self.restocked.as_deref()),
            search: search_term(self.q.as_deref()),
            limit: PAGE_SIZE,
            offset: (page - 1) * PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn preserved(&self) -> Vec<(&'static str, String)> {
        let filter = self.to_filter();
        let mut params = Vec::new();
        let flag = |b: bool| if b { "yes" } else { "no" }.to_string();
        if let Some(acceptable) = filter.condition_acceptable {
            params.push(("condition_acceptable", flag(acceptable)));
        }
        if let Some(restocked) = filter.restocked {
            params.push(("restocked", flag(restocked)));
        }
        if let Some(q) = filter.search {
            params.push(("q", q));
        }
        params
    }
}

/// One refund item row or detail.
#[derive(Debug, Clone)]
pub struct RefundItemView {
    pub id: String,
    pub url: String,
    pub refund_request: String,
    pub refund_url: String,
    pub order_item: String,
    pub product: String,
    pub quantity: i32,
    pub refund_amount: String,
    pub condition_acceptable: bool,
    pub restocked: bool,
    pub condition_notes: String,
}

impl From<&RefundItem> for RefundItemView {
    fn from(item: &RefundItem) -> Self {
        Self {
            id: item.id.to_string(),
            url: format!("{PATH}/{}", item.id),
            refund_request: format!("Refund #{}", item.refund_request_id),
            refund_url: format!("/refunds/{}", item.refund_request_id),
            order_item: format!("Order item #{}", item.order_item_id),
            product: item.product_name(),
            quantity: item.quantity_to_refund,
            refund_amount: Money::new(item.refund_amount).to_string(),
            condition_acceptable: item.condition_acceptable,
            restocked: item.restocked,
            condition_notes: item.condition_notes.clone(),
        }
    }
}

/// Refund item list template.
#[derive(Template)]
#[template(path = "refund_items/index.html")]
pub struct RefundItemsIndexTemplate {
    pub layout: Layout,
    pub columns: Vec<TableColumn>,
    pub filters: Vec<FilterView>,
    pub search_placeholder: String,
    pub empty_icon: String,
    pub empty_title: String,
    pub items: Vec<RefundItemView>,
    pub pagination: Pagination,
    pub search_value: String,
}

/// Refund item detail template.
#[derive(Template)]
#[template(path = "refund_items/show.html")]
pub struct RefundItemShowTemplate {
    pub layout: Layout,
    pub item: RefundItemView,
}

/// Refund item list page handler.
///
/// GET /refund-items
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<RefundItemsQuery>,
) -> Result<Html<String>, AppError> {
    let filter = query.to_filter();
    let (items, total) = RefundItemRepository::new(state.pool()).list(&filter).await?;

    let params = query.preserved();
    let config = refund_items_table_config().with_selected(|key| {
        let value = match key {
            "condition_acceptable" => filter.condition_acceptable,
            "restocked" => filter.restocked,
            _ => None,
        };
        value.map(|b| if b { "yes" } else { "no" })
    });
    let filters = config
        .filters
        .iter()
        .map(|f| FilterView {
            label: f.label.clone(),
            links: f.links(PATH, &params),
        })
        .collect();

    let page = page_number(query.page.as_deref());
    let template = RefundItemsIndexTemplate {
        layout: Layout::new(&admin, state.registry(), "refund_items", take_flash(&session).await),
        columns: config.columns,
        filters,
        search_placeholder: config.search_placeholder,
        empty_icon: config.empty_icon,
        empty_title: config.empty_title,
        items: items.iter().map(RefundItemView::from).collect(),
        pagination: Pagination::new(PATH, &params, page, PAGE_SIZE, total),
        search_value: filter.search.unwrap_or_default(),
    };

    Ok(render_html(&template))
}

/// Refund item detail page handler.
///
/// GET /refund-items/{id}
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let id = RefundItemId::new(id);
    let item = RefundItemRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("refund item #{id}")))?;

    let template = RefundItemShowTemplate {
        layout: Layout::new(&admin, state.registry(), "refund_items", take_flash(&session).await),
        item: RefundItemView::from(&item),
    };

    Ok(render_html(&template))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_yes_no_filters() {
        let query = RefundItemsQuery {
            condition_acceptable: Some("yes".to_string()),
            restocked: Some("maybe".to_string()),
            q: Some(" 42 ".to_string()),
            page: None,
        };
        let filter = query.to_filter();
        assert_eq!(filter.condition_acceptable, Some(true));
        assert_eq!(filter.restocked, None);
        assert_eq!(filter.search.as_deref(), Some("42"));
        assert_eq!(
            query.preserved(),
            vec![
                ("condition_acceptable", "yes".to_string()),
                ("q", "42".to_string())
            ]
        );
    }

    #[test]
    fn test_missing_product_renders_error_text() {
        let item = RefundItem {
            id: RefundItemId::new(5),
            refund_request_id: tidemark_core::RefundRequestId::new(7),
            order_item_id: tidemark_core::OrderItemId::new(88),
            quantity_to_refund: 2,
            refund_amount: rust_decimal::Decimal::new(1_250, 2),
            condition_acceptable: true,
            restocked: false,
            condition_notes: String::new(),
            product_id: None,
            product_title: None,
        };
        let view = RefundItemView::from(&item);
        assert_eq!(view.product, "Error: order item #88 has no product");
        assert_eq!(view.refund_amount, "$12.50");
        assert_eq!(view.refund_url, "/refunds/7");
    }
}
