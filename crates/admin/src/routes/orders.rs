//! Read-only order pages: orders, order items and shipping addresses.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::Html,
};
use tower_sessions::Session;
use tracing::instrument;

use tidemark_core::{Money, OrderId};

use crate::{
    db::OrderRepository,
    error::AppError,
    filters,
    middleware::{RequireAdminAuth, take_flash},
    models::order::{Order, OrderItem, ShippingAddress},
    models::refund::PAGE_SIZE,
    state::AppState,
};

use super::{Layout, ListQuery, Pagination, page_number, render_html, search_term};

/// Order row.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub url: String,
    pub customer: String,
    pub customer_name: String,
    pub total: String,
    pub rewards_used: String,
    pub rewards_earned: String,
    pub created_at: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            url: format!("/orders/{}", order.id),
            customer: order.customer_label(),
            customer_name: order.customer_name.clone(),
            total: order.total_display(),
            rewards_used: Money::new(order.rewards_used).to_string(),
            rewards_earned: Money::new(order.rewards_earned).to_string(),
            created_at: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Order item row.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub id: String,
    pub order: String,
    pub order_url: String,
    pub product: String,
    pub quantity: i32,
    pub price: String,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id.to_string(),
            order: format!("Order #{}", item.order_id),
            order_url: format!("/orders/{}", item.order_id),
            product: item.product_name(),
            quantity: item.quantity,
            price: item.price_display(),
        }
    }
}

/// Shipping address row.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub id: String,
    pub order: String,
    pub order_url: String,
    pub full_name: String,
    pub address: String,
}

impl From<&ShippingAddress> for AddressView {
    fn from(address: &ShippingAddress) -> Self {
        Self {
            id: address.id.to_string(),
            order: format!("Order #{}", address.order_id),
            order_url: format!("/orders/{}", address.order_id),
            full_name: address.full_name.clone(),
            address: address.one_line(),
        }
    }
}

#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderView>,
    pub pagination: Pagination,
    pub search_value: String,
}

#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub layout: Layout,
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
    pub addresses: Vec<AddressView>,
}

#[derive(Template)]
#[template(path = "orders/items.html")]
pub struct OrderItemsTemplate {
    pub layout: Layout,
    pub items: Vec<OrderItemView>,
    pub pagination: Pagination,
    pub search_value: String,
}

#[derive(Template)]
#[template(path = "orders/addresses.html")]
pub struct AddressesTemplate {
    pub layout: Layout,
    pub addresses: Vec<AddressView>,
    pub pagination: Pagination,
    pub search_value: String,
}

/// Search and page of a plain list page.
struct ListPage {
    search: Option<String>,
    page: i64,
    params: Vec<(&'static str, String)>,
}

impl ListPage {
    fn from_query(query: &ListQuery) -> Self {
        let search = search_term(query.q.as_deref());
        let params = search.iter().map(|q| ("q", q.clone())).collect();
        Self {
            search,
            page: page_number(query.page.as_deref()),
            params,
        }
    }

    const fn offset(&self) -> i64 {
        (self.page - 1) * PAGE_SIZE
    }

    fn pagination(&self, path: &str, total: i64) -> Pagination {
        Pagination::new(path, &self.params, self.page, PAGE_SIZE, total)
    }
}

/// Order list.
///
/// GET /orders
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let list = ListPage::from_query(&query);
    let (orders, total) = OrderRepository::new(state.pool())
        .list(list.search.as_deref(), PAGE_SIZE, list.offset())
        .await?;

    let template = OrdersIndexTemplate {
        layout: Layout::new(&admin, state.registry(), "orders", take_flash(&session).await),
        orders: orders.iter().map(OrderView::from).collect(),
        pagination: list.pagination("/orders", total),
        search_value: list.search.clone().unwrap_or_default(),
    };

    Ok(render_html(&template))
}

/// Order detail with its items and shipping addresses.
///
/// GET /orders/{id}
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let id = OrderId::new(id);
    let detail = OrderRepository::new(state.pool())
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order #{id}")))?;

    let template = OrderShowTemplate {
        layout: Layout::new(&admin, state.registry(), "orders", take_flash(&session).await),
        order: OrderView::from(&detail.order),
        items: detail.items.iter().map(OrderItemView::from).collect(),
        addresses: detail.addresses.iter().map(AddressView::from).collect(),
    };

    Ok(render_html(&template))
}

/// Order item list.
///
/// GET /order-items
#[instrument(skip(admin, state, session))]
pub async fn items(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let list = ListPage::from_query(&query);
    let (items, total) = OrderRepository::new(state.pool())
        .list_items(list.search.as_deref(), PAGE_SIZE, list.offset())
        .await?;

    let template = OrderItemsTemplate {
        layout: Layout::new(&admin, state.registry(), "order_items", take_flash(&session).await),
        items: items.iter().map(OrderItemView::from).collect(),
        pagination: list.pagination("/order-items", total),
        search_value: list.search.clone().unwrap_or_default(),
    };

    Ok(render_html(&template))
}

/// Shipping address list.
///
/// GET /shipping-addresses
#[instrument(skip(admin, state, session))]
pub async fn addresses(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let list = ListPage::from_query(&query);
    let (addresses, total) = OrderRepository::new(state.pool())
        .list_addresses(list.search.as_deref(), PAGE_SIZE, list.offset())
        .await?;

    let template = AddressesTemplate {
        layout: Layout::new(
            &admin,
            state.registry(),
            "shipping_addresses",
            take_flash(&session).await,
        ),
        addresses: addresses.iter().map(AddressView::from).collect(),
        pagination: list.pagination("/shipping-addresses", total),
        search_value: list.search.clone().unwrap_or_default(),
    };

    Ok(render_html(&template))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_page_offset_and_params() {
        let page = ListPage::from_query(&ListQuery {
            q: Some(" portland ".to_string()),
            page: Some("3".to_string()),
        });
        assert_eq!(page.offset(), 2 * PAGE_SIZE);
        assert_eq!(page.params, vec![("q", "portland".to_string())]);

        let pagination = page.pagination("/shipping-addresses", 250);
        assert_eq!(
            pagination.prev_url.as_deref(),
            Some("/shipping-addresses?q=portland&page=2")
        );
        assert!(pagination.next_url.is_none());
    }

    #[test]
    fn test_order_item_view_links_order() {
        let item = OrderItem {
            id: tidemark_core::OrderItemId::new(3),
            order_id: OrderId::new(41),
            product_id: None,
            product_title: None,
            quantity: 1,
            price: rust_decimal::Decimal::new(999, 2),
        };
        let view = OrderItemView::from(&item);
        assert_eq!(view.order_url, "/orders/41");
        assert_eq!(view.price, "$9.99");
        assert_eq!(view.product, "Error: order item #3 has no product");
    }
}
