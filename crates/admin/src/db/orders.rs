//! Read-only order queries backing the order, order item and shipping
//! address pages.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use tidemark_core::{OrderId, OrderItemId, ProductId, ShippingAddressId, UserId};

use super::{RepositoryError, like_pattern};
use crate::models::order::{Order, OrderDetail, OrderItem, ShippingAddress};

const ORDER_SELECT: &str = "\
    SELECT o.id, o.user_id, u.username, o.customer_email, o.customer_name, \
           o.total, o.rewards_used, o.rewards_earned, o.created_at \
    FROM orders o \
    LEFT JOIN users u ON u.id = o.user_id";

const ORDER_ITEM_SELECT: &str = "\
    SELECT oi.id, oi.order_id, oi.product_id, p.title AS product_title, oi.quantity, oi.price \
    FROM order_items oi \
    LEFT JOIN products p ON p.id = oi.product_id";

const ADDRESS_SELECT: &str = "\
    SELECT id, order_id, full_name, address1, address2, city, state, zipcode, country \
    FROM shipping_addresses";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    username: Option<String>,
    customer_email: String,
    customer_name: String,
    total: Decimal,
    rewards_used: Decimal,
    rewards_earned: Decimal,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            customer_email: row.customer_email,
            customer_name: row.customer_name,
            total: row.total,
            rewards_used: row.rewards_used,
            rewards_earned: row.rewards_earned,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: Option<ProductId>,
    product_title: Option<String>,
    quantity: i32,
    price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_title: row.product_title,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShippingAddressRow {
    id: ShippingAddressId,
    order_id: OrderId,
    full_name: String,
    address1: String,
    address2: Option<String>,
    city: String,
    state: Option<String>,
    zipcode: Option<String>,
    country: String,
}

impl From<ShippingAddressRow> for ShippingAddress {
    fn from(row: ShippingAddressRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            full_name: row.full_name,
            address1: row.address1,
            address2: row.address2,
            city: row.city,
            state: row.state,
            zipcode: row.zipcode,
            country: row.country,
        }
    }
}

fn search(q: Option<&str>) -> Option<String> {
    q.map(str::trim).filter(|q| !q.is_empty()).map(like_pattern)
}

/// Repository for orders and their children.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of orders, newest first, searchable by id, customer and
    /// username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        q: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let pattern = search(q);
        let push_where = |qb: &mut QueryBuilder<'_, Postgres>| {
            if let Some(pattern) = &pattern {
                qb.push(" WHERE (o.id::text ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR o.customer_email ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR o.customer_name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR u.username ILIKE ")
                    .push_bind(pattern.clone())
                    .push(")");
            }
        };

        let mut qb = QueryBuilder::<Postgres>::new(ORDER_SELECT);
        push_where(&mut qb);
        qb.push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build_query_as::<OrderRow>().fetch_all(self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM orders o LEFT JOIN users u ON u.id = o.user_id",
        );
        push_where(&mut count);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// An order with its line items and shipping addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(&format!(
            "{ORDER_ITEM_SELECT} WHERE oi.order_id = $1 ORDER BY oi.id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let addresses = sqlx::query_as::<_, ShippingAddressRow>(&format!(
            "{ADDRESS_SELECT} WHERE order_id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderDetail {
            order: row.into(),
            items: items.into_iter().map(Into::into).collect(),
            addresses: addresses.into_iter().map(Into::into).collect(),
        }))
    }

    /// One page of order items across all orders, searchable by order id and
    /// product title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_items(
        &self,
        q: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<OrderItem>, i64), RepositoryError> {
        let pattern = search(q);
        let push_where = |qb: &mut QueryBuilder<'_, Postgres>| {
            if let Some(pattern) = &pattern {
                qb.push(" WHERE (oi.order_id::text ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR p.title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(")");
            }
        };

        let mut qb = QueryBuilder::<Postgres>::new(ORDER_ITEM_SELECT);
        push_where(&mut qb);
        qb.push(" ORDER BY oi.order_id DESC, oi.id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb
            .build_query_as::<OrderItemRow>()
            .fetch_all(self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM order_items oi LEFT JOIN products p ON p.id = oi.product_id",
        );
        push_where(&mut count);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// One page of shipping addresses, searchable by name, city and order id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_addresses(
        &self,
        q: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ShippingAddress>, i64), RepositoryError> {
        let pattern = search(q);
        let push_where = |qb: &mut QueryBuilder<'_, Postgres>| {
            if let Some(pattern) = &pattern {
                qb.push(" WHERE (order_id::text ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR full_name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR city ILIKE ")
                    .push_bind(pattern.clone())
                    .push(")");
            }
        };

        let mut qb = QueryBuilder::<Postgres>::new(ADDRESS_SELECT);
        push_where(&mut qb);
        qb.push(" ORDER BY order_id DESC, id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb
            .build_query_as::<ShippingAddressRow>()
            .fetch_all(self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shipping_addresses");
        push_where(&mut count);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }
}
