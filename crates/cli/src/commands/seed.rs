//! Seed the database with demo data.
//!
//! Reads a YAML file describing categories, products, customers, orders and
//! refund requests, and inserts everything in a single transaction so a
//! malformed file leaves the database untouched.
//!
//! ```bash
//! tidemark seed --file demo/seed.yaml
//! ```

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use thiserror::Error;
use tracing::info;

use tidemark_core::{
    CategoryId, OrderId, OrderItemId, ProductId, RefundReason, RefundRequestId, RefundStatus,
    UserId,
};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid seed data: {0}")]
    Invalid(String),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub categories: Vec<CategorySeed>,
    pub products: Vec<ProductSeed>,
    pub users: Vec<UserSeed>,
    pub orders: Vec<OrderSeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub brand: String,
    /// Category slug.
    pub category: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
}

#[derive(Debug, Deserialize)]
pub struct UserSeed {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub rewards_balance: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct OrderSeed {
    /// Username of the customer; guest checkout when absent.
    pub user: Option<String>,
    pub customer_email: String,
    pub customer_name: String,
    #[serde(default)]
    pub rewards_used: Decimal,
    #[serde(default)]
    pub rewards_earned: Decimal,
    pub items: Vec<OrderItemSeed>,
    pub address: Option<AddressSeed>,
    pub refund: Option<RefundSeed>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemSeed {
    /// Product slug.
    pub product: String,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct AddressSeed {
    pub full_name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "US".to_owned()
}

#[derive(Debug, Deserialize)]
pub struct RefundSeed {
    pub reason: RefundReason,
    #[serde(default)]
    pub status: RefundStatus,
    #[serde(default)]
    pub reason_details: String,
    #[serde(default)]
    pub tracking_number: String,
    pub items: Vec<RefundItemSeed>,
}

#[derive(Debug, Deserialize)]
pub struct RefundItemSeed {
    /// Zero-based index into the order's `items`.
    pub item: usize,
    pub quantity: i32,
    #[serde(default)]
    pub condition_acceptable: bool,
}

/// Counts of inserted rows, logged at the end of a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub users: usize,
    pub orders: usize,
    pub refunds: usize,
}

/// Check cross references before touching the database.
///
/// # Errors
///
/// Returns `SeedError::Invalid` naming the first broken reference.
pub fn validate(seed: &SeedFile) -> Result<(), SeedError> {
    let categories: Vec<&str> = seed.categories.iter().map(|c| c.slug.as_str()).collect();
    let products: Vec<&str> = seed.products.iter().map(|p| p.slug.as_str()).collect();
    let users: Vec<&str> = seed.users.iter().map(|u| u.username.as_str()).collect();

    for product in &seed.products {
        if let Some(category) = &product.category
            && !categories.contains(&category.as_str())
        {
            return Err(SeedError::Invalid(format!(
                "product {} references unknown category {category}",
                product.slug
            )));
        }
        if product.price < Decimal::ZERO || product.stock < 0 {
            return Err(SeedError::Invalid(format!(
                "product {} has a negative price or stock",
                product.slug
            )));
        }
    }

    for (n, order) in seed.orders.iter().enumerate() {
        if let Some(user) = &order.user
            && !users.contains(&user.as_str())
        {
            return Err(SeedError::Invalid(format!(
                "order {n} references unknown user {user}"
            )));
        }
        if order.items.is_empty() {
            return Err(SeedError::Invalid(format!("order {n} has no items")));
        }
        for item in &order.items {
            if !products.contains(&item.product.as_str()) {
                return Err(SeedError::Invalid(format!(
                    "order {n} references unknown product {}",
                    item.product
                )));
            }
            if item.quantity <= 0 {
                return Err(SeedError::Invalid(format!(
                    "order {n} has a non-positive quantity"
                )));
            }
        }
        if let Some(refund) = &order.refund {
            for refund_item in &refund.items {
                let Some(item) = order.items.get(refund_item.item) else {
                    return Err(SeedError::Invalid(format!(
                        "refund on order {n} references missing item {}",
                        refund_item.item
                    )));
                };
                if refund_item.quantity <= 0 || refund_item.quantity > item.quantity {
                    return Err(SeedError::Invalid(format!(
                        "refund on order {n} returns {} of {} units",
                        refund_item.quantity, item.quantity
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Load `file_path` and insert its contents.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or if any insert
/// fails. Nothing is committed in that case.
pub async fn run(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading demo data");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;
    validate(&seed)?;

    let pool = connect().await?;
    let mut tx = pool.begin().await?;
    let summary = insert_all(&mut tx, &seed).await?;
    tx.commit().await?;

    info!(
        categories = summary.categories,
        products = summary.products,
        users = summary.users,
        orders = summary.orders,
        refunds = summary.refunds,
        "Seeding complete"
    );
    Ok(())
}

async fn insert_all(
    tx: &mut Transaction<'_, Postgres>,
    seed: &SeedFile,
) -> Result<SeedSummary, SeedError> {
    let mut categories = HashMap::new();
    for category in &seed.categories {
        let id: CategoryId =
            sqlx::query_scalar("INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING id")
                .bind(&category.name)
                .bind(&category.slug)
                .fetch_one(&mut **tx)
                .await?;
        categories.insert(category.slug.as_str(), id);
    }

    let mut products = HashMap::new();
    for product in &seed.products {
        let category_id = product
            .category
            .as_deref()
            .and_then(|slug| categories.get(slug).copied());
        let id: ProductId = sqlx::query_scalar(
            "INSERT INTO products (title, slug, brand, category_id, description, price, stock) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&product.title)
        .bind(&product.slug)
        .bind(&product.brand)
        .bind(category_id)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .fetch_one(&mut **tx)
        .await?;
        products.insert(product.slug.as_str(), (id, product.price));
    }

    let mut users = HashMap::new();
    for user in &seed.users {
        let id: UserId = sqlx::query_scalar(
            "INSERT INTO users (username, email, rewards_balance) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.rewards_balance)
        .fetch_one(&mut **tx)
        .await?;
        users.insert(user.username.as_str(), id);
    }

    let mut refunds = 0;
    for order in &seed.orders {
        let user_id = order
            .user
            .as_deref()
            .and_then(|name| users.get(name).copied());

        let lines: Vec<(ProductId, i32, Decimal)> = order
            .items
            .iter()
            .filter_map(|item| {
                products
                    .get(item.product.as_str())
                    .map(|&(id, price)| (id, item.quantity, price))
            })
            .collect();
        let total: Decimal = lines
            .iter()
            .map(|(_, quantity, price)| price * Decimal::from(*quantity))
            .sum::<Decimal>()
            - order.rewards_used;

        let order_id: OrderId = sqlx::query_scalar(
            "INSERT INTO orders (user_id, customer_email, customer_name, total, rewards_used, \
             rewards_earned) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(user_id)
        .bind(&order.customer_email)
        .bind(&order.customer_name)
        .bind(total.max(Decimal::ZERO))
        .bind(order.rewards_used)
        .bind(order.rewards_earned)
        .fetch_one(&mut **tx)
        .await?;

        let mut item_ids = Vec::with_capacity(lines.len());
        for (product_id, quantity, price) in &lines {
            let id: OrderItemId = sqlx::query_scalar(
                "INSERT INTO order_items (order_id, product_id, quantity, price) \
                 VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(order_id)
            .bind(product_id)
            .bind(quantity)
            .bind(price)
            .fetch_one(&mut **tx)
            .await?;
            item_ids.push((id, *price));
        }

        if let Some(address) = &order.address {
            sqlx::query(
                "INSERT INTO shipping_addresses \
                 (order_id, full_name, address1, address2, city, state, zipcode, country) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(order_id)
            .bind(&address.full_name)
            .bind(&address.address1)
            .bind(&address.address2)
            .bind(&address.city)
            .bind(&address.state)
            .bind(&address.zipcode)
            .bind(&address.country)
            .execute(&mut **tx)
            .await?;
        }

        if let Some(refund) = &order.refund {
            insert_refund(tx, order, order_id, user_id, &item_ids, refund).await?;
            refunds += 1;
        }
    }

    Ok(SeedSummary {
        categories: seed.categories.len(),
        products: seed.products.len(),
        users: seed.users.len(),
        orders: seed.orders.len(),
        refunds,
    })
}

async fn insert_refund(
    tx: &mut Transaction<'_, Postgres>,
    order: &OrderSeed,
    order_id: OrderId,
    user_id: Option<UserId>,
    item_ids: &[(OrderItemId, Decimal)],
    refund: &RefundSeed,
) -> Result<(), SeedError> {
    let lines: Vec<(OrderItemId, i32, Decimal, bool)> = refund
        .items
        .iter()
        .filter_map(|item| {
            item_ids.get(item.item).map(|&(id, price)| {
                (
                    id,
                    item.quantity,
                    price * Decimal::from(item.quantity),
                    item.condition_acceptable,
                )
            })
        })
        .collect();
    let refund_amount: Decimal = lines.iter().map(|(_, _, amount, _)| *amount).sum();

    let refund_id: RefundRequestId = sqlx::query_scalar(
        "INSERT INTO refund_requests \
         (order_id, user_id, customer_email, customer_name, status, reason, reason_details, \
          refund_amount, rewards_used, tracking_number, product_received_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, \
                 CASE WHEN $5 = 'PENDING_RETURN'::refund_status THEN NULL ELSE NOW() END) \
         RETURNING id",
    )
    .bind(order_id)
    .bind(user_id)
    .bind(&order.customer_email)
    .bind(&order.customer_name)
    .bind(refund.status)
    .bind(refund.reason)
    .bind(&refund.reason_details)
    .bind(refund_amount)
    .bind(order.rewards_used)
    .bind(&refund.tracking_number)
    .fetch_one(&mut **tx)
    .await?;

    for (order_item_id, quantity, amount, acceptable) in lines {
        sqlx::query(
            "INSERT INTO refund_items \
             (refund_request_id, order_item_id, quantity_to_refund, refund_amount, \
              condition_acceptable) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(refund_id)
        .bind(order_item_id)
        .bind(quantity)
        .bind(amount)
        .bind(acceptable)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
categories:
  - { name: Bedding, slug: bedding }
products:
  - title: Linen Sheet Set
    slug: linen-sheet-set
    brand: Tidewater
    category: bedding
    price: "129.00"
    stock: 5
users:
  - { username: marisol, email: marisol@example.com, rewards_balance: "12.50" }
orders:
  - user: marisol
    customer_email: marisol@example.com
    customer_name: Marisol Vega
    rewards_used: "5.00"
    items:
      - { product: linen-sheet-set, quantity: 2 }
    refund:
      reason: DAMAGED
      items:
        - { item: 0, quantity: 1 }
"#;

    #[test]
    fn test_parses_and_validates_sample() {
        let seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(seed.products[0].price, Decimal::new(12_900, 2));
        let refund = seed.orders[0].refund.as_ref().unwrap();
        assert_eq!(refund.reason, RefundReason::Damaged);
        assert_eq!(refund.status, RefundStatus::PendingReturn);
        validate(&seed).unwrap();
    }

    #[test]
    fn test_rejects_unknown_product() {
        let mut seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        seed.orders[0].items[0].product = "nope".to_owned();
        assert!(matches!(validate(&seed), Err(SeedError::Invalid(_))));
    }

    #[test]
    fn test_rejects_over_refund() {
        let mut seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        if let Some(refund) = seed.orders[0].refund.as_mut() {
            refund.items[0].quantity = 3;
        }
        assert!(matches!(validate(&seed), Err(SeedError::Invalid(_))));
    }

    #[test]
    fn test_empty_file_is_valid() {
        let seed: SeedFile = serde_yaml::from_str("{}").unwrap();
        validate(&seed).unwrap();
    }
}
