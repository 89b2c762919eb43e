//! Catalog records shown on the storefront.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tidemark_core::{CategoryId, Money, ProductId};

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub brand: String,
    pub category_id: Option<CategoryId>,
    /// Joined for display.
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    #[must_use]
    pub fn price_display(&self) -> String {
        Money::new(self.price).to_string()
    }
}
