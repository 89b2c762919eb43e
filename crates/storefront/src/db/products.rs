//! Catalog queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use tidemark_core::{CategoryId, ProductId};

use super::{RepositoryError, like_pattern};
use crate::models::{Category, Product};

const PRODUCT_SELECT: &str = "\
    SELECT p.id, p.title, p.slug, p.brand, p.category_id, c.name AS category_name, \
           c.slug AS category_slug, p.description, p.price, p.stock, p.created_at \
    FROM products p \
    LEFT JOIN categories c ON c.id = p.category_id";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    slug: String,
    brand: String,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
    category_slug: Option<String>,
    description: String,
    price: Decimal,
    stock: i32,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            brand: row.brand,
            category_id: row.category_id,
            category_name: row.category_name,
            category_slug: row.category_slug,
            description: row.description,
            price: row.price,
            stock: row.stock,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
        }
    }
}

/// Read-only catalog repository.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest products that are in stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn newest_in_stock(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.stock > 0 ORDER BY p.created_at DESC, p.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Products in a category, alphabetical.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn in_category(&self, id: CategoryId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.category_id = $1 ORDER BY p.title, p.id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Products of a brand, matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_brand(&self, brand: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE lower(p.brand) = lower($1) ORDER BY p.title, p.id"
        ))
        .bind(brand)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Title, brand and description matches for `q`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, q: &str, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let pattern = like_pattern(q);
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} \
             WHERE p.title ILIKE $1 OR p.brand ILIKE $1 OR p.description ILIKE $1 \
             ORDER BY (p.title ILIKE $1) DESC, p.title, p.id \
             LIMIT $2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
