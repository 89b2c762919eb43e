//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::AppError;
use crate::filters;
use crate::models::Product;
use crate::state::AppState;

use super::{ProductCardView, Route, SiteNav, is_slug};

/// Products on the store front page.
const STORE_PRODUCTS: i64 = 24;

/// Product detail display data.
#[derive(Debug, Clone)]
pub struct ProductDetailView {
    pub title: String,
    pub description: String,
    pub price: String,
    pub brand: String,
    pub brand_url: Option<String>,
    pub category: String,
    pub category_url: Option<String>,
    pub stock: i32,
    pub in_stock: bool,
    pub canonical_url: String,
}

impl ProductDetailView {
    fn new(product: &Product, canonical_url: String) -> Self {
        let card = ProductCardView::from(product);
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            price: card.price,
            brand: card.brand,
            brand_url: card.brand_url,
            category: product.category_name.clone().unwrap_or_default(),
            category_url: product.category_slug.as_deref().map(|slug| {
                Route::ListCategory {
                    category_slug: slug,
                }
                .path()
            }),
            stock: product.stock,
            in_stock: product.in_stock(),
            canonical_url,
        }
    }
}

/// Store front page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/store.html")]
pub struct StoreTemplate {
    pub nav: SiteNav,
    pub products: Vec<ProductCardView>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductInfoTemplate {
    pub nav: SiteNav,
    pub product: ProductDetailView,
}

/// Newest in-stock products.
///
/// GET /
#[instrument(skip(state))]
pub async fn store(State(state): State<AppState>) -> Result<Response, AppError> {
    let products = ProductRepository::new(state.pool())
        .newest_in_stock(STORE_PRODUCTS)
        .await?;

    Ok(StoreTemplate {
        nav: SiteNav::new(None),
        products: products.iter().map(ProductCardView::from).collect(),
    }
    .into_response())
}

/// Product detail by slug.
///
/// GET /product/{product_slug}/
#[instrument(skip(state))]
pub async fn product_info(
    State(state): State<AppState>,
    Path(product_slug): Path<String>,
) -> Result<Response, AppError> {
    if !is_slug(&product_slug) {
        return Err(AppError::NotFound(format!("product {product_slug}")));
    }

    let product = ProductRepository::new(state.pool())
        .get_by_slug(&product_slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_slug}")))?;

    let canonical_url = state.config().absolute_url(
        &Route::ProductInfo {
            product_slug: &product.slug,
        }
        .path(),
    );

    Ok(ProductInfoTemplate {
        nav: SiteNav::new(None),
        product: ProductDetailView::new(&product, canonical_url),
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use tidemark_core::{CategoryId, ProductId};

    use super::*;

    #[test]
    fn test_detail_view_links_category_and_brand() {
        let product = Product {
            id: ProductId::new(1),
            title: "Linen Shirt".to_string(),
            slug: "linen-shirt".to_string(),
            brand: "Tide & Co".to_string(),
            category_id: Some(CategoryId::new(3)),
            category_name: Some("Shirts".to_string()),
            category_slug: Some("shirts".to_string()),
            description: String::new(),
            price: Decimal::new(4_500, 2),
            stock: 0,
            created_at: Utc::now(),
        };

        let view = ProductDetailView::new(
            &product,
            "https://shop.tidemark.example/product/linen-shirt/".to_string(),
        );
        assert_eq!(view.price, "$45.00");
        assert_eq!(view.category_url.as_deref(), Some("/search/shirts/"));
        assert_eq!(view.brand_url.as_deref(), Some("/brand/Tide%20%26%20Co/"));
        assert!(!view.in_stock);
    }
}
