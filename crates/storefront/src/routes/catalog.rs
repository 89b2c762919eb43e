//! Category and brand listings.

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
use crate::state::AppState;

use super::{ProductCardView, SiteNav, is_slug};

/// Listing page shared by category and brand views.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/list.html")]
pub struct ListingTemplate {
    pub nav: SiteNav,
    /// "Category" or "Brand".
    pub kind: &'static str,
    pub heading: String,
    pub products: Vec<ProductCardView>,
}

/// Products in a category.
///
/// GET /search/{category_slug}/
#[instrument(skip(state))]
pub async fn list_category(
    State(state): State<AppState>,
    Path(category_slug): Path<String>,
) -> Result<Response, AppError> {
    if !is_slug(&category_slug) {
        return Err(AppError::NotFound(format!("category {category_slug}")));
    }

    let repo = ProductRepository::new(state.pool());
    let category = repo
        .category_by_slug(&category_slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {category_slug}")))?;
    let products = repo.in_category(category.id).await?;

    Ok(ListingTemplate {
        nav: SiteNav::new(None),
        kind: "Category",
        heading: category.name,
        products: products.iter().map(ProductCardView::from).collect(),
    }
    .into_response())
}

/// Products of a brand. A brand only exists through its products, so a
/// brand with none is a 404.
///
/// GET /brand/{brand_name}/
#[instrument(skip(state))]
pub async fn list_brand(
    State(state): State<AppState>,
    Path(brand_name): Path<String>,
) -> Result<Response, AppError> {
    let brand_name = brand_name.trim();
    if brand_name.is_empty() {
        return Err(AppError::NotFound("brand".to_string()));
    }

    let products = ProductRepository::new(state.pool())
        .by_brand(brand_name)
        .await?;
    let Some(first) = products.first() else {
        return Err(AppError::NotFound(format!("brand {brand_name}")));
    };

    Ok(ListingTemplate {
        nav: SiteNav::new(None),
        kind: "Brand",
        // Stored spelling, not the URL's
        heading: first.brand.clone(),
        products: products.iter().map(ProductCardView::from).collect(),
    }
    .into_response())
}
