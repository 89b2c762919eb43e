//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                            - store            newest in-stock products
//! GET  /product/{product_slug}/     - product-info     product detail
//! GET  /search/{category_slug}/     - list-category    products in a category
//! GET  /brand/{brand_name}/         - list-brand       products of a brand
//! GET  /search-products/?q=         - search-products  free-text search
//! ```
//!
//! `/health`, `/health/ready` and `/static` are mounted in `main`.
//! Anything else renders the 404 page.

pub mod catalog;
pub mod products;
pub mod search;

use axum::{Router, routing::get};

use crate::error::AppError;
use crate::models::Product;
use crate::state::AppState;

/// A named storefront route. [`Route::path`] builds its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Store,
    ProductInfo { product_slug: &'a str },
    ListCategory { category_slug: &'a str },
    ListBrand { brand_name: &'a str },
    SearchProducts { q: Option<&'a str> },
}

impl Route<'_> {
    /// Router patterns, in the same order as [`Route::name`].
    pub const PATTERNS: [(&'static str, &'static str); 5] = [
        ("store", "/"),
        ("product-info", "/product/{product_slug}/"),
        ("list-category", "/search/{category_slug}/"),
        ("list-brand", "/brand/{brand_name}/"),
        ("search-products", "/search-products/"),
    ];

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::ProductInfo { .. } => "product-info",
            Self::ListCategory { .. } => "list-category",
            Self::ListBrand { .. } => "list-brand",
            Self::SearchProducts { .. } => "search-products",
        }
    }

    /// URL path for this route; path segments and the query are
    /// percent-encoded.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Store => "/".to_string(),
            Self::ProductInfo { product_slug } => {
                format!("/product/{}/", urlencoding::encode(product_slug))
            }
            Self::ListCategory { category_slug } => {
                format!("/search/{}/", urlencoding::encode(category_slug))
            }
            Self::ListBrand { brand_name } => {
                format!("/brand/{}/", urlencoding::encode(brand_name))
            }
            Self::SearchProducts { q: None } => "/search-products/".to_string(),
            Self::SearchProducts { q: Some(q) } => {
                format!("/search-products/?q={}", urlencoding::encode(q))
            }
        }
    }
}

/// `[-a-zA-Z0-9_]+`, the shape product and category slugs take.
#[must_use]
pub fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Header links and the search box, shared by every page.
#[derive(Debug, Clone)]
pub struct SiteNav {
    pub store_url: String,
    pub search_url: String,
    /// Current search text, echoed into the search box.
    pub query: String,
}

impl SiteNav {
    #[must_use]
    pub fn new(query: Option<&str>) -> Self {
        Self {
            store_url: Route::Store.path(),
            search_url: Route::SearchProducts { q: None }.path(),
            query: query.unwrap_or_default().to_string(),
        }
    }
}

/// Product card used by every listing.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub title: String,
    pub url: String,
    pub brand: String,
    pub brand_url: Option<String>,
    pub price: String,
    pub in_stock: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            url: Route::ProductInfo {
                product_slug: &product.slug,
            }
            .path(),
            brand: product.brand.clone(),
            brand_url: (!product.brand.is_empty()).then(|| {
                Route::ListBrand {
                    brand_name: &product.brand,
                }
                .path()
            }),
            price: product.price_display(),
            in_stock: product.in_stock(),
        }
    }
}

/// Fallback for unknown paths.
async fn not_found() -> AppError {
    AppError::NotFound("page".to_string())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let [store, product_info, list_category, list_brand, search_products] = Route::PATTERNS;
    Router::new()
        .route(store.1, get(products::store))
        .route(product_info.1, get(products::product_info))
        .route(list_category.1, get(catalog::list_category))
        .route(list_brand.1, get(catalog::list_brand))
        .route(search_products.1, get(search::search_products))
        .fallback(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Store.path(), "/");
        assert_eq!(
            Route::ProductInfo {
                product_slug: "linen-shirt"
            }
            .path(),
            "/product/linen-shirt/"
        );
        assert_eq!(
            Route::ListCategory {
                category_slug: "outerwear"
            }
            .path(),
            "/search/outerwear/"
        );
        assert_eq!(
            Route::ListBrand {
                brand_name: "Tide & Co"
            }
            .path(),
            "/brand/Tide%20%26%20Co/"
        );
        assert_eq!(
            Route::SearchProducts { q: Some("wool socks") }.path(),
            "/search-products/?q=wool%20socks"
        );
        assert_eq!(Route::SearchProducts { q: None }.path(), "/search-products/");
    }

    #[test]
    fn test_route_names_match_patterns() {
        let routes = [
            Route::Store,
            Route::ProductInfo { product_slug: "a" },
            Route::ListCategory { category_slug: "a" },
            Route::ListBrand { brand_name: "a" },
            Route::SearchProducts { q: None },
        ];
        for (route, (name, _)) in routes.iter().zip(Route::PATTERNS) {
            assert_eq!(route.name(), name);
        }
    }

    #[test]
    fn test_is_slug() {
        assert!(is_slug("linen-shirt_2"));
        assert!(!is_slug(""));
        assert!(!is_slug("linen shirt"));
        assert!(!is_slug("café"));
    }
}
