//! Product search.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

use super::{ProductCardView, SiteNav};

/// Most results shown for one query.
const MAX_RESULTS: i64 = 60;

/// Longest query accepted; the rest is ignored.
const MAX_QUERY_CHARS: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

impl SearchQuery {
    /// Trimmed, length-capped query text; `None` when blank.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let q: String = self.q.trim().chars().take(MAX_QUERY_CHARS).collect();
        let q = q.trim_end().to_string();
        (!q.is_empty()).then_some(q)
    }
}

/// Search results page template.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub nav: SiteNav,
    pub query: String,
    pub products: Vec<ProductCardView>,
    /// False for a blank query: nothing was searched.
    pub searched: bool,
}

/// Free-text product search. A blank query renders an empty page.
///
/// GET /search-products/?q=
#[instrument(skip(state))]
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let Some(text) = query.text() else {
        return Ok(SearchTemplate {
            nav: SiteNav::new(None),
            query: String::new(),
            products: Vec::new(),
            searched: false,
        }
        .into_response());
    };

    let products = ProductRepository::new(state.pool())
        .search(&text, MAX_RESULTS)
        .await?;
    tracing::debug!(query = %text, results = products.len(), "Product search");

    Ok(SearchTemplate {
        nav: SiteNav::new(Some(&text)),
        products: products.iter().map(ProductCardView::from).collect(),
        query: text,
        searched: true,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_text() {
        let blank = SearchQuery {
            q: "   ".to_string(),
        };
        assert_eq!(blank.text(), None);

        let padded = SearchQuery {
            q: "  wool socks ".to_string(),
        };
        assert_eq!(padded.text().as_deref(), Some("wool socks"));

        let long = SearchQuery { q: "a".repeat(500) };
        assert_eq!(long.text().map(|q| q.len()), Some(MAX_QUERY_CHARS));
    }
}
