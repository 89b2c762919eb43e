//! HTTP smoke tests against running servers.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database (`tidemark migrate`, `tidemark seed`)
//! - The storefront running (`cargo run -p tidemark-storefront`)
//! - The admin panel running (`cargo run -p tidemark-admin`)
//!
//! Run with: cargo test -p tidemark-integration-tests -- --ignored

use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};

fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A client that reports redirects instead of following them.
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

// ============================================================================
// Storefront
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_storefront_routes_respond() {
    let client = client();
    let base_url = storefront_base_url();

    for path in [
        "/",
        "/product/linen-sheet-set/",
        "/search/bedding/",
        "/brand/Tidewater/",
        "/search-products/?q=linen",
    ] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .expect("Failed to reach storefront");
        assert_eq!(resp.status(), StatusCode::OK, "GET {path}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_storefront_unknown_slugs_are_not_found() {
    let client = client();
    let base_url = storefront_base_url();

    for path in ["/product/no-such-thing/", "/search/nowhere/", "/brand/Nobody/"] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .expect("Failed to reach storefront");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "GET {path}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_storefront_sets_security_headers() {
    let resp = client()
        .get(format!("{}/", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");

    let headers = resp.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_health() {
    let resp = client()
        .get(format!("{}/health", admin_base_url()))
        .send()
        .await
        .expect("Failed to reach admin");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires both servers and a migrated database"]
async fn test_readiness_once_migrated() {
    let client = client();
    for base_url in [admin_base_url(), storefront_base_url()] {
        let resp = client
            .get(format!("{base_url}/health/ready"))
            .send()
            .await
            .expect("Failed to reach server");
        assert_eq!(resp.status(), StatusCode::OK, "{base_url} not ready");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_pages_require_login() {
    let client = client();
    let base_url = admin_base_url();

    for path in ["/refunds", "/refund-items", "/orders"] {
        let resp = client
            .get(format!("{base_url}{path}"))
            .send()
            .await
            .expect("Failed to reach admin");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "GET {path}");
        assert_eq!(resp.headers()["location"], "/login", "GET {path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_bulk_action_requires_login() {
    let resp = client()
        .post(format!("{}/refunds/actions", admin_base_url()))
        .form(&[("action", "reject_refund"), ("refund_id", "1")])
        .send()
        .await
        .expect("Failed to reach admin");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_login_rejects_bad_credentials() {
    let resp = client()
        .post(format!("{}/login", admin_base_url()))
        .form(&[("email", "nobody@example.com"), ("password", "wrong-password")])
        .send()
        .await
        .expect("Failed to reach admin");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/login?error=credentials");
}
