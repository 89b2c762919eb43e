//! Tidemark Admin - refund back office.
//!
//! Staff log in here to work the refund queue: receive returned parcels,
//! restock acceptable items, move refunds through `PayPal` processing to
//! completion or rejection, and restore spent rewards as a goodwill gesture.
//! Orders, order items and shipping addresses are browsable read-only.
//!
//! # Startup
//!
//! 1. `AdminConfig::from_env` (a weak `ADMIN_SESSION_SECRET` stops startup)
//! 2. Sentry, then the tracing subscriber (JSON on Fly.io)
//! 3. Postgres pool and session store; migrations are applied by
//!    `tidemark migrate`, never here
//! 4. HTTPS when `ADMIN_TLS_CERT`/`ADMIN_TLS_KEY` are set, plain HTTP on
//!    `127.0.0.1:3001` otherwise
//!
//! `/health/ready` only reports ready once the refund tables exist, so a
//! deploy that forgot to migrate never receives traffic.

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tidemark_admin::config::AdminConfig;
use tidemark_admin::middleware::create_session_layer;
use tidemark_admin::registry::AdminRegistry;
use tidemark_admin::state::AppState;
use tidemark_admin::{db, routes};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry
                .environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry.sample_rate,
            traces_sample_rate: config.sentry.traces_sample_rate,
            attach_stacktrace: true,
            send_default_pii: true, // Refund pages carry customer emails
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Must happen before any TLS operations
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = AdminConfig::from_env().expect("Failed to load configuration");

    // Sentry first so the tracing layer has a client to report to
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let session_layer = create_session_layer(&pool, &config);
    let registry = AdminRegistry::standard();
    tracing::info!(sections = registry.sections().len(), "Admin sections registered");

    let state = AppState::new(config.clone(), pool, registry);
    let app = build_app(state, session_layer);

    serve(app, &config).await;
}

/// Text logs locally, flattened JSON on Fly.io. `RUST_LOG` overrides the
/// default of info for this crate and debug for request traces.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tidemark_admin=info,tower_http=debug".into());

    let is_fly = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = is_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Admin routes plus health checks and static assets. Every request gets a
/// span carrying its status and latency; Sentry wraps the whole stack.
fn build_app(state: AppState, sessions: SessionManagerLayer<PostgresStore>) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "admin_request",
                method = %request.method(),
                uri = %request.uri(),
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(
            |response: &axum::http::Response<_>, latency: std::time::Duration, span: &Span| {
                span.record("status", response.status().as_u16());
                span.record("latency_ms", latency.as_millis() as u64);
                DefaultOnResponse::default().on_response(response, latency, span);
            },
        );

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new("crates/admin/static"))
        .layer(sessions)
        .layer(trace)
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

async fn serve(app: Router, config: &AdminConfig) {
    let addr = config.socket_addr();

    let Some(tls) = &config.tls else {
        // Loopback by default; remote staff go through a reverse proxy
        tracing::info!("admin listening on http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind to address");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .expect("Server error");
        return;
    };

    let rustls_config = RustlsConfig::from_pem(
        tls.cert_pem.as_bytes().to_vec(),
        tls.key_pem.expose_secret().as_bytes().to_vec(),
    )
    .await
    .expect("Failed to load TLS certificates");
    tracing::info!("admin listening on https://{}", addr);

    // axum-server has no graceful-shutdown future, so drive its handle
    let handle = Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_handle.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
    });

    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .expect("Server error");
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// 503 until the database is reachable and migrated: the probe reads the
/// refund queue table rather than `SELECT 1`.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1 FROM refund_requests LIMIT 1")
        .fetch_optional(state.pool())
        .await
    {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
