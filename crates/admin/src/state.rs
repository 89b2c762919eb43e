//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::db::{PgRefundHooks, PgRefundStore};
use crate::registry::AdminRegistry;
use crate::services::RefundWorkflow;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    registry: AdminRegistry,
}

impl AppState {
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool, registry: AdminRegistry) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                registry,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Sections shown in the admin navigation.
    #[must_use]
    pub fn registry(&self) -> &AdminRegistry {
        &self.inner.registry
    }

    /// Refund workflow over the shared pool.
    #[must_use]
    pub fn workflow(&self) -> RefundWorkflow<PgRefundStore, PgRefundHooks> {
        RefundWorkflow::new(
            PgRefundStore::new(self.inner.pool.clone()),
            PgRefundHooks::new(self.inner.pool.clone()),
        )
    }
}
