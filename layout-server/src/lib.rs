//! # Menu Designer Server Library
//!
//! HTTP surface over [`layout_core::LayoutEngine`] sessions.
//! This library is used by both the binary and integration tests.

use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use layout_core::{CatalogProvider, EngineConfig};

pub mod catalog;
pub mod config;
pub mod error;
pub mod flusher;
pub mod health;
pub mod metrics;
pub mod routes;
pub mod sessions;
pub mod validation;

pub use catalog::{CatalogFile, FileCatalogProvider};
pub use config::{CliArgs, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use flusher::{spawn_flusher, FlusherHandle};
pub use sessions::{SessionRegistry, SharedStore};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Open designer sessions.
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Create state over a layout store and a catalog.
    pub fn new(
        store: SharedStore,
        catalog: Arc<dyn CatalogProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(store, catalog, config),
        }
    }

    /// Get a reference to the session registry.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}

/// Health probes and the designer API, without the outer middleware.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/api/menus/{menu_key}/layout", get(routes::get_layout))
        .route("/api/menus/{menu_key}/reconcile", post(routes::reconcile))
        .route("/api/menus/{menu_key}/sections", post(routes::add_section))
        .route(
            "/api/menus/{menu_key}/sections/{section_id}",
            patch(routes::update_section).delete(routes::delete_section),
        )
        .route("/api/menus/{menu_key}/theme", put(routes::set_theme))
        .route("/api/menus/{menu_key}/layout-type", put(routes::set_layout_type))
        .route("/api/menus/{menu_key}/drag", post(routes::drag))
        .route("/api/menus/{menu_key}/save", post(routes::save))
        .route("/api/menus/{menu_key}/duplicate", post(routes::duplicate))
        .with_state(state)
}
