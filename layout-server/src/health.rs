//! Health check endpoints for Kubernetes probes.
//!
//! - `/health/live` - Liveness probe (restart if fails)
//! - `/health/ready` - Readiness probe (remove from LB if fails)

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Individual component checks
    pub checks: HealthChecks,
}

/// Individual health checks.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Layout store readable
    pub layout_store: bool,
    /// Open designer sessions
    pub sessions: usize,
}

/// Liveness probe - is the server running?
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe - can the server load and save layouts?
#[tracing::instrument(name = "readiness_probe", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let store_ok = match state.sessions.store().menu_keys().await {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!("Layout store not readable: {err}");
            false
        }
    };

    let status = HealthStatus {
        status: if store_ok { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            layout_store: store_ok,
            sessions: state.sessions.len(),
        },
    };

    let code = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}
