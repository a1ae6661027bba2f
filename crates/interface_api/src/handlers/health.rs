//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use core_kernel::{AdapterHealth, HealthCheckResult};

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<HealthCheckResult>,
}

/// Liveness endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Vec::new(),
    })
}

/// Readiness check across all ports
///
/// Answers 503 when any adapter is unhealthy. A degraded adapter (e.g. the
/// extraction circuit breaker is open) still counts as ready.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let ports = &state.ports;
    let (extraction, memberships, payment_groups, sink) = tokio::join!(
        ports.extraction.health_check(),
        ports.memberships.health_check(),
        ports.payment_groups.health_check(),
        ports.sink.health_check(),
    );
    let checks = vec![extraction, memberships, payment_groups, sink];

    let ready = checks
        .iter()
        .all(|check| !matches!(check.status, AdapterHealth::Unhealthy));
    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks,
        }),
    )
}
