use crate::observability::{HealthChecker, HealthStatus, MetricsRecorder};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

/// GET /health/live
#[tracing::instrument(skip(health_checker))]
pub async fn liveness(State(health_checker): State<Arc<HealthChecker>>) -> Json<HealthStatus> {
    Json(health_checker.liveness().await)
}

/// GET /health/ready - 503 with the failing checks while the store is unreachable
#[tracing::instrument(skip(health_checker))]
pub async fn readiness(
    State(health_checker): State<Arc<HealthChecker>>,
) -> (StatusCode, Json<HealthStatus>) {
    let status = health_checker.readiness().await;

    let code = if status.status == "ok" {
        StatusCode::OK
    } else {
        tracing::warn!(check = ?status.checks.store.message, "Store not ready");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

/// GET /metrics - Prometheus metrics
pub async fn metrics() -> Result<String, StatusCode> {
    MetricsRecorder::export().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
