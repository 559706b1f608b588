use crate::{errors::Result, observability::MetricsRecorder, rate_limit::RateLimiter};
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

/// DELETE /admin/limits/:key - Start a fresh window for `key`
#[tracing::instrument(skip(limiter))]
pub async fn reset(
    State(limiter): State<Arc<RateLimiter>>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    limiter.reset(&key).await?;
    MetricsRecorder::record_reset();

    tracing::info!(key = %key, "Rate limit reset");

    Ok(StatusCode::NO_CONTENT)
}
