use crate::{
    api::{health, limits},
    config::RateLimitConfig,
    observability::HealthChecker,
    rate_limit::{rate_limit_middleware, RateLimitGuard, RateLimiter},
};
use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub health_checker: Arc<HealthChecker>,
}

pub fn create_router(limiter: Arc<RateLimiter>, config: &RateLimitConfig) -> Router {
    let health_checker = Arc::new(HealthChecker::new(limiter.store().clone()));

    let guard = RateLimitGuard::new(limiter.clone())
        .ignore_rate_limiting(config.ignore_rate_limiting);

    let state = AppState {
        limiter,
        health_checker,
    };

    Router::new()
        // Health endpoints
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(health::metrics))
        .route("/admin/limits/:key", delete(limits::reset))
        // Rate limited API
        .nest("/v1", v1_routes(guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn v1_routes(guard: RateLimitGuard) -> Router<AppState> {
    Router::new()
        .route("/ping", get(|| async { "pong" }))
        .layer(middleware::from_fn_with_state(guard, rate_limit_middleware))
}
