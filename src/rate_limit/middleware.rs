use crate::errors::AppError;
use crate::observability::MetricsRecorder;
use crate::rate_limit::limiter::{RateLimiter, Verdict};
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

/// Derives the rate-limit key from a request.
pub type KeyExtractor = Arc<dyn Fn(&Request) -> String + Send + Sync>;

/// Produces the response for a rate-limited request.
pub type LimitedHandler = Arc<dyn Fn(Request) -> Response + Send + Sync>;

/// Seconds until the window elapses, inserted into the extensions of a
/// limited request before it reaches the [`LimitedHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAfter(pub i64);

/// Middleware state: the limiter plus per-route adapter settings.
///
/// Use with `axum::middleware::from_fn_with_state(guard, rate_limit_middleware)`.
#[derive(Clone)]
pub struct RateLimitGuard {
    limiter: Arc<RateLimiter>,
    key_extractor: KeyExtractor,
    ignore_rate_limiting: bool,
    on_limited: LimitedHandler,
}

impl RateLimitGuard {
    /// Guard keyed by client IP that answers 429 when limited.
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self {
            limiter,
            key_extractor: Arc::new(extract_ip),
            ignore_rate_limiting: false,
            on_limited: Arc::new(too_many_requests),
        }
    }

    pub fn key_extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        self.key_extractor = Arc::new(extractor);
        self
    }

    /// Count hits but let limited requests through.
    pub fn ignore_rate_limiting(mut self, ignore: bool) -> Self {
        self.ignore_rate_limiting = ignore;
        self
    }

    pub fn on_limited<F>(mut self, handler: F) -> Self
    where
        F: Fn(Request) -> Response + Send + Sync + 'static,
    {
        self.on_limited = Arc::new(handler);
        self
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(guard): State<RateLimitGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = (guard.key_extractor)(&request);

    // Store failures go to the error path; they are neither allow nor deny.
    let verdict = guard.limiter.increment(&key).await.map_err(|e| {
        MetricsRecorder::record_decision("error");
        e
    })?;

    match verdict {
        Verdict::Limited { retry_after } if !guard.ignore_rate_limiting => {
            MetricsRecorder::record_decision("limited");
            tracing::warn!(key = %key, retry_after = retry_after, "Rate limit exceeded");

            request.extensions_mut().insert(RetryAfter(retry_after));
            Ok((guard.on_limited)(request))
        }
        Verdict::Limited { .. } => {
            MetricsRecorder::record_decision("ignored");
            Ok(next.run(request).await)
        }
        Verdict::Allowed => {
            MetricsRecorder::record_decision("allowed");
            Ok(next.run(request).await)
        }
    }
}

/// Default key: the `x-forwarded-for` header, else the peer address.
pub fn extract_ip(request: &Request) -> String {
    if let Some(forwarded_for) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        return forwarded_for.to_string();
    }

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

fn too_many_requests(request: Request) -> Response {
    let retry_after = request
        .extensions()
        .get::<RetryAfter>()
        .map(|r| r.0)
        .unwrap_or(0);

    AppError::RateLimitExceeded { retry_after }.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::rate_limit::RateLimitOptions;
    use crate::store::{InMemoryStore, RateLimitRecord, StoreError, StoreKey, TtlStore};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn limiter(limit: u64) -> Arc<RateLimiter> {
        let clock = ManualClock::new(1_700_000_000);
        let store = InMemoryStore::with_clock(Arc::new(clock.clone()));
        let limiter = RateLimiter::builder(
            Arc::new(store),
            "test",
            "limits",
            RateLimitOptions::new(limit, 60),
        )
        .clock(Arc::new(clock))
        .connect()
        .await
        .unwrap();
        Arc::new(limiter)
    }

    fn app(guard: RateLimitGuard) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(guard, rate_limit_middleware))
    }

    fn request_from(ip: &str) -> Request {
        axum::http::Request::builder()
            .uri("/")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    fn request_with_peer(addr: &str) -> Request {
        let mut request = axum::http::Request::builder().uri("/").body(Body::empty()).unwrap();
        let addr: SocketAddr = addr.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    struct BrokenStore;

    #[async_trait]
    impl TtlStore for BrokenStore {
        async fn connect(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn get(&self, _key: &StoreKey) -> Result<RateLimitRecord, StoreError> {
            Err(StoreError::Backend("unreachable".to_string()))
        }

        async fn put(&self, _key: &StoreKey, _record: &RateLimitRecord, _ttl_secs: u64) -> Result<(), StoreError> {
            Err(StoreError::Backend("unreachable".to_string()))
        }

        async fn remove(&self, _key: &StoreKey) -> Result<(), StoreError> {
            Err(StoreError::Backend("unreachable".to_string()))
        }
    }

    #[test]
    fn test_extract_ip_from_forwarded_for() {
        let request = request_from("192.168.1.1");
        assert_eq!(extract_ip(&request), "192.168.1.1");
    }

    #[test]
    fn test_extract_ip_prefers_forwarded_for() {
        let mut request = request_from("192.168.1.1");
        let addr: SocketAddr = "10.0.0.9:4000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(extract_ip(&request), "192.168.1.1");
    }

    #[test]
    fn test_extract_ip_from_peer_address() {
        let request = request_with_peer("203.0.113.42:51000");
        assert_eq!(extract_ip(&request), "203.0.113.42");
    }

    #[test]
    fn test_extract_ip_default() {
        let request = axum::http::Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(extract_ip(&request), "unknown");
    }

    #[tokio::test]
    async fn test_limited_request_gets_429() {
        let app = app(RateLimitGuard::new(limiter(2).await));

        for _ in 0..2 {
            let response = app.clone().oneshot(request_from("1.1.1.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.clone().oneshot(request_from("1.1.1.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");
    }

    #[tokio::test]
    async fn test_different_addresses_do_not_interfere() {
        let app = app(RateLimitGuard::new(limiter(1).await));

        let response = app.clone().oneshot(request_with_peer("10.0.0.1:1000")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(request_with_peer("10.0.0.2:1000")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.clone().oneshot(request_with_peer("10.0.0.1:2000")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_ignore_rate_limiting_passes_through() {
        let app = app(RateLimitGuard::new(limiter(1).await).ignore_rate_limiting(true));

        for _ in 0..3 {
            let response = app.clone().oneshot(request_from("1.1.1.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_custom_handler_and_extractor() {
        let guard = RateLimitGuard::new(limiter(1).await)
            .key_extractor(|request: &Request| {
                request
                    .headers()
                    .get("x-api-key")
                    .and_then(|h| h.to_str().ok())
                    .unwrap_or("anonymous")
                    .to_string()
            })
            .on_limited(|request: Request| {
                let retry_after = request.extensions().get::<RetryAfter>().copied();
                assert_eq!(retry_after, Some(RetryAfter(60)));
                (StatusCode::SERVICE_UNAVAILABLE, "slow down").into_response()
            });
        let app = app(guard);

        let keyed = |key: &str| {
            axum::http::Request::builder()
                .uri("/")
                .header("x-api-key", key)
                .body(Body::empty())
                .unwrap()
        };

        assert_eq!(app.clone().oneshot(keyed("k1")).await.unwrap().status(), StatusCode::OK);
        assert_eq!(app.clone().oneshot(keyed("k2")).await.unwrap().status(), StatusCode::OK);
        assert_eq!(
            app.clone().oneshot(keyed("k1")).await.unwrap().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_store_error_goes_to_error_path() {
        let limiter = RateLimiter::connect(
            Arc::new(BrokenStore),
            "test",
            "limits",
            RateLimitOptions::new(5, 60),
        )
        .await
        .unwrap();
        let app = app(RateLimitGuard::new(Arc::new(limiter)));

        let response = app.oneshot(request_from("1.1.1.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
