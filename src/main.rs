use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use ttl_limiter::{
    api::create_router, config::Config, observability::init_tracing, RateLimiter, RedisStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;
    config.validate()?;

    // Initialize tracing/logging
    init_tracing(&config.observability);

    tracing::info!("Starting ttl-limiter");
    tracing::info!("Configuration loaded: {:?}", config.server);

    // Connect the store; a failure here is fatal
    let store = Arc::new(RedisStore::new(&config.redis)?);
    let limiter = RateLimiter::connect(
        store,
        config.rate_limit.namespace.as_str(),
        config.rate_limit.set.as_str(),
        config.rate_limit.options.clone(),
    )
    .await?;

    tracing::info!(
        namespace = %config.rate_limit.namespace,
        set = %config.rate_limit.set,
        limit = config.rate_limit.options.limit,
        duration = config.rate_limit.options.duration,
        "Rate limiter ready"
    );

    let app = create_router(Arc::new(limiter), &config.rate_limit);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    tracing::info!("ttl-limiter stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
