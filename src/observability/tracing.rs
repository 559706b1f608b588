use crate::config::ObservabilityConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging. `RUST_LOG` overrides the configured level.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    let initialized = match config.log_format.as_str() {
        "json" => registry
            .with(fmt::layer().json().flatten_event(true))
            .try_init(),
        _ => registry.with(fmt::layer().pretty()).try_init(),
    };

    if initialized.is_err() {
        tracing::warn!("Global subscriber already set, keeping it");
        return;
    }

    tracing::info!(
        "Tracing initialized (level: {}, format: {})",
        config.log_level,
        config.log_format
    );
}
