use crate::errors::{AppError, Result};
use crate::rate_limit::RateLimitOptions;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub rate_limit: RateLimitConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub connection_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub namespace: String,
    pub set: String,
    /// Let limited requests through while still counting them
    #[serde(default)]
    pub ignore_rate_limiting: bool,
    #[serde(flatten)]
    pub options: RateLimitOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let environment = env::var("TTL_LIMITER_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(
                config::File::with_name(&format!("config/{}", environment)).required(false),
            )
            // e.g., TTL_LIMITER__RATE_LIMIT__LIMIT=100
            .add_source(
                config::Environment::with_prefix("TTL_LIMITER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Configuration(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Configuration("Invalid port number".to_string()));
        }

        if self.redis.url.is_empty() {
            return Err(AppError::Configuration(
                "Redis URL is required".to_string(),
            ));
        }

        if self.rate_limit.namespace.is_empty() || self.rate_limit.set.is_empty() {
            return Err(AppError::Configuration(
                "Rate limit namespace and set are required".to_string(),
            ));
        }

        self.rate_limit.options.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    const VALID: &str = r#"
        [server]
        host = "0.0.0.0"
        port = 8080

        [redis]
        url = "redis://localhost:6379"
        connection_timeout_seconds = 5

        [rate_limit]
        namespace = "test"
        set = "limits"
        limit = 100
        duration = 60

        [observability]
        log_level = "info"
        log_format = "pretty"
    "#;

    #[test]
    fn test_config_validation() {
        let mut config = from_toml(VALID);
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit.options.prefix, "RATE_LIMIT");
        assert!(!config.rate_limit.ignore_rate_limiting);

        // Test invalid port
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_limit_fails_validation() {
        let config = from_toml(&VALID.replace("limit = 100", ""));
        assert_eq!(config.rate_limit.options.limit, 0);
        assert!(matches!(config.validate(), Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_empty_namespace_fails_validation() {
        let mut config = from_toml(VALID);
        config.rate_limit.namespace.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_file_loads() {
        let config = Config::load().expect("Failed to load config");
        assert!(config.validate().is_ok());
    }
}
