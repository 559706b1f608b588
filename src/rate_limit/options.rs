use crate::errors::{AppError, Result};
use serde::Deserialize;

/// Key prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "RATE_LIMIT";

/// Per-limiter window settings.
///
/// `limit` and `duration` default to 0, which [`validate`](Self::validate)
/// rejects, so a deserialized block missing either field fails construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateLimitOptions {
    /// Hits allowed per window
    #[serde(default)]
    pub limit: u64,
    /// Window length in seconds
    #[serde(default)]
    pub duration: u64,
    /// Namespace prefix for store keys
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl RateLimitOptions {
    pub fn new(limit: u64, duration: u64) -> Self {
        Self {
            limit,
            duration,
            prefix: default_prefix(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(AppError::Configuration(
                "Limit missing in rate limit options".to_string(),
            ));
        }

        if self.duration == 0 {
            return Err(AppError::Configuration(
                "Duration missing in rate limit options".to_string(),
            ));
        }

        // Remaining-time arithmetic is done in i64.
        if i64::try_from(self.duration).is_err() {
            return Err(AppError::Configuration(format!(
                "Duration out of range: {}",
                self.duration
            )));
        }

        Ok(())
    }
}
