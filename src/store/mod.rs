//! TTL key-value store abstraction consumed by the rate limiter.
//!
//! A store holds one [`RateLimitRecord`] per [`StoreKey`] and expires it on
//! its own once the TTL given at write time runs out. Two implementations
//! ship with the crate:
//!
//! - [`RedisStore`] for production deployments
//! - [`InMemoryStore`] for tests and single-node use

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use self::memory::InMemoryStore;
pub use self::redis::RedisStore;

/// Composite key: namespace, set and a string key.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct StoreKey {
    pub namespace: String,
    pub set: String,
    pub key: String,
}

impl StoreKey {
    pub fn new(namespace: impl Into<String>, set: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            set: set.into(),
            key: key.into(),
        }
    }
}

/// Renders as `namespace:set:key`, the flat form used by key-only stores.
impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.set, self.key)
    }
}

/// Hit counter for one fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRecord {
    /// Epoch seconds at which the window started
    pub created_at: i64,
    /// Hits recorded in the window, at least 1
    pub hits: u64,
}

impl RateLimitRecord {
    /// First hit of a window starting at `now`.
    pub fn first_hit(now: i64) -> Self {
        Self {
            created_at: now,
            hits: 1,
        }
    }
}

/// Errors reported by a [`TtlStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists for the key. Expected on the first hit of a window.
    #[error("record not found")]
    NotFound,

    #[error("store is not connected")]
    NotConnected,

    #[error("store connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("record codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// Remote key-value store with per-record TTL.
#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Establish the shared connection. Called once by the limiter at construction.
    async fn connect(&self) -> Result<(), StoreError>;

    /// Read the record for `key`, failing with [`StoreError::NotFound`] when absent.
    async fn get(&self, key: &StoreKey) -> Result<RateLimitRecord, StoreError>;

    /// Write `record`, replacing any previous value and its TTL.
    async fn put(
        &self,
        key: &StoreKey,
        record: &RateLimitRecord,
        ttl_secs: u64,
    ) -> Result<(), StoreError>;

    /// Delete the record for `key`.
    async fn remove(&self, key: &StoreKey) -> Result<(), StoreError>;

    /// Liveness probe for health checks.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
