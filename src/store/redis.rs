use super::{RateLimitRecord, StoreError, StoreKey, TtlStore};
use crate::config::RedisConfig;
use ::redis::{aio::ConnectionManager, AsyncCommands, Client};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Redis-backed TTL store.
///
/// Records are JSON strings written with `SET .. EX ttl`, keyed by the
/// rendered `namespace:set:key` form of the [`StoreKey`].
pub struct RedisStore {
    client: Client,
    connect_timeout: Duration,
    manager: OnceCell<ConnectionManager>,
}

impl RedisStore {
    /// Open a client for the configured URL. No connection is made until `connect`.
    pub fn new(config: &RedisConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.url.as_str())?;

        Ok(Self {
            client,
            connect_timeout: Duration::from_secs(config.connection_timeout_seconds),
            manager: OnceCell::new(),
        })
    }

    fn manager(&self) -> Result<ConnectionManager, StoreError> {
        self.manager.get().cloned().ok_or(StoreError::NotConnected)
    }
}

#[async_trait]
impl TtlStore for RedisStore {
    async fn connect(&self) -> Result<(), StoreError> {
        if self.manager.initialized() {
            return Ok(());
        }

        tracing::info!("Connecting to Redis");

        let manager = tokio::time::timeout(
            self.connect_timeout,
            ConnectionManager::new(self.client.clone()),
        )
        .await
        .map_err(|_| StoreError::Timeout(self.connect_timeout))??;

        // A concurrent connect may have won; either handle is equivalent.
        let _ = self.manager.set(manager);

        tracing::info!("Redis client connected");

        Ok(())
    }

    async fn get(&self, key: &StoreKey) -> Result<RateLimitRecord, StoreError> {
        let mut manager = self.manager()?;
        let raw: Option<String> = manager.get(key.to_string()).await?;

        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Err(StoreError::NotFound),
        }
    }

    async fn put(
        &self,
        key: &StoreKey,
        record: &RateLimitRecord,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let mut manager = self.manager()?;
        let value = serde_json::to_string(record)?;
        let _: () = manager.set_ex(key.to_string(), value, ttl_secs).await?;
        Ok(())
    }

    async fn remove(&self, key: &StoreKey) -> Result<(), StoreError> {
        let mut manager = self.manager()?;
        let _: i64 = manager.del(key.to_string()).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut manager = self.manager()?;
        let _: String = ::redis::cmd("PING").query_async(&mut manager).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("connect_timeout", &self.connect_timeout)
            .field("connected", &self.manager.initialized())
            .finish_non_exhaustive()
    }
}
