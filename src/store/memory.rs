//! In-memory TTL store for tests and single-node deployments.
//!
//! Expiry is evaluated lazily against the injected [`Clock`]: an entry whose
//! deadline has passed reads as absent and is dropped on the next access.

use super::{RateLimitRecord, StoreError, StoreKey, TtlStore};
use crate::clock::{Clock, SystemClock};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy)]
struct Entry {
    record: RateLimitRecord,
    /// Epoch second at which the entry stops being visible
    expires_at: i64,
}

/// Process-local [`TtlStore`].
pub struct InMemoryStore {
    entries: RwLock<HashMap<StoreKey, Entry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store whose expiry follows `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Remaining TTL of a live entry, in seconds.
    pub async fn ttl(&self, key: &StoreKey) -> Option<i64> {
        let now = self.clock.now_secs();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.expires_at - now)
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = self.clock.now_secs();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| entry.expires_at > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TtlStore for InMemoryStore {
    async fn connect(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get(&self, key: &StoreKey) -> Result<RateLimitRecord, StoreError> {
        let now = self.clock.now_secs();
        let mut entries = self.entries.write().await;

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(entry.record),
            Some(_) => {
                entries.remove(key);
                Err(StoreError::NotFound)
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn put(
        &self,
        key: &StoreKey,
        record: &RateLimitRecord,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let ttl = i64::try_from(ttl_secs)
            .map_err(|_| StoreError::Backend(format!("ttl out of range: {}", ttl_secs)))?;
        let expires_at = self.clock.now_secs().saturating_add(ttl);

        let mut entries = self.entries.write().await;
        entries.insert(
            key.clone(),
            Entry {
                record: *record,
                expires_at,
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &StoreKey) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").finish_non_exhaustive()
    }
}
