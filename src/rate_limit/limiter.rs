use crate::clock::{Clock, SystemClock};
use crate::errors::{AppError, Result};
use crate::rate_limit::events::{LimiterEvents, TracingEvents};
use crate::rate_limit::key::KeyBuilder;
use crate::rate_limit::options::RateLimitOptions;
use crate::store::{RateLimitRecord, StoreKey, TtlStore};
use std::sync::Arc;

/// Outcome of recording a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The hit fits in the current window
    Allowed,
    /// The window budget is spent
    Limited {
        /// Seconds until the window elapses; may be non-positive if the
        /// store has not yet expired the record
        retry_after: i64,
    },
}

impl Verdict {
    pub fn is_limited(&self) -> bool {
        matches!(self, Verdict::Limited { .. })
    }
}

/// Fixed-window rate limiter over a [`TtlStore`].
///
/// Each `increment` is one read followed by at most one write. There is no
/// locking across calls: two concurrent hits on the same key may both read
/// the same record and one increment can be lost. Windows are bounded by the
/// store TTL, never by local state.
pub struct RateLimiter {
    store: Arc<dyn TtlStore>,
    keys: KeyBuilder,
    options: RateLimitOptions,
    clock: Arc<dyn Clock>,
    events: Arc<dyn LimiterEvents>,
}

/// Builder for a [`RateLimiter`] with a custom clock or event sink.
pub struct RateLimiterBuilder {
    store: Arc<dyn TtlStore>,
    namespace: String,
    set: String,
    options: RateLimitOptions,
    clock: Arc<dyn Clock>,
    events: Arc<dyn LimiterEvents>,
}

impl RateLimiterBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn events(mut self, events: Arc<dyn LimiterEvents>) -> Self {
        self.events = events;
        self
    }

    /// Validate options, then connect the store.
    ///
    /// Invalid options fail before the store is touched. A connection failure
    /// is returned as-is and is not retried.
    pub async fn connect(self) -> Result<RateLimiter> {
        self.options.validate()?;

        self.store.connect().await.map_err(AppError::Connection)?;

        Ok(RateLimiter {
            store: self.store,
            keys: KeyBuilder::new(self.namespace, self.set, self.options.prefix.as_str()),
            options: self.options,
            clock: self.clock,
            events: self.events,
        })
    }
}

impl RateLimiter {
    pub fn builder(
        store: Arc<dyn TtlStore>,
        namespace: impl Into<String>,
        set: impl Into<String>,
        options: RateLimitOptions,
    ) -> RateLimiterBuilder {
        RateLimiterBuilder {
            store,
            namespace: namespace.into(),
            set: set.into(),
            options,
            clock: Arc::new(SystemClock),
            events: Arc::new(TracingEvents),
        }
    }

    /// Create a limiter with the system clock and tracing events.
    pub async fn connect(
        store: Arc<dyn TtlStore>,
        namespace: impl Into<String>,
        set: impl Into<String>,
        options: RateLimitOptions,
    ) -> Result<Self> {
        Self::builder(store, namespace, set, options).connect().await
    }

    /// Record a hit for `key` and report whether it is rate limited.
    pub async fn increment(&self, key: &str) -> Result<Verdict> {
        let store_key = self.keys.build(key);
        let now = self.clock.now_secs();

        let record = match self.store.get(&store_key).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                self.create_record(&store_key, now).await?;
                return Ok(Verdict::Allowed);
            }
            Err(e) => {
                self.events.read_failed(&store_key, &e);
                return Err(AppError::Store(e));
            }
        };

        if record.hits < self.options.limit {
            self.update_record(&store_key, record, now).await?;
            return Ok(Verdict::Allowed);
        }

        let retry_after = self.remaining_time_at(&record, now);
        self.events.limited(key, retry_after);
        Ok(Verdict::Limited { retry_after })
    }

    /// Remove the record for `key`, starting a fresh window on the next hit.
    pub async fn reset(&self, key: &str) -> Result<()> {
        let store_key = self.keys.build(key);

        self.store.remove(&store_key).await.map_err(|e| {
            self.events.reset_failed(&store_key, &e);
            AppError::Store(e)
        })
    }

    /// Seconds left in `record`'s window. Non-positive once the window has elapsed.
    pub fn remaining_time(&self, record: &RateLimitRecord) -> i64 {
        self.remaining_time_at(record, self.clock.now_secs())
    }

    /// The store key `key` maps to.
    pub fn store_key(&self, key: &str) -> StoreKey {
        self.keys.build(key)
    }

    pub fn store(&self) -> &Arc<dyn TtlStore> {
        &self.store
    }

    fn remaining_time_at(&self, record: &RateLimitRecord, now: i64) -> i64 {
        // created_at comes back from the store and is not trusted to be sane.
        // duration is validated to fit in i64.
        let elapsed = now.saturating_sub(record.created_at);
        (self.options.duration as i64).saturating_sub(elapsed)
    }

    async fn create_record(&self, store_key: &StoreKey, now: i64) -> Result<()> {
        let record = RateLimitRecord::first_hit(now);

        self.store
            .put(store_key, &record, self.options.duration)
            .await
            .map_err(|e| {
                self.events.write_failed(store_key, &e);
                AppError::Store(e)
            })
    }

    async fn update_record(
        &self,
        store_key: &StoreKey,
        mut record: RateLimitRecord,
        now: i64,
    ) -> Result<()> {
        record.hits += 1;
        let ttl = self.remaining_time_at(&record, now);
        self.events.ttl_computed(store_key, ttl);

        // The window has elapsed but the store still holds the record.
        if ttl <= 0 {
            return Ok(());
        }

        self.store
            .put(store_key, &record, ttl as u64)
            .await
            .map_err(|e| {
                self.events.write_failed(store_key, &e);
                AppError::Store(e)
            })
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("keys", &self.keys)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
