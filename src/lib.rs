// Fixed-window rate limiting over a TTL key-value store

pub mod api;
pub mod clock;
pub mod config;
pub mod errors;
pub mod observability;
pub mod rate_limit;
pub mod store;

pub use config::Config;
pub use errors::{AppError, Result};
pub use rate_limit::{RateLimitGuard, RateLimitOptions, RateLimiter, Verdict};
pub use store::{InMemoryStore, RateLimitRecord, RedisStore, StoreError, StoreKey, TtlStore};
