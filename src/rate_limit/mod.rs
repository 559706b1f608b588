pub mod events;
pub mod key;
pub mod limiter;
pub mod middleware;
pub mod options;

pub use events::{LimiterEvents, NoopEvents, TracingEvents};
pub use key::{KeyBuilder, SEPARATOR};
pub use limiter::{RateLimiter, RateLimiterBuilder, Verdict};
pub use middleware::{extract_ip, rate_limit_middleware, RateLimitGuard, RetryAfter};
pub use options::{RateLimitOptions, DEFAULT_PREFIX};
