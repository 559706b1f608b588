//! Observation points of the rate limiter.
//!
//! The limiter never logs through ambient state; it reports to the
//! [`LimiterEvents`] handed to it at construction.

use crate::observability::MetricsRecorder;
use crate::store::{StoreError, StoreKey};

/// Receives the limiter's observation points. Every method defaults to a no-op.
pub trait LimiterEvents: Send + Sync {
    /// A read failed with something other than "not found".
    fn read_failed(&self, _key: &StoreKey, _error: &StoreError) {}

    /// Remaining TTL computed while recording a hit on an existing window.
    fn ttl_computed(&self, _key: &StoreKey, _ttl: i64) {}

    /// Creating or updating a record failed.
    fn write_failed(&self, _key: &StoreKey, _error: &StoreError) {}

    /// A hit was refused because the window budget is spent.
    fn limited(&self, _key: &str, _retry_after: i64) {}

    /// Removing a record failed.
    fn reset_failed(&self, _key: &StoreKey, _error: &StoreError) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

impl LimiterEvents for NoopEvents {}

/// Emits `tracing` events and counts store failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvents;

impl LimiterEvents for TracingEvents {
    fn read_failed(&self, key: &StoreKey, error: &StoreError) {
        MetricsRecorder::record_store_error("get");
        tracing::error!(key = %key, error = %error, "Error while reading rate limit record");
    }

    fn ttl_computed(&self, key: &StoreKey, ttl: i64) {
        tracing::debug!(key = %key, ttl = ttl, "Recomputed rate limit TTL");
    }

    fn write_failed(&self, key: &StoreKey, error: &StoreError) {
        MetricsRecorder::record_store_error("put");
        tracing::error!(key = %key, error = %error, "Error while writing rate limit record");
    }

    fn limited(&self, key: &str, retry_after: i64) {
        tracing::info!(key = %key, retry_after = retry_after, "Key rate limited");
    }

    fn reset_failed(&self, key: &StoreKey, error: &StoreError) {
        MetricsRecorder::record_store_error("remove");
        tracing::error!(key = %key, error = %error, "Error while resetting rate limit");
    }
}
