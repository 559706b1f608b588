use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec, TextEncoder};

// Metrics registry
static RATE_LIMIT_DECISIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rate_limit_decisions_total",
        "Rate limit decisions taken by the middleware",
        &["verdict"]
    )
    .unwrap()
});

static RATE_LIMIT_STORE_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rate_limit_store_errors_total",
        "Store operations that failed during rate limiting",
        &["operation"]
    )
    .unwrap()
});

static RATE_LIMIT_RESETS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("rate_limit_resets_total", "Rate limit keys reset").unwrap()
});

pub struct MetricsRecorder;

impl MetricsRecorder {
    /// `verdict` is one of `allowed`, `limited`, `ignored`, `error`.
    pub fn record_decision(verdict: &str) {
        RATE_LIMIT_DECISIONS_TOTAL.with_label_values(&[verdict]).inc();
    }

    pub fn record_store_error(operation: &str) {
        RATE_LIMIT_STORE_ERRORS_TOTAL
            .with_label_values(&[operation])
            .inc();
    }

    pub fn record_reset() {
        RATE_LIMIT_RESETS_TOTAL.inc();
    }

    /// Export all metrics in Prometheus format
    pub fn export() -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        encoder.encode_to_string(&metric_families)
    }
}
