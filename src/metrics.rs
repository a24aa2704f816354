//! Prometheus metrics for allow-list requests and provider calls
//!
//! This module provides a global metrics registry and helper functions
//! to track request outcomes and cloud API latency.

use lazy_static::lazy_static;
use prometheus::{
    opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, Registry, TextEncoder,
};
use std::sync::Once;
use tracing::debug;

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref REGISTRY: Registry = Registry::new();

    /// Allow-list requests by outcome
    /// Labels: outcome (created, updated, exists, rejected, provider_error)
    pub static ref ALLOW_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        opts!("allow_requests_total", "Total number of allow-list requests"),
        &["outcome"]
    )
    .expect("Failed to create allow_requests_total metric");

    /// Provider API call duration in seconds
    /// Labels: operation (list, create, update), status (ok, error)
    pub static ref PROVIDER_CALL_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "provider_call_duration_seconds",
        "Cloud provider API call latencies",
        &["operation", "status"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to create provider_call_duration_seconds metric");
}

static INIT: Once = Once::new();

/// Initialize metrics registry by registering all metrics
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(ALLOW_REQUESTS_TOTAL.clone()))
            .expect("Failed to register allow_requests_total");
        REGISTRY
            .register(Box::new(PROVIDER_CALL_DURATION_SECONDS.clone()))
            .expect("Failed to register provider_call_duration_seconds");

        debug!("Prometheus metrics registry initialized");
    });
}

/// Record the final outcome of an allow-list request
pub fn record_allow_outcome(outcome: &str) {
    ALLOW_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record one provider API call
pub fn record_provider_call(operation: &str, success: bool, duration_secs: f64) {
    let status = if success { "ok" } else { "error" };
    PROVIDER_CALL_DURATION_SECONDS
        .with_label_values(&[operation, status])
        .observe(duration_secs);
}

/// Render the registry in Prometheus text format
pub fn gather_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("Failed to encode metrics: {}", e))?;

    String::from_utf8(buffer).map_err(|e| format!("Metrics are not valid UTF-8: {}", e))
}
