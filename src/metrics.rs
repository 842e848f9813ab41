//! Prometheus metrics for request and store monitoring.
//!
//! This module provides metrics for:
//! - HTTP request counts and latency per route
//! - Document store operation latency and failures
//! - Book lifecycle events (created, updated, deleted)

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Store operation latency metric name.
pub const METRIC_STORE_OPERATION_LATENCY: &str = "store_operation_latency_ms";
/// Store errors counter metric name.
pub const METRIC_STORE_ERRORS: &str = "store_errors_total";
/// Books created counter metric name.
pub const METRIC_BOOKS_CREATED: &str = "books_created_total";
/// Books updated counter metric name.
pub const METRIC_BOOKS_UPDATED: &str = "books_updated_total";
/// Books deleted counter metric name.
pub const METRIC_BOOKS_DELETED: &str = "books_deleted_total";

/// Install the Prometheus recorder and register metric descriptions.
/// Call this once at startup.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Initialize all metric descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_STORE_OPERATION_LATENCY,
        "Document store operation latency in milliseconds"
    );

    describe_counter!(METRIC_HTTP_REQUESTS, "Total number of HTTP requests");
    describe_counter!(
        METRIC_STORE_ERRORS,
        "Total number of failed document store operations"
    );
    describe_counter!(METRIC_BOOKS_CREATED, "Total number of books created");
    describe_counter!(METRIC_BOOKS_UPDATED, "Total number of books updated");
    describe_counter!(METRIC_BOOKS_DELETED, "Total number of books deleted");

    debug!("Metrics initialized");
}

/// Record HTTP request latency and count.
pub fn record_http_request(start: Instant, route: &str, status: u16) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "route" => route.to_string()).record(latency_ms);
    counter!(
        METRIC_HTTP_REQUESTS,
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Increment store errors counter.
pub fn inc_store_errors() {
    counter!(METRIC_STORE_ERRORS).increment(1);
}

/// Increment books created counter.
pub fn inc_books_created() {
    counter!(METRIC_BOOKS_CREATED).increment(1);
}

/// Increment books updated counter.
pub fn inc_books_updated() {
    counter!(METRIC_BOOKS_UPDATED).increment(1);
}

/// Increment books deleted counter.
pub fn inc_books_deleted() {
    counter!(METRIC_BOOKS_DELETED).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
    op: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric and operation label.
    pub fn new(metric_name: &'static str, op: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
            op,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name, "op" => self.op).record(latency_ms);
    }
}

/// Create a latency timer for a store operation.
pub fn timer_store_op(op: &'static str) -> LatencyTimer {
    LatencyTimer::new(METRIC_STORE_OPERATION_LATENCY, op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn latency_timer_measures_time() {
        let timer = timer_store_op("test");
        sleep(Duration::from_millis(10));
        let elapsed = timer.elapsed_ms();
        assert!(elapsed >= 9.0); // Allow some tolerance
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        record_http_request(Instant::now(), "/books", 200);
        inc_books_created();
        inc_store_errors();
    }
}
