//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by relay mode and status
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_upstream_bytes` (histogram): size of buffered upstream bodies
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Error outcomes are labelled with mode `error`

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of one proxied call.
pub fn record_request(mode: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "mode" => mode,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "mode" => mode)
        .record(start.elapsed().as_secs_f64());
}

/// Record the size of a buffered upstream body.
pub fn record_upstream_bytes(size: usize) {
    metrics::histogram!("proxy_upstream_bytes").record(size as f64);
}
