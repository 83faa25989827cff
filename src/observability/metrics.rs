//! Metrics collection and exposition.
//!
//! # Metrics
//! - `prerender_requests_total` (counter): adapter requests by outcome, status
//! - `prerender_request_duration_seconds` (histogram): adapter latency
//! - `prerender_declined_total` (counter): rendering client declines by reason
//! - `prerender_fallback_attempts_total` (counter): fallback fetch attempts
//!
//! Recording is a no-op until a recorder is installed by [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished adapter request.
pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    counter!(
        "prerender_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("prerender_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record the rendering client declining a request.
pub fn record_render_declined(reason: &'static str) {
    counter!("prerender_declined_total", "reason" => reason).increment(1);
}

/// Record one fallback fetch attempt.
pub fn record_fallback_attempt() {
    counter!("prerender_fallback_attempts_total").increment(1);
}
