//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): proxied requests by method, status, backend
//! - `gateway_request_duration_seconds` (histogram): proxied request latency
//! - `gateway_backend_health` (gauge): last probe verdict, 1=healthy, 0=unhealthy
//! - `gateway_failover_total` (counter): selections that fell back to the backup
//! - `gateway_circuit_transitions_total` (counter): circuit state changes by key and state
//! - `gateway_tokens_issued_total` (counter): token requests by outcome
//! - `gateway_authorization_total` (counter): authorization decisions by reason
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels for route, backend, status code

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, backend: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "backend" => backend.to_string()
    )
    .increment(1);

    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "backend" => backend.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_backend_health(backend: &str, healthy: bool) {
    gauge!("gateway_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_failover(primary: &str, backup: &str) {
    counter!(
        "gateway_failover_total",
        "primary" => primary.to_string(),
        "backup" => backup.to_string()
    )
    .increment(1);
}

pub fn record_circuit_transition(key: &str, state: &'static str) {
    counter!(
        "gateway_circuit_transitions_total",
        "key" => key.to_string(),
        "state" => state
    )
    .increment(1);
}

pub fn record_token_issued(outcome: &'static str) {
    counter!("gateway_tokens_issued_total", "outcome" => outcome).increment(1);
}

pub fn record_authorization(reason: &'static str, allow: bool) {
    counter!(
        "gateway_authorization_total",
        "reason" => reason,
        "decision" => if allow { "allow" } else { "deny" }
    )
    .increment(1);
}
