//! Metrics collection and exposition.
//!
//! # Metrics
//! - `provider_calls_total` (counter): recorded outcomes by provider, outcome
//! - `provider_response_time_ms` (histogram): latency of successful calls
//! - `provider_circuit_open` (gauge): 1=skipped, 0=eligible
//! - `provider_router_fallback_total` (counter): all candidates were circuit-broken
//! - `provider_health_persist_errors_total` (counter): failed saves
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus exporter is opt-in via config

use std::net::SocketAddr;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter. Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a recorded call outcome.
pub fn record_call(provider: &str, success: bool, response_time_ms: Option<u64>) {
    let outcome = if success { "success" } else { "failure" };
    ::metrics::counter!(
        "provider_calls_total",
        "provider" => provider.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    if let Some(ms) = response_time_ms {
        ::metrics::histogram!("provider_response_time_ms", "provider" => provider.to_string())
            .record(ms as f64);
    }
}

/// Publish whether a provider is currently skipped.
pub fn record_circuit_state(provider: &str, open: bool) {
    ::metrics::gauge!("provider_circuit_open", "provider" => provider.to_string())
        .set(if open { 1.0 } else { 0.0 });
}

/// Count a routing request where every candidate was circuit-broken.
pub fn record_fallback() {
    ::metrics::counter!("provider_router_fallback_total").increment(1);
}

/// Count a failed health save.
pub fn record_persist_error() {
    ::metrics::counter!("provider_health_persist_errors_total").increment(1);
}
