//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! store / router produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;

use crate::config::ObservabilityConfig;

/// Install logging and, when enabled, the metrics exporter.
///
/// Logging is skipped if the host process already installed a subscriber.
pub fn init(config: &ObservabilityConfig) {
    if logging::init_logging(config).is_err() {
        tracing::debug!("Global tracing subscriber already set, keeping it");
    }

    if config.metrics_enabled {
        match config.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }
}
