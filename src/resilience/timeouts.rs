//! Adaptive timeouts.
//!
//! # Responsibilities
//! - Derive a per-provider call timeout from its average latency
//! - Fall back to a fixed default until enough successes are observed
//!
//! # Design Decisions
//! - The engine produces the value; callers enforce it (e.g. `tokio::time::timeout`)
//! - Clamping keeps the result away from pathologically small or huge values

use std::time::Duration;

use crate::config::HealthPolicy;
use crate::health::ProviderStats;
use crate::routing::priority::avg_response_time_ms;

/// Timeout in seconds for the next call to a provider.
pub fn adaptive_timeout_secs(stats: &ProviderStats, policy: &HealthPolicy) -> f64 {
    let timeouts = &policy.timeouts;
    if stats.success_count < timeouts.min_samples {
        return timeouts.default_secs;
    }

    let avg_ms = avg_response_time_ms(stats, &policy.scoring);
    let timeout_ms = avg_ms * timeouts.multiplier + timeouts.buffer_ms as f64;

    // max/min rather than clamp: a hot-swapped policy must never panic here.
    (timeout_ms / 1000.0).min(timeouts.max_secs).max(timeouts.min_secs)
}

/// [`adaptive_timeout_secs`] as a [`Duration`].
pub fn adaptive_timeout(stats: &ProviderStats, policy: &HealthPolicy) -> Duration {
    let secs = adaptive_timeout_secs(stats, policy);
    Duration::try_from_secs_f64(secs)
        .or_else(|_| Duration::try_from_secs_f64(policy.timeouts.default_secs))
        .unwrap_or(Duration::from_secs(10))
}
