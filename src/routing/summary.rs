//! Reporting view over tracked providers.

use serde::Serialize;

/// Derived health metrics for one provider, computed on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSummary {
    pub success_count: u64,
    pub fail_count: u64,
    /// Fraction in [0, 1].
    pub success_rate: f64,
    /// e.g. "66.7%"
    pub success_rate_display: String,
    /// Whole milliseconds, truncated.
    pub avg_response_time_ms: u64,
    pub consecutive_failures: u64,
    pub priority_score: f64,
    /// e.g. "0.83"
    pub priority_score_display: String,
    pub circuit_broken: bool,
    /// Seconds until the provider is eligible again, when broken.
    pub cooldown_remaining_secs: Option<u64>,
}

pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}
