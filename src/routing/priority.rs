//! Priority scoring.
//!
//! Higher score = better provider, tried first. The score is only meaningful
//! relative to other providers scored with the same configuration.
//!
//! ```text
//! score = w_success * success_rate
//!       + w_time    * max(0, 1 - avg_ms / max_acceptable_ms)
//!       + w_stable  * (1 - min(1, consecutive_failures * penalty))
//! ```

use crate::config::ScoringConfig;
use crate::health::ProviderStats;

/// Fraction of calls that succeeded. Unseen providers are assumed good.
pub fn success_rate(stats: &ProviderStats) -> f64 {
    let total = stats.total_calls();
    if total == 0 {
        return 1.0;
    }
    stats.success_count as f64 / total as f64
}

/// Average latency, or half the acceptable ceiling before the first success.
pub fn avg_response_time_ms(stats: &ProviderStats, scoring: &ScoringConfig) -> f64 {
    stats
        .average_response_time_ms()
        .unwrap_or(scoring.max_acceptable_response_time_ms as f64 / 2.0)
}

/// 1.0 for an instantaneous provider, 0.0 at or beyond the ceiling.
pub fn time_score(stats: &ProviderStats, scoring: &ScoringConfig) -> f64 {
    let ceiling = scoring.max_acceptable_response_time_ms as f64;
    if ceiling <= 0.0 {
        return 0.0;
    }
    (1.0 - avg_response_time_ms(stats, scoring) / ceiling).max(0.0)
}

/// 1.0 with no recent failures, dropping by the penalty per consecutive failure.
pub fn stability_score(stats: &ProviderStats, scoring: &ScoringConfig) -> f64 {
    let penalty = (stats.consecutive_failures as f64 * scoring.stability_penalty_per_failure).min(1.0);
    1.0 - penalty
}

/// Weighted priority score in [0.0, 1.0].
pub fn priority_score(stats: &ProviderStats, scoring: &ScoringConfig) -> f64 {
    success_rate(stats) * scoring.weight_success_rate
        + time_score(stats, scoring) * scoring.weight_response_time
        + stability_score(stats, scoring) * scoring.weight_stability
}
