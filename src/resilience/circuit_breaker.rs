//! Circuit breaker for failing providers.
//!
//! # States
//! - Closed: normal operation, calls allowed
//! - Open: provider skipped until its cool-down elapses
//! - Half-Open: threshold still met but cool-down over, next call allowed
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= threshold
//! Open → Half-Open: now >= last_failure + cooldown(consecutive_failures)
//! Half-Open → Closed: a success zeroes consecutive_failures
//! Half-Open → Open: another failure, possibly at a longer cool-down tier
//! ```
//!
//! # Design Decisions
//! - State is derived from (consecutive_failures, last_failure, now), never stored
//! - Cool-down is the highest tier not exceeding the failure count
//! - Missing failure time fails open

use std::time::Duration;
use chrono::{DateTime, TimeDelta, Utc};

use crate::config::CircuitBreakerConfig;
use crate::health::ProviderStats;

/// Derived breaker state for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Below the failure threshold.
    Closed,
    /// Tripped; calls should be skipped for `remaining`.
    Open { remaining: Duration },
    /// Tripped earlier but the cool-down has run out.
    HalfOpen,
}

impl CircuitState {
    /// Whether callers should avoid the provider right now.
    pub fn is_open(&self) -> bool {
        matches!(self, CircuitState::Open { .. })
    }

    /// Time left until the provider becomes eligible again.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            CircuitState::Open { remaining } => Some(*remaining),
            _ => None,
        }
    }
}

/// Cool-down for a given number of consecutive failures.
///
/// 3 → 60s, 4 → 60s, 5 → 300s, 10+ → 1800s with the default tiers.
pub fn cooldown_for(consecutive_failures: u64, config: &CircuitBreakerConfig) -> Duration {
    let secs = config
        .tiers
        .iter()
        .filter(|tier| tier.failures <= consecutive_failures)
        .max_by_key(|tier| tier.failures)
        .map(|tier| tier.cooldown_secs)
        .unwrap_or(config.fallback_cooldown_secs);
    Duration::from_secs(secs)
}

/// Evaluate the breaker for a stats snapshot at `now`.
pub fn evaluate(stats: &ProviderStats, config: &CircuitBreakerConfig, now: DateTime<Utc>) -> CircuitState {
    if stats.consecutive_failures < config.threshold {
        return CircuitState::Closed;
    }

    let Some(last_failure) = stats.last_failure else {
        return CircuitState::HalfOpen;
    };

    let cooldown = cooldown_for(stats.consecutive_failures, config);
    let skip_until = TimeDelta::from_std(cooldown)
        .ok()
        .and_then(|delta| last_failure.checked_add_signed(delta));

    match skip_until {
        Some(until) if now >= until => CircuitState::HalfOpen,
        Some(until) => CircuitState::Open {
            remaining: (until - now).to_std().unwrap_or_default(),
        },
        // Past the end of representable time.
        None => CircuitState::Open { remaining: cooldown },
    }
}

/// Whether the provider should be skipped at `now`.
pub fn should_skip(stats: &ProviderStats, config: &CircuitBreakerConfig, now: DateTime<Utc>) -> bool {
    evaluate(stats, config, now).is_open()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CooldownTier;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn failing(consecutive: u64, last_failure: Option<DateTime<Utc>>) -> ProviderStats {
        ProviderStats {
            fail_count: consecutive,
            consecutive_failures: consecutive,
            last_failure,
            ..Default::default()
        }
    }

    #[test]
    fn test_cooldown_tiers() {
        let config = CircuitBreakerConfig::default();
        let cases = [(3, 60), (4, 60), (5, 300), (9, 300), (10, 1800), (250, 1800)];
        for (failures, secs) in cases {
            assert_eq!(cooldown_for(failures, &config), Duration::from_secs(secs), "{failures} failures");
        }
    }

    #[test]
    fn test_fallback_cooldown_when_no_tier_matches() {
        let config = CircuitBreakerConfig {
            threshold: 2,
            tiers: vec![CooldownTier { failures: 4, cooldown_secs: 30 }],
            fallback_cooldown_secs: 900,
        };
        assert_eq!(cooldown_for(2, &config), Duration::from_secs(900));
        assert_eq!(cooldown_for(4, &config), Duration::from_secs(30));
    }

    #[test]
    fn test_unsorted_tiers() {
        let config = CircuitBreakerConfig {
            tiers: vec![
                CooldownTier { failures: 10, cooldown_secs: 1800 },
                CooldownTier { failures: 3, cooldown_secs: 60 },
                CooldownTier { failures: 5, cooldown_secs: 300 },
            ],
            ..Default::default()
        };
        assert_eq!(cooldown_for(7, &config), Duration::from_secs(300));
    }

    #[test]
    fn test_below_threshold_is_closed() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(evaluate(&ProviderStats::default(), &config, t0()), CircuitState::Closed);
        assert_eq!(evaluate(&failing(2, Some(t0())), &config, t0()), CircuitState::Closed);
    }

    #[test]
    fn test_opens_at_threshold_and_recovers() {
        let config = CircuitBreakerConfig::default();
        let stats = failing(3, Some(t0()));

        assert_eq!(
            evaluate(&stats, &config, t0()),
            CircuitState::Open { remaining: Duration::from_secs(60) }
        );
        assert_eq!(
            evaluate(&stats, &config, t0() + TimeDelta::seconds(45)).remaining(),
            Some(Duration::from_secs(15))
        );
        assert!(!should_skip(&stats, &config, t0() + TimeDelta::seconds(60)));
        assert_eq!(
            evaluate(&stats, &config, t0() + TimeDelta::seconds(61)),
            CircuitState::HalfOpen
        );
    }

    #[test]
    fn test_missing_failure_time_fails_open() {
        let config = CircuitBreakerConfig::default();
        let stats = failing(12, None);
        assert_eq!(evaluate(&stats, &config, t0()), CircuitState::HalfOpen);
        assert!(!should_skip(&stats, &config, t0()));
    }

    #[test]
    fn test_clock_behind_failure_stays_open() {
        let config = CircuitBreakerConfig::default();
        let stats = failing(3, Some(t0()));
        let state = evaluate(&stats, &config, t0() - TimeDelta::seconds(30));
        assert_eq!(state.remaining(), Some(Duration::from_secs(90)));
    }
}
