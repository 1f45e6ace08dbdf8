//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (weights, timeouts, tiers)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{CircuitBreakerConfig, HealthPolicy, RouterConfig, ScoringConfig, TimeoutConfig};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("scoring weight `{name}` must be a finite non-negative number, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("scoring weights must sum to 1.0, got {0}")]
    WeightSum(f64),

    #[error("scoring.max_acceptable_response_time_ms must be greater than 0")]
    ZeroResponseCeiling,

    #[error("scoring.stability_penalty_per_failure must be in (0, 1], got {0}")]
    InvalidPenalty(f64),

    #[error("timeouts.{name} must be a positive number, got {value}")]
    InvalidTimeout { name: &'static str, value: f64 },

    #[error("timeouts.min_secs ({min}) exceeds timeouts.max_secs ({max})")]
    TimeoutRange { min: f64, max: f64 },

    #[error("timeouts.min_samples must be at least 1")]
    ZeroMinSamples,

    #[error("circuit_breaker.threshold must be at least 1")]
    ZeroThreshold,

    #[error("circuit breaker tier with {0} failures is below the threshold and can never apply")]
    UnreachableTier(u64),

    #[error("duplicate circuit breaker tier for {0} failures")]
    DuplicateTier(u64),

    #[error("storage.key must not be empty")]
    EmptyStorageKey,

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),
}

/// Validate a full configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = policy_errors(&config.policy());

    if config.storage.key.trim().is_empty() {
        errors.push(ValidationError::EmptyStorageKey);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate only the routing policy.
pub fn validate_policy(policy: &HealthPolicy) -> Result<(), Vec<ValidationError>> {
    let errors = policy_errors(policy);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn policy_errors(policy: &HealthPolicy) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_scoring(&policy.scoring, &mut errors);
    check_timeouts(&policy.timeouts, &mut errors);
    check_circuit_breaker(&policy.circuit_breaker, &mut errors);
    errors
}

fn check_scoring(scoring: &ScoringConfig, errors: &mut Vec<ValidationError>) {
    let weights = [
        ("weight_success_rate", scoring.weight_success_rate),
        ("weight_response_time", scoring.weight_response_time),
        ("weight_stability", scoring.weight_stability),
    ];

    let mut all_valid = true;
    for (name, value) in weights {
        if !value.is_finite() || value < 0.0 {
            errors.push(ValidationError::InvalidWeight { name, value });
            all_valid = false;
        }
    }

    if all_valid {
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            errors.push(ValidationError::WeightSum(sum));
        }
    }

    if scoring.max_acceptable_response_time_ms == 0 {
        errors.push(ValidationError::ZeroResponseCeiling);
    }

    let penalty = scoring.stability_penalty_per_failure;
    if !(penalty > 0.0 && penalty <= 1.0) {
        errors.push(ValidationError::InvalidPenalty(penalty));
    }
}

fn check_timeouts(timeouts: &TimeoutConfig, errors: &mut Vec<ValidationError>) {
    let values = [
        ("default_secs", timeouts.default_secs),
        ("min_secs", timeouts.min_secs),
        ("max_secs", timeouts.max_secs),
        ("multiplier", timeouts.multiplier),
    ];

    for (name, value) in values {
        if !value.is_finite() || value <= 0.0 {
            errors.push(ValidationError::InvalidTimeout { name, value });
        }
    }

    if timeouts.min_secs > timeouts.max_secs {
        errors.push(ValidationError::TimeoutRange {
            min: timeouts.min_secs,
            max: timeouts.max_secs,
        });
    }

    // With no samples the average is only the unseen-provider placeholder.
    if timeouts.min_samples == 0 {
        errors.push(ValidationError::ZeroMinSamples);
    }
}

fn check_circuit_breaker(breaker: &CircuitBreakerConfig, errors: &mut Vec<ValidationError>) {
    if breaker.threshold == 0 {
        errors.push(ValidationError::ZeroThreshold);
    }

    let mut seen = HashSet::new();
    for tier in &breaker.tiers {
        if !seen.insert(tier.failures) {
            errors.push(ValidationError::DuplicateTier(tier.failures));
        }
        if tier.failures < breaker.threshold {
            errors.push(ValidationError::UnreachableTier(tier.failures));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::CooldownTier;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RouterConfig::default()).is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = RouterConfig::default();
        config.scoring.weight_stability = 0.5;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::WeightSum(_)));
    }

    #[test]
    fn test_negative_weight_reported_without_sum_error() {
        let mut config = RouterConfig::default();
        config.scoring.weight_success_rate = -0.4;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidWeight {
                name: "weight_success_rate",
                value: -0.4
            }]
        );
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RouterConfig::default();
        config.timeouts.min_secs = 40.0;
        config.circuit_breaker.threshold = 0;
        config.storage.key = "  ".to_string();
        config.scoring.max_acceptable_response_time_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::TimeoutRange { min: 40.0, max: 30.0 }));
        assert!(errors.contains(&ValidationError::ZeroThreshold));
        assert!(errors.contains(&ValidationError::EmptyStorageKey));
        assert!(errors.contains(&ValidationError::ZeroResponseCeiling));
    }

    #[test]
    fn test_tier_checks() {
        let mut config = RouterConfig::default();
        config.circuit_breaker.tiers = vec![
            CooldownTier { failures: 2, cooldown_secs: 10 },
            CooldownTier { failures: 5, cooldown_secs: 60 },
            CooldownTier { failures: 5, cooldown_secs: 90 },
        ];

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::UnreachableTier(2)));
        assert!(errors.contains(&ValidationError::DuplicateTier(5)));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = RouterConfig::default();
        config.observability.metrics_address = "not-an-address".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::MetricsAddress("not-an-address".to_string())]
        );
    }

    #[test]
    fn test_min_samples_must_be_positive() {
        let mut config = RouterConfig::default();
        config.timeouts.min_samples = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::ZeroMinSamples]);

        config.timeouts.min_samples = 1;
        assert!(validate_config(&config).is_ok());
    }
}
