//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the provider router.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Priority scoring weights and normalization.
    pub scoring: ScoringConfig,

    /// Adaptive timeout settings.
    pub timeouts: TimeoutConfig,

    /// Circuit breaker threshold and cool-down tiers.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Where provider health is persisted.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl RouterConfig {
    /// The part of the configuration that governs routing decisions.
    pub fn policy(&self) -> HealthPolicy {
        HealthPolicy {
            scoring: self.scoring.clone(),
            timeouts: self.timeouts.clone(),
            circuit_breaker: self.circuit_breaker.clone(),
        }
    }
}

/// Routing policy, hot-swappable at runtime.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HealthPolicy {
    pub scoring: ScoringConfig,
    pub timeouts: TimeoutConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Priority score configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of the success rate component.
    pub weight_success_rate: f64,

    /// Weight of the response time component.
    pub weight_response_time: f64,

    /// Weight of the recent stability component.
    pub weight_stability: f64,

    /// Average latency at which the response time component reaches zero.
    pub max_acceptable_response_time_ms: u64,

    /// Stability lost per consecutive failure.
    pub stability_penalty_per_failure: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weight_success_rate: 0.4,
            weight_response_time: 0.3,
            weight_stability: 0.3,
            max_acceptable_response_time_ms: 10_000,
            stability_penalty_per_failure: 0.25,
        }
    }
}

/// Adaptive timeout configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout used until enough successes have been observed, in seconds.
    pub default_secs: f64,

    /// Lower clamp in seconds.
    pub min_secs: f64,

    /// Upper clamp in seconds.
    pub max_secs: f64,

    /// timeout = avg_time * multiplier + buffer
    pub multiplier: f64,

    /// Extra headroom in milliseconds.
    pub buffer_ms: u64,

    /// Successes required before the timeout adapts.
    pub min_samples: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_secs: 10.0,
            min_secs: 3.0,
            max_secs: 30.0,
            multiplier: 2.5,
            buffer_ms: 1000,
            min_samples: 3,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the breaker.
    pub threshold: u64,

    /// Cool-down tiers keyed by consecutive failure count.
    pub tiers: Vec<CooldownTier>,

    /// Cool-down used when the threshold is met but no tier matches.
    pub fallback_cooldown_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            tiers: vec![
                CooldownTier { failures: 3, cooldown_secs: 60 },
                CooldownTier { failures: 5, cooldown_secs: 300 },
                CooldownTier { failures: 10, cooldown_secs: 1800 },
            ],
            fallback_cooldown_secs: 1800,
        }
    }
}

/// A single cool-down step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CooldownTier {
    /// Minimum consecutive failures for this tier to apply.
    pub failures: u64,

    /// How long the provider is skipped, in seconds.
    pub cooldown_secs: u64,
}

/// Health persistence configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the store. In-memory only when unset.
    pub path: Option<String>,

    /// Key the health map is stored under.
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: "provider_health".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
