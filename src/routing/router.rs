//! Provider router.
//!
//! # Responsibilities
//! - Caller-facing handle over health tracking, scoring and circuit breaking
//! - Order candidate providers for the next call
//! - Hot-swap the routing policy on config reload

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use arc_swap::ArcSwap;
use tokio::sync::{broadcast, mpsc};

use crate::config::{validate_policy, HealthPolicy, RouterConfig, ValidationError};
use crate::health::{Clock, HealthStore, ProviderStats, SystemClock};
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{self, CircuitState};
use crate::resilience::timeouts;
use crate::routing::priority;
use crate::routing::summary::{format_percent, format_score, ProviderSummary};
use crate::storage::{JsonFileStorage, MemoryStorage};

/// Ranks and gates providers based on their recorded health.
///
/// Construct one per process and share it behind an `Arc`.
pub struct ProviderRouter {
    store: HealthStore,
    policy: ArcSwap<HealthPolicy>,
    clock: Arc<dyn Clock>,
}

impl ProviderRouter {
    /// Create a router using the system clock.
    pub fn new(store: HealthStore, policy: HealthPolicy) -> Self {
        Self::with_clock(store, policy, Arc::new(SystemClock))
    }

    /// Create a router with an explicit clock.
    pub fn with_clock(store: HealthStore, policy: HealthPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy: ArcSwap::from_pointee(policy),
            clock,
        }
    }

    /// Build the router described by a validated configuration.
    pub fn from_config(config: &RouterConfig) -> Self {
        let key = config.storage.key.clone();
        let store = match &config.storage.path {
            Some(path) => {
                tracing::info!(path = %path, key = %key, "Using file-backed provider health");
                HealthStore::open(JsonFileStorage::new(path), key)
            }
            None => {
                tracing::info!("Using in-memory provider health");
                HealthStore::open(MemoryStorage::new(), key)
            }
        };
        Self::new(store, config.policy())
    }

    pub fn store(&self) -> &HealthStore {
        &self.store
    }

    /// The policy currently in effect.
    pub fn policy(&self) -> Arc<HealthPolicy> {
        self.policy.load_full()
    }

    /// Replace the policy. Invalid policies are rejected and the current one kept.
    pub fn apply_policy(&self, policy: HealthPolicy) -> Result<(), Vec<ValidationError>> {
        validate_policy(&policy)?;
        if *self.policy.load_full() != policy {
            tracing::info!(
                threshold = policy.circuit_breaker.threshold,
                tiers = policy.circuit_breaker.tiers.len(),
                "Routing policy updated"
            );
        }
        self.policy.store(Arc::new(policy));
        Ok(())
    }

    /// Record a successful call and its latency.
    pub fn record_success(&self, provider: &str, response_time_ms: u64) {
        let stats = self.store.record_success(provider, response_time_ms);
        metrics::record_call(provider, true, Some(response_time_ms));
        metrics::record_circuit_state(provider, false);

        tracing::debug!(
            provider,
            response_time_ms,
            total = stats.success_count,
            rate = %format_percent(priority::success_rate(&stats)),
            "Provider call succeeded"
        );
    }

    /// Record a failed call.
    pub fn record_failure(&self, provider: &str) {
        let stats = self.store.record_failure(provider, self.clock.as_ref());
        let policy = self.policy.load();
        let state = circuit_breaker::evaluate(&stats, &policy.circuit_breaker, self.clock.now());
        metrics::record_call(provider, false, None);
        metrics::record_circuit_state(provider, state.is_open());

        tracing::debug!(
            provider,
            consecutive = stats.consecutive_failures,
            total_fails = stats.fail_count,
            "Provider call failed"
        );
        if let CircuitState::Open { remaining } = state {
            tracing::info!(provider, cooldown_secs = remaining.as_secs(), "Provider circuit opened");
        }
    }

    /// Breaker state for a provider right now.
    pub fn circuit_state(&self, provider: &str) -> CircuitState {
        let stats = self.store.snapshot(provider);
        self.evaluate_circuit(provider, &stats)
    }

    /// Whether the provider is in cool-down and should not be called.
    pub fn should_skip_provider(&self, provider: &str) -> bool {
        self.circuit_state(provider).is_open()
    }

    /// Current priority score for a provider.
    pub fn priority_score(&self, provider: &str) -> f64 {
        let stats = self.store.snapshot(provider);
        priority::priority_score(&stats, &self.policy.load().scoring)
    }

    /// Timeout in seconds for the next call to `provider`.
    pub fn get_adaptive_timeout(&self, provider: &str) -> f64 {
        let stats = self.store.snapshot(provider);
        let policy = self.policy.load();
        let timeout = timeouts::adaptive_timeout_secs(&stats, &policy);

        tracing::debug!(
            provider,
            timeout_secs = timeout,
            avg_ms = priority::avg_response_time_ms(&stats, &policy.scoring) as u64,
            "Adaptive timeout"
        );
        timeout
    }

    /// [`Self::get_adaptive_timeout`] as a [`Duration`].
    pub fn adaptive_timeout(&self, provider: &str) -> Duration {
        let stats = self.store.snapshot(provider);
        timeouts::adaptive_timeout(&stats, &self.policy.load())
    }

    /// Order candidates for the next call, best first.
    ///
    /// Circuit-broken providers are dropped unless that would leave nothing,
    /// in which case every candidate is ranked. Equal scores keep input order.
    pub fn get_priority_sorted_providers<S: AsRef<str>>(&self, candidates: &[S]) -> Vec<String> {
        let policy = self.policy.load();
        let now = self.clock.now();

        let scored: Vec<(&str, ProviderStats)> = candidates
            .iter()
            .map(|p| (p.as_ref(), self.store.snapshot(p.as_ref())))
            .collect();

        let mut available: Vec<(&str, f64)> = scored
            .iter()
            .filter(|(_, stats)| !circuit_breaker::should_skip(stats, &policy.circuit_breaker, now))
            .map(|(p, stats)| (*p, priority::priority_score(stats, &policy.scoring)))
            .collect();

        if available.is_empty() && !scored.is_empty() {
            tracing::warn!(
                candidates = scored.len(),
                "All providers circuit-broken, allowing all as fallback"
            );
            metrics::record_fallback();
            available = scored
                .iter()
                .map(|(p, stats)| (*p, priority::priority_score(stats, &policy.scoring)))
                .collect();
        }

        // Stable: ties keep their relative input order.
        available.sort_by(|a, b| b.1.total_cmp(&a.1));

        tracing::debug!(
            order = ?available
                .iter()
                .map(|(p, score)| format!("{}={}", p, format_score(*score)))
                .collect::<Vec<_>>(),
            "Provider priority order"
        );

        available.into_iter().map(|(p, _)| p.to_string()).collect()
    }

    /// Forget a provider's history.
    pub fn reset_provider(&self, provider: &str) -> bool {
        let removed = self.store.reset_provider(provider);
        if removed {
            metrics::record_circuit_state(provider, false);
            tracing::info!(provider, "Reset health data for provider");
        }
        removed
    }

    /// Forget every provider's history.
    pub fn reset_all(&self) {
        for provider in self.store.snapshot_all().keys() {
            metrics::record_circuit_state(provider, false);
        }
        self.store.reset_all();
        tracing::info!("Reset all provider health data");
    }

    /// Derived metrics for every tracked provider, keyed by provider id.
    pub fn stats_summary(&self) -> BTreeMap<String, ProviderSummary> {
        let policy = self.policy.load();
        let now = self.clock.now();

        self.store
            .snapshot_all()
            .into_iter()
            .map(|(provider, stats)| {
                let success_rate = priority::success_rate(&stats);
                let score = priority::priority_score(&stats, &policy.scoring);
                let state = circuit_breaker::evaluate(&stats, &policy.circuit_breaker, now);

                let summary = ProviderSummary {
                    success_count: stats.success_count,
                    fail_count: stats.fail_count,
                    success_rate,
                    success_rate_display: format_percent(success_rate),
                    avg_response_time_ms: priority::avg_response_time_ms(&stats, &policy.scoring) as u64,
                    consecutive_failures: stats.consecutive_failures,
                    priority_score: score,
                    priority_score_display: format_score(score),
                    circuit_broken: state.is_open(),
                    cooldown_remaining_secs: state.remaining().map(|d| d.as_secs()),
                };
                (provider, summary)
            })
            .collect()
    }

    /// Apply reloaded policies until the channel closes or shutdown fires.
    pub async fn run_config_updates(
        self: Arc<Self>,
        mut updates: mpsc::UnboundedReceiver<HealthPolicy>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                update = updates.recv() => {
                    let Some(policy) = update else {
                        tracing::info!("Policy update channel closed, stopping policy reloads");
                        break;
                    };
                    if let Err(errors) = self.apply_policy(policy) {
                        tracing::error!(errors = ?errors, "Rejected reloaded routing policy, keeping current");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Policy reloader received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn evaluate_circuit(&self, provider: &str, stats: &ProviderStats) -> CircuitState {
        let policy = self.policy.load();
        let state = circuit_breaker::evaluate(stats, &policy.circuit_breaker, self.clock.now());

        match state {
            CircuitState::Open { remaining } => {
                tracing::debug!(
                    provider,
                    remaining_secs = remaining.as_secs(),
                    "Provider circuit breaker active"
                );
            }
            CircuitState::HalfOpen if stats.last_failure.is_none() => {
                tracing::warn!(provider, "Failure time missing for tripped provider, allowing calls");
            }
            CircuitState::HalfOpen => {
                tracing::debug!(provider, "Provider circuit breaker expired, allowing retry");
            }
            CircuitState::Closed => {}
        }
        state
    }
}

impl std::fmt::Debug for ProviderRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRouter")
            .field("store", &self.store)
            .field("policy", &self.policy.load_full())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CooldownTier;
    use crate::health::ManualClock;
    use chrono::{TimeZone, Utc};

    fn router() -> (ProviderRouter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let store = HealthStore::open(MemoryStorage::new(), "provider_health");
        let router = ProviderRouter::with_clock(store, HealthPolicy::default(), clock.clone());
        (router, clock)
    }

    #[test]
    fn test_unknown_provider_defaults() {
        let (router, _) = router();
        assert!(!router.should_skip_provider("google"));
        assert_eq!(router.get_adaptive_timeout("google"), 10.0);
        assert_eq!(router.adaptive_timeout("google"), Duration::from_secs(10));
        assert!((router.priority_score("google") - 0.85).abs() < 1e-9);
        // Queries start tracking the provider.
        assert!(router.store().contains("google"));
    }

    #[test]
    fn test_empty_candidates() {
        let (router, _) = router();
        let empty: [&str; 0] = [];
        assert!(router.get_priority_sorted_providers(&empty).is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let (router, _) = router();
        let order = router.get_priority_sorted_providers(&["c", "a", "b"]);
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_broken_provider_filtered() {
        let (router, _) = router();
        router.record_success("google", 100);
        for _ in 0..3 {
            router.record_failure("openai");
        }

        let order = router.get_priority_sorted_providers(&["openai".to_string(), "google".to_string()]);
        assert_eq!(order, vec!["google"]);
    }

    #[test]
    fn test_circuit_state_transitions() {
        let (router, clock) = router();
        router.record_failure("p");
        router.record_failure("p");
        assert_eq!(router.circuit_state("p"), CircuitState::Closed);

        router.record_failure("p");
        assert_eq!(
            router.circuit_state("p"),
            CircuitState::Open { remaining: Duration::from_secs(60) }
        );

        clock.advance(Duration::from_secs(60));
        assert_eq!(router.circuit_state("p"), CircuitState::HalfOpen);

        router.record_success("p", 250);
        assert_eq!(router.circuit_state("p"), CircuitState::Closed);
    }

    #[test]
    fn test_apply_policy() {
        let (router, _) = router();
        let mut policy = HealthPolicy::default();
        policy.circuit_breaker.threshold = 1;
        policy.circuit_breaker.tiers = vec![CooldownTier { failures: 1, cooldown_secs: 5 }];
        router.apply_policy(policy.clone()).unwrap();
        assert_eq!(*router.policy(), policy);

        router.record_failure("p");
        assert!(router.should_skip_provider("p"));

        let mut invalid = HealthPolicy::default();
        invalid.scoring.weight_success_rate = 0.9;
        assert!(router.apply_policy(invalid).is_err());
        assert_eq!(*router.policy(), policy);
    }

    #[test]
    fn test_summary_reports_cooldown() {
        let (router, clock) = router();
        for _ in 0..5 {
            router.record_failure("b");
        }
        clock.advance(Duration::from_secs(100));

        let summary = router.stats_summary();
        let b = &summary["b"];
        assert!(b.circuit_broken);
        assert_eq!(b.cooldown_remaining_secs, Some(200));
        assert_eq!(b.success_rate_display, "0.0%");
        assert_eq!(b.avg_response_time_ms, 5000);
        // 0.4 * 0 + 0.3 * 0.5 + 0.3 * 0
        assert_eq!(b.priority_score_display, "0.15");
    }

    #[test]
    fn test_reset_provider() {
        let (router, _) = router();
        for _ in 0..3 {
            router.record_failure("p");
        }
        assert!(router.reset_provider("p"));
        assert!(!router.reset_provider("p"));
        assert!(!router.should_skip_provider("p"));
    }

    #[test]
    fn test_legacy_local_timestamp_cooldown() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let wall_clock = start
            .with_timezone(&chrono::Local)
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string();
        let storage = MemoryStorage::with_entry(
            "provider_health",
            serde_json::json!({
                "deepl": {"success_count": 0, "fail_count": 3, "total_response_time_ms": 0,
                          "last_failure": wall_clock, "consecutive_failures": 3}
            }),
        );
        let clock = Arc::new(ManualClock::new(start));
        let router = ProviderRouter::with_clock(
            HealthStore::open(storage, "provider_health"),
            HealthPolicy::default(),
            clock.clone(),
        );

        assert_eq!(
            router.circuit_state("deepl"),
            CircuitState::Open { remaining: Duration::from_secs(60) }
        );
        clock.advance(Duration::from_secs(61));
        assert!(!router.should_skip_provider("deepl"));
    }

    #[test]
    fn test_from_config_in_memory() {
        let router = ProviderRouter::from_config(&RouterConfig::default());
        router.record_success("google", 10);
        assert_eq!(router.store().snapshot("google").success_count, 1);
        assert_eq!(*router.policy(), HealthPolicy::default());
    }
}
