//! Per-provider call statistics and their persisted form.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observed outcomes for a single provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderStats {
    /// Total successful calls.
    pub success_count: u64,
    /// Total failed calls.
    pub fail_count: u64,
    /// Sum of latencies across successful calls.
    pub total_response_time_ms: u64,
    /// Failures since the last success.
    pub consecutive_failures: u64,
    /// When the most recent failure happened.
    pub last_failure: Option<DateTime<Utc>>,
}

impl ProviderStats {
    pub fn record_success(&mut self, response_time_ms: u64) {
        self.success_count = self.success_count.saturating_add(1);
        self.total_response_time_ms = self.total_response_time_ms.saturating_add(response_time_ms);
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self, at: DateTime<Utc>) {
        self.fail_count = self.fail_count.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_failure = Some(at);
    }

    /// Total calls observed, successful or not.
    pub fn total_calls(&self) -> u64 {
        self.success_count.saturating_add(self.fail_count)
    }

    /// Mean latency of successful calls, `None` before the first success.
    pub fn average_response_time_ms(&self) -> Option<f64> {
        if self.success_count == 0 {
            None
        } else {
            Some(self.total_response_time_ms as f64 / self.success_count as f64)
        }
    }

    /// Convert into the persisted representation.
    pub fn to_record(&self) -> StoredStats {
        StoredStats {
            success_count: self.success_count,
            fail_count: self.fail_count,
            total_response_time_ms: self.total_response_time_ms,
            last_failure: self.last_failure.map(|t| t.to_rfc3339()),
            consecutive_failures: self.consecutive_failures,
        }
    }

    /// Rebuild stats from a persisted record.
    ///
    /// An unreadable `last_failure` is dropped so the breaker fails open.
    pub fn from_record(provider: &str, record: StoredStats) -> Self {
        let last_failure = record.last_failure.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                tracing::warn!(provider, last_failure = raw, "Ignoring unparseable failure timestamp");
            }
            parsed
        });

        let mut consecutive_failures = record.consecutive_failures;
        if consecutive_failures > record.fail_count {
            tracing::warn!(
                provider,
                consecutive = consecutive_failures,
                fail_count = record.fail_count,
                "Consecutive failures exceed total failures, clamping"
            );
            consecutive_failures = record.fail_count;
        }

        Self {
            success_count: record.success_count,
            fail_count: record.fail_count,
            total_response_time_ms: record.total_response_time_ms,
            consecutive_failures,
            last_failure,
        }
    }
}

/// Persisted shape of [`ProviderStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredStats {
    pub success_count: u64,
    pub fail_count: u64,
    pub total_response_time_ms: u64,
    /// ISO-8601 timestamp.
    pub last_failure: Option<String>,
    pub consecutive_failures: u64,
}

/// Parse an ISO-8601 timestamp.
///
/// Offset-less values are local wall-clock time. A local time that falls in a
/// DST gap is read as UTC; one in a fold resolves to the earlier instant.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Utc));
    }
    let naive = raw.parse::<NaiveDateTime>().ok()?;
    let resolved = naive
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc());
    Some(resolved)
}
