//! Durable store of per-provider statistics.
//!
//! # Responsibilities
//! - Own the provider → stats map
//! - Load it from the storage collaborator on startup
//! - Persist the whole map after every mutation (write-through)
//!
//! # Design Decisions
//! - One mutex guards both the map and the save, so a record is
//!   read, mutated and persisted in a single critical section
//! - Readers get whole-record copies taken under the same lock
//! - Storage failures are logged and swallowed; memory stays authoritative

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use serde_json::Value;

use crate::health::clock::Clock;
use crate::health::stats::{ProviderStats, StoredStats};
use crate::observability::metrics;
use crate::storage::{HealthStorage, StorageError};

/// Thread-safe provider statistics with write-through persistence.
pub struct HealthStore {
    records: Mutex<HashMap<String, ProviderStats>>,
    storage: Box<dyn HealthStorage>,
    key: String,
}

impl HealthStore {
    /// Open a store, loading whatever `storage` holds under `key`.
    pub fn open<S>(storage: S, key: impl Into<String>) -> Self
    where
        S: HealthStorage + 'static,
    {
        let key = key.into();
        let records = load_records(&storage, &key);
        tracing::debug!(key = %key, providers = records.len(), "Loaded provider health data");

        Self {
            records: Mutex::new(records),
            storage: Box::new(storage),
            key,
        }
    }

    /// Record a successful call and return the updated stats.
    pub fn record_success(&self, provider: &str, response_time_ms: u64) -> ProviderStats {
        let mut records = self.lock();
        let stats = records.entry(provider.to_string()).or_default();
        stats.record_success(response_time_ms);
        let updated = stats.clone();
        self.persist(&records);
        updated
    }

    /// Record a failed call and return the updated stats.
    ///
    /// The failure time is read from `clock` under the lock, so `last_failure`
    /// never moves backwards when failures race.
    pub fn record_failure(&self, provider: &str, clock: &dyn Clock) -> ProviderStats {
        let mut records = self.lock();
        let stats = records.entry(provider.to_string()).or_default();
        stats.record_failure(clock.now());
        let updated = stats.clone();
        self.persist(&records);
        updated
    }

    /// Forget a provider. Returns whether anything was removed.
    pub fn reset_provider(&self, provider: &str) -> bool {
        let mut records = self.lock();
        if records.remove(provider).is_none() {
            return false;
        }
        self.persist(&records);
        true
    }

    /// Forget every provider.
    pub fn reset_all(&self) {
        let mut records = self.lock();
        records.clear();
        self.persist(&records);
    }

    /// Copy of a provider's stats. Unknown providers start tracking with defaults.
    pub fn snapshot(&self, provider: &str) -> ProviderStats {
        self.lock().entry(provider.to_string()).or_default().clone()
    }

    /// Copy of every tracked provider's stats, ordered by provider id.
    pub fn snapshot_all(&self) -> BTreeMap<String, ProviderStats> {
        self.lock()
            .iter()
            .map(|(provider, stats)| (provider.clone(), stats.clone()))
            .collect()
    }

    /// Whether a provider has a record.
    pub fn contains(&self, provider: &str) -> bool {
        self.lock().contains_key(provider)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ProviderStats>> {
        // Every mutation leaves the map consistent, so a poisoned lock is safe to reuse.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, records: &HashMap<String, ProviderStats>) {
        if let Err(e) = self.try_persist(records) {
            metrics::record_persist_error();
            tracing::error!(key = %self.key, error = %e, "Error saving provider health data");
        }
    }

    fn try_persist(&self, records: &HashMap<String, ProviderStats>) -> Result<(), StorageError> {
        let ordered: BTreeMap<&str, StoredStats> = records
            .iter()
            .map(|(provider, stats)| (provider.as_str(), stats.to_record()))
            .collect();
        let value = serde_json::to_value(ordered)?;
        self.storage.set(&self.key, value)
    }
}

impl std::fmt::Debug for HealthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthStore")
            .field("key", &self.key)
            .field("providers", &self.len())
            .finish_non_exhaustive()
    }
}

fn load_records(storage: &dyn HealthStorage, key: &str) -> HashMap<String, ProviderStats> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return HashMap::new(),
        Err(e) => {
            tracing::error!(key, error = %e, "Error loading provider health data");
            return HashMap::new();
        }
    };

    let Value::Object(entries) = raw else {
        tracing::error!(key, "Provider health data is not an object, starting empty");
        return HashMap::new();
    };

    let mut records = HashMap::with_capacity(entries.len());
    for (provider, value) in entries {
        match serde_json::from_value::<StoredStats>(value) {
            Ok(record) => {
                let stats = ProviderStats::from_record(&provider, record);
                records.insert(provider, stats);
            }
            Err(e) => {
                tracing::warn!(provider = %provider, error = %e, "Skipping malformed provider health record");
            }
        }
    }
    records
}
