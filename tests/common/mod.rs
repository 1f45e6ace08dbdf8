//! Shared utilities for integration tests.

use std::sync::Arc;
use chrono::{DateTime, TimeZone, Utc};
use provider_router::config::HealthPolicy;
use provider_router::{HealthStore, ManualClock, MemoryStorage, ProviderRouter};

pub const KEY: &str = "provider_health";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 15, 8, 0, 0).unwrap()
}

/// A router over in-memory storage with a clock the test controls.
pub struct Harness {
    pub router: Arc<ProviderRouter>,
    pub clock: Arc<ManualClock>,
    pub storage: Arc<MemoryStorage>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()))
    }

    /// Reuse an existing storage, e.g. to simulate a process restart.
    pub fn with_storage(storage: Arc<MemoryStorage>) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let store = HealthStore::open(storage.clone(), KEY);
        let router = Arc::new(ProviderRouter::with_clock(
            store,
            HealthPolicy::default(),
            clock.clone(),
        ));
        Self { router, clock, storage }
    }

    #[allow(dead_code)]
    pub fn fail(&self, provider: &str, times: usize) {
        for _ in 0..times {
            self.router.record_failure(provider);
        }
    }
}
