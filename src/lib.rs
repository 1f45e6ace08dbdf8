//! Provider health tracking and adaptive routing.
//!
//! Records the outcome of calls to interchangeable backend providers, ranks
//! them by reliability and latency, skips repeatedly failing ones for a
//! cool-down and derives per-provider timeouts.
//!
//! ```text
//!   caller ──record_success/failure──▶ ProviderRouter ──▶ HealthStore ──▶ HealthStorage
//!   caller ◀──ordered candidates────── ProviderRouter ◀── priority + circuit breaker
//! ```

pub mod config;
pub mod health;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod storage;

pub use config::schema::{HealthPolicy, RouterConfig};
pub use health::{Clock, HealthStore, ManualClock, ProviderStats, SystemClock};
pub use resilience::CircuitState;
pub use routing::{ProviderRouter, ProviderSummary};
pub use storage::{HealthStorage, JsonFileStorage, MemoryStorage, StorageError};
