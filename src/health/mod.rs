//! Provider health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Provider call completes (caller)
//!     → ProviderRouter::record_success / record_failure
//!     → store.rs (mutate stats.rs record under lock)
//!     → storage collaborator (persist whole map)
//!
//! Routing query:
//!     → store.rs snapshot (whole-record copy)
//!     → scoring / circuit breaker evaluate the copy lock-free
//! ```
//!
//! # Design Decisions
//! - Stats are created lazily; an unseen provider is assumed trustworthy
//! - No stored breaker state; it is derived from stats and clock.rs time

pub mod clock;
pub mod stats;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use stats::{ProviderStats, StoredStats};
pub use store::HealthStore;
