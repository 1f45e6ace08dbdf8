//! Provider routing subsystem.
//!
//! # Data Flow
//! ```text
//! Candidate providers (caller)
//!     → router.rs (snapshot stats per candidate)
//!     → circuit breaker filter (all broken → keep everyone)
//!     → priority.rs (score survivors)
//!     → stable sort, best first
//! ```
//!
//! # Design Decisions
//! - Availability over strict breaking: the caller always gets a candidate
//! - Stable sort so equal scores are deterministic
//! - summary.rs is a read-only reporting view, never cached

pub mod priority;
pub mod router;
pub mod summary;

pub use router::ProviderRouter;
pub use summary::ProviderSummary;
