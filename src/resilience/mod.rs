//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Before a provider call:
//!     → circuit_breaker.rs (skip providers in cool-down)
//!     → timeouts.rs (budget for the call, enforced by the caller)
//! ```
//!
//! # Design Decisions
//! - Both are pure functions of a stats snapshot and the policy
//! - The engine never blocks or enforces anything itself

pub mod circuit_breaker;
pub mod timeouts;

pub use circuit_breaker::CircuitState;
