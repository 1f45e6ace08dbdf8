//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → HealthPolicy handed to the ProviderRouter
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new config sent over a channel
//!     → router swaps its HealthPolicy atomically
//! ```
//!
//! # Design Decisions
//! - Every field has a default so an empty file is a valid config
//! - Only the policy is hot-swappable; storage and observability need a restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CircuitBreakerConfig, CooldownTier, HealthPolicy, ObservabilityConfig, RouterConfig,
    ScoringConfig, StorageConfig, TimeoutConfig,
};
pub use validation::{validate_config, validate_policy, ValidationError};
pub use watcher::ConfigWatcher;
