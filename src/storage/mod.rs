//! Persistence collaborators for provider health.
//!
//! # Data Flow
//! ```text
//! HealthStore mutation
//!     → serialize whole provider map to a JSON value
//!     → HealthStorage::set(key, value)
//!
//! HealthStore construction
//!     → HealthStorage::get(key)
//!     → deserialize record by record
//! ```
//!
//! # Design Decisions
//! - Storage is an opaque key → blob store; no partial writes
//! - Injected into the store so tests run against independent instances
//! - Errors are returned here and swallowed by the store

pub mod file;
pub mod memory;

use serde_json::Value;
use thiserror::Error;

pub use file::JsonFileStorage;
pub use memory::MemoryStorage;

/// Errors that can occur while reading or writing health data.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The stored document has an unexpected shape.
    #[error("storage document is corrupt: {0}")]
    Corrupt(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Key-value persistence of whole health maps.
pub trait HealthStorage: Send + Sync {
    /// Fetch the blob stored under `key`, if any.
    fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Replace the blob stored under `key`.
    fn set(&self, key: &str, value: Value) -> StorageResult<()>;
}

impl<S: HealthStorage + ?Sized> HealthStorage for std::sync::Arc<S> {
    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        (**self).set(key, value)
    }
}
