//! In-process storage.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use serde_json::Value;

use crate::storage::{HealthStorage, StorageResult};

/// Keeps blobs in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a key, e.g. with health data captured elsewhere.
    pub fn with_entry(key: impl Into<String>, value: Value) -> Self {
        let storage = Self::new();
        storage
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
        storage
    }
}

impl HealthStorage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
