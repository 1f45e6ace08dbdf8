//! JSON file storage.
//!
//! The file holds one JSON object mapping storage keys to blobs, so several
//! components can share a settings file the way a config store would.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use serde_json::{Map, Value};

use crate::storage::{HealthStorage, StorageError, StorageResult};

/// Persists blobs to a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> StorageResult<Map<String, Value>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_reader(BufReader::new(file))? {
            Value::Object(map) => Ok(map),
            other => Err(StorageError::Corrupt(format!(
                "expected a JSON object at the top level of {}, found {}",
                self.path.display(),
                type_name(&other)
            ))),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write next to the target and rename so readers never see a torn file.
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(&mut writer, document)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl HealthStorage for JsonFileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.read_document()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let mut document = self.read_document()?;
        document.insert(key.to_string(), value);
        self.write_document(&document)?;
        tracing::trace!(path = %self.path.display(), key, "Saved health document");
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("settings.json"));
        assert!(storage.get("provider_health").unwrap().is_none());
    }

    #[test]
    fn test_set_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let storage = JsonFileStorage::new(&path);

        storage.set("theme", json!("dark")).unwrap();
        storage.set("provider_health", json!({"google": {"success_count": 1}})).unwrap();

        let reopened = JsonFileStorage::new(&path);
        assert_eq!(reopened.get("theme").unwrap(), Some(json!("dark")));
        assert_eq!(
            reopened.get("provider_health").unwrap(),
            Some(json!({"google": {"success_count": 1}}))
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_non_object_document_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = JsonFileStorage::new(&path).get("provider_health").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let storage = JsonFileStorage::new(&path);
        assert!(matches!(
            storage.get("provider_health").unwrap_err(),
            StorageError::Serialization(_)
        ));
        // A broken document is not silently overwritten.
        assert!(storage.set("provider_health", json!({})).is_err());
    }
}
