//! Key/value storage backends
//!
//! The workspace persists one JSON blob per key. Backends only move strings
//! around; parsing and fallback live in [`crate::persisted`].
//! - File: `<data>/storage/<key>.json`
//! - Memory: shared map, with switches to simulate disabled storage and quotas

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Quota exceeded writing '{key}': {len} bytes over a {quota} byte quota")]
    QuotaExceeded { key: String, len: usize, quota: usize },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable string storage addressed by key
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Keys become file names, so keep them boring
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && !key.starts_with('.');
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// The directory is created on first write, not here
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        // Write-then-rename so readers never see a torn blob
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, String>,
    unavailable: bool,
    quota: Option<usize>,
}

/// In-memory storage; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail, like disabled browser storage
    pub fn set_available(&self, available: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.unavailable = !available;
        }
    }

    /// Cap the total stored bytes
    pub fn set_quota(&self, quota: Option<usize>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.quota = quota;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_inner<R>(
        &self,
        f: impl FnOnce(&mut MemoryInner) -> Result<R, StorageError>,
    ) -> Result<R, StorageError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))?;
        if inner.unavailable {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        f(&mut inner)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        self.with_inner(|inner| Ok(inner.entries.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.with_inner(|inner| {
            if let Some(quota) = inner.quota {
                let others: usize = inner
                    .entries
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(_, v)| v.len())
                    .sum();
                if others + value.len() > quota {
                    return Err(StorageError::QuotaExceeded {
                        key: key.to_string(),
                        len: value.len(),
                        quota,
                    });
                }
            }
            inner.entries.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.with_inner(|inner| {
            inner.entries.remove(key);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_validation() {
        assert!(validate_key("focus-workspace-settings").is_ok());
        assert!(validate_key("a.b_c").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("with space").is_err());
    }

    #[test]
    fn test_file_storage_missing_dir_reads_absent() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(&tmp.path().join("not-yet"));
        assert!(storage.get("settings").unwrap().is_none());
        assert!(!storage.dir().exists());
    }

    #[test]
    fn test_file_storage_set_get_remove() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(&tmp.path().join("storage"));

        storage.set("settings", r#"{"a":1}"#).unwrap();
        assert_eq!(storage.get("settings").unwrap().as_deref(), Some(r#"{"a":1}"#));
        assert!(storage.path_for("settings").unwrap().exists());
        assert!(!tmp.path().join("storage/settings.json.tmp").exists());

        storage.set("settings", "2").unwrap();
        assert_eq!(storage.get("settings").unwrap().as_deref(), Some("2"));

        storage.remove("settings").unwrap();
        assert!(storage.get("settings").unwrap().is_none());
        storage.remove("settings").unwrap();
    }

    #[test]
    fn test_memory_storage_shared_between_clones() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        storage.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn test_memory_storage_unavailable() {
        let storage = MemoryStorage::new();
        storage.set_available(false);

        assert!(matches!(storage.get("k"), Err(StorageError::Unavailable(_))));
        assert!(matches!(storage.set("k", "v"), Err(StorageError::Unavailable(_))));

        storage.set_available(true);
        assert!(storage.get("k").unwrap().is_none());
    }

    #[test]
    fn test_memory_storage_quota() {
        let storage = MemoryStorage::new();
        storage.set_quota(Some(4));

        storage.set("k", "1234").unwrap();
        // Replacing a key only counts the new value
        storage.set("k", "abcd").unwrap();

        let err = storage.set("other", "x").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { quota: 4, .. }));
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("abcd"));
    }
}
