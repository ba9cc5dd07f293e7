//! Persisted value bound to one storage key
//!
//! Read once when opened, written through on every change. Storage trouble
//! never reaches the caller: a bad or missing blob yields the default, a
//! failed write is logged and dropped while the in-memory value moves on.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::storage::KeyValueStorage;

pub struct Persisted<T, S> {
    storage: S,
    key: String,
    value: T,
}

impl<T, S> Persisted<T, S>
where
    T: Serialize + DeserializeOwned,
    S: KeyValueStorage,
{
    /// Bind `key`, loading its current value or falling back to `default`
    ///
    /// Never writes: a fallback leaves whatever is stored untouched.
    pub fn open(storage: S, key: &str, default: T) -> Self {
        let value = load(&storage, key).unwrap_or(default);
        Self {
            storage,
            key: key.to_string(),
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Owned copy of the current value
    pub fn read(&self) -> T
    where
        T: Clone,
    {
        self.value.clone()
    }

    /// Replace the value and persist it
    pub fn write(&mut self, value: T) {
        self.value = value;
        self.persist();
    }

    /// Replace the value with `f(previous)` and persist it in the same step
    pub fn update<F>(&mut self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.value);
        self.write(next);
    }

    /// Re-read the stored blob, keeping the current value if it is unusable
    pub fn reload(&mut self) -> bool {
        match load(&self.storage, &self.key) {
            Some(value) => {
                self.value = value;
                true
            }
            None => false,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to serialize value, write dropped");
                return;
            }
        };

        if let Err(e) = self.storage.set(&self.key, &json) {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist value, write dropped");
        }
    }
}

fn load<T, S>(storage: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStorage,
{
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!(key, "No stored value, using default");
            return None;
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Storage unavailable, using default");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Stored value is not valid, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        name: String,
        items: Vec<u32>,
    }

    fn prefs() -> Prefs {
        Prefs {
            name: "default".to_string(),
            items: vec![],
        }
    }

    #[test]
    fn test_absent_key_yields_default_without_writing() {
        let storage = MemoryStorage::new();
        let store = Persisted::open(storage.clone(), "prefs", prefs());

        assert_eq!(store.get(), &prefs());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_round_trip_through_fresh_instance() {
        let storage = MemoryStorage::new();
        let value = Prefs {
            name: "mine".to_string(),
            items: vec![3, 1, 2],
        };

        let mut store = Persisted::open(storage.clone(), "prefs", prefs());
        store.write(value.clone());

        let reopened = Persisted::open(storage, "prefs", prefs());
        assert_eq!(reopened.read(), value);
    }

    #[test]
    fn test_invalid_json_falls_back_and_keeps_blob() {
        let storage = MemoryStorage::new();
        storage.set("prefs", "not json").unwrap();

        let store = Persisted::open(storage.clone(), "prefs", prefs());
        assert_eq!(store.get(), &prefs());
        assert_eq!(storage.get("prefs").unwrap().as_deref(), Some("not json"));
    }

    #[test]
    fn test_unavailable_storage_on_open_and_write() {
        let storage = MemoryStorage::new();
        storage.set_available(false);

        let mut store = Persisted::open(storage.clone(), "prefs", prefs());
        assert_eq!(store.get(), &prefs());

        store.update(|p| Prefs {
            name: "offline".to_string(),
            ..p.clone()
        });
        assert_eq!(store.get().name, "offline");

        storage.set_available(true);
        assert!(storage.get("prefs").unwrap().is_none());
    }

    #[test]
    fn test_quota_exceeded_write_is_dropped() {
        let storage = MemoryStorage::new();
        let mut store = Persisted::open(storage.clone(), "prefs", prefs());
        store.write(prefs());
        let stored = storage.get("prefs").unwrap();

        storage.set_quota(Some(8));
        store.update(|p| Prefs {
            items: vec![1; 100],
            ..p.clone()
        });

        assert_eq!(store.get().items.len(), 100);
        assert_eq!(storage.get("prefs").unwrap(), stored);
    }

    #[test]
    fn test_updates_compose_in_order() {
        let storage = MemoryStorage::new();
        let mut store = Persisted::open(storage.clone(), "prefs", prefs());

        for i in 0..3 {
            store.update(|p| {
                let mut next = p.clone();
                next.items.push(i);
                next
            });
        }

        let reopened: Persisted<Prefs, _> = Persisted::open(storage, "prefs", prefs());
        assert_eq!(reopened.get().items, vec![0, 1, 2]);
    }

    #[test]
    fn test_reload_picks_up_external_write() {
        let storage = MemoryStorage::new();
        let mut a = Persisted::open(storage.clone(), "prefs", prefs());
        let mut b = Persisted::open(storage.clone(), "prefs", prefs());

        a.write(Prefs {
            name: "from-a".to_string(),
            items: vec![],
        });
        assert_eq!(b.get().name, "default");
        assert!(b.reload());
        assert_eq!(b.get().name, "from-a");

        storage.set("prefs", "{broken").unwrap();
        assert!(!b.reload());
        assert_eq!(b.get().name, "from-a");
    }

    #[test]
    fn test_file_backed_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path());

        let mut store = Persisted::open(storage.clone(), "prefs", prefs());
        store.write(Prefs {
            name: "disk".to_string(),
            items: vec![7],
        });

        let reopened = Persisted::open(storage, "prefs", prefs());
        assert_eq!(reopened.get().items, vec![7]);
        assert_eq!(reopened.key(), "prefs");
    }
}
