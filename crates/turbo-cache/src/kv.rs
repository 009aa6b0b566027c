//! Typed key-value handle with automatic serialization.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::backend::{KeyValueStore, MemoryStore};
use crate::events::{Origin, StorageEvent, StorageWatcher};
use crate::CacheError;

/// Type-safe handle on a [`KeyValueStore`].
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`. Each handle carries an [`Origin`] so
/// that change events can tell its own writes apart from other handles'.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KeyValueStore>,
    origin: Origin,
}

impl Cache {
    /// Open a handle on a shared backend with a fresh origin.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            origin: Origin::generate(),
        }
    }

    /// Open a handle with an explicit origin.
    pub fn with_origin(store: Arc<dyn KeyValueStore>, origin: Origin) -> Self {
        Self { store, origin }
    }

    /// Open a handle on a private in-memory backend.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStore::new()))
    }

    /// Another handle on the same backend, as a second tab would hold.
    pub fn sibling(&self) -> Self {
        Self::open(Arc::clone(&self.store))
    }

    /// This handle's origin.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist.
    ///
    /// ```rust,ignore
    /// let code: Option<String> = cache.get("currency")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value in the cache and signal the change.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, &bytes)?;
        self.notify(key);
        Ok(())
    }

    /// Delete a value from the cache and signal the change.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key)?;
        self.notify(key);
        Ok(())
    }

    /// Check if a key exists in the cache.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.store.exists(key)
    }

    /// Get all keys in the cache.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.store.keys()
    }

    /// Watch for changes made through other handles on this backend.
    pub fn watch(&self) -> StorageWatcher {
        StorageWatcher::new(self.store.events().subscribe(), self.origin.clone())
    }

    fn notify(&self, key: &str) {
        // No subscribers is the common case, not an error.
        let _ = self.store.events().send(StorageEvent::write(key, &self.origin));
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("origin", &self.origin).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        id: String,
        count: u32,
    }

    #[test]
    fn test_typed_round_trip() {
        let cache = Cache::in_memory();
        let record = Record {
            id: "u1".to_string(),
            count: 3,
        };
        cache.set("user", &record).unwrap();

        let loaded: Option<Record> = cache.get("user").unwrap();
        assert_eq!(loaded, Some(record));
    }

    #[test]
    fn test_get_missing_is_none() {
        let cache = Cache::in_memory();
        let loaded: Option<Record> = cache.get("user").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_get_wrong_shape_is_error() {
        let cache = Cache::in_memory();
        cache.set("user", "just a string").unwrap();

        let result: Result<Option<Record>, _> = cache.get("user");
        assert!(matches!(result, Err(CacheError::SerializeError(_))));
    }

    #[test]
    fn test_sibling_sees_writes_and_events() {
        let tab_a = Cache::in_memory();
        let tab_b = tab_a.sibling();
        let mut watcher_a = tab_a.watch();
        let mut watcher_b = tab_b.watch();

        tab_a.set("currency", "NGN").unwrap();

        let code: Option<String> = tab_b.get("currency").unwrap();
        assert_eq!(code.as_deref(), Some("NGN"));

        let event = watcher_b.try_changed().unwrap();
        assert_eq!(event.key.as_deref(), Some("currency"));
        assert_eq!(event.origin.as_ref(), Some(tab_a.origin()));
        assert!(watcher_a.try_changed().is_none());
    }

    #[test]
    fn test_delete_signals_change() {
        let tab_a = Cache::in_memory();
        let tab_b = tab_a.sibling();
        tab_a.set("user", &1).unwrap();
        let mut watcher = tab_b.watch();

        tab_a.delete("user").unwrap();

        assert!(!tab_b.exists("user").unwrap());
        assert!(watcher.try_changed().is_some());
    }
}
