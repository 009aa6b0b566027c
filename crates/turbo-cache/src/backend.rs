//! Storage backends.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::events::{StorageEvent, EVENT_CAPACITY};
use crate::CacheError;

/// Raw byte-oriented key-value storage.
///
/// Implementations must be safe to share between handles; every handle
/// opened on the same backend observes the same data and change events.
pub trait KeyValueStore: Send + Sync {
    /// Get the raw bytes stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store raw bytes under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// List all keys.
    fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Channel that carries change events for this backend.
    fn events(&self) -> &broadcast::Sender<StorageEvent>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key)?.is_some())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, CacheError> {
    mutex
        .lock()
        .map_err(|_| CacheError::StoreError("store lock poisoned".to_string()))
}

/// Volatile in-process store.
///
/// Used for the session-only tier and in tests.
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Mutex::new(BTreeMap::new()),
            events,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        lock(&self.entries)?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }

    fn events(&self) -> &broadcast::Sender<StorageEvent> {
        &self.events
    }
}

/// Durable store persisted as a single JSON document on disk.
///
/// Values are base64-encoded so arbitrary bytes survive the round trip.
/// Every write rewrites the file through a temporary sibling and a rename.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    events: broadcast::Sender<StorageEvent>,
}

impl FileStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        use base64::{engine::general_purpose::STANDARD, Engine};

        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let encoded: BTreeMap<String, String> = if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            };
            encoded
                .into_iter()
                .map(|(key, value)| {
                    STANDARD
                        .decode(value)
                        .map(|bytes| (key.clone(), bytes))
                        .map_err(|e| CacheError::OpenError(format!("corrupt entry {key}: {e}")))
                })
                .collect::<Result<_, _>>()?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            events,
        })
    }

    fn flush(&self, entries: &BTreeMap<String, Vec<u8>>) -> Result<(), CacheError> {
        use base64::{engine::general_purpose::STANDARD, Engine};

        let encoded: BTreeMap<&str, String> = entries
            .iter()
            .map(|(k, v)| (k.as_str(), STANDARD.encode(v)))
            .collect();
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&encoded)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let mut entries = lock(&self.entries)?;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_vec());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = lock(&self.entries)?;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }

    fn events(&self) -> &broadcast::Sender<StorageEvent> {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_set_get_delete() {
        let store = MemoryStore::new();
        store.set("a", b"1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
        assert!(store.exists("a").unwrap());

        store.delete("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert!(!store.exists("a").unwrap());
    }

    #[test]
    fn test_memory_store_keys_sorted() {
        let store = MemoryStore::new();
        store.set("b", b"").unwrap();
        store.set("a", b"").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("currency", br#""NGN""#).unwrap();
            store.set("gone", b"x").unwrap();
            store.delete("gone").unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("currency").unwrap(), Some(br#""NGN""#.to_vec()));
        assert_eq!(store.keys().unwrap(), vec!["currency"]);
    }

    #[test]
    fn test_file_store_failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = dir.path().join("store");
        let path = store_dir.join("store.json");
        let store = FileStore::open(&path).unwrap();
        store.set("kept", b"1").unwrap();

        std::fs::remove_dir_all(&store_dir).unwrap();
        assert!(store.set("lost", b"2").is_err());
        assert!(store.delete("kept").is_err());

        assert_eq!(store.get("lost").unwrap(), None);
        assert_eq!(store.get("kept").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.keys().unwrap(), vec!["kept"]);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"k": "%%%not-base64"}"#).unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(CacheError::OpenError(_))
        ));
    }

    #[test]
    fn test_file_store_empty_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }
}
