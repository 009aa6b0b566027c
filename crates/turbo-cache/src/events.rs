//! Storage-change signal shared by every handle on one backend.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Capacity of the per-backend change channel.
pub(crate) const EVENT_CAPACITY: usize = 64;

/// Identifies the handle (one "tab") that performed a write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin(String);

impl Origin {
    /// Create an origin from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a random origin.
    pub fn generate() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let bytes: [u8; 9] = rand::thread_rng().gen();
        Self(format!("tab_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Get the origin as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A write or delete happened on the backend.
///
/// `key` and `origin` are `None` when the receiver fell behind and events were
/// dropped; the handler should re-read everything it cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: Option<String>,
    pub origin: Option<Origin>,
}

impl StorageEvent {
    pub(crate) fn write(key: &str, origin: &Origin) -> Self {
        Self {
            key: Some(key.to_string()),
            origin: Some(origin.clone()),
        }
    }

    fn lagged() -> Self {
        Self {
            key: None,
            origin: None,
        }
    }
}

/// Receives storage-change events written by *other* handles.
///
/// Events caused by the watching handle itself are skipped, which mirrors
/// how browsers deliver `storage` events only to other tabs.
pub struct StorageWatcher {
    rx: broadcast::Receiver<StorageEvent>,
    own: Origin,
}

impl StorageWatcher {
    pub(crate) fn new(rx: broadcast::Receiver<StorageEvent>, own: Origin) -> Self {
        Self { rx, own }
    }

    /// Wait for the next foreign change.
    ///
    /// Returns `None` once the backend has been dropped.
    pub async fn changed(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.is_own(&event) => continue,
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "storage watcher lagged");
                    return Some(StorageEvent::lagged());
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`changed`](Self::changed).
    pub fn try_changed(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.is_own(&event) => continue,
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(_)) => return Some(StorageEvent::lagged()),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    fn is_own(&self, event: &StorageEvent) -> bool {
        event.origin.as_ref() == Some(&self.own)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_generate_format() {
        let origin = Origin::generate();
        assert!(origin.as_str().starts_with("tab_"));
        // 9 bytes base64 = 12 chars
        assert_eq!(origin.as_str().len(), 16);
    }

    #[test]
    fn test_origin_generate_uniqueness() {
        assert_ne!(Origin::generate(), Origin::generate());
    }

    #[test]
    fn test_watcher_skips_own_events() {
        let (tx, rx) = broadcast::channel(EVENT_CAPACITY);
        let mine = Origin::new("a");
        let theirs = Origin::new("b");
        let mut watcher = StorageWatcher::new(rx, mine.clone());

        tx.send(StorageEvent::write("user", &mine)).unwrap();
        tx.send(StorageEvent::write("user", &theirs)).unwrap();

        let event = watcher.try_changed().unwrap();
        assert_eq!(event.origin, Some(theirs));
        assert!(watcher.try_changed().is_none());
    }

    #[test]
    fn test_watcher_reports_lag() {
        let (tx, rx) = broadcast::channel(2);
        let mut watcher = StorageWatcher::new(rx, Origin::new("a"));
        let other = Origin::new("b");
        for _ in 0..5 {
            tx.send(StorageEvent::write("user", &other)).unwrap();
        }

        let event = watcher.try_changed().unwrap();
        assert_eq!(event.key, None);
    }
}
