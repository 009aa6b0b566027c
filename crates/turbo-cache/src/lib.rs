//! Type-safe Key-Value storage layer for TurboCommerce.
//!
//! Provides a simple, ergonomic API for persisting data with automatic JSON
//! serialization, plus the two-tier session record used by the storefront
//! state layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turbo_cache::{Cache, FileStore};
//!
//! let cache = Cache::open(Arc::new(FileStore::open("state/store.json")?));
//!
//! // Store a value
//! cache.set("currency", "NGN")?;
//!
//! // Retrieve a value
//! let code: Option<String> = cache.get("currency")?;
//!
//! // Another tab on the same backend is told about the write
//! let mut watcher = cache.sibling().watch();
//! ```

mod backend;
mod error;
mod events;
mod kv;
mod session;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use error::CacheError;
pub use events::{Origin, StorageEvent, StorageWatcher};
pub use kv::Cache;
pub use session::{SessionStorage, Tier, SESSION_KEY};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, SessionStorage, StorageWatcher, Tier};
}
