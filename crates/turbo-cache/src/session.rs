//! Active session record stored across two storage tiers.

use serde::{de::DeserializeOwned, Serialize};

use crate::events::StorageWatcher;
use crate::{Cache, CacheError};

/// Key the session record is stored under in either tier.
pub const SESSION_KEY: &str = "user";

/// Where a session record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// "Remember me": survives restarts and is shared between tabs.
    Durable,
    /// Lives only as long as the current session.
    Session,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Durable => "durable",
            Tier::Session => "session",
        }
    }
}

/// Session record manager over a durable and a session-only tier.
///
/// Exactly one tier is authoritative at a time. When both hold a record the
/// durable tier wins. Writes go back to the tier the record was read from;
/// there is no version check, the last writer wins.
///
/// # Example
///
/// ```rust,ignore
/// let storage = SessionStorage::<UserRecord>::new(durable, session);
/// storage.sign_in(&record, true)?;
/// storage.update(|user| user.cart.clear())?;
/// ```
pub struct SessionStorage<T> {
    durable: Cache,
    session: Cache,
    key: String,
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T> Clone for SessionStorage<T> {
    fn clone(&self) -> Self {
        Self {
            durable: self.durable.clone(),
            session: self.session.clone(),
            key: self.key.clone(),
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> SessionStorage<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a manager over the two tiers using [`SESSION_KEY`].
    pub fn new(durable: Cache, session: Cache) -> Self {
        Self {
            durable,
            session,
            key: SESSION_KEY.to_string(),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Handle for one tier.
    pub fn tier(&self, tier: Tier) -> &Cache {
        match tier {
            Tier::Durable => &self.durable,
            Tier::Session => &self.session,
        }
    }

    /// The tier currently holding the record, if any.
    pub fn active_tier(&self) -> Result<Option<Tier>, CacheError> {
        if self.durable.exists(&self.key)? {
            return Ok(Some(Tier::Durable));
        }
        if self.session.exists(&self.key)? {
            return Ok(Some(Tier::Session));
        }
        Ok(None)
    }

    /// Load the active record together with its tier.
    pub fn load(&self) -> Result<Option<(Tier, T)>, CacheError> {
        for tier in [Tier::Durable, Tier::Session] {
            if let Some(record) = self.tier(tier).get::<T>(&self.key)? {
                return Ok(Some((tier, record)));
            }
        }
        Ok(None)
    }

    /// Load the active record.
    pub fn get(&self) -> Result<Option<T>, CacheError> {
        Ok(self.load()?.map(|(_, record)| record))
    }

    /// Apply `f` to a copy of the active record and write it back to the
    /// same tier.
    ///
    /// Returns the updated record, or `None` when no session is active (in
    /// which case nothing is written).
    pub fn update<F>(&self, f: F) -> Result<Option<T>, CacheError>
    where
        F: FnOnce(&mut T),
    {
        let Some((tier, mut record)) = self.load()? else {
            return Ok(None);
        };
        f(&mut record);
        self.tier(tier).set(&self.key, &record)?;
        tracing::trace!(tier = tier.as_str(), key = %self.key, "session record updated");
        Ok(Some(record))
    }

    /// Store `record` as the active session.
    ///
    /// `remember_me` selects the durable tier; the other tier is cleared so
    /// only one stays authoritative.
    pub fn sign_in(&self, record: &T, remember_me: bool) -> Result<Tier, CacheError> {
        let (tier, other) = if remember_me {
            (Tier::Durable, Tier::Session)
        } else {
            (Tier::Session, Tier::Durable)
        };
        self.tier(other).delete(&self.key)?;
        self.tier(tier).set(&self.key, record)?;
        Ok(tier)
    }

    /// Remove the session record from both tiers.
    pub fn sign_out(&self) -> Result<(), CacheError> {
        self.durable.delete(&self.key)?;
        self.session.delete(&self.key)
    }

    /// Watch the durable tier for changes made by other handles.
    ///
    /// The session tier is private to its owner and never changes under it.
    pub fn watch(&self) -> StorageWatcher {
        self.durable.watch()
    }
}
