//! The persisted session record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::cart::CartLineItem;
use crate::catalog::Product;
use crate::ids::UserId;

/// The user record held by session storage.
///
/// Only the fields this layer manages are typed; everything else (name,
/// email, token, ...) round-trips through `extra` untouched.
///
/// Reading is forgiving so one bad value never locks the session: an
/// unusable `id` reads as a guest, and malformed cart or wishlist entries
/// are dropped with a warning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Remote user id. Guests without one are synced locally only.
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<UserId>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub cart: Vec<CartLineItem>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub wishlist: Vec<Product>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionRecord {
    /// A record for a signed-in user with empty cart and wishlist.
    pub fn for_user(id: UserId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// A record with no remote identity.
    pub fn guest() -> Self {
        Self::default()
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<UserId>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(raw) {
        Ok(id) => Ok(Some(id)),
        Err(e) => {
            tracing::warn!(error = %e, "session record has an unusable id, treating as guest");
            Ok(None)
        }
    }
}

fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            tracing::warn!(found = %other, "session record list is not an array, ignoring");
            return Ok(Vec::new());
        }
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(index, error = %e, "dropping malformed session record entry");
                None
            }
        })
        .collect())
}
