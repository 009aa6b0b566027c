//! Commerce error types.

use thiserror::Error;

use crate::money::Currency;

/// Errors that can occur in commerce state operations.
///
/// Every rejected operation produces one of these; the commerce state also
/// reports it through its notifier so the UI can show it.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// An identifier was empty or otherwise unusable.
    #[error("Invalid {0} id")]
    InvalidId(&'static str),

    /// Quantity must be at least one.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Requested quantity exceeds the stock on hand.
    #[error("Only {available} items available")]
    InsufficientInventory {
        product_id: String,
        requested: u32,
        available: u32,
    },

    /// A product price quoted in something other than the base currency.
    #[error("Price of {product_id} is in {currency}; catalog prices must be in USD")]
    NonBasePrice {
        product_id: String,
        currency: Currency,
    },

    /// Item not in wishlist.
    #[error("Item not in wishlist: {0}")]
    ItemNotInWishlist(String),

    /// Currency code outside the supported set.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Exchange rate could not be obtained or was unusable.
    #[error("Exchange rate unavailable: {0}")]
    RateUnavailable(String),

    /// Remote request failed.
    #[error("Remote request failed: {0}")]
    Fetch(#[from] turbo_data::FetchError),

    /// Local storage error.
    #[error("Storage error: {0}")]
    CacheError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CommerceError {
    /// Whether retrying the same operation could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CommerceError::Fetch(e) if e.is_transient())
    }
}

impl From<turbo_cache::CacheError> for CommerceError {
    fn from(e: turbo_cache::CacheError) -> Self {
        CommerceError::CacheError(e.to_string())
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}
