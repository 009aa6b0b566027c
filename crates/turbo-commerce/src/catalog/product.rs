//! Product snapshot type.

use crate::catalog::Inventory;
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::{major_units, Money};
use serde::{Deserialize, Serialize};

/// A product as delivered by the catalog API.
///
/// Only the fields the state layer reads are typed. Anything else the API
/// sends is kept in `extra` and written back unchanged, so a wishlist entry
/// is a verbatim snapshot of what the catalog returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Brand name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Current price in the base currency.
    #[serde(with = "major_units")]
    pub price: Money,
    /// Price before markdown, if on sale.
    #[serde(
        default,
        with = "major_units::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<Money>,
    /// Image URLs, primary first.
    #[serde(default)]
    pub images: Vec<String>,
    /// Stock information, when the catalog provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Inventory>,
    /// Untyped remainder of the catalog record.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Product {
    /// Create a product with the required fields.
    ///
    /// `price` must be in [`Currency::BASE`](crate::money::Currency::BASE).
    pub fn new(id: ProductId, name: impl Into<String>, price: Money) -> Result<Self, CommerceError> {
        let product = Self {
            id,
            name: name.into(),
            brand: None,
            price,
            original_price: None,
            images: Vec::new(),
            inventory: None,
            extra: serde_json::Map::new(),
        };
        product.check_price()?;
        Ok(product)
    }

    /// Reject a price that would not survive persistence.
    ///
    /// Prices are stored as bare major-unit numbers and always read back in
    /// the base currency.
    pub fn check_price(&self) -> Result<(), CommerceError> {
        if self.price.currency.is_base() {
            Ok(())
        } else {
            Err(CommerceError::NonBasePrice {
                product_id: self.id.to_string(),
                currency: self.price.currency,
            })
        }
    }

    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn with_original_price(mut self, original_price: Money) -> Self {
        self.original_price = Some(original_price);
        self
    }

    /// Maximum quantity a cart may hold.
    ///
    /// A product without inventory data cannot be added at all.
    pub fn max_available(&self) -> u32 {
        self.inventory
            .as_ref()
            .map(Inventory::max_available)
            .unwrap_or(0)
    }

    /// Check if the product is in stock.
    pub fn is_in_stock(&self) -> bool {
        self.max_available() > 0
    }

    /// Check if on sale (original price above current price).
    pub fn is_on_sale(&self) -> bool {
        self.original_price
            .map(|orig| orig.amount_cents > self.price.amount_cents)
            .unwrap_or(false)
    }

    /// Calculate discount percentage if on sale.
    pub fn discount_percentage(&self) -> Option<f64> {
        if !self.is_on_sale() {
            return None;
        }
        self.original_price.map(|orig| {
            let discount = orig.amount_cents - self.price.amount_cents;
            (discount as f64 / orig.amount_cents as f64) * 100.0
        })
    }
}
