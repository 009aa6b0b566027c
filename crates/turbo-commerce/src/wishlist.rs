//! Wishlist of saved product snapshots.

use crate::catalog::Product;
use crate::error::CommerceError;
use crate::ids::ProductId;
use serde::{Deserialize, Serialize};

/// Saved products, one entry per product id, in the order they were saved.
///
/// Entries are full product snapshots taken at save time; they are not
/// refreshed from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct Wishlist {
    items: Vec<Product>,
}

impl Wishlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a wishlist from persisted entries, keeping the first of any
    /// duplicate ids.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut wishlist = Self::new();
        for product in products {
            if !wishlist.contains(&product.id) {
                wishlist.items.push(product);
            }
        }
        wishlist
    }

    /// Remove the product if saved, otherwise save a snapshot of it.
    ///
    /// Returns `true` when the product is in the wishlist afterwards. Saving
    /// a product not priced in the base currency is rejected; unsaving never
    /// fails.
    pub fn toggle(&mut self, product: &Product) -> Result<bool, CommerceError> {
        if self.remove(&product.id) {
            return Ok(false);
        }
        product.check_price()?;
        self.items.push(product.clone());
        Ok(true)
    }

    /// Remove a saved product. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let len_before = self.items.len();
        self.items.retain(|p| &p.id != product_id);
        self.items.len() < len_before
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|p| &p.id == product_id)
    }

    pub fn get(&self, product_id: &ProductId) -> Option<&Product> {
        self.items.iter().find(|p| &p.id == product_id)
    }

    /// Number of saved products.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Saved products in insertion order.
    pub fn items(&self) -> &[Product] {
        &self.items
    }
}
