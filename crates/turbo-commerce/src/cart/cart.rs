//! Cart and line item types.

use crate::catalog::{Inventory, Product};
use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::{major_units, Currency, Money};
use serde::{Deserialize, Serialize};

/// A shopping cart: an ordered list of line items, at most one per product.
///
/// `count` and `total` are derived from the lines on every call and never
/// stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from persisted lines.
    ///
    /// Duplicate product ids are folded into the first occurrence so the
    /// one-line-per-product invariant holds even for hand-edited records.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLineItem>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            match cart.items.iter_mut().find(|i| i.id == line.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity)
                }
                None => cart.items.push(line),
            }
        }
        cart
    }

    /// Add `quantity` of `product`.
    ///
    /// Increments the existing line for the product or appends a new one.
    /// Returns the line's new quantity.
    ///
    /// Returns an error, leaving the cart unchanged, if:
    /// - `quantity` is zero
    /// - the product is not priced in the base currency
    /// - the resulting quantity would exceed the product's available stock
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<u32, CommerceError> {
        if quantity == 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        product.check_price()?;

        let current = self.line(&product.id).map(|l| l.quantity).unwrap_or(0);
        let requested = current.saturating_add(quantity);
        let available = product.max_available();
        if requested > available {
            return Err(CommerceError::InsufficientInventory {
                product_id: product.id.to_string(),
                requested,
                available,
            });
        }

        match self.items.iter_mut().find(|i| i.id == product.id) {
            Some(existing) => existing.quantity = requested,
            None => self
                .items
                .push(CartLineItem::from_product(product, requested)),
        }
        Ok(requested)
    }

    /// Set a line's quantity exactly.
    ///
    /// Returns `Ok(false)` without changing anything when `quantity < 1` or
    /// the product is not in the cart. The line's own inventory snapshot,
    /// when present, bounds the new quantity.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<bool, CommerceError> {
        if quantity < 1 {
            return Ok(false);
        }

        let Some(item) = self.items.iter_mut().find(|i| &i.id == product_id) else {
            return Ok(false);
        };

        if let Some(available) = item.max_available() {
            if quantity > available {
                return Err(CommerceError::InsufficientInventory {
                    product_id: product_id.to_string(),
                    requested: quantity,
                    available,
                });
            }
        }

        item.quantity = quantity;
        Ok(true)
    }

    /// Remove the line for a product.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let len_before = self.items.len();
        self.items.retain(|i| &i.id != product_id);
        self.items.len() < len_before
    }

    /// Clear all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total item count (sum of quantities).
    pub fn count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of price × quantity over all lines, in the base currency.
    ///
    /// Every line is priced in the base currency: `add` rejects anything
    /// else and persisted prices always read back as base amounts.
    pub fn total(&self) -> Money {
        let cents = self
            .items
            .iter()
            .map(|line| line.line_total().amount_cents)
            .fold(0_i64, i64::saturating_add);
        Money::new(cents, Currency::BASE)
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Get the line for a product.
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|i| &i.id == product_id)
    }

    /// Check if a product is in the cart.
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.line(product_id).is_some()
    }
}

/// A line in the cart.
///
/// Carries the product fields needed to render the cart without a catalog
/// lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLineItem {
    /// Product this line is for.
    pub id: ProductId,
    /// Product name (denormalized for display).
    pub name: String,
    /// Brand name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Unit price in the base currency.
    #[serde(with = "major_units")]
    pub price: Money,
    /// Quantity, always at least one.
    pub quantity: u32,
    /// Image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    /// Inventory snapshot taken when the line was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Inventory>,
}

impl CartLineItem {
    /// Snapshot `product` into a new line.
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            price: product.price,
            quantity,
            images: product.images.clone(),
            inventory: product.inventory.clone(),
        }
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }

    /// Stock ceiling from the snapshot, if known.
    pub fn max_available(&self) -> Option<u32> {
        self.inventory.as_ref().map(Inventory::max_available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: f64, stock: Option<u32>) -> Product {
        let p = Product::new(
            ProductId::parse(id).unwrap(),
            format!("Product {id}"),
            Money::from_major(price, Currency::USD),
        )
        .unwrap();
        match stock {
            Some(q) => p.with_inventory(Inventory::new(q)),
            None => p,
        }
    }

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    #[test]
    fn test_cart_creation() {
        let cart = Cart::new();
        assert!(cart.is_empty());
        assert_eq!(cart.count(), 0);
        assert_eq!(cart.total(), Money::zero(Currency::USD));
    }

    #[test]
    fn test_add_same_item_increases_quantity() {
        let mut cart = Cart::new();
        let p = product("p1", 10.0, Some(5));

        assert_eq!(cart.add(&p, 1).unwrap(), 1);
        assert_eq!(cart.add(&p, 2).unwrap(), 3);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_add_rejects_over_capacity_and_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        let p = product("p1", 10.0, Some(5));
        cart.add(&p, 4).unwrap();
        let before = cart.clone();

        let err = cart.add(&p, 2).unwrap_err();
        assert!(matches!(
            err,
            CommerceError::InsufficientInventory {
                requested: 6,
                available: 5,
                ..
            }
        ));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_without_inventory_is_rejected() {
        let mut cart = Cart::new();
        let err = cart.add(&product("p1", 10.0, None), 1).unwrap_err();
        assert!(matches!(
            err,
            CommerceError::InsufficientInventory { available: 0, .. }
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_zero_is_invalid() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.add(&product("p1", 10.0, Some(5)), 0),
            Err(CommerceError::InvalidQuantity(0))
        ));
    }

    #[test]
    fn test_repeated_adds_never_exceed_stock() {
        let mut cart = Cart::new();
        let p = product("p1", 1.0, Some(7));
        for _ in 0..20 {
            let _ = cart.add(&p, 3);
            assert!(cart.line(&p.id).map(|l| l.quantity).unwrap_or(0) <= 7);
        }
        assert_eq!(cart.line(&p.id).unwrap().quantity, 6);
    }

    #[test]
    fn test_update_quantity_sets_exactly() {
        let mut cart = Cart::new();
        cart.add(&product("p1", 10.0, Some(5)), 2).unwrap();

        assert!(cart.update_quantity(&id("p1"), 5).unwrap());
        assert_eq!(cart.line(&id("p1")).unwrap().quantity, 5);
        assert!(cart.update_quantity(&id("p1"), 1).unwrap());
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_update_quantity_below_one_is_noop() {
        let mut cart = Cart::new();
        cart.add(&product("p1", 10.0, Some(5)), 2).unwrap();
        let before = cart.clone();

        assert!(!cart.update_quantity(&id("p1"), 0).unwrap());
        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_quantity_missing_line_is_noop() {
        let mut cart = Cart::new();
        assert!(!cart.update_quantity(&id("ghost"), 3).unwrap());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_respects_line_inventory() {
        let mut cart = Cart::new();
        cart.add(&product("p1", 10.0, Some(5)), 1).unwrap();

        assert!(cart.update_quantity(&id("p1"), 6).is_err());
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_update_quantity_unbounded_without_snapshot() {
        let line = CartLineItem {
            id: id("p1"),
            name: "Legacy".into(),
            brand: None,
            price: Money::from_major(2.0, Currency::USD),
            quantity: 1,
            images: Vec::new(),
            inventory: None,
        };
        let mut cart = Cart::from_lines([line]);
        assert!(cart.update_quantity(&id("p1"), 500).unwrap());
        assert_eq!(cart.count(), 500);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(&product("p1", 10.0, Some(5)), 1).unwrap();
        cart.add(&product("p2", 20.0, Some(5)), 1).unwrap();

        assert!(cart.remove(&id("p1")));
        assert!(!cart.remove(&id("p1")));
        assert!(!cart.contains(&id("p1")));
        assert_eq!(cart.len(), 1);

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_tracks_lines() {
        let mut cart = Cart::new();
        cart.add(&product("p1", 10.0, Some(5)), 2).unwrap();
        cart.add(&product("p2", 2.5, Some(5)), 3).unwrap();

        let expected: i64 = cart.lines().iter().map(|l| l.price.amount_cents * l.quantity as i64).sum();
        assert_eq!(cart.total().amount_cents, expected);
        assert_eq!(cart.total(), Money::from_major(27.5, Currency::USD));
        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn test_add_rejects_non_base_price() {
        let mut cart = Cart::new();
        cart.add(&product("p1", 10.0, Some(5)), 1).unwrap();

        let mut naira = product("p2", 0.0, Some(5));
        naira.price = Money::from_major(1000.0, Currency::NGN);
        let err = cart.add(&naira, 2).unwrap_err();

        assert!(matches!(err, CommerceError::NonBasePrice { currency: Currency::NGN, .. }));
        assert_eq!(cart.count(), 1);
        assert_eq!(cart.total(), Money::from_major(10.0, Currency::USD));

        let reloaded: Cart = serde_json::from_str(&serde_json::to_string(&cart).unwrap()).unwrap();
        assert_eq!(reloaded, cart);
    }

    #[test]
    fn test_from_lines_folds_duplicates() {
        let p = product("p1", 10.0, Some(5));
        let cart = Cart::from_lines([
            CartLineItem::from_product(&p, 1),
            CartLineItem::from_product(&p, 2),
        ]);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_persisted_round_trip() {
        let mut cart = Cart::new();
        cart.add(&product("p1", 10.0, Some(5)), 2).unwrap();
        cart.add(&product("p2", 19.99, Some(1)), 1).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        let reloaded: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, cart);
    }

    #[test]
    fn test_parses_persisted_line_shape() {
        let json = serde_json::json!([{
            "id": "p1",
            "name": "Kaftan",
            "brand": "Eko",
            "price": 35,
            "quantity": 2,
            "images": ["k.jpg"],
            "inventory": {"quantity": 4, "variants": [{"sku": "K-S", "quantity": 2, "size": "S"}]}
        }]);
        let cart: Cart = serde_json::from_value(json).unwrap();
        let line = cart.line(&id("p1")).unwrap();
        assert_eq!(line.max_available(), Some(4));
        assert_eq!(cart.total(), Money::from_major(70.0, Currency::USD));
    }
}
