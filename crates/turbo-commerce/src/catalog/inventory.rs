//! Inventory descriptors carried on products and cart lines.

use serde::{Deserialize, Serialize};

/// Stock information for a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Inventory {
    /// Total quantity in stock.
    pub quantity: u32,
    /// Per-variant stock, keyed by SKU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<VariantStock>>,
}

impl Inventory {
    /// Create an inventory with no variant breakdown.
    pub fn new(quantity: u32) -> Self {
        Self {
            quantity,
            variants: None,
        }
    }

    /// Maximum quantity of the product a single cart may hold.
    pub fn max_available(&self) -> u32 {
        self.quantity
    }

    /// Variants that still have stock.
    pub fn in_stock_variants(&self) -> impl Iterator<Item = &VariantStock> {
        self.variants
            .iter()
            .flatten()
            .filter(|v| v.stock > 0)
    }
}

/// Stock for one SKU of a product.
///
/// The catalog writes the count as either `stock` or `quantity`; both are
/// accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VariantStock {
    pub sku: String,
    #[serde(alias = "quantity")]
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_code: Option<String>,
}

impl VariantStock {
    /// Human-readable label such as "M / Red".
    pub fn label(&self) -> String {
        [self.size.as_deref(), self.color.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_available_is_quantity() {
        assert_eq!(Inventory::new(10).max_available(), 10);
        assert_eq!(Inventory::new(0).max_available(), 0);
    }

    #[test]
    fn test_variant_accepts_stock_or_quantity() {
        let inv: Inventory = serde_json::from_str(
            r##"{"quantity": 7, "variants": [
                {"sku": "TS-M-RED", "stock": 4, "size": "M", "color": "Red", "colorCode": "#f00"},
                {"sku": "TS-L-RED", "quantity": 0, "size": "L"}
            ]}"##,
        )
        .unwrap();

        let in_stock: Vec<_> = inv.in_stock_variants().collect();
        assert_eq!(in_stock.len(), 1);
        assert_eq!(in_stock[0].sku, "TS-M-RED");
        assert_eq!(in_stock[0].stock, 4);
        assert_eq!(in_stock[0].color_code.as_deref(), Some("#f00"));
        assert_eq!(in_stock[0].label(), "M / Red");

        let variants = inv.variants.as_ref().unwrap();
        assert_eq!(variants[1].stock, 0);
        assert_eq!(variants[1].label(), "L");
    }

    #[test]
    fn test_no_variants_serializes_without_field() {
        let json = serde_json::to_value(Inventory::new(2)).unwrap();
        assert_eq!(json, serde_json::json!({"quantity": 2}));
    }
}
