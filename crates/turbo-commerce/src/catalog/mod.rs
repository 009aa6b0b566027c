//! Product catalog types as seen by the session state layer.

mod inventory;
mod product;

pub use inventory::{Inventory, VariantStock};
pub use product::Product;
