//! Product catalogue entries

use crate::ids::ProductId;
use crate::money::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product or SKU within a shop's catalogue.
///
/// Name is unique case-insensitively within a shop — enforced at the
/// persistence layer, not here. `auto_created` placeholder products
/// (price 0, stock 9999) are produced by the invoice preview flow when
/// a spoken item name cannot be resolved to a known product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit: String,
    pub price: Money,
    pub stock: i64,
    pub hsn_code: Option<String>,
    pub gst_rate: Decimal,
    pub cess_rate: Decimal,
    pub is_gst_exempt: bool,
    pub is_active: bool,
    pub auto_created: bool,
}

/// Stock reserved for products invented on the fly during invoice preview.
pub const PLACEHOLDER_STOCK: i64 = 9999;

impl Product {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(crate::Error::Validation("product name must not be empty".into()));
        }
        Ok(Self {
            id: ProductId::new(),
            name,
            unit: unit.into(),
            price: Money::ZERO,
            stock: 0,
            hsn_code: None,
            gst_rate: Decimal::ZERO,
            cess_rate: Decimal::ZERO,
            is_gst_exempt: false,
            is_active: true,
            auto_created: false,
        })
    }

    /// A placeholder product auto-created when an invoice line item names
    /// something not yet in the catalogue.
    pub fn placeholder(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            unit: unit.into(),
            price: Money::ZERO,
            stock: PLACEHOLDER_STOCK,
            hsn_code: None,
            gst_rate: Decimal::ZERO,
            cess_rate: Decimal::ZERO,
            is_gst_exempt: false,
            is_active: true,
            auto_created: true,
        }
    }

    pub fn has_sufficient_stock(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_has_reserved_stock_and_zero_price() {
        let p = Product::placeholder("kuch_nayi_cheez", "piece");
        assert_eq!(p.stock, PLACEHOLDER_STOCK);
        assert!(p.price.is_zero());
        assert!(p.auto_created);
    }

    #[test]
    fn rejects_empty_name() {
        assert!(Product::new("", "piece").is_err());
    }
}
