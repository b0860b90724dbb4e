//! Invoice and invoice-line types

use crate::ids::{CustomerId, InvoiceId, ProductId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether a sale is intra-state (CGST+SGST split) or inter-state (IGST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyType {
    IntraState,
    InterState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Cancelled,
}

/// A single priced line on an invoice. `product_id` is nullable because a
/// product may later be deleted from the catalogue without invalidating
/// historical invoices — `product_name` is denormalised for that reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub invoice_id: InvoiceId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub unit: String,
    pub hsn_code: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub gst_rate: Decimal,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub cess: Money,
    pub subtotal: Money,
    pub total: Money,
}

/// An invoice. `invoice_no` is assigned only at confirm time, by the
/// atomic per-financial-year counter in `voice-agent-ledger`, and is never
/// reused even if the invoice is later cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_no: Option<String>,
    pub customer_id: CustomerId,
    pub date: DateTime<Utc>,
    pub subtotal: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub cess: Money,
    pub total: Money,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub pdf_object_key: Option<String>,
    pub pdf_url: Option<String>,
}

impl Invoice {
    /// Checks the `total = subtotal + cgst + sgst + igst + cess` invariant
    /// to 2-decimal precision.
    pub fn totals_are_consistent(&self) -> bool {
        let expected = self.subtotal + self.cgst + self.sgst + self.igst + self.cess;
        expected == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{CustomerId, InvoiceId};
    use rust_decimal_macros::dec;

    fn sample(total_override: Option<Money>) -> Invoice {
        let subtotal = Money::from_decimal(dec!(100));
        let cgst = Money::from_decimal(dec!(9));
        let sgst = Money::from_decimal(dec!(9));
        let total = total_override.unwrap_or(subtotal + cgst + sgst);
        Invoice {
            id: InvoiceId::new(),
            invoice_no: None,
            customer_id: CustomerId::new(),
            date: Utc::now(),
            subtotal,
            cgst,
            sgst,
            igst: Money::ZERO,
            cess: Money::ZERO,
            total,
            status: InvoiceStatus::Pending,
            notes: None,
            pdf_object_key: None,
            pdf_url: None,
        }
    }

    #[test]
    fn totals_consistent_when_summed_correctly() {
        assert!(sample(None).totals_are_consistent());
    }

    #[test]
    fn detects_inconsistent_total() {
        let bad = sample(Some(Money::from_decimal(dec!(500))));
        assert!(!bad.totals_are_consistent());
    }
}
