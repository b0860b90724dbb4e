//! GST line-item calculator. Pure, `Decimal`-only arithmetic — no I/O.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use voice_agent_core::invoice::SupplyType;
use voice_agent_core::money::Money;

/// A single line to be taxed, before persistence.
#[derive(Debug, Clone)]
pub struct LineItemInput {
    pub product_name: String,
    pub hsn_code: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub gst_rate: Decimal,
    pub cess_rate: Decimal,
    pub is_gst_exempt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemTax {
    pub subtotal: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub cess: Money,
    pub total_tax: Money,
    pub total: Money,
}

/// Splits tax: CGST+SGST for intra-state, IGST for
/// inter-state, cess always applies on top regardless of supply type.
#[must_use]
pub fn calculate_line_item(input: &LineItemInput, supply_type: SupplyType) -> LineItemTax {
    let subtotal = input.unit_price.checked_mul_qty(input.quantity);

    let (cgst, sgst, igst) = if input.is_gst_exempt || input.gst_rate.is_zero() {
        (Money::ZERO, Money::ZERO, Money::ZERO)
    } else {
        match supply_type {
            SupplyType::IntraState => {
                let half = subtotal.percent_of(input.gst_rate / Decimal::from(2));
                (half, half, Money::ZERO)
            }
            SupplyType::InterState => (Money::ZERO, Money::ZERO, subtotal.percent_of(input.gst_rate)),
        }
    };

    let cess = if input.is_gst_exempt {
        Money::ZERO
    } else {
        subtotal.percent_of(input.cess_rate)
    };

    let total_tax = cgst + sgst + igst + cess;
    let total = subtotal + total_tax;

    LineItemTax { subtotal, cgst, sgst, igst, cess, total_tax, total }
}

/// Running totals across a whole invoice, summed then rounded at each step.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub cess: Money,
    pub grand_total: Money,
}

impl InvoiceTotals {
    #[must_use]
    pub fn add_line(mut self, line: &LineItemTax) -> Self {
        self.subtotal += line.subtotal;
        self.cgst += line.cgst;
        self.sgst += line.sgst;
        self.igst += line.igst;
        self.cess += line.cess;
        self.grand_total = self.subtotal + self.cgst + self.sgst + self.igst + self.cess;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(rate: Decimal, exempt: bool) -> LineItemInput {
        LineItemInput {
            product_name: "chawal".into(),
            hsn_code: Some("1006".into()),
            quantity: dec!(2),
            unit_price: Money::from_decimal(dec!(50)),
            gst_rate: rate,
            cess_rate: Decimal::ZERO,
            is_gst_exempt: exempt,
        }
    }

    #[test]
    fn exempt_items_have_no_tax() {
        let result = calculate_line_item(&line(dec!(5), true), SupplyType::IntraState);
        assert!(result.cgst.is_zero());
        assert_eq!(result.total, result.subtotal);
    }

    #[test]
    fn intra_state_splits_cgst_sgst_evenly() {
        let result = calculate_line_item(&line(dec!(5), false), SupplyType::IntraState);
        assert_eq!(result.subtotal, Money::from_decimal(dec!(100)));
        assert_eq!(result.cgst, Money::from_decimal(dec!(2.5)));
        assert_eq!(result.sgst, Money::from_decimal(dec!(2.5)));
        assert!(result.igst.is_zero());
        assert_eq!(result.total, Money::from_decimal(dec!(105)));
    }

    #[test]
    fn inter_state_uses_igst_only() {
        let result = calculate_line_item(&line(dec!(5), false), SupplyType::InterState);
        assert!(result.cgst.is_zero());
        assert!(result.sgst.is_zero());
        assert_eq!(result.igst, Money::from_decimal(dec!(5)));
    }

    #[test]
    fn aggregation_sums_across_lines() {
        let l1 = calculate_line_item(&line(dec!(5), false), SupplyType::IntraState);
        let l2 = calculate_line_item(&line(dec!(5), false), SupplyType::IntraState);
        let totals = InvoiceTotals::default().add_line(&l1).add_line(&l2);
        assert_eq!(totals.grand_total, Money::from_decimal(dec!(210)));
    }

    #[test]
    fn draft_to_toggle_gst_scenario() {
        // scenario 3: chawal=50 qty2, aata=30 qty5, gstRate=5 both.
        let chawal = LineItemInput {
            product_name: "chawal".into(),
            hsn_code: None,
            quantity: dec!(2),
            unit_price: Money::from_decimal(dec!(50)),
            gst_rate: dec!(5),
            cess_rate: Decimal::ZERO,
            is_gst_exempt: false,
        };
        let aata = LineItemInput {
            product_name: "aata".into(),
            hsn_code: None,
            quantity: dec!(5),
            unit_price: Money::from_decimal(dec!(30)),
            gst_rate: dec!(5),
            cess_rate: Decimal::ZERO,
            is_gst_exempt: false,
        };
        let l1 = calculate_line_item(&chawal, SupplyType::IntraState);
        let l2 = calculate_line_item(&aata, SupplyType::IntraState);
        let totals = InvoiceTotals::default().add_line(&l1).add_line(&l2);
        assert_eq!(totals.subtotal, Money::from_decimal(dec!(250)));
        assert_eq!(totals.grand_total, Money::from_decimal(dec!(262.5)));
        assert_eq!(totals.cgst, Money::from_decimal(dec!(6.25)));
        assert_eq!(totals.sgst, Money::from_decimal(dec!(6.25)));
    }
}
