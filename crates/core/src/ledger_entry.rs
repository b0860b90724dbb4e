//! Append-only ledger entries backing the customer balance invariant

use crate::ids::CustomerId;
use crate::money::Money;
use crate::payment::PaymentMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    Debit,
    Credit,
    OpeningBalance,
}

/// One append-only movement against a customer's balance. Never deleted or
/// mutated; a reversal is always a new CREDIT entry referencing the
/// original.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub customer_id: CustomerId,
    pub entry_type: LedgerEntryType,
    /// Always positive; the sign is carried by `entry_type`, not the amount.
    pub amount: Money,
    pub description: String,
    pub reference: Option<String>,
    pub payment_mode: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// The signed delta this entry applies to the running balance.
    pub fn signed_amount(&self) -> Money {
        match self.entry_type {
            LedgerEntryType::Debit | LedgerEntryType::OpeningBalance => self.amount,
            LedgerEntryType::Credit => -self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(t: LedgerEntryType, amount: Decimal) -> LedgerEntry {
        LedgerEntry {
            customer_id: CustomerId::new(),
            entry_type: t,
            amount: Money::from_decimal(amount),
            description: "test".into(),
            reference: None,
            payment_mode: None,
            created_at: Utc::now(),
        }
    }

    use rust_decimal::Decimal;

    #[test]
    fn debit_increases_balance() {
        let e = entry(LedgerEntryType::Debit, dec!(50));
        assert_eq!(e.signed_amount(), Money::from_decimal(dec!(50)));
    }

    #[test]
    fn credit_decreases_balance() {
        let e = entry(LedgerEntryType::Credit, dec!(50));
        assert_eq!(e.signed_amount(), Money::from_decimal(dec!(-50)));
    }
}
