//! Customer profile and running-balance invariant

use crate::ids::CustomerId;
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shop's customer record.
///
/// `balance` is a cached projection, never the source of truth: the
/// invariant is `balance == sum(ledger entries: DEBIT + OPENING_BALANCE - CREDIT)`
/// for this customer, and only an explicit reconciliation operation in
/// `voice-agent-ledger` is allowed to recompute it from scratch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: Option<String>,
    pub nickname: Option<String>,
    pub landmark: Option<String>,
    pub email: Option<String>,
    /// Positive means the customer owes the shop.
    pub balance: Money,
    pub total_purchases: Money,
    pub visit_count: i64,
    pub last_visit: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            id: CustomerId::new(),
            name,
            phone: None,
            nickname: None,
            landmark: None,
            email: None,
            balance: Money::ZERO,
            total_purchases: Money::ZERO,
            visit_count: 0,
            last_visit: None,
            is_active: true,
        })
    }

    pub fn owes_money(&self) -> bool {
        self.balance.is_positive()
    }
}

/// Validates the 1..120 character bound on a customer name.
pub fn validate_name(name: &str) -> crate::Result<()> {
    let len = name.trim().chars().count();
    if len == 0 || len > 120 {
        return Err(crate::Error::Validation(format!(
            "customer name must be 1..120 characters, got {len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        assert!(Customer::new("").is_err());
    }

    #[test]
    fn rejects_overlong_name() {
        let long = "a".repeat(121);
        assert!(Customer::new(long).is_err());
    }

    #[test]
    fn fresh_customer_has_zero_balance() {
        let c = Customer::new("Ramesh Gupta").unwrap();
        assert!(!c.owes_money());
    }
}
