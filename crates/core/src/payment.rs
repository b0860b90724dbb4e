//! Payment records

use crate::ids::{CustomerId, PaymentId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Upi,
    Card,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Recorded,
    Reversed,
}

/// A payment received from a customer against their running balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub received_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(customer_id: CustomerId, amount: Money, method: PaymentMethod) -> crate::Result<Self> {
        if !amount.is_positive() {
            return Err(crate::Error::NonPositiveAmount);
        }
        Ok(Self {
            id: PaymentId::new(),
            customer_id,
            amount,
            method,
            status: PaymentStatus::Recorded,
            received_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_zero_amount() {
        let result = Payment::new(CustomerId::new(), Money::ZERO, PaymentMethod::Cash);
        assert!(result.is_err());
    }

    #[test]
    fn accepts_positive_amount() {
        let amt = Money::from_decimal(dec!(250));
        let p = Payment::new(CustomerId::new(), amt, PaymentMethod::Upi).unwrap();
        assert_eq!(p.status, PaymentStatus::Recorded);
    }
}
