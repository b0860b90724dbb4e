//! Decimal currency type
//!
//! Every field that represents rupees, GST, or a balance goes through `Money`.
//! Never use `f64` for currency — floating point cannot represent 2-decimal-place
//! rupee amounts exactly, and the ledger invariants in must hold to
//! the paisa. Grounded in the same choice made by `itretail_automation`,
//! `massehanto-accounting-system`, and `zavora-ai-zavora-erp` in the retrieval
//! pack, all of which pick `rust_decimal` for retail/ledger money.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// A monetary amount, always kept at 2 decimal places.
///
/// Serialises as a quoted decimal string on the wire, never as a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn from_decimal(d: Decimal) -> Self {
        Self(round2(d))
    }

    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn checked_mul_qty(&self, qty: Decimal) -> Money {
        Money::from_decimal(self.0 * qty)
    }

    pub fn percent_of(&self, pct: Decimal) -> Money {
        Money::from_decimal(self.0 * pct / Decimal::from(100))
    }
}

/// 2-decimal-place rounding used throughout GST and ledger arithmetic.
pub fn round2(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Money::from_decimal)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Self) -> Self::Output {
        Money::from_decimal(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Self) -> Self::Output {
        Money::from_decimal(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Self::Output {
        Money::from_decimal(-self.0)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = StringOrNumber::deserialize(deserializer)?;
        let decimal = match raw {
            StringOrNumber::String(s) => {
                Decimal::from_str(&s).map_err(serde::de::Error::custom)?
            }
            StringOrNumber::Number(n) => {
                Decimal::try_from(n).map_err(serde::de::Error::custom)?
            }
        };
        Ok(Money::from_decimal(decimal))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_to_two_places() {
        let m = Money::from_decimal(dec!(10.005));
        assert_eq!(m.to_string(), "10.00");
    }

    #[test]
    fn arithmetic_stays_rounded() {
        // Each operand rounds to 2dp at construction (banker's rounding: both
        // 10.125 and 0.005 are exact midpoints, rounding to the even digit),
        // so the sum is exact with no further rounding ambiguity.
        let a = Money::from_decimal(dec!(10.125));
        let b = Money::from_decimal(dec!(0.005));
        assert_eq!(a.to_string(), "10.12");
        assert_eq!(b.to_string(), "0.00");
        assert_eq!((a + b).to_string(), "10.12");
    }

    #[test]
    fn serialises_as_quoted_string() {
        let m = Money::from_decimal(dec!(250));
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"250.00\"");
    }

    #[test]
    fn deserialises_from_string() {
        let m: Money = serde_json::from_str("\"42.50\"").unwrap();
        assert_eq!(m.to_string(), "42.50");
    }
}
