//! Fixed-point money type with exactly 2 decimal places.
//!
//! Uses `rust_decimal` internally. Unlike a rounding wrapper, construction is
//! strict: a value that cannot be represented at 2 fraction digits without
//! loss is rejected rather than rounded.

use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

/// A signed monetary value with exactly 2 decimal places.
///
/// Balances and amounts are always non-negative; negative values only appear
/// as debit deltas.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use banking_ledger::Money;
///
/// let amount = Money::from_str("10.5").unwrap();
/// assert_eq!(amount.to_string(), "10.50");
/// assert!(Money::from_str("10.505").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(Decimal::ZERO);

    /// Creates a `Money` from a `Decimal`, failing if it carries more than
    /// 2 significant fraction digits. Trailing zeros are not significant.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        if value.normalize().scale() > Self::SCALE {
            return Err(LedgerError::InvalidAmount {
                input: value.to_string(),
                reason: "more than 2 fraction digits",
            });
        }
        Money::exact(value).ok_or_else(|| LedgerError::InvalidAmount {
            input: value.to_string(),
            reason: "out of range",
        })
    }

    /// Creates a `Money` from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, Self::SCALE))
    }

    /// Parses a transaction amount: exact at 2 places and strictly positive.
    pub fn parse_amount(s: &str) -> Result<Self> {
        Money::from_str(s)?.require_positive()
    }

    /// Returns `self` if strictly positive, `InvalidAmount` otherwise.
    pub fn require_positive(self) -> Result<Self> {
        if self.is_positive() {
            Ok(self)
        } else {
            Err(LedgerError::InvalidAmount {
                input: self.to_string(),
                reason: "amount must be positive",
            })
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Absolute value.
    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Addition that reports overflow instead of panicking. A sum too large
    /// to keep 2 fraction digits counts as overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).and_then(Money::exact)
    }

    /// Subtraction with the same overflow rules as [`Money::checked_add`].
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).and_then(Money::exact)
    }

    /// Rescales to exactly 2 places; `None` when the magnitude leaves no room
    /// for them.
    fn exact(mut value: Decimal) -> Option<Self> {
        value.rescale(Self::SCALE);
        (value.scale() == Self::SCALE).then_some(Money(value))
    }
}

impl FromStr for Money {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed).map_err(|_| LedgerError::InvalidAmount {
            input: trimmed.to_string(),
            reason: "not a decimal number",
        })?;
        Money::from_decimal(decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let mut sum = self.0 + rhs.0;
        sum.rescale(Self::SCALE);
        Money(sum)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        let mut diff = self.0 - rhs.0;
        diff.rescale(Self::SCALE);
        Money(diff)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.2}", self.0))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Money::from_str(&s).map_err(serde::de::Error::custom)
    }
}
