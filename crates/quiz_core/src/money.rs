//! Exact monetary amounts.
//!
//! Question values grow by fractional increments (e.g. 0.5 RON per question),
//! so amounts are kept as whole hundredths instead of floats. Data files and
//! the persisted record still carry plain decimal numbers.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Largest magnitude accepted from decimal input (in whole units).
const MAX_UNITS: f64 = 1.0e13;

/// Amount of money in hundredths of the currency unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub const fn from_units(units: i64) -> Self {
        Money(units * 100)
    }

    /// Convert a decimal amount, rounding to the nearest hundredth.
    /// Returns `None` for NaN, infinities and absurdly large values.
    pub fn from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() || value.abs() > MAX_UNITS {
            return None;
        }
        Some(Money((value * 100.0).round() as i64))
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_integral(self) -> bool {
        self.0 % 100 == 0
    }

    /// `self * n`, saturating instead of overflowing.
    pub fn times(self, n: usize) -> Self {
        let n = i64::try_from(n).unwrap_or(i64::MAX);
        Money(self.0.saturating_mul(n))
    }

    /// Render with the currency label, e.g. `16.5 RON`.
    pub fn display_with(self, currency: &str) -> String {
        if currency.is_empty() {
            self.to_string()
        } else {
            format!("{} {}", self, currency)
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

/// No decimals when integral, otherwise one decimal rounded half-up on the
/// exact hundredths. A non-integral amount always keeps its decimal, so
/// 9.95 renders as `10.0`, never as `10`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        if abs % 100 == 0 {
            return write!(f, "{}{}", sign, abs / 100);
        }
        let tenths = (abs + 5) / 10;
        write!(f, "{}{}.{}", sign, tenths / 10, tenths % 10)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_integral() {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.to_f64())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_decimal(value)
            .ok_or_else(|| de::Error::custom(format!("invalid monetary amount: {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rules() {
        assert_eq!(Money::from_units(5).to_string(), "5");
        assert_eq!(Money::from_cents(550).to_string(), "5.5");
        assert_eq!(Money::from_cents(1650).to_string(), "16.5");
        assert_eq!(Money::from_cents(525).to_string(), "5.3");
        assert_eq!(Money::from_cents(995).to_string(), "10.0");
        assert_eq!(Money::ZERO.to_string(), "0");
        assert_eq!(Money::from_cents(1650).display_with("RON"), "16.5 RON");
    }

    #[test]
    fn test_rounding_up_to_a_whole_keeps_the_decimal() {
        assert_eq!(Money::from_cents(995).to_string(), "10.0");
        assert_eq!(Money::from_cents(1995).display_with("RON"), "20.0 RON");
        assert_eq!(Money::from_cents(-995).to_string(), "-10.0");
        assert_eq!(Money::from_cents(994).to_string(), "9.9");
        assert_eq!(Money::from_cents(5).to_string(), "0.1");
        assert_eq!(Money::from_cents(1000).to_string(), "10");
    }

    #[test]
    fn test_no_drift_over_many_increments() {
        let step = Money::from_decimal(0.1).unwrap();
        let total: Money = (0..1000).map(|_| step).sum();
        assert_eq!(total, Money::from_units(100));
        assert_eq!(step.times(1000), Money::from_units(100));
    }

    #[test]
    fn test_from_decimal_rejects_non_finite() {
        assert!(Money::from_decimal(f64::NAN).is_none());
        assert!(Money::from_decimal(f64::INFINITY).is_none());
        assert_eq!(Money::from_decimal(0.07), Some(Money::from_cents(7)));
    }

    #[test]
    fn test_serde_as_plain_number() {
        let json = serde_json::to_string(&Money::from_cents(550)).unwrap();
        assert_eq!(json, "5.5");
        let json = serde_json::to_string(&Money::from_units(11)).unwrap();
        assert_eq!(json, "11");

        let parsed: Money = serde_json::from_str("16.5").unwrap();
        assert_eq!(parsed, Money::from_cents(1650));
        let parsed: Money = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, Money::from_units(3));
    }
}
