//! Amount type for handling signed monetary values.
//!
//! This module provides the `Amount` type which wraps `Decimal`. On the wire an amount is a JSON
//! number, but money literals held in strings, with or without a dollar sign and commas, are
//! accepted when reading.

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Represents a signed amount of money. Positive values are income and negative values are
/// expenses.
///
/// Equality and ordering are numeric, so `4.5` and `4.50` are the same amount.
///
/// # Examples
///
/// Parsing with a dollar sign and commas:
/// ```
/// # use fin_ledger::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("-$5,000.00").unwrap();
/// let b = Amount::from_str("-5000").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.formatted(), "-5,000.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Rounds `value` to the nearest amount that a JSON number holds exactly, so that an amount
    /// reads back unchanged after it is written.
    fn representable(value: Decimal) -> Result<Self, rust_decimal::Error> {
        let n = value
            .to_string()
            .parse::<f64>()
            .map_err(|e| rust_decimal::Error::ConversionTo(e.to_string()))?;
        // `Display` for f64 prints the shortest string that round-trips, never in exponent form.
        Decimal::from_str(&n.to_string()).map(Amount)
    }

    /// Formats the amount with two decimal places and thousands separators, e.g. `-60,000.00`.
    pub fn formatted(&self) -> String {
        let num = self.0.abs().round_dp(2).to_string();
        let num = num.parse::<f64>().unwrap_or_default();
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{sign}{}", format_num::format_num!(",.2", num))
    }
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        // Remove dollar sign if present: "-$50.00", "$50.00"
        let without_dollar = if let Some(after_minus) = trimmed.strip_prefix('-') {
            match after_minus.strip_prefix('$') {
                Some(after_dollar) => format!("-{after_dollar}"),
                None => trimmed.to_string(),
            }
        } else if let Some(after_dollar) = trimmed.strip_prefix('$') {
            after_dollar.to_string()
        } else {
            trimmed.to_string()
        };

        // Remove commas (thousand separators)
        let without_commas = without_dollar.replace(',', "");

        let value = Decimal::from_str(&without_commas).map_err(AmountError)?;
        Amount::representable(value).map_err(AmountError)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // The decimal string is the exact value, so parsing it yields the nearest f64.
        let n = self
            .0
            .to_string()
            .parse::<f64>()
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_f64(n)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a string holding a money amount")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Amount::representable(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Amount::representable(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        if !v.is_finite() {
            return Err(E::custom(format!("amount must be finite, got {v}")));
        }
        // `Display` for f64 prints the shortest string that round-trips, never in exponent form.
        Decimal::from_str(&v.to_string())
            .map(Amount)
            .map_err(|e| E::custom(format!("amount {v} is out of range: {e}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_with_dollar_sign() {
        let amount = Amount::from_str("$50.00").unwrap();
        assert_eq!(amount.value(), dec("50.00"));
    }

    #[test]
    fn test_parse_negative_with_dollar_sign() {
        let amount = Amount::from_str("-$50.00").unwrap();
        assert_eq!(amount.value(), dec("-50.00"));
    }

    #[test]
    fn test_parse_negative_without_dollar_sign() {
        let amount = Amount::from_str("-50.00").unwrap();
        assert_eq!(amount.value(), dec("-50.00"));
    }

    #[test]
    fn test_parse_empty_string() {
        let amount = Amount::from_str("").unwrap();
        assert_eq!(amount.value(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_whitespace() {
        let amount = Amount::from_str("  $50.00  ").unwrap();
        assert_eq!(amount.value(), dec("50.00"));
    }

    #[test]
    fn test_parse_multiple_commas() {
        let amount = Amount::from_str("$1,234,567.89").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("four dollars").is_err());
    }

    #[test]
    fn test_serialize_as_number() {
        let amount = Amount::from_str("-4.50").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "-4.5");
    }

    #[test]
    fn test_serialize_integer_value() {
        let amount = Amount::from_str("1200").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "1200.0");
    }

    #[test]
    fn test_deserialize_number() {
        let amount: Amount = serde_json::from_str("-4.50").unwrap();
        assert_eq!(amount.value(), dec("-4.5"));
        let amount: Amount = serde_json::from_str("17").unwrap();
        assert_eq!(amount.value(), dec("17"));
        let amount: Amount = serde_json::from_str("0.1").unwrap();
        assert_eq!(amount.value(), dec("0.1"));
    }

    #[test]
    fn test_high_precision_reads_back_unchanged() {
        let exact = dec("12345678901.123456789");
        let from_json: Amount = serde_json::from_str("\"12345678901.123456789\"").unwrap();
        let parsed = Amount::from_str("12345678901.123456789").unwrap();
        assert_eq!(from_json, parsed);
        // More digits than a JSON number keeps are rounded off when the amount is accepted.
        assert_ne!(parsed.value(), exact);
        assert!((parsed.value() - exact).abs() < dec("0.00001"));

        let written = serde_json::to_string(&parsed).unwrap();
        let read_back: Amount = serde_json::from_str(&written).unwrap();
        assert_eq!(read_back, parsed);
    }

    #[test]
    fn test_large_integer_reads_back_unchanged() {
        let amount: Amount = serde_json::from_str("9007199254740993").unwrap();
        let read_back: Amount =
            serde_json::from_str(&serde_json::to_string(&amount).unwrap()).unwrap();
        assert_eq!(read_back, amount);
    }

    #[test]
    fn test_deserialize_string() {
        let amount: Amount = serde_json::from_str("\"-$60,000.00\"").unwrap();
        assert_eq!(amount.value(), dec("-60000"));
    }

    #[test]
    fn test_deserialize_wrong_type() {
        assert!(serde_json::from_str::<Amount>("true").is_err());
        assert!(serde_json::from_str::<Amount>("[1]").is_err());
    }

    #[test]
    fn test_equality_is_numeric() {
        let a1 = Amount::from_str("$50.00").unwrap();
        let a2 = Amount::from_str("50").unwrap();
        assert_eq!(a1, a2);
    }

    #[test]
    fn test_zero_is_not_positive_or_negative() {
        let zero = Amount::from_str("$0.00").unwrap();
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());
        assert!(zero.is_zero());
        let neg_zero = Amount::from_str("-0.00").unwrap();
        assert!(!neg_zero.is_negative());
    }

    #[test]
    fn test_formatted() {
        assert_eq!(Amount::from_str("-60000").unwrap().formatted(), "-60,000.00");
        assert_eq!(Amount::from_str("4.5").unwrap().formatted(), "4.50");
        assert_eq!(Amount::ZERO.formatted(), "0.00");
    }

    #[test]
    fn test_add() {
        let mut total = Amount::ZERO;
        total += Amount::from_str("10.25").unwrap();
        total += Amount::from_str("-4.50").unwrap();
        assert_eq!(total, Amount::from_str("5.75").unwrap());
    }
}
