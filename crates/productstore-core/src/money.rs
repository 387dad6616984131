//! Prices as whole cents.
//!
//! A price enters the system once, as text such as `"9.99"`, and is kept as
//! an `i64` count of cents from then on. Nothing in the store does floating
//! point arithmetic on a price.
//!
//! ```rust
//! use productstore_core::money::Money;
//!
//! let price: Money = "9.99".parse().unwrap();
//! assert_eq!(price.cents(), 999);
//! assert_eq!(price.to_string(), "$9.99");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// An amount in cents. Serializes as the bare integer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }
}

/// Parses a decimal amount such as `"9.99"`, `"10"` or `"0.5"`.
///
/// ## Rules
/// - Optional leading `-`
/// - At most two fractional digits (`"1.999"` is rejected, never rounded)
/// - No currency symbol, no thousands separator
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (major, minor) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major.is_empty() && minor.is_empty() {
            return Err(invalid("empty amount"));
        }
        if minor.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }
        if !major.chars().chain(minor.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a decimal number"));
        }

        let major: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| invalid("amount too large"))?
        };
        // "0.5" means fifty cents
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| invalid("must be a decimal number"))? * 10,
            _ => minor.parse().map_err(|_| invalid("must be a decimal number"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "${}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(Money::from_cents(999).to_string(), "$9.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(7).to_string(), "$0.07");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::default().to_string(), "$0.00");
    }

    #[test]
    fn test_parse_decimal_amounts() {
        let cents = |s: &str| s.parse::<Money>().unwrap().cents();

        assert_eq!(cents("9.99"), 999);
        assert_eq!(cents("10"), 1000);
        assert_eq!(cents("0.5"), 50);
        assert_eq!(cents(".25"), 25);
        assert_eq!(cents("-1.10"), -110);
        assert_eq!(cents(" 3.00 "), 300);
    }

    #[test]
    fn test_parse_rejects_malformed_amounts() {
        for input in ["", ".", "1.999", "abc", "1,000.00", "$5", "99999999999999999999"] {
            let err = input.parse::<Money>().unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidFormat { ref field, .. } if field == "price"),
                "{input:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(1250)).unwrap();
        assert_eq!(json, "1250");
    }
}
