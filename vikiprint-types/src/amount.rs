//! Fixed-point amounts
//!
//! The register exchanges prices, quantities and sums as decimal text with
//! up to nine fractional digits (`10.000000000`). `Amount` keeps them as an
//! integer count of 1e-9 units so nothing is lost going through floats.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Decimal value with nine fractional digits
///
/// # Examples
///
/// ```
/// use vikiprint_types::Amount;
///
/// let price: Amount = "12.5".parse().unwrap();
/// assert_eq!(price.to_string(), "12.500000000");
/// assert_eq!(price, Amount::from_parts(12, 500_000_000).unwrap());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// Number of fractional digits
    pub const SCALE: usize = 9;

    /// Zero
    pub const ZERO: Amount = Amount(0);

    const UNIT: i64 = 1_000_000_000;

    /// Build from a raw count of 1e-9 units
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Build from whole units
    pub fn from_units(units: i64) -> Option<Self> {
        units.checked_mul(Self::UNIT).map(Self)
    }

    /// Build from a whole part and a fractional part given in 1e-9 units
    ///
    /// The sign is taken from `whole`.
    pub fn from_parts(whole: i64, nanos: u32) -> Option<Self> {
        if i64::from(nanos) >= Self::UNIT {
            return None;
        }
        let base = whole.checked_mul(Self::UNIT)?;
        if whole < 0 {
            base.checked_sub(i64::from(nanos)).map(Self)
        } else {
            base.checked_add(i64::from(nanos)).map(Self)
        }
    }

    /// Raw count of 1e-9 units
    pub const fn nanos(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Parse(format!("invalid decimal value: {s:?}"));

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if fraction.len() > Self::SCALE {
            return Err(Error::Parse(format!(
                "too many fractional digits in {s:?} (max {})",
                Self::SCALE
            )));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let mut nanos: i64 = 0;
        for digit in fraction.bytes().chain(std::iter::repeat(b'0')).take(Self::SCALE) {
            nanos = nanos * 10 + i64::from(digit - b'0');
        }

        let value = whole
            .checked_mul(Self::UNIT)
            .and_then(|v| v.checked_add(nanos))
            .ok_or_else(|| Error::Validation(format!("decimal value out of range: {s:?}")))?;

        Ok(Self(if negative { -value } else { value }))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let unit = Self::UNIT as u64;
        write!(f, "{}{}.{:09}", sign, abs / unit, abs % unit)
    }
}
