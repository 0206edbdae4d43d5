// ============================================================================
// Fixed-Point Price
// Exact price representation used for ordering and crossing checks
// ============================================================================

use super::errors::{NumericError, NumericResult};
use super::Quantity;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed-point price.
///
/// Internally stores `value × 10^8` as an i64, which gives a range of
/// roughly ±92 billion with a resolution of 0.00000001. Book sides are keyed
/// by this value, so two prices that print the same always compare equal.
///
/// # Example
/// ```
/// use matching_core::numeric::Price;
///
/// let price: Price = "100.25".parse().unwrap();
/// assert_eq!(price, Price::from_parts(100, 25_000_000).unwrap());
/// assert_eq!(price.to_string(), "100.25");
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct Price(i64);

impl Price {
    /// Number of decimal places carried
    pub const DECIMALS: u32 = 8;

    /// The scale factor (10^DECIMALS)
    pub const SCALE: i64 = 100_000_000;

    pub const ZERO: Self = Self(0);

    pub const MAX: Self = Self(i64::MAX);

    // ========================================================================
    // Construction
    // ========================================================================

    /// Create from the raw scaled representation.
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Create from a whole-unit value.
    ///
    /// # Errors
    /// Returns `Overflow` if the value is too large to represent.
    #[inline]
    pub fn from_integer(value: i64) -> NumericResult<Self> {
        value
            .checked_mul(Self::SCALE)
            .map(Self)
            .ok_or(NumericError::Overflow)
    }

    /// Create from integer and fractional parts, where `fraction` is expressed
    /// in units of 10^-8 and applies in the direction of `integer`'s sign.
    pub fn from_parts(integer: i64, fraction: u64) -> NumericResult<Self> {
        if fraction >= Self::SCALE as u64 {
            return Err(NumericError::InvalidInput);
        }

        let int_scaled = integer
            .checked_mul(Self::SCALE)
            .ok_or(NumericError::Overflow)?;

        let frac_signed = if integer < 0 {
            -(fraction as i64)
        } else {
            fraction as i64
        };

        int_scaled
            .checked_add(frac_signed)
            .map(Self)
            .ok_or(NumericError::Overflow)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub const fn raw_value(self) -> i64 {
        self.0
    }

    /// Integer part, truncated toward zero.
    #[inline]
    pub const fn integer_part(self) -> i64 {
        self.0 / Self::SCALE
    }

    /// Fractional part as a positive count of 10^-8 units.
    #[inline]
    pub const fn fractional_part(self) -> u64 {
        (self.0 % Self::SCALE).unsigned_abs()
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// True when this price sits exactly on a grid of `tick`.
    ///
    /// A non-positive tick never matches.
    pub fn is_multiple_of(self, tick: Price) -> bool {
        tick.0 > 0 && self.0 % tick.0 == 0
    }

    // ========================================================================
    // Arithmetic
    // ========================================================================

    pub fn checked_add(self, rhs: Self) -> NumericResult<Self> {
        self.0.checked_add(rhs.0).map(Self).ok_or(if rhs.0 > 0 {
            NumericError::Overflow
        } else {
            NumericError::Underflow
        })
    }

    pub fn checked_sub(self, rhs: Self) -> NumericResult<Self> {
        self.0.checked_sub(rhs.0).map(Self).ok_or(if rhs.0 < 0 {
            NumericError::Overflow
        } else {
            NumericError::Underflow
        })
    }

    /// Notional value of `quantity` units at this price.
    pub fn checked_notional(self, quantity: Quantity) -> NumericResult<Self> {
        let qty = i64::try_from(quantity).map_err(|_| NumericError::Overflow)?;
        self.0
            .checked_mul(qty)
            .map(Self)
            .ok_or(NumericError::Overflow)
    }

    // ========================================================================
    // rust_decimal conversions (API boundaries)
    // ========================================================================

    /// Convert from `rust_decimal::Decimal`.
    ///
    /// # Errors
    /// - `PrecisionLoss` if the value has more than 8 significant decimals
    /// - `Overflow` if the value does not fit
    pub fn from_decimal(d: Decimal) -> NumericResult<Self> {
        let scaled = d
            .checked_mul(Decimal::from(Self::SCALE))
            .ok_or(NumericError::Overflow)?;

        if !scaled.fract().is_zero() {
            return Err(NumericError::PrecisionLoss);
        }

        scaled.to_i64().map(Self).ok_or(NumericError::Overflow)
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, Self::DECIMALS)
    }
}

// ============================================================================
// Display and Debug
// ============================================================================

impl fmt::Debug for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Price({})", self)
    }
}

impl fmt::Display for Price {
    /// Prints without trailing zeros: `100`, `100.5`, `-0.25`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let int_part = self.integer_part().unsigned_abs();
        let frac_part = self.fractional_part();

        if frac_part == 0 {
            return write!(f, "{}{}", sign, int_part);
        }

        let digits = format!("{:0>width$}", frac_part, width = Self::DECIMALS as usize);
        write!(f, "{}{}.{}", sign, int_part, digits.trim_end_matches('0'))
    }
}

// ============================================================================
// String Parsing
// ============================================================================

impl std::str::FromStr for Price {
    type Err = NumericError;

    /// Parse from plain decimal text, e.g. `"100"`, `"99.5"`, `"-1"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (is_negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (int_str, frac_str) = match unsigned.split_once('.') {
            Some((int_str, frac_str)) => (int_str, frac_str),
            None => (unsigned, ""),
        };

        if int_str.is_empty() && frac_str.is_empty() {
            return Err(NumericError::InvalidInput);
        }
        if !int_str.bytes().all(|b| b.is_ascii_digit())
            || !frac_str.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(NumericError::InvalidInput);
        }

        let int_val: i64 = if int_str.is_empty() {
            0
        } else {
            int_str.parse().map_err(|_| NumericError::Overflow)?
        };

        if frac_str.len() > Self::DECIMALS as usize {
            return Err(NumericError::PrecisionLoss);
        }
        let frac_val: u64 = if frac_str.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac_str, width = Self::DECIMALS as usize);
            padded.parse().map_err(|_| NumericError::InvalidInput)?
        };

        let magnitude = Self::from_parts(int_val, frac_val)?;
        if is_negative {
            magnitude
                .0
                .checked_neg()
                .map(Self)
                .ok_or(NumericError::Underflow)
        } else {
            Ok(magnitude)
        }
    }
}
