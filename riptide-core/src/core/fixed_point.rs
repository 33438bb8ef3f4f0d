//! Fixed-point decimal types for prices and quantities
//!
//! `Price` and `Quantity` are signed integers scaled by [`SCALE`] (10^8 ticks
//! per unit). They never allocate and never lose precision beyond the
//! declared truncation at construction time. All arithmetic is checked;
//! overflow is a programming error, not a recoverable condition, so it
//! panics rather than silently wrapping.

use crate::core::errors::ConversionError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Ticks per unit. 10^8, matching the platform-wide fixed-point convention.
pub const SCALE: i64 = 100_000_000;

/// A signed fixed-point value scaled by [`SCALE`].
///
/// `Price` and `Quantity` both wrap this representation; they are kept as
/// distinct newtypes so the two can't be confused at a call site (a price
/// added to a quantity is a type error, not a silent bug).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Ticks(pub i64);

impl Ticks {
    #[inline(always)]
    pub const fn zero() -> Self {
        Self(0)
    }

    #[inline(always)]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    #[inline(always)]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline(always)]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub fn signum(self) -> i64 {
        self.0.signum()
    }

    #[inline(always)]
    pub fn abs(self) -> Self {
        Self(self.0.checked_abs().expect("Ticks::abs overflow"))
    }

    /// Truncates a decimal value toward zero at [`SCALE`] precision.
    pub fn from_decimal(value: Decimal) -> Self {
        let scaled = (value * Decimal::from(SCALE)).trunc();
        let ticks = scaled
            .to_i64()
            .unwrap_or_else(|| panic!("fixed-point value {value} out of i64 range"));
        Self(ticks)
    }

    pub fn from_decimal_checked(value: Decimal) -> Result<Self, ConversionError> {
        let scaled = (value * Decimal::from(SCALE)).trunc();
        scaled
            .to_i64()
            .map(Self)
            .ok_or(ConversionError::OutOfRange { value })
    }

    /// Exact decimal equivalent (no rounding: ticks / SCALE).
    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(SCALE)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Multiplies two fixed-point values, returning a value at the same
    /// scale (i.e. computes `a * b / SCALE`) using an i128 intermediate to
    /// avoid overflow on the product.
    pub fn checked_mul_fp(self, rhs: Self) -> Option<Self> {
        let product = (self.0 as i128) * (rhs.0 as i128);
        let scaled = product / (SCALE as i128);
        i64::try_from(scaled).ok().map(Self)
    }

    /// Divides two fixed-point values, returning a value at the same scale
    /// (i.e. computes `a * SCALE / b`).
    pub fn checked_div_fp(self, rhs: Self) -> Option<Self> {
        if rhs.0 == 0 {
            return None;
        }
        let numerator = (self.0 as i128) * (SCALE as i128);
        let scaled = numerator / (rhs.0 as i128);
        i64::try_from(scaled).ok().map(Self)
    }

    /// Rounds down to the nearest multiple of `step` (toward negative infinity
    /// for negative values is not a supported use case here; callers only
    /// quantize non-negative sizes).
    pub fn round_down_to(self, step: Self) -> Self {
        if step.0 <= 0 {
            return self;
        }
        Self((self.0 / step.0) * step.0)
    }

    /// Rounds up to the nearest multiple of `step`.
    pub fn round_up_to(self, step: Self) -> Self {
        if step.0 <= 0 {
            return self;
        }
        let rem = self.0.rem_euclid(step.0);
        if rem == 0 {
            self
        } else {
            Self(self.0 + (step.0 - rem))
        }
    }
}

impl Add for Ticks {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.checked_add(rhs).expect("Ticks addition overflow")
    }
}

impl Sub for Ticks {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self.checked_sub(rhs).expect("Ticks subtraction overflow")
    }
}

impl Neg for Ticks {
    type Output = Self;
    fn neg(self) -> Self {
        Self(self.0.checked_neg().expect("Ticks negation overflow"))
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

macro_rules! fixed_point_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "Decimal", into = "Decimal")]
        pub struct $name(pub Ticks);

        impl $name {
            #[inline(always)]
            pub const fn zero() -> Self {
                Self(Ticks::zero())
            }

            #[inline(always)]
            pub const fn from_ticks(ticks: i64) -> Self {
                Self(Ticks::from_ticks(ticks))
            }

            #[inline(always)]
            pub const fn raw(self) -> i64 {
                self.0.raw()
            }

            #[inline(always)]
            pub fn is_zero(self) -> bool {
                self.0.is_zero()
            }

            #[inline(always)]
            pub fn signum(self) -> i64 {
                self.0.signum()
            }

            #[inline(always)]
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            pub fn from_decimal(value: Decimal) -> Self {
                Self(Ticks::from_decimal(value))
            }

            pub fn from_decimal_checked(value: Decimal) -> Result<Self, ConversionError> {
                Ticks::from_decimal_checked(value).map(Self)
            }

            pub fn to_decimal(self) -> Decimal {
                self.0.to_decimal()
            }

            pub fn round_down_to(self, step: Self) -> Self {
                Self(self.0.round_down_to(step.0))
            }

            pub fn round_up_to(self, step: Self) -> Self {
                Self(self.0.round_up_to(step.0))
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $name {
            type Output = Self;
            fn neg(self) -> Self {
                Self(-self.0)
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.cmp(&other.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<Decimal> for $name {
            type Error = ConversionError;
            fn try_from(value: Decimal) -> Result<Self, Self::Error> {
                Self::from_decimal_checked(value)
            }
        }

        impl From<$name> for Decimal {
            fn from(value: $name) -> Decimal {
                value.to_decimal()
            }
        }
    };
}

fixed_point_newtype!(Price);
fixed_point_newtype!(Quantity);

impl Price {
    /// Multiplies a price by a quantity, returning a fixed-point product
    /// (i.e. `price * qty`, scaled back down to [`SCALE`]).
    pub fn checked_mul_qty(self, qty: Quantity) -> Option<Ticks> {
        self.0.checked_mul_fp(qty.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round_trip_exact_values() {
        let p = Price::from_decimal(dec!(50000.12345678));
        assert_eq!(p.to_decimal(), dec!(50000.12345678));
    }

    #[test]
    fn truncates_beyond_scale() {
        let p = Price::from_decimal(dec!(1.123456789));
        assert_eq!(p.to_decimal(), dec!(1.12345678));
    }

    #[test]
    fn truncates_toward_zero_for_negative() {
        let q = Quantity::from_decimal(dec!(-1.999999999));
        assert_eq!(q.to_decimal(), dec!(-1.99999999));
    }

    #[test]
    fn addition_and_subtraction() {
        let a = Price::from_decimal(dec!(100));
        let b = Price::from_decimal(dec!(0.5));
        assert_eq!((a + b).to_decimal(), dec!(100.5));
        assert_eq!((a - b).to_decimal(), dec!(99.5));
    }

    #[test]
    fn ordering_is_total() {
        let a = Price::from_decimal(dec!(1));
        let b = Price::from_decimal(dec!(2));
        assert!(a < b);
        assert!(b > a);
    }

    #[test]
    fn mul_and_div_fixed_point() {
        let price = Price::from_decimal(dec!(100));
        let qty = Quantity::from_decimal(dec!(2));
        let value = price.checked_mul_qty(qty).unwrap();
        assert_eq!(value.to_decimal(), dec!(200));
    }

    #[test]
    fn round_to_tick() {
        let tick = Price::from_decimal(dec!(0.01));
        let price = Price::from_decimal(dec!(100.0149));
        assert_eq!(price.round_down_to(tick).to_decimal(), dec!(100.01));
        assert_eq!(price.round_up_to(tick).to_decimal(), dec!(100.02));
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn addition_overflow_panics() {
        let max = Price::from_ticks(i64::MAX);
        let one = Price::from_ticks(1);
        let _ = max + one;
    }
}
