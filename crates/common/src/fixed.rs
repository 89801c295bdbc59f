//! Exact fixed-point and rational arithmetic.
//!
//! Layout and blending never touch floating point: fractional quantities are
//! carried as exact rationals or fixed-point integers and only converted to
//! whole pixels or channel values at the very end, using round-half-to-even.

use crate::error::{GfxError, GfxResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Divide `num` by `den` (> 0), rounding ties to the even neighbour.
#[inline]
pub fn div_round_half_even(num: u64, den: u64) -> u64 {
    debug_assert!(den > 0, "division by zero");
    let q = num / den;
    let r = num % den;
    match (2 * r).cmp(&den) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + (q & 1),
    }
}

/// Wide variant of [`div_round_half_even`] for accumulated weighted sums.
#[inline]
pub fn div_round_half_even_u128(num: u128, den: u128) -> u128 {
    debug_assert!(den > 0, "division by zero");
    let q = num / den;
    let r = num % den;
    match (2 * r).cmp(&den) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + (q & 1),
    }
}

/// Signed variant of [`div_round_half_even`].
#[inline]
pub fn div_round_half_even_i64(num: i64, den: i64) -> i64 {
    debug_assert!(den > 0, "division by zero");
    let q = num.div_euclid(den);
    let r = num.rem_euclid(den);
    match (2 * r).cmp(&den) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + (q & 1),
    }
}

/// An exact rational number with a positive denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fraction {
    num: i64,
    den: i64,
}

impl Fraction {
    pub const ZERO: Fraction = Fraction { num: 0, den: 1 };
    pub const HALF: Fraction = Fraction { num: 1, den: 2 };
    pub const ONE: Fraction = Fraction { num: 1, den: 1 };

    /// Multiply by an integer and round the exact product to a whole number.
    #[inline]
    pub fn scale_round(&self, value: i64) -> i64 {
        div_round_half_even_i64(self.num * value, self.den)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Layer opacity in fixed point, `raw / OPACITY_SCALE`, always within [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Opacity(u32);

/// Fixed-point denominator for [`Opacity`].
pub const OPACITY_SCALE: u32 = 1 << 16;

impl Opacity {
    pub const TRANSPARENT: Opacity = Opacity(0);
    pub const OPAQUE: Opacity = Opacity(OPACITY_SCALE);

    /// Convert a resolved numeric parameter. NaN and values outside [0, 1]
    /// are rejected.
    pub fn new(value: f64) -> GfxResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(GfxError::invalid_opacity(format!(
                "{value} is outside [0, 1]"
            )));
        }
        // Exact: the product is at most 2^16 and f64 has 53 mantissa bits.
        let raw = (value * f64::from(OPACITY_SCALE)).round_ties_even();
        Ok(Self(raw as u32))
    }

    /// Exact `num / den`.
    pub fn from_ratio(num: u32, den: u32) -> GfxResult<Self> {
        if den == 0 || num > den {
            return Err(GfxError::invalid_opacity(format!(
                "{num}/{den} is outside [0, 1]"
            )));
        }
        let raw = div_round_half_even(u64::from(num) * u64::from(OPACITY_SCALE), u64::from(den));
        Ok(Self(raw as u32))
    }

    #[inline]
    pub fn raw(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.0 == 0
    }

    /// Scale an 8-bit alpha value by this opacity.
    #[inline]
    pub fn apply(&self, alpha: u8) -> u8 {
        div_round_half_even(u64::from(alpha) * u64::from(self.0), u64::from(OPACITY_SCALE)) as u8
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::OPAQUE
    }
}

impl TryFrom<f64> for Opacity {
    type Error = GfxError;

    fn try_from(value: f64) -> GfxResult<Self> {
        Self::new(value)
    }
}

impl From<Opacity> for f64 {
    fn from(opacity: Opacity) -> f64 {
        f64::from(opacity.0) / f64::from(OPACITY_SCALE)
    }
}

/// Parses a plain decimal such as `"0.35"` exactly, without going through
/// binary floating point.
impl FromStr for Opacity {
    type Err = GfxError;

    fn from_str(s: &str) -> GfxResult<Self> {
        let invalid = || GfxError::invalid_opacity(format!("'{s}' is not a decimal in [0, 1]"));
        let s = s.trim();
        let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let int_value: u64 = if int_part.is_empty() {
            0
        } else {
            int_part.trim_start_matches('0').parse().unwrap_or(0)
        };
        if int_part.trim_start_matches('0').len() > 1 {
            return Err(invalid());
        }

        // Trailing zeros carry no value and would only overflow the power of ten.
        let frac_digits = frac_part.trim_end_matches('0');
        if frac_digits.len() > 30 {
            return Err(invalid());
        }
        let frac_value: u128 = if frac_digits.is_empty() {
            0
        } else {
            frac_digits.parse().map_err(|_| invalid())?
        };
        let frac_den = 10u128.pow(frac_digits.len() as u32);

        match (int_value, frac_value) {
            (0, _) => {}
            (1, 0) => return Ok(Self::OPAQUE),
            _ => return Err(invalid()),
        }

        let scaled = frac_value * u128::from(OPACITY_SCALE);
        let q = scaled / frac_den;
        let r = scaled % frac_den;
        let raw = match (2 * r).cmp(&frac_den) {
            std::cmp::Ordering::Less => q,
            std::cmp::Ordering::Greater => q + 1,
            std::cmp::Ordering::Equal => q + (q & 1),
        };
        Ok(Self(raw as u32))
    }
}

impl fmt::Display for Opacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", f64::from(*self))
    }
}
