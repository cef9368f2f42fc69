//! Arbitrary precision numbers using dashu
//!
//! `Number` is used twice over in metrum: as the magnitude of a quantity and
//! as the exponent of a unit inside a units container. Exponents must hash
//! and compare exactly, so `Number` implements `Eq`, `Ord` and `Hash`.

use dashu_float::DBig;
use dashu_int::IBig;
use dashu_int::ops::BitTest;
use serde::{Deserialize, Serialize, Serializer, Deserializer};
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Error type for number operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("Invalid number format: {0}")]
    ParseError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Domain error: {0}")]
    DomainError(String),

    #[error("Overflow: result too large")]
    Overflow,
}

/// Default precision for calculations (decimal digits)
pub const DEFAULT_PRECISION: u32 = 50;

/// Arbitrary precision decimal number
///
/// Built on dashu-float's DBig. All operations return Results or new
/// Numbers - never panic.
#[derive(Debug, Clone)]
pub struct Number {
    inner: DBig,
}

impl Number {
    // ========== Construction ==========

    /// Ensure a DBig has adequate precision for calculations
    fn with_work_precision(val: DBig) -> DBig {
        val.with_precision(DEFAULT_PRECISION as usize).value()
    }

    /// Create from string representation
    /// Supports: "123", "3.14", "1/3", "1.5e10", "-42"
    pub fn from_str(s: &str) -> Result<Self, NumberError> {
        let s = s.trim();

        // Handle rational format "a/b"
        if s.contains('/') && !s.contains('.') && !s.contains('e') && !s.contains('E') {
            let parts: Vec<&str> = s.split('/').collect();
            if parts.len() == 2 {
                let num: DBig = parts[0].trim().parse()
                    .map_err(|_| NumberError::ParseError(s.to_string()))?;
                let den: DBig = parts[1].trim().parse()
                    .map_err(|_| NumberError::ParseError(s.to_string()))?;

                if den == DBig::ZERO {
                    return Err(NumberError::DivisionByZero);
                }

                let result = Self::with_work_precision(num) / Self::with_work_precision(den);
                return Ok(Self { inner: result });
            }
        }

        // Scientific notation with integer mantissa: "662607015e-42"
        if (s.contains('e') || s.contains('E')) && !s.contains('.') {
            let s_lower = s.to_lowercase();
            let parts: Vec<&str> = s_lower.split('e').collect();
            if parts.len() == 2 {
                let mantissa: IBig = parts[0].parse()
                    .map_err(|_| NumberError::ParseError(s.to_string()))?;
                let exp: i32 = parts[1].parse()
                    .map_err(|_| NumberError::ParseError(s.to_string()))?;

                let result = DBig::from_parts(mantissa, exp as isize);
                return Ok(Self { inner: Self::with_work_precision(result) });
            }
        }

        let inner: DBig = s.parse()
            .map_err(|_| NumberError::ParseError(s.to_string()))?;

        Ok(Self { inner: Self::with_work_precision(inner) })
    }

    /// Create from i64 with working precision
    pub fn from_i64(n: i64) -> Self {
        Self { inner: Self::with_work_precision(DBig::from(n)) }
    }

    /// Exact `mantissa * 10^exponent`, e.g. `from_scientific(254, -4)` is 0.0254
    pub fn from_scientific(mantissa: i64, exponent: i32) -> Self {
        let value = DBig::from_parts(IBig::from(mantissa), exponent as isize);
        Self { inner: Self::with_work_precision(value) }
    }

    /// Create from f64 via its shortest round-trip decimal form
    pub fn from_f64(f: f64) -> Self {
        if f.is_nan() || f.is_infinite() {
            return Self { inner: DBig::ZERO };
        }
        // "1.5e-20" becomes the integer-mantissa form "15e-21"
        let s = format!("{:e}", f);
        let Some((mantissa, exp)) = s.split_once('e') else {
            return Self { inner: DBig::ZERO };
        };
        let (digits, exp) = match mantissa.split_once('.') {
            Some((int, frac)) => (format!("{}{}", int, frac), exp.parse::<i64>().unwrap_or(0) - frac.len() as i64),
            None => (mantissa.to_string(), exp.parse::<i64>().unwrap_or(0)),
        };
        Self::from_str(&format!("{}e{}", digits, exp)).unwrap_or(Self { inner: DBig::ZERO })
    }

    pub fn zero() -> Self {
        Self::from_i64(0)
    }

    pub fn one() -> Self {
        Self::from_i64(1)
    }

    // ========== Predicates ==========

    pub fn is_zero(&self) -> bool {
        self.inner == DBig::ZERO
    }

    pub fn is_one(&self) -> bool {
        self.inner == DBig::ONE
    }

    pub fn is_negative(&self) -> bool {
        self.inner < DBig::ZERO
    }

    pub fn is_integer(&self) -> bool {
        let floor_val = self.inner.clone().floor();
        self.inner == floor_val
    }

    // ========== Basic Arithmetic ==========

    pub fn add(&self, other: &Self) -> Self {
        Self { inner: &self.inner + &other.inner }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self { inner: &self.inner - &other.inner }
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self { inner: &self.inner * &other.inner }
    }

    pub fn neg(&self) -> Self {
        Self { inner: -&self.inner }
    }

    /// Safe division (returns Result, never panics)
    pub fn checked_div(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            Err(NumberError::DivisionByZero)
        } else {
            Ok(Self { inner: &self.inner / &other.inner })
        }
    }

    /// Reciprocal `1 / self`
    pub fn recip(&self) -> Result<Self, NumberError> {
        Self::one().checked_div(self)
    }

    /// Integer power by repeated squaring
    pub fn pow(&self, exp: i32) -> Self {
        if exp == 0 {
            return Self::one();
        }

        let mut result = Self::one();
        let mut base = self.clone();
        let mut remaining = exp.unsigned_abs();
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = result.mul(&base);
            }
            remaining >>= 1;
            if remaining > 0 {
                base = base.mul(&base);
            }
        }

        if exp < 0 {
            result.recip().unwrap_or(Self::zero())
        } else {
            result
        }
    }

    /// Real-valued power: x^y = exp(y * ln(x)), exact for integer exponents
    pub fn pow_real(&self, exp: &Self, precision: u32) -> Result<Self, NumberError> {
        if exp.is_zero() {
            return Ok(Self::one());
        }
        if exp.is_integer() {
            if let Some(e) = exp.to_i64() {
                let e = i32::try_from(e).map_err(|_| NumberError::Overflow)?;
                if self.is_zero() && e < 0 {
                    return Err(NumberError::DivisionByZero);
                }
                return Ok(self.pow(e));
            }
        }
        if self.is_zero() {
            return Ok(Self::zero());
        }
        if self.is_negative() {
            return Err(NumberError::DomainError(
                "fractional power of negative number".to_string()
            ));
        }

        let ln_x = self.inner.clone().with_precision(precision as usize).value().ln();
        let product = &ln_x * &exp.inner;
        Ok(Self { inner: product.exp() })
    }

    // ========== Rounding ==========

    /// Largest integer <= x
    pub fn floor(&self) -> Self {
        Self { inner: self.inner.clone().floor() }
    }

    /// Smallest integer >= x
    pub fn ceil(&self) -> Self {
        Self { inner: self.inner.clone().ceil() }
    }

    /// Integer part, rounding toward zero
    pub fn trunc(&self) -> Self {
        if self.is_negative() { self.ceil() } else { self.floor() }
    }

    // ========== Conversion ==========

    /// Try to convert to i64
    pub fn to_i64(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }

        // DBig stores as significand * 10^exponent
        let (significand, exponent) = self.inner.clone().into_repr().into_parts();
        let sig_i64: i64 = significand.try_into().ok()?;

        if exponent == 0 {
            Some(sig_i64)
        } else if exponent > 0 && exponent <= 18 {
            sig_i64.checked_mul(10_i64.checked_pow(exponent as u32)?)
        } else if exponent < 0 && exponent >= -18 {
            let divisor = 10_i64.checked_pow((-exponent) as u32)?;
            if sig_i64 % divisor == 0 {
                Some(sig_i64 / divisor)
            } else {
                None
            }
        } else {
            self.to_f64().and_then(|f| {
                if f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            })
        }
    }

    /// Convert to f64 (may lose precision)
    pub fn to_f64(&self) -> Option<f64> {
        let (significand, exponent) = self.inner.clone().into_repr().into_parts();

        let sig_f64: f64 = if significand.bit_len() <= 53 {
            match TryInto::<i64>::try_into(significand.clone()) {
                Ok(i) => i as f64,
                Err(_) => {
                    let is_neg = significand < IBig::ZERO;
                    let abs_sig = if is_neg { -significand.clone() } else { significand.clone() };
                    match TryInto::<u64>::try_into(abs_sig) {
                        Ok(u) => if is_neg { -(u as f64) } else { u as f64 },
                        Err(_) => return None,
                    }
                }
            }
        } else {
            // Shift right to fit in 53 bits, compensating in binary
            let extra_bits = significand.bit_len() - 53;
            let shifted = &significand >> extra_bits;
            let shifted_i64: i64 = shifted.try_into().ok()?;
            shifted_i64 as f64 * 2_f64.powi(extra_bits as i32)
        };

        let result = if exponent == 0 {
            sig_f64
        } else if exponent > 0 && exponent <= 308 {
            sig_f64 * 10_f64.powi(exponent as i32)
        } else if exponent < 0 && exponent >= -308 {
            sig_f64 / 10_f64.powi((-exponent) as i32)
        } else {
            return None;
        };

        if result.is_finite() {
            Some(result)
        } else {
            None
        }
    }

    // ========== Display ==========

    /// Shortest faithful rendering: integers without a fraction, everything
    /// else through f64 when representable.
    pub fn as_compact(&self) -> String {
        if self.is_integer() {
            if let Some(i) = self.to_i64() {
                return i.to_string();
            }
        }
        match self.to_f64() {
            Some(f) => format!("{}", f),
            None => format!("{}", self.inner),
        }
    }
}

// ========== Trait Implementations ==========

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_compact())
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Self::from_i64(n)
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Self::from_i64(n as i64)
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Self::from_f64(f)
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner.to_string())
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Number {}

// DBig keeps its representation normalized, so equal values share one f64
// image and therefore one hash.
impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.to_f64() {
            Some(f) => (f + 0.0).to_bits().hash(state),
            None => self.inner.to_string().hash(state),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner.partial_cmp(&other.inner).unwrap_or(std::cmp::Ordering::Equal)
    }
}
