//! Exact decimal numbers.
//!
//! Schema examples, rule thresholds and document literals are compared as
//! exact decimals, never as floats: `1.20 == 1.2000` and `-0.0 == 0`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Exponents beyond this are displayed in scientific notation.
const PLAIN_DISPLAY_LIMIT: u64 = 21;

/// A decimal number `mantissa * 10^exponent`, kept normalized.
///
/// The mantissa never ends with a zero digit, and zero is always `0e0`, so
/// structural equality is numeric equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number {
    mantissa: BigInt,
    exponent: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid number {0:?}")]
pub struct NumberError(String);

impl Number {
    pub fn new(mantissa: BigInt, exponent: i64) -> Self {
        if mantissa.is_zero() {
            return Self::zero();
        }
        let ten = BigInt::from(10);
        let mut mantissa = mantissa;
        let mut exponent = exponent;
        while (&mantissa % &ten).is_zero() {
            mantissa /= &ten;
            exponent += 1;
        }
        Self { mantissa, exponent }
    }

    pub fn zero() -> Self {
        Self {
            mantissa: BigInt::zero(),
            exponent: 0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    pub fn is_integer(&self) -> bool {
        self.exponent >= 0
    }

    /// Number of digits after the decimal point in the normalized form.
    pub fn fraction_digits(&self) -> u64 {
        if self.exponent < 0 {
            self.exponent.unsigned_abs()
        } else {
            0
        }
    }

    pub fn to_u64(&self) -> Option<u64> {
        if !self.is_integer() || self.exponent > 20 {
            return None;
        }
        (&self.mantissa * pow10(self.exponent.unsigned_abs())).to_u64()
    }

    /// Smallest integer not below this number.
    pub fn ceil(&self) -> Number {
        self.round_toward(true)
    }

    /// Largest integer not above this number.
    pub fn floor(&self) -> Number {
        self.round_toward(false)
    }

    pub fn add_integer(&self, delta: i64) -> Number {
        if self.exponent >= 0 {
            let scaled = &self.mantissa * pow10(self.exponent.unsigned_abs());
            return Number::new(scaled + delta, 0);
        }
        let shift = pow10(self.exponent.unsigned_abs());
        Number::new(&self.mantissa + BigInt::from(delta) * shift, self.exponent)
    }

    fn round_toward(&self, up: bool) -> Number {
        if self.is_integer() {
            return self.clone();
        }
        let divisor = pow10(self.exponent.unsigned_abs());
        // BigInt division truncates toward zero.
        let quotient = &self.mantissa / &divisor;
        let remainder = &self.mantissa % &divisor;
        let adjusted = match (up, remainder.is_positive(), remainder.is_negative()) {
            (true, true, _) => quotient + 1,
            (false, _, true) => quotient - 1,
            _ => quotient,
        };
        Number::new(adjusted, 0)
    }

    fn digit_count(&self) -> i64 {
        self.mantissa.magnitude().to_string().len() as i64
    }

    fn cmp_magnitude(&self, other: &Number) -> Ordering {
        let scale_self = self.digit_count() + self.exponent;
        let scale_other = other.digit_count() + other.exponent;
        if scale_self != scale_other {
            return scale_self.cmp(&scale_other);
        }
        let common = self.exponent.min(other.exponent);
        let a = self.mantissa.magnitude() * pow10((self.exponent - common).unsigned_abs()).magnitude();
        let b = other.mantissa.magnitude() * pow10((other.exponent - common).unsigned_abs()).magnitude();
        a.cmp(&b)
    }
}

fn pow10(exponent: u64) -> BigInt {
    let mut result = BigInt::one();
    let ten = BigInt::from(10);
    for _ in 0..exponent {
        result *= &ten;
    }
    result
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        let sign = self.mantissa.sign().cmp(&other.mantissa.sign());
        if sign != Ordering::Equal || self.is_zero() {
            return sign;
        }
        let magnitude = self.cmp_magnitude(other);
        if self.is_negative() {
            magnitude.reverse()
        } else {
            magnitude
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Number {
    type Err = NumberError;

    /// Parses JSON number syntax.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let error = || NumberError(text.to_string());
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (significand, exponent) = match unsigned.find(['e', 'E']) {
            Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
            None => (unsigned, None),
        };
        let (int, frac) = match significand.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (significand, ""),
        };
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if int.is_empty()
            || !all_digits(int)
            || !all_digits(frac)
            || (significand.contains('.') && frac.is_empty())
            || (int.len() > 1 && int.starts_with('0'))
        {
            return Err(error());
        }
        let exponent: i64 = match exponent {
            Some(exp) => {
                let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
                if digits.is_empty() || !all_digits(digits) {
                    return Err(error());
                }
                exp.trim_start_matches('+').parse().map_err(|_| error())?
            }
            None => 0,
        };
        let digits = format!("{int}{frac}");
        let mut mantissa = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(error)?;
        if negative {
            mantissa = -mantissa;
        }
        let exponent = exponent
            .checked_sub(frac.len() as i64)
            .ok_or_else(error)?;
        Ok(Number::new(mantissa, exponent))
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Number::new(BigInt::from(value), 0)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::new(BigInt::from(value), 0)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let digits = self.mantissa.magnitude().to_string();
        if self.exponent >= 0 {
            if self.exponent.unsigned_abs() >= PLAIN_DISPLAY_LIMIT {
                return write!(f, "{sign}{digits}e{}", self.exponent);
            }
            let zeros = "0".repeat(self.exponent.unsigned_abs() as usize);
            return write!(f, "{sign}{digits}{zeros}");
        }
        let fraction = self.exponent.unsigned_abs() as usize;
        if fraction > digits.len() + PLAIN_DISPLAY_LIMIT as usize {
            return write!(f, "{sign}{digits}e{}", self.exponent);
        }
        if digits.len() <= fraction {
            let zeros = "0".repeat(fraction - digits.len());
            write!(f, "{sign}0.{zeros}{digits}")
        } else {
            let (int, frac) = digits.split_at(digits.len() - fraction);
            write!(f, "{sign}{int}.{frac}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(text: &str) -> Number {
        text.parse().unwrap()
    }

    #[test]
    fn test_normalized_equality() {
        assert_eq!(n("1.20"), n("1.2000"));
        assert_eq!(n("-0.0"), n("0"));
        assert_eq!(n("1e2"), n("100"));
        assert_eq!(n("12.5E-1"), n("1.25"));
        assert_ne!(n("1.2"), n("1.21"));
    }

    #[test]
    fn test_ordering() {
        let mut values = vec![n("10"), n("-1.5"), n("0"), n("9.99"), n("-20"), n("1e1"), n("0.001")];
        values.sort();
        let sorted: Vec<String> = values.iter().map(ToString::to_string).collect();
        assert_eq!(sorted, vec!["-20", "-1.5", "0", "0.001", "9.99", "10", "10"]);
        assert!(n("1e400") > n("99999"));
        assert!(n("-1e400") < n("-99999"));
    }

    #[test]
    fn test_fraction_digits() {
        assert_eq!(n("1.250").fraction_digits(), 2);
        assert_eq!(n("100").fraction_digits(), 0);
        assert!(n("2.0").is_integer());
    }

    #[test]
    fn test_rounding() {
        assert_eq!(n("1.2").ceil(), n("2"));
        assert_eq!(n("-1.2").ceil(), n("-1"));
        assert_eq!(n("1.2").floor(), n("1"));
        assert_eq!(n("-1.2").floor(), n("-2"));
        assert_eq!(n("0.5").add_integer(1), n("1.5"));
    }

    #[test]
    fn test_display() {
        assert_eq!(n("0.050").to_string(), "0.05");
        assert_eq!(n("-12.5e1").to_string(), "-125");
        assert_eq!(n("1e30").to_string(), "1e30");
    }

    #[test]
    fn test_rejects_malformed() {
        for text in ["", "-", "1.", ".5", "01", "1e", "1e+", "+1", "1.2.3", "abc"] {
            assert!(text.parse::<Number>().is_err(), "{text:?}");
        }
    }
}
