// Warn about missing docs, but not for item declared with `#[cfg(test)]`.
#![cfg_attr(not(test), warn(missing_docs))]

//! Binary fixed-point arithmetic.
//!
//! This crate provides the [FixedPoint] type, a signed binary fixed-point
//! number whose range (integer bits) and resolution (negated fraction bits)
//! are supplied as const generic parameters, along with a rounding mode and
//! an overflow mode supplied as marker types.  The [fixed_point] macro picks
//! the smallest storage that can hold a format: a native integer up to 128
//! bits, and [Extended] storage beyond that, so that formats with thousands
//! of fraction bits work the same way as 8-bit ones.
//!
//! ```
//! use feldera_binfxp::{fixed_point, NearestEven};
//!
//! type Q = fixed_point!(15, -16, NearestEven);
//! let a = Q::try_from(8.375).unwrap();
//! let b = Q::try_from(64.125).unwrap();
//! assert_eq!(a + b, Q::try_from(72.5).unwrap());
//! assert_eq!((a * b).to_string(), "537.046875");
//! assert_eq!(Q::STORAGE_BITS, 32);
//! ```
//!
//! Arithmetic is exact before rounding: products and shifted dividends are
//! computed at double width, then rounded once with the type's [RoundMode]
//! and narrowed with its [OverflowMode].  Elementary and transcendental
//! functions (square root, trigonometric, hyperbolic, exponential and
//! logarithmic functions, Bessel functions) are computed at extra precision
//! with arbitrary-precision integers and rounded into the type the same way.
//!
//! # Features
//!
//! The following `cargo` features are provided:
//!
//! * `serde`: Implements [serde] traits for serializing and deserializing
//!   [FixedPoint] as an exact decimal number.
//!
//! [serde]: https://serde.rs/

use std::{cmp::Ordering, io::Write, num::IntErrorKind};

use num_bigint::{BigInt, BigUint};
use smallvec::{Array, SmallVec};
use thiserror::Error as ThisError;

mod constants;
mod extended;
mod fixed;
mod math;
mod overflow;
mod rounding;
mod storage;
mod u256;

#[cfg(feature = "serde")]
mod serde_impl;

pub use constants::Constant;
pub use extended::Extended;
pub use fixed::FixedPoint;
pub use overflow::{Impossible, Modulo, Overflow, OverflowMode, Saturate, Throw, Undefined};
pub use rounding::{
    Fastest, NearestAway, NearestEven, NearestOdd, Remainder, RoundMode, Rounding,
    TowardNegInfinity, TowardPosInfinity, TowardZero,
};
pub use storage::{
    all_bits, storage_bits, storage_class, Repr, SelectStorage, Storage, Unbounded,
};

/// Names the [FixedPoint] type with the given range and resolution, and
/// optionally rounding and overflow modes, using the smallest storage that
/// holds it.
///
/// ```
/// use feldera_binfxp::{fixed_point, Extended, FixedPoint, NearestEven, Saturate};
///
/// // 1 sign bit + 2 integer bits + 5 fraction bits fit in `i8`.
/// type Small = fixed_point!(2, -5);
/// assert_eq!(Small::STORAGE_BITS, 8);
///
/// // 1 + 14 + 114 = 129 bits need extended storage, in 32-bit limbs.
/// type Wide = fixed_point!(14, -114, NearestEven, Saturate);
/// assert_eq!(Wide::STORAGE_BITS, 160);
///
/// let _: FixedPoint<Extended<160>, 14, { -114 }, NearestEven, Saturate> = Wide::default();
/// ```
#[macro_export]
macro_rules! fixed_point {
    ($range:expr, $resolution:expr $(,)?) => {
        $crate::fixed_point!($range, $resolution, $crate::Fastest, $crate::Undefined)
    };
    ($range:expr, $resolution:expr, $round:ty $(,)?) => {
        $crate::fixed_point!($range, $resolution, $round, $crate::Undefined)
    };
    ($range:expr, $resolution:expr, $round:ty, $overflow:ty $(,)?) => {
        $crate::FixedPoint<
            <$crate::Storage<{ $crate::storage_class($range, $resolution) }> as $crate::SelectStorage<
                { $crate::storage_bits($range, $resolution) },
            >>::Repr,
            { $range },
            { $resolution },
            $round,
            $overflow,
        >
    };
}

/// Error returned by fallible arithmetic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ArithmeticError {
    /// The result does not fit in the type's range.
    #[error("result out of range")]
    Overflow,

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// An argument is outside the function's domain, such as the square root
    /// of a negative number, or a pole, such as the logarithm of zero.
    #[error("argument outside the function's domain")]
    Domain,
}

/// Error that can be returned when parsing [FixedPoint].
#[derive(Copy, Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ParseDecimalError {
    /// Invalid syntax.
    #[error("invalid decimal syntax")]
    SyntaxError,

    /// Out of valid range.
    ///
    /// Underflow is rounded to zero, so this error is only returned when the
    /// absolute value exceeds the type's range.
    #[error("decimal value out of range")]
    OutOfRange,
}

/// Returns the decimal digits of `magnitude / 2**s`, which has exactly `s`
/// digits after the decimal point.  The result has at least `s + 1` digits.
fn decimal_digits(magnitude: &BigUint, s: u32) -> Result<SmallVec<[u8; 64]>, std::fmt::Error> {
    let integer = magnitude >> s;
    let fraction = (magnitude - (&integer << s)) * BigUint::from(5u32).pow(s);
    let mut buf = SmallVec::new();
    write!(&mut buf, "{integer}{fraction:0width$}", width = s as usize).map_err(|_| std::fmt::Error)?;
    Ok(buf)
}

fn debug_decimal(
    negative: bool,
    mut buf: SmallVec<[u8; 64]>,
    s: usize,
    f: &mut std::fmt::Formatter,
) -> std::fmt::Result {
    let d = buf.len() - s;
    while buf.len() > d && buf.ends_with(b"0") {
        buf.pop();
    }
    // SAFETY: `buf` contains only ASCII characters.
    let s = unsafe { str::from_utf8_unchecked(&buf) };
    let (integer, fraction) = s.split_at(d);
    let sign = if negative { "-" } else { "" };
    write!(f, "{sign}{integer}")?;
    if !fraction.is_empty() {
        write!(f, ".{fraction}")?;
    }
    Ok(())
}

fn display_decimal(
    negative: bool,
    mut buf: SmallVec<[u8; 64]>,
    s: usize,
    f: &mut std::fmt::Formatter,
) -> std::fmt::Result {
    debug_assert!(buf.len() > s);
    let decimals = if let Some(precision) = f.precision() {
        match precision.cmp(&s) {
            Ordering::Less => {
                let new_len = buf.len() - (s - precision);
                let mut discard = buf[new_len..].iter();
                enum Round {
                    Up,
                    Down,
                    Even,
                }
                impl Round {
                    fn round<A>(&self, s: &mut SmallVec<A>)
                    where
                        A: Array<Item = u8>,
                    {
                        let round_up = match self {
                            Round::Down => false,
                            Round::Up => true,
                            Round::Even => s.last().is_some_and(|digit| digit % 2 == 1),
                        };
                        if round_up {
                            let mut nines = 0;
                            let c = loop {
                                match s.pop() {
                                    Some(b'9') => nines += 1,
                                    Some(c) => break c,
                                    None => break b'0',
                                }
                            };
                            s.push(c + 1);
                            for _ in 0..nines {
                                s.push(b'0');
                            }
                        }
                    }
                }
                let rounding = match discard.next() {
                    Some(b'5') => loop {
                        match discard.next() {
                            Some(b'0') => (),
                            Some(_) => break Round::Up,
                            None => break Round::Even,
                        }
                    },
                    Some(b'6'..=b'9') => Round::Up,
                    _ => Round::Down,
                };
                buf.truncate(new_len);
                rounding.round(&mut buf);
            }
            Ordering::Equal => (),
            Ordering::Greater => {
                for _ in s..precision {
                    buf.push(b'0');
                }
            }
        }
        precision
    } else {
        let mut decimals = s;
        while decimals > 0 && buf.ends_with(b"0") {
            buf.pop();
            decimals -= 1;
        }
        decimals
    };
    if decimals > 0 {
        buf.insert(buf.len() - decimals, b'.');
    }

    // SAFETY: `buf` contains only ASCII characters.
    f.pad_integral(!negative, "", unsafe { str::from_utf8_unchecked(&buf) })
}

/// Parses decimal string `s` into `(sig,exp)`, representing `sig * 10**exp`.
fn parse_decimal(s: &str) -> Result<(BigInt, i32), ParseDecimalError> {
    // Accumulate digits into `digits`.  Adjust `exponent` such that the
    // parsed value is `digits * 10**exponent`.
    let mut digits = SmallVec::<[u8; 64]>::new();
    let mut exponent: i32 = 0;

    let mut saw_dot = false;

    let mut sign = None;
    enum Sign {
        Positive,
        Negative,
    }

    let is_zero = |digits: &[u8]| digits.iter().all(|&d| d == b'0');

    let mut iter = s.chars();
    while let Some(c) = iter.next() {
        match c {
            '-' | '+' if sign.is_some() || !digits.is_empty() || saw_dot => {
                return Err(ParseDecimalError::SyntaxError)
            }
            '-' => {
                sign = Some(Sign::Negative);
            }
            '+' => {
                sign = Some(Sign::Positive);
            }
            '0'..='9' => {
                digits.push(c as u8);
                if saw_dot {
                    exponent = exponent
                        .checked_sub(1)
                        .ok_or(ParseDecimalError::OutOfRange)?;
                }
            }
            '.' => {
                if saw_dot {
                    return Err(ParseDecimalError::SyntaxError);
                }
                saw_dot = true;
            }
            'e' | 'E' => {
                if digits.is_empty() {
                    return Err(ParseDecimalError::SyntaxError);
                }
                let e: i32 = match iter.as_str().parse() {
                    Ok(e) => e,
                    Err(error) => {
                        return match error.kind() {
                            IntErrorKind::PosOverflow => {
                                if !is_zero(&digits[..]) {
                                    Err(ParseDecimalError::OutOfRange)
                                } else {
                                    Ok((BigInt::ZERO, 0))
                                }
                            }
                            IntErrorKind::NegOverflow => Ok((BigInt::ZERO, 0)),
                            _ => Err(ParseDecimalError::SyntaxError),
                        }
                    }
                };
                exponent = match exponent.checked_add(e) {
                    Some(exponent) => exponent,
                    None if e > 0 && !is_zero(&digits[..]) => {
                        return Err(ParseDecimalError::OutOfRange)
                    }
                    None => return Ok((BigInt::ZERO, 0)),
                };
                break;
            }
            _ => return Err(ParseDecimalError::SyntaxError),
        }
    }
    let value =
        BigUint::parse_bytes(&digits, 10).ok_or(ParseDecimalError::SyntaxError)?;
    let value = match sign {
        Some(Sign::Negative) => -BigInt::from(value),
        _ => BigInt::from(value),
    };
    Ok((value, exponent))
}

/// This is a doc-test to check that trying to instantiate the value 1 for a
/// type that can't represent it properly fails, with an error like "one is
/// not representable in a fixed-point type with zero range".
///
/// ```compile_fail
/// use feldera_binfxp::fixed_point;
///
/// let _ = <fixed_point!(0, -7)>::one();
/// ```
///
/// Likewise, a format without fraction bits is rejected:
///
/// ```compile_fail
/// use feldera_binfxp::FixedPoint;
///
/// let _ = FixedPoint::<i32, 10, 0>::default();
/// ```
fn _invalid_constant_test() {}

#[cfg(test)]
mod test {
    use std::fmt::Write;

    use crate::{NearestEven, ParseDecimalError};

    type F = fixed_point!(10, -8, NearestEven);
    fn f(n: f64) -> F {
        F::try_from(n).unwrap()
    }

    #[test]
    fn from_str() {
        for (s, expect) in [
            ("0", Ok(0.0)),
            ("0.", Ok(0.0)),
            (".0", Ok(0.0)),
            ("-0", Ok(0.0)),
            ("+0", Ok(0.0)),
            ("--0", Err(ParseDecimalError::SyntaxError)),
            ("-+0", Err(ParseDecimalError::SyntaxError)),
            ("0-", Err(ParseDecimalError::SyntaxError)),
            ("0x", Err(ParseDecimalError::SyntaxError)),
            ("0e5x", Err(ParseDecimalError::SyntaxError)),
            ("e5", Err(ParseDecimalError::SyntaxError)),
            (".", Err(ParseDecimalError::SyntaxError)),
            ("", Err(ParseDecimalError::SyntaxError)),
            ("1.5", Ok(1.5)),
            ("-1.25", Ok(-1.25)),
            ("+1.25", Ok(1.25)),
            ("1023.99609375", Ok(1023.99609375)),
            ("-1024", Ok(-1024.0)),
            ("1024", Err(ParseDecimalError::OutOfRange)),
            ("-1024.00390625", Err(ParseDecimalError::OutOfRange)),
            ("1e3", Ok(1000.0)),
            ("1e4", Err(ParseDecimalError::OutOfRange)),
            ("10240e-1", Err(ParseDecimalError::OutOfRange)),
            // 1023.9 * 256 = 262118.4, which rounds down.
            ("10239e-1", Ok(1023.8984375)),
            // Exactly halfway between 1023.99609375 (odd) and 1024 (even),
            // so this rounds up and out of range.
            ("1023.998046875", Err(ParseDecimalError::OutOfRange)),
            // Just below halfway rounds down and stays in range.
            ("1023.998046874", Ok(1023.99609375)),
            // Halfway cases round to even.
            ("0.001953125", Ok(0.0)),
            ("0.005859375", Ok(0.0078125)),
            ("-0.005859375", Ok(-0.0078125)),
            ("0.0019531251", Ok(0.00390625)),
            // Many more digits than the type can hold.
            (
                "3.14159265358979323846264338327950288419716939937510582097494459",
                Ok(3.140625),
            ),
            ("123e-2", Ok(1.23046875)),
            ("1e999999999999999", Err(ParseDecimalError::OutOfRange)),
            ("0e999999999999999", Ok(0.0)),
            ("1e-999999999999999", Ok(0.0)),
            ("1e2147483647", Err(ParseDecimalError::OutOfRange)),
            (".1e-2147483648", Ok(0.0)),
        ] {
            println!("{s}: {:?}", s.parse::<F>());
            assert_eq!(s.parse::<F>(), expect.map(f), "{s}");
        }
    }

    #[test]
    fn debug() {
        for (value, expect) in [
            (0.0, "0"),
            (5.0, "5"),
            (-5.0, "-5"),
            (10.0, "10"),
            (0.00390625, "0.00390625"),
            (-0.00390625, "-0.00390625"),
            (1.6875, "1.6875"),
            (-1.6875, "-1.6875"),
            (-1024.0, "-1024"),
        ] {
            assert_eq!(format!("{:?}", f(value)), expect);
            assert_eq!(format!("{:>20?}", f(value)), expect);
        }
    }

    #[test]
    fn display() {
        fn test(fixed: F, expect: &str) {
            let mut s = String::new();
            write!(&mut s, "{fixed}").unwrap();
            for precision in 0..=9 {
                write!(&mut s, " {fixed:.0$}", precision).unwrap();
            }
            assert_eq!(s, expect);
        }

        test(
            f(0.00390625),
            "0.00390625 0 0.0 0.00 0.004 0.0039 0.00391 0.003906 0.0039062 0.00390625 0.003906250",
        );
        test(
            f(-0.00390625),
            "-0.00390625 -0 -0.0 -0.00 -0.004 -0.0039 -0.00391 -0.003906 -0.0039062 -0.00390625 -0.003906250",
        );
        test(
            f(1.6875),
            "1.6875 2 1.7 1.69 1.688 1.6875 1.68750 1.687500 1.6875000 1.68750000 1.687500000",
        );
        test(
            f(-1.6875),
            "-1.6875 -2 -1.7 -1.69 -1.688 -1.6875 -1.68750 -1.687500 -1.6875000 -1.68750000 -1.687500000",
        );
        test(
            f(999.99609375),
            "999.99609375 1000 1000.0 1000.00 999.996 999.9961 999.99609 999.996094 999.9960938 999.99609375 999.996093750",
        );
        test(f(0.5), "0.5 0 0.5 0.50 0.500 0.5000 0.50000 0.500000 0.5000000 0.50000000 0.500000000");
        test(f(2.5), "2.5 2 2.5 2.50 2.500 2.5000 2.50000 2.500000 2.5000000 2.50000000 2.500000000");
        test(f(3.5), "3.5 4 3.5 3.50 3.500 3.5000 3.50000 3.500000 3.5000000 3.50000000 3.500000000");

        assert_eq!(format!("{:>8}", f(1.5)), "     1.5");
        assert_eq!(format!("{:<8}|", f(-1.5)), "-1.5    |");
        assert_eq!(format!("{:+}", f(1.5)), "+1.5");
        assert_eq!(format!("{:08.2}", f(-1.5)), "-0001.50");
    }
}
