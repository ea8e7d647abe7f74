//! Storage for fixed-point representations.
//!
//! A [FixedPoint] stores one signed integer.  [Repr] abstracts over the
//! integer types that can hold it: the native `i8` through `i128`, and
//! [Extended] for wider formats.  Every `Repr` has a double-width partner,
//! its [Unbounded] type, in which sums, products, and shifted dividends are
//! computed exactly before being rounded and narrowed back.
//!
//! [FixedPoint]: crate::FixedPoint

use std::{cmp::Ordering, fmt::Debug, hash::Hash};

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};

use crate::{
    extended::Extended,
    rounding::{Remainder, Rounding},
    u256::I256,
};

mod sealed {
    pub trait Sealed {}
}
pub(crate) use sealed::Sealed;

/// An exact signed intermediate value, at least twice as wide as the [Repr]
/// it pairs with.
///
/// Operations never overflow for the magnitudes that fixed-point arithmetic
/// feeds them: a product of two representations, or a representation shifted
/// left by at most its own width.
pub trait Unbounded: Clone + Debug + Sealed {
    /// Returns true if this value is less than zero.
    fn is_negative(&self) -> bool;

    /// Returns true if this value is zero.
    fn is_zero(&self) -> bool;

    /// Returns `self + other`.
    fn add(&self, other: &Self) -> Self;

    /// Returns `self - other`.
    fn sub(&self, other: &Self) -> Self;

    /// Returns `-self`.
    fn neg(&self) -> Self;

    /// Returns `self * 2**n`.
    fn shl(&self, n: u32) -> Self;

    /// Returns `self / 2**n`, rounded with `rounding`.
    fn shr_round(&self, n: u32, rounding: Rounding) -> Self;

    /// Returns `self / divisor`, rounded with `rounding`.  `divisor` must be
    /// nonzero.
    fn div_round(&self, divisor: &Self, rounding: Rounding) -> Self;

    /// Returns the square root of `self`, which must not be negative, rounded
    /// with `rounding`.
    fn isqrt_round(&self, rounding: Rounding) -> Self;

    /// Returns true if this value can be represented in `bits`-bit two's
    /// complement.
    fn fits(&self, bits: u32) -> bool;

    /// Returns the low 128 bits of this value's two's complement
    /// representation.
    fn low_i128(&self) -> i128;

    /// Returns this value as a [BigInt].
    fn to_bigint(&self) -> BigInt;
}

/// Signed integer storage for a fixed-point representation.
pub trait Repr:
    Clone + Debug + Default + PartialEq + Eq + PartialOrd + Ord + Hash + Send + Sync + 'static + Sealed
{
    /// Number of bits of storage.
    const BITS: u32;

    /// The double-width type for exact intermediates.
    type Wide: Unbounded;

    /// Converts to the double-width type.
    fn widen(&self) -> Self::Wide;

    /// Returns the exact product `self * other`.
    fn widening_mul(&self, other: &Self) -> Self::Wide;

    /// Truncates `value` to its low `bits` bits and sign-extends, that is,
    /// wraps it into `bits`-bit two's complement.
    fn from_unbounded<U: Unbounded>(value: &U, bits: u32) -> Self;

    /// The most negative value in `bits`-bit two's complement.
    fn min_for(bits: u32) -> Self;

    /// The most positive value in `bits`-bit two's complement.
    fn max_for(bits: u32) -> Self;

    /// Returns this value as `i128`, if it fits.
    fn to_i128(&self) -> Option<i128>;

    /// Returns this value as a [BigInt].
    fn to_bigint(&self) -> BigInt;

    /// Returns true if this value is less than zero.
    fn is_negative(&self) -> bool;

    /// Returns true if this value is zero.
    fn is_zero(&self) -> bool;

    /// Returns `self * 2**exp2` as the nearest `f64`.
    fn to_f64(&self, exp2: i32) -> f64;
}

/// Returns the number of bits, including the sign bit, needed by a format
/// with the given range and resolution.
pub const fn all_bits(range: u32, resolution: i32) -> u32 {
    let bits = range as i64 - resolution as i64 + 1;
    if bits < 0 {
        0
    } else if bits > u32::MAX as i64 {
        u32::MAX
    } else {
        bits as u32
    }
}

/// Returns the storage class for the given range and resolution: 8, 16, 32,
/// 64, or 128 for the smallest native integer that holds the format, or 0 if
/// only [Extended] storage will do.
pub const fn storage_class(range: u32, resolution: i32) -> u32 {
    match all_bits(range, resolution) {
        0..=8 => 8,
        9..=16 => 16,
        17..=32 => 32,
        33..=64 => 64,
        65..=128 => 128,
        _ => 0,
    }
}

/// Returns the number of bits of storage for the given range and resolution.
/// Extended storage grows in 32-bit limbs.
pub const fn storage_bits(range: u32, resolution: i32) -> u32 {
    match storage_class(range, resolution) {
        0 => all_bits(range, resolution).div_ceil(32) * 32,
        class => class,
    }
}

/// Storage class marker, see [storage_class].
pub struct Storage<const CLASS: u32>;

/// Maps a [Storage] class to the integer type that implements it.
pub trait SelectStorage<const BITS: u32> {
    /// The selected storage type.
    type Repr: Repr;
}

macro_rules! select_native {
    ($($class:literal => $t:ty),*) => {
        $(
            impl<const BITS: u32> SelectStorage<BITS> for Storage<$class> {
                type Repr = $t;
            }
        )*
    };
}
select_native!(8 => i8, 16 => i16, 32 => i32, 64 => i64, 128 => i128);

impl<const BITS: u32> SelectStorage<BITS> for Storage<0> {
    type Repr = Extended<BITS>;
}

/// Sign-extends the low `bits` bits of `value`.
pub(crate) const fn sign_extend(value: i128, bits: u32) -> i128 {
    if bits >= 128 {
        value
    } else {
        let shift = 128 - bits;
        (value << shift) >> shift
    }
}

/// Returns the most negative `bits`-bit two's complement value, saturated to
/// the range of `i128`.
pub(crate) const fn min_i128(bits: u32) -> i128 {
    if bits >= 128 {
        i128::MIN
    } else {
        -(1 << (bits - 1))
    }
}

/// Returns the most positive `bits`-bit two's complement value, saturated to
/// the range of `i128`.
pub(crate) const fn max_i128(bits: u32) -> i128 {
    if bits >= 128 {
        i128::MAX
    } else {
        (1 << (bits - 1)) - 1
    }
}

/// Returns `x * 2**exp`, scaling in steps so that intermediate powers of two
/// stay finite.
pub(crate) fn ldexp_f64(mut x: f64, mut exp: i32) -> f64 {
    while exp > 1000 {
        x *= 2f64.powi(1000);
        exp -= 1000;
        if x.is_infinite() {
            return x;
        }
    }
    while exp < -1000 {
        x *= 2f64.powi(-1000);
        exp += 1000;
        if x == 0.0 {
            return x;
        }
    }
    x * 2f64.powi(exp)
}

/// Returns `value * 2**exp2` as the nearest `f64`.
pub(crate) fn bigint_to_f64(value: &BigInt, exp2: i32) -> f64 {
    let magnitude = value.magnitude();
    let bits = magnitude.bits();
    let (mantissa, shift) = if bits <= 64 {
        (magnitude.to_u64().unwrap_or_default(), 0)
    } else {
        // Keep 64 bits and fold everything below them into a sticky bit, so
        // that the final conversion to `f64` rounds correctly.
        let shift = bits - 64;
        let kept = magnitude >> shift;
        let sticky = (&kept << shift) != *magnitude;
        (kept.to_u64().unwrap_or_default() | sticky as u64, shift)
    };
    let shift = i32::try_from(shift).unwrap_or(i32::MAX);
    let x = ldexp_f64(mantissa as f64, exp2.saturating_add(shift));
    if value.sign() == Sign::Minus {
        -x
    } else {
        x
    }
}

/// Digit-by-digit square root: returns `(s, n - s*s)` with `s = floor(sqrt(n))`.
pub(crate) fn isqrt_rem_u128(n: u128) -> (u128, u128) {
    if n == 0 {
        return (0, 0);
    }
    let mut remainder = n;
    let mut root = 0u128;
    let mut bit = 1u128 << ((127 - n.leading_zeros()) & !1);
    while bit != 0 {
        if remainder >= root + bit {
            remainder -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    (root, remainder)
}

/// Digit-by-digit square root of an arbitrary-precision integer.
pub(crate) fn isqrt_rem_biguint(n: &BigUint) -> (BigUint, BigUint) {
    if n.is_zero() {
        return (BigUint::zero(), BigUint::zero());
    }
    let mut remainder = n.clone();
    let mut root = BigUint::zero();
    let mut bit = BigUint::one() << ((n.bits() - 1) & !1);
    while !bit.is_zero() {
        let trial = &root + &bit;
        if remainder >= trial {
            remainder -= trial;
            root = (root >> 1u32) + &bit;
        } else {
            root >>= 1u32;
        }
        bit >>= 2u32;
    }
    (root, remainder)
}

/// Classifies the remainder `rem` of an integer square root `root`.
///
/// `(root + 1/2)**2 = root**2 + root + 1/4` is never an integer, so there are
/// no ties: the root should be rounded up exactly when `rem > root`.
pub(crate) fn classify_sqrt<T: PartialOrd + Zero>(root: &T, rem: &T) -> Remainder {
    if rem.is_zero() {
        Remainder::Zero
    } else if rem <= root {
        Remainder::BelowHalf
    } else {
        Remainder::AboveHalf
    }
}

macro_rules! unbounded_native {
    ($($t:ty: $u:ty),*) => {
        $(
            impl Sealed for $t {}

            impl Unbounded for $t {
                fn is_negative(&self) -> bool {
                    *self < 0
                }

                fn is_zero(&self) -> bool {
                    *self == 0
                }

                fn add(&self, other: &Self) -> Self {
                    self.wrapping_add(*other)
                }

                fn sub(&self, other: &Self) -> Self {
                    self.wrapping_sub(*other)
                }

                fn neg(&self) -> Self {
                    self.wrapping_neg()
                }

                fn shl(&self, n: u32) -> Self {
                    if n >= <$t>::BITS {
                        0
                    } else {
                        *self << n
                    }
                }

                fn shr_round(&self, n: u32, rounding: Rounding) -> Self {
                    if n == 0 {
                        return *self;
                    }
                    let negative = *self < 0;
                    let magnitude = self.unsigned_abs();
                    let (q, remainder) = if n >= <$u>::BITS {
                        // The magnitude is at most `2**(BITS-1)`, so it can
                        // only reach half of `2**n` when `n == BITS`.
                        let half_cmp = if n == <$u>::BITS {
                            magnitude.cmp(&(1 << (<$u>::BITS - 1)))
                        } else {
                            Ordering::Less
                        };
                        (0, Remainder::classify(magnitude == 0, half_cmp))
                    } else {
                        let r = magnitude & ((1 << n) - 1);
                        let half: $u = 1 << (n - 1);
                        (magnitude >> n, Remainder::classify(r == 0, r.cmp(&half)))
                    };
                    let q = q + rounding.round_away(negative, q & 1 == 1, remainder) as $u;
                    if negative {
                        (q as $t).wrapping_neg()
                    } else {
                        q as $t
                    }
                }

                fn div_round(&self, divisor: &Self, rounding: Rounding) -> Self {
                    let negative = (*self < 0) != (*divisor < 0);
                    let n = self.unsigned_abs();
                    let d = divisor.unsigned_abs();
                    let q = n / d;
                    let r = n % d;
                    // `r < d <= 2**(BITS-1)`, so `2*r` can't overflow.
                    let remainder = Remainder::classify(r == 0, (2 * r).cmp(&d));
                    let q = q + rounding.round_away(negative, q & 1 == 1, remainder) as $u;
                    if negative {
                        (q as $t).wrapping_neg()
                    } else {
                        q as $t
                    }
                }

                fn isqrt_round(&self, rounding: Rounding) -> Self {
                    debug_assert!(*self >= 0);
                    let (root, rem) = isqrt_rem_u128(self.unsigned_abs() as u128);
                    let remainder = classify_sqrt(&root, &rem);
                    (root + rounding.round_away(false, root & 1 == 1, remainder) as u128) as $t
                }

                fn fits(&self, bits: u32) -> bool {
                    let value = *self as i128;
                    min_i128(bits) <= value && value <= max_i128(bits)
                }

                fn low_i128(&self) -> i128 {
                    *self as i128
                }

                fn to_bigint(&self) -> BigInt {
                    BigInt::from(*self)
                }
            }
        )*
    };
}
unbounded_native!(i8: u8, i16: u16, i32: u32, i64: u64, i128: u128);

impl Sealed for BigInt {}

impl Unbounded for BigInt {
    fn is_negative(&self) -> bool {
        self.sign() == Sign::Minus
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn add(&self, other: &Self) -> Self {
        self + other
    }

    fn sub(&self, other: &Self) -> Self {
        self - other
    }

    fn neg(&self) -> Self {
        -self
    }

    fn shl(&self, n: u32) -> Self {
        self << n
    }

    fn shr_round(&self, n: u32, rounding: Rounding) -> Self {
        if n == 0 {
            return self.clone();
        }
        let negative = Unbounded::is_negative(self);
        let magnitude = self.magnitude();
        if u64::from(n) > magnitude.bits() {
            // Below half, without building `2**(n - 1)`.
            let remainder = Remainder::classify(magnitude.is_zero(), Ordering::Less);
            return with_sign(negative, round_magnitude(BigUint::ZERO, rounding, negative, remainder));
        }
        let q = magnitude >> n;
        let r = magnitude - (&q << n);
        let half = BigUint::one() << (n - 1);
        let remainder = Remainder::classify(r.is_zero(), r.cmp(&half));
        with_sign(negative, round_magnitude(q, rounding, negative, remainder))
    }

    fn div_round(&self, divisor: &Self, rounding: Rounding) -> Self {
        let negative = Unbounded::is_negative(self) != Unbounded::is_negative(divisor);
        let n = self.magnitude();
        let d = divisor.magnitude();
        let q = n / d;
        let r = n - &q * d;
        let remainder = Remainder::classify(r.is_zero(), (r << 1u32).cmp(d));
        with_sign(negative, round_magnitude(q, rounding, negative, remainder))
    }

    fn isqrt_round(&self, rounding: Rounding) -> Self {
        debug_assert!(!Unbounded::is_negative(self));
        let (root, rem) = isqrt_rem_biguint(self.magnitude());
        let remainder = classify_sqrt(&root, &rem);
        BigInt::from(round_magnitude(root, rounding, false, remainder))
    }

    fn fits(&self, bits: u32) -> bool {
        let magnitude = self.magnitude();
        if Unbounded::is_negative(self) {
            // `-2**(bits-1)` fits but its magnitude needs `bits` bits.
            (magnitude - 1u32).bits() < bits as u64
        } else {
            magnitude.bits() < bits as u64
        }
    }

    fn low_i128(&self) -> i128 {
        let mut digits = self.magnitude().iter_u64_digits();
        let lo = digits.next().unwrap_or(0);
        let hi = digits.next().unwrap_or(0);
        let low = (((hi as u128) << 64) | lo as u128) as i128;
        if Unbounded::is_negative(self) {
            low.wrapping_neg()
        } else {
            low
        }
    }

    fn to_bigint(&self) -> BigInt {
        self.clone()
    }
}

/// Applies `rounding` to magnitude `q`, truncated from a value with sign
/// `negative` and discarded part `remainder`.
pub(crate) fn round_magnitude(
    q: BigUint,
    rounding: Rounding,
    negative: bool,
    remainder: Remainder,
) -> BigUint {
    let odd = q.bit(0);
    if rounding.round_away(negative, odd, remainder) {
        q + 1u32
    } else {
        q
    }
}

pub(crate) fn with_sign(negative: bool, magnitude: BigUint) -> BigInt {
    let sign = if negative { Sign::Minus } else { Sign::Plus };
    BigInt::from_biguint(sign, magnitude)
}

macro_rules! repr_native {
    ($($t:ty => $wide:ty),*) => {
        $(
            impl Repr for $t {
                const BITS: u32 = <$t>::BITS;

                type Wide = $wide;

                fn widen(&self) -> Self::Wide {
                    *self as $wide
                }

                fn widening_mul(&self, other: &Self) -> Self::Wide {
                    (*self as $wide) * (*other as $wide)
                }

                fn from_unbounded<U: Unbounded>(value: &U, bits: u32) -> Self {
                    sign_extend(value.low_i128(), bits) as $t
                }

                fn min_for(bits: u32) -> Self {
                    min_i128(bits) as $t
                }

                fn max_for(bits: u32) -> Self {
                    max_i128(bits) as $t
                }

                fn to_i128(&self) -> Option<i128> {
                    Some(*self as i128)
                }

                fn to_bigint(&self) -> BigInt {
                    BigInt::from(*self)
                }

                fn is_negative(&self) -> bool {
                    *self < 0
                }

                fn is_zero(&self) -> bool {
                    *self == 0
                }

                fn to_f64(&self, exp2: i32) -> f64 {
                    ldexp_f64(*self as f64, exp2)
                }
            }
        )*
    };
}
repr_native!(i8 => i16, i16 => i32, i32 => i64, i64 => i128);

impl Repr for i128 {
    const BITS: u32 = i128::BITS;

    type Wide = I256;

    fn widen(&self) -> Self::Wide {
        I256::from(*self)
    }

    fn widening_mul(&self, other: &Self) -> Self::Wide {
        I256::from_product(*self, *other)
    }

    fn from_unbounded<U: Unbounded>(value: &U, bits: u32) -> Self {
        sign_extend(value.low_i128(), bits)
    }

    fn min_for(bits: u32) -> Self {
        min_i128(bits)
    }

    fn max_for(bits: u32) -> Self {
        max_i128(bits)
    }

    fn to_i128(&self) -> Option<i128> {
        Some(*self)
    }

    fn to_bigint(&self) -> BigInt {
        BigInt::from(*self)
    }

    fn is_negative(&self) -> bool {
        *self < 0
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }

    fn to_f64(&self, exp2: i32) -> f64 {
        ldexp_f64(*self as f64, exp2)
    }
}
