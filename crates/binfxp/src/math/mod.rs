//! Elementary and transcendental functions.
//!
//! Functions that [FixedPoint] can compute exactly and then round, such as
//! [sqrt](FixedPoint::sqrt) and [hypot](FixedPoint::hypot), are correctly
//! rounded with the type's rounding mode.  The others evaluate a kernel at a
//! working precision 64 bits finer than the type and round that once, so
//! that they are almost always correctly rounded too, and never off by more
//! than an ulp.
//!
//! Every function has a `checked_` form that reports arguments outside its
//! domain as [ArithmeticError::Domain] and results out of range as
//! [ArithmeticError::Overflow].  The plain form panics for the former and
//! resolves the latter with the type's overflow mode.  A result so far out of
//! range that computing it would be pointless, more than `2**ALL_BITS` in
//! magnitude, is resolved as if it were exactly `2**(ALL_BITS + 64)` with the
//! right sign, so that it saturates, wraps to zero, or fails.

pub(crate) mod kernel;

use num_bigint::{BigInt, BigUint};
use num_traits::{One, ToPrimitive};

use crate::{
    constants::working,
    fixed::OnOverflow,
    overflow::OverflowMode,
    rounding::{Remainder, RoundMode, Rounding},
    storage::{round_magnitude, with_sign, Repr, Unbounded},
    ArithmeticError, Constant, FixedPoint,
};

use kernel::{abs, div, mul, one, sqrt_of_product};

/// Bits of working precision beyond a type's own.
const GUARD_BITS: u32 = 64;

macro_rules! checked_and_unchecked {
    ($(
        $(#[$attr:meta])*
        $name:ident / $checked:ident => $with:ident($($arg:ident: $ty:ty),*);
    )*) => {
        $(
            $(#[$attr])*
            ///
            /// # Panic
            ///
            /// Panics if the argument is outside the function's domain, or if
            /// the result is out of range and the overflow mode is
            /// [Throw](crate::Throw).
            pub fn $name(&self $(, $arg: $ty)*) -> Self {
                self.$with($($arg, )* OnOverflow::Policy)
                    .unwrap_or_else(|error| panic!(concat!(stringify!($name), ": {}"), error))
            }

            $(#[$attr])*
            ///
            /// Returns [ArithmeticError::Domain] if the argument is outside the
            /// function's domain, or [ArithmeticError::Overflow] if the result
            /// is out of range.
            pub fn $checked(&self $(, $arg: $ty)*) -> Result<Self, ArithmeticError> {
                self.$with($($arg, )* OnOverflow::Error)
            }
        )*
    };
}

impl<I, const RANGE: u32, const RESOLUTION: i32, R, O> FixedPoint<I, RANGE, RESOLUTION, R, O>
where
    I: Repr,
    R: RoundMode,
    O: OverflowMode,
{
    fn working_bits() -> u32 {
        Self::FRACTION_BITS + GUARD_BITS
    }

    /// Returns this value at working precision `p`.
    fn to_working(&self, p: u32) -> BigInt {
        self.0.to_bigint() << (p - Self::FRACTION_BITS)
    }

    /// Rounds `value`, at working precision `p`, into this type.
    fn from_working(value: BigInt, p: u32, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        Self::from_scaled_bigint(value, p, on_overflow)
    }

    /// Resolves a result too large to compute.
    fn far_out_of_range(negative: bool, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let huge = BigUint::one() << (Self::ALL_BITS + Self::FRACTION_BITS + GUARD_BITS);
        Self::narrow(&with_sign(negative, huge), on_overflow)
    }

    /// Returns true if `x`, at working precision `p`, exceeds `ALL_BITS`, so
    /// that `e**x` is far out of range.
    fn exp_overflows(x: &BigInt, p: u32) -> bool {
        *x > BigInt::from(Self::ALL_BITS) << p
    }

    /// Returns true if this value is an integer.
    fn is_integer(&self) -> bool {
        let value = self.0.to_bigint();
        value
            .trailing_zeros()
            .map_or(true, |zeros| zeros >= Self::FRACTION_BITS as u64)
    }

    fn sqrt_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        if self.0.is_negative() {
            return Err(ArithmeticError::Domain);
        }
        let root = self.0.widen().shl(Self::FRACTION_BITS).isqrt_round(R::MODE);
        Self::narrow(&root, on_overflow)
    }

    fn cbrt_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        // `cbrt(n * 2**-f) * 2**f = cbrt(n * 2**2f)`.
        let n = self.0.to_bigint() << (2 * Self::FRACTION_BITS);
        let negative = n.is_negative();
        let magnitude = n.magnitude();
        let root = magnitude.cbrt();
        let rem = magnitude - root.pow(3);

        // `(root + 1/2)**3 - root**3 = (12 root**2 + 6 root + 1) / 8`, which
        // is never an integer, so there are no ties.
        let midpoint = BigUint::from(12u32) * &root * &root + BigUint::from(6u32) * &root + 1u32;
        let remainder = Remainder::classify(rem == BigUint::ZERO, (rem << 3u32).cmp(&midpoint));
        let root = with_sign(negative, round_magnitude(root, R::MODE, negative, remainder));
        Self::narrow(&root, on_overflow)
    }

    fn hypot_with(&self, other: &Self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let (x, y) = (self.0.to_bigint(), other.0.to_bigint());
        let root = (&x * &x + &y * &y).isqrt_round(R::MODE);
        Self::narrow(&root, on_overflow)
    }

    fn round_to_integer(&self, rounding: Rounding, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let f = Self::FRACTION_BITS;
        Self::narrow(&self.0.widen().shr_round(f, rounding).shl(f), on_overflow)
    }

    fn floor_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        self.round_to_integer(Rounding::TowardNegInfinity, on_overflow)
    }

    fn ceil_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        self.round_to_integer(Rounding::TowardPosInfinity, on_overflow)
    }

    fn trunc_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        self.round_to_integer(Rounding::TowardZero, on_overflow)
    }

    fn round_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        self.round_to_integer(Rounding::NearestAway, on_overflow)
    }

    fn nearbyint_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        self.round_to_integer(R::MODE, on_overflow)
    }

    fn fract_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let f = Self::FRACTION_BITS;
        let value = self.0.widen();
        let integer = value.shr_round(f, Rounding::TowardZero).shl(f);
        Self::narrow(&value.sub(&integer), on_overflow)
    }

    fn ldexp_with(&self, n: i32, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let value = self.0.widen();
        let shifted = if n < 0 {
            value.shr_round(n.unsigned_abs(), R::MODE)
        } else if n.unsigned_abs() < Self::ALL_BITS {
            value.shl(n.unsigned_abs())
        } else if value.is_zero() {
            return Ok(Self::zero());
        } else {
            return Self::far_out_of_range(value.is_negative(), on_overflow);
        };
        Self::narrow(&shifted, on_overflow)
    }

    fn copysign_with(&self, sign: &Self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        if self.0.is_negative() != sign.0.is_negative() {
            self.neg_with(on_overflow)
        } else {
            Ok(self.clone())
        }
    }

    fn abs_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        if self.0.is_negative() {
            self.neg_with(on_overflow)
        } else {
            Ok(self.clone())
        }
    }

    fn signum_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let sign = if self.0.is_negative() {
            -1
        } else if self.0.is_zero() {
            0
        } else {
            1
        };
        Self::narrow(&(BigInt::from(sign) << Self::FRACTION_BITS), on_overflow)
    }

    fn fmod_with(&self, other: &Self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        if other.0.is_zero() {
            return Err(ArithmeticError::Domain);
        }
        match (self.0.to_i128(), other.0.to_i128()) {
            // `checked_rem` fails only for `MIN % -1`, which is 0.
            (Some(x), Some(y)) => Self::narrow(&x.checked_rem(y).unwrap_or(0), on_overflow),
            _ => Self::narrow(&(self.0.to_bigint() % other.0.to_bigint()), on_overflow),
        }
    }

    fn powi_with(&self, n: i32, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        if n == 0 {
            return Self::narrow(&one(Self::FRACTION_BITS), on_overflow);
        } else if self.0.is_zero() {
            return if n > 0 {
                Ok(Self::zero())
            } else {
                Err(ArithmeticError::Domain)
            };
        }

        // Each multiplication loses a little relative precision, and a
        // reciprocal as small as `2**-RANGE` needs `RANGE` more bits.
        let exponent_bits = 32 - n.unsigned_abs().leading_zeros();
        let p = Self::working_bits()
            .saturating_add(2 * Self::ALL_BITS)
            .saturating_add(2 * exponent_bits);
        let negative = self.0.is_negative() && n % 2 != 0;
        let mut base = abs(&self.to_working(p));
        if n < 0 {
            base = div(&one(p), &base, p);
        }

        // `|x**n|` is at least as large as every factor that goes into it
        // when `|x| >= 1`, and when `|x| < 1` nothing grows, so any factor
        // beyond the limit means the result is too.
        let limit = BigInt::one() << (p + Self::ALL_BITS);
        let mut power = one(p);
        let mut e = n.unsigned_abs();
        loop {
            if e & 1 == 1 {
                power = mul(&power, &base, p);
                if power > limit {
                    return Self::far_out_of_range(negative, on_overflow);
                }
            }
            e >>= 1;
            if e == 0 {
                break;
            }
            base = mul(&base, &base, p);
            if base > limit {
                return Self::far_out_of_range(negative, on_overflow);
            }
        }
        let power = if negative { -power } else { power };
        Self::from_working(power, p, on_overflow)
    }

    fn pow_with(&self, y: &Self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        if y.is_integer() {
            if let Some(n) = (y.0.to_bigint() >> Self::FRACTION_BITS).to_i32() {
                return self.powi_with(n, on_overflow);
            }
        }
        if self.0.is_zero() {
            return if y.0.is_negative() || y.0.is_zero() {
                Err(ArithmeticError::Domain)
            } else {
                Ok(Self::zero())
            };
        } else if self.0.is_negative() {
            if !y.is_integer() {
                return Err(ArithmeticError::Domain);
            }
            // An integer too large for `i32`.  Only its parity matters for
            // the sign.
            let odd = (y.0.to_bigint() >> Self::FRACTION_BITS).bit(0);
            let magnitude = abs(&self.to_working(Self::working_bits()));
            return Self::exp_of_product(&magnitude, y, odd, on_overflow);
        }
        Self::exp_of_product(&self.to_working(Self::working_bits()), y, false, on_overflow)
    }

    /// Returns `exp(y * ln(x))`, negated if `negative`.  `x` is positive at
    /// working precision.
    fn exp_of_product(x: &BigInt, y: &Self, negative: bool, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        // An error in `y * ln(x)` becomes a relative error in the result,
        // which may be as large as `2**RANGE`, and `y` itself may be that
        // large.
        let p = Self::working_bits().saturating_add(2 * Self::ALL_BITS);
        let x = x << (p - Self::working_bits());
        let z = (kernel::ln(&x, p) * y.0.to_bigint()) >> Self::FRACTION_BITS;
        if Self::exp_overflows(&z, p) {
            return Self::far_out_of_range(negative, on_overflow);
        }
        let value = kernel::exp(&z, p);
        Self::from_working(if negative { -value } else { value }, p, on_overflow)
    }

    fn exp_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        let x = self.to_working(p);
        if Self::exp_overflows(&x, p) {
            return Self::far_out_of_range(false, on_overflow);
        }
        Self::from_working(kernel::exp(&x, p), p, on_overflow)
    }

    fn exp2_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        // `2**x = 2**k * 2**f` for integer `k` and `f` in `[0, 1)`, so that
        // only `2**f` is approximated and its relative error does not grow
        // with `k`.  Below `2**-(FRACTION_BITS + 2)` all values round alike.
        let value = self.0.to_bigint();
        let k = &value >> Self::FRACTION_BITS;
        let f = value - (&k << Self::FRACTION_BITS);
        let tiny = i64::from(Self::FRACTION_BITS) + 2;
        let k = match k.to_i64() {
            Some(k) if k >= i64::from(Self::ALL_BITS) => return Self::far_out_of_range(false, on_overflow),
            Some(k) => k.max(-tiny),
            None if k.is_negative() => -tiny,
            None => return Self::far_out_of_range(false, on_overflow),
        };

        let p = Self::working_bits() + k.max(0) as u32;
        let power = if f.is_zero() {
            one(p)
        } else {
            let x = mul(&(f << (p - Self::FRACTION_BITS)), &working(Constant::Ln2, p), p);
            kernel::exp(&x, p)
        };
        Self::from_scaled_bigint(power, (i64::from(p) - k) as u32, on_overflow)
    }

    fn expm1_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        let x = self.to_working(p);
        if Self::exp_overflows(&x, p) {
            return Self::far_out_of_range(false, on_overflow);
        }
        Self::from_working(kernel::exp(&x, p) - one(p), p, on_overflow)
    }

    fn ln_working(&self, p: u32) -> Result<BigInt, ArithmeticError> {
        if self.0.is_negative() || self.0.is_zero() {
            return Err(ArithmeticError::Domain);
        }
        Ok(kernel::ln(&self.to_working(p), p))
    }

    fn ln_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        Self::from_working(self.ln_working(p)?, p, on_overflow)
    }

    fn log2_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        // Powers of two have exact logarithms.
        let value = self.0.to_bigint();
        if !value.is_negative() && value.magnitude().count_ones() == 1 {
            let exponent = value.bits() as i64 - 1 - Self::FRACTION_BITS as i64;
            return Self::narrow(&(BigInt::from(exponent) << Self::FRACTION_BITS), on_overflow);
        }
        let p = Self::working_bits();
        let ln = self.ln_working(p)?;
        Self::from_working(div(&ln, &working(Constant::Ln2, p), p), p, on_overflow)
    }

    fn log10_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        let ln = self.ln_working(p)?;
        Self::from_working(div(&ln, &working(Constant::Ln10, p), p), p, on_overflow)
    }

    fn ln_1p_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        let x = self.to_working(p) + one(p);
        if x.is_negative() || x.is_zero() {
            return Err(ArithmeticError::Domain);
        }
        Self::from_working(kernel::ln(&x, p), p, on_overflow)
    }

    fn sin_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        let (sin, _) = kernel::sin_cos(&self.to_working(p), p);
        Self::from_working(sin, p, on_overflow)
    }

    fn cos_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        let (_, cos) = kernel::sin_cos(&self.to_working(p), p);
        Self::from_working(cos, p, on_overflow)
    }

    fn tan_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        // Near a pole, the cosine needs `RANGE` more bits of relative
        // precision for the quotient to be accurate.
        let p = Self::working_bits().saturating_add(2 * RANGE);
        let (sin, cos) = kernel::sin_cos(&self.to_working(p), p);
        if cos.is_zero() {
            return Self::far_out_of_range(sin.is_negative(), on_overflow);
        }
        Self::from_working(div(&sin, &cos, p), p, on_overflow)
    }

    /// Returns `sqrt(1 - x**2)` for `|x| <= 1`, at working precision `p`.
    fn cofunction(x: &BigInt, p: u32) -> Result<BigInt, ArithmeticError> {
        if abs(x) > one(p) {
            return Err(ArithmeticError::Domain);
        }
        Ok(sqrt_of_product(&(one(p) - x), &(one(p) + x)))
    }

    fn asin_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        let x = self.to_working(p);
        let c = Self::cofunction(&x, p)?;
        Self::from_working(kernel::atan2(&x, &c, p), p, on_overflow)
    }

    fn acos_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        let x = self.to_working(p);
        let c = Self::cofunction(&x, p)?;
        Self::from_working(kernel::atan2(&c, &x, p), p, on_overflow)
    }

    fn atan_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        Self::from_working(kernel::atan(&self.to_working(p), p), p, on_overflow)
    }

    fn atan2_with(&self, other: &Self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        let angle = kernel::atan2(&self.to_working(p), &other.to_working(p), p);
        Self::from_working(angle, p, on_overflow)
    }

    /// Returns `(e**x, e**-x)` for this value `x`, or `None` if they are far
    /// out of range.
    fn exp_pair(&self, p: u32) -> Option<(BigInt, BigInt)> {
        let x = self.to_working(p);
        if Self::exp_overflows(&abs(&x), p) {
            return None;
        }
        Some((kernel::exp(&x, p), kernel::exp(&-&x, p)))
    }

    fn sinh_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        match self.exp_pair(p) {
            Some((plus, minus)) => Self::from_working((plus - minus) >> 1u32, p, on_overflow),
            None => Self::far_out_of_range(self.0.is_negative(), on_overflow),
        }
    }

    fn cosh_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        match self.exp_pair(p) {
            Some((plus, minus)) => Self::from_working((plus + minus) >> 1u32, p, on_overflow),
            None => Self::far_out_of_range(false, on_overflow),
        }
    }

    fn tanh_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        // `tanh(|x|) = (1 - e**-2|x|) / (1 + e**-2|x|)`, which cannot overflow
        // an intermediate.
        let p = Self::working_bits();
        let x = self.to_working(p);
        let t = kernel::exp(&-(abs(&x) << 1u32), p);
        let y = div(&(one(p) - &t), &(one(p) + &t), p);
        Self::from_working(if x.is_negative() { -y } else { y }, p, on_overflow)
    }

    fn asinh_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        let x = self.to_working(p);
        let x_abs = abs(&x);
        let root = kernel::sqrt(&(mul(&x_abs, &x_abs, p) + one(p)), p);
        let y = kernel::ln(&(x_abs + root), p);
        Self::from_working(if x.is_negative() { -y } else { y }, p, on_overflow)
    }

    fn acosh_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        let x = self.to_working(p);
        if x < one(p) {
            return Err(ArithmeticError::Domain);
        }
        let root = sqrt_of_product(&(&x - one(p)), &(&x + one(p)));
        Self::from_working(kernel::ln(&(x + root), p), p, on_overflow)
    }

    fn atanh_with(&self, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        let x = self.to_working(p);
        if abs(&x) >= one(p) {
            return Err(ArithmeticError::Domain);
        }
        let y = kernel::ln(&(one(p) + &x), p) - kernel::ln(&(one(p) - &x), p);
        Self::from_working(y >> 1u32, p, on_overflow)
    }

    fn cyl_bessel_j_with(&self, n: u32, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let p = Self::working_bits();
        Self::from_working(kernel::bessel_j(n, &self.to_working(p), p), p, on_overflow)
    }

    checked_and_unchecked! {
        /// Returns the square root, correctly rounded.  The domain is `x >= 0`.
        sqrt / checked_sqrt => sqrt_with();

        /// Returns the cube root, correctly rounded.
        cbrt / checked_cbrt => cbrt_with();

        /// Returns `sqrt(self**2 + other**2)`, correctly rounded.
        hypot / checked_hypot => hypot_with(other: &Self);

        /// Returns the largest integer less than or equal to this value.
        floor / checked_floor => floor_with();

        /// Returns the smallest integer greater than or equal to this value.
        ceil / checked_ceil => ceil_with();

        /// Returns the integer part of this value, rounding toward zero.
        trunc / checked_trunc => trunc_with();

        /// Returns the nearest integer, rounding halfway cases away from zero.
        round / checked_round => round_with();

        /// Returns this value rounded to an integer with this type's rounding
        /// mode, so that, for example, `2.5` becomes `2` with [NearestEven]
        /// or [Fastest] but `3` with [NearestAway].
        ///
        /// [NearestEven]: crate::NearestEven
        /// [NearestAway]: crate::NearestAway
        /// [Fastest]: crate::Fastest
        nearbyint / checked_nearbyint => nearbyint_with();

        /// Returns the fractional part, `self - self.trunc()`.
        fract / checked_fract => fract_with();

        /// Returns `self * 2**n`, rounded with this type's rounding mode.
        ldexp / checked_ldexp => ldexp_with(n: i32);

        /// Returns this value with the sign of `sign`.
        copysign / checked_copysign => copysign_with(sign: &Self);

        /// Returns the absolute value.
        abs / checked_abs => abs_with();

        /// Returns -1, 0, or 1 according to the sign of this value.
        signum / checked_signum => signum_with();

        /// Returns the remainder of `self / other` truncated toward zero,
        /// which has the sign of `self`.  The domain is `other != 0`.
        fmod / checked_fmod => fmod_with(other: &Self);

        /// Returns `self**n`.  `0**0` is 1, and `0**n` for negative `n` is
        /// outside the domain.
        powi / checked_powi => powi_with(n: i32);

        /// Returns `self**y`.  A negative base requires an integer
        /// exponent, and a zero base requires a positive one.
        pow / checked_pow => pow_with(y: &Self);

        /// Returns `e**self`.
        exp / checked_exp => exp_with();

        /// Returns `2**self`, exactly for integers.
        exp2 / checked_exp2 => exp2_with();

        /// Returns `e**self - 1`.
        expm1 / checked_expm1 => expm1_with();

        /// Returns the natural logarithm.  The domain is `x > 0`.
        ln / checked_ln => ln_with();

        /// Returns the base-2 logarithm, exactly for powers of two.  The
        /// domain is `x > 0`.
        log2 / checked_log2 => log2_with();

        /// Returns the base-10 logarithm.  The domain is `x > 0`.
        log10 / checked_log10 => log10_with();

        /// Returns `ln(1 + self)`.  The domain is `x > -1`.
        ln_1p / checked_ln_1p => ln_1p_with();

        /// Returns the sine of this value in radians.
        sin / checked_sin => sin_with();

        /// Returns the cosine of this value in radians.
        cos / checked_cos => cos_with();

        /// Returns the tangent of this value in radians.
        tan / checked_tan => tan_with();

        /// Returns the arcsine, in `[-pi/2, pi/2]`.  The domain is
        /// `-1 <= x <= 1`.
        asin / checked_asin => asin_with();

        /// Returns the arccosine, in `[0, pi]`.  The domain is `-1 <= x <= 1`.
        acos / checked_acos => acos_with();

        /// Returns the arctangent, in `(-pi/2, pi/2)`.
        atan / checked_atan => atan_with();

        /// Returns the angle of the point `(other, self)`, in `[-pi, pi]`.
        /// `atan2` of the origin is 0.
        atan2 / checked_atan2 => atan2_with(other: &Self);

        /// Returns the hyperbolic sine.
        sinh / checked_sinh => sinh_with();

        /// Returns the hyperbolic cosine.
        cosh / checked_cosh => cosh_with();

        /// Returns the hyperbolic tangent.
        tanh / checked_tanh => tanh_with();

        /// Returns the inverse hyperbolic sine.
        asinh / checked_asinh => asinh_with();

        /// Returns the inverse hyperbolic cosine.  The domain is `x >= 1`.
        acosh / checked_acosh => acosh_with();

        /// Returns the inverse hyperbolic tangent.  The domain is
        /// `-1 < x < 1`.
        atanh / checked_atanh => atanh_with();

        /// Returns the Bessel function of the first kind of order `n`.
        cyl_bessel_j / checked_cyl_bessel_j => cyl_bessel_j_with(n: u32);
    }

    /// Splits this value into a mantissa `m` and exponent `e` such that
    /// `self = m * 2**e` and `0.5 <= |m| < 1`, or `(0, 0)` for zero.
    ///
    /// If this value has more significant bits than the type has fraction
    /// bits, the mantissa is rounded with this type's rounding mode.
    pub fn frexp(&self) -> (Self, i32) {
        let value = self.0.to_bigint();
        if value.is_zero() {
            return (Self::zero(), 0);
        }
        let f = Self::FRACTION_BITS as i64;
        let bits = value.bits() as i64;
        let mut mantissa = if bits > f {
            value.shr_round((bits - f) as u32, R::MODE)
        } else {
            value << (f - bits) as u32
        };
        let mut exponent = bits - f;
        if mantissa.bits() > f as u64 {
            // Rounded up to a magnitude of 1.
            mantissa = mantissa >> 1u32;
            exponent += 1;
        }
        let mantissa = Self::from_repr(I::from_unbounded(&mantissa, Self::ALL_BITS));
        (mantissa, exponent as i32)
    }
}
