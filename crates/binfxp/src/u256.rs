//! Routines for 256-bit integer arithmetic.
//!
//! [I256] is the double-width partner of `i128` storage.  It is only as
//! general as fixed-point arithmetic needs: products of two `i128`s, `i128`s
//! shifted left by up to 128 bits, and their sums.

use std::{
    cmp::Ordering,
    fmt::Debug,
    ops::{Add, Shl, Shr, Sub},
};

use num_bigint::{BigInt, BigUint};
use num_traits::Zero;

use crate::{
    rounding::{Remainder, Rounding},
    storage::{classify_sqrt, isqrt_rem_u128, with_sign, Sealed, Unbounded},
};

const fn lo(x: u128) -> u128 {
    x & ((1 << 64) - 1)
}
const fn hi(x: u128) -> u128 {
    x >> 64
}
const fn hi_lo(x: u128) -> (u128, u128) {
    (hi(x), lo(x))
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct U256(u128, u128);

impl U256 {
    pub const ZERO: Self = U256(0, 0);
    pub const ONE: Self = U256(0, 1);

    /// Returns `x * y`.
    ///
    /// This could use [u128::widening_mul] if that's ever stabilized.
    pub const fn from_product(x: u128, y: u128) -> Self {
        // Grade-school multiplication:
        //
        // ```ignore
        //        a  b
        //    ×   c  d
        // -----------
        //       ad bd
        // +  ac bc
        // -----------
        //       |---| sum0
        // |---| sum1
        // ```

        let (a, b) = hi_lo(x);
        let (c, d) = hi_lo(y);

        // These can't overflow and `wrapping_mul` doesn't waste time checking.
        let ad = a.wrapping_mul(d);
        let bd = b.wrapping_mul(d);
        let ac = a.wrapping_mul(c);
        let bc = b.wrapping_mul(c);

        // Calculate lower half of result and carry-outs.
        let (sum0, carry0) = bd.overflowing_add(ad << 64);
        let (sum0, carry1) = sum0.overflowing_add(bc << 64);

        // Calculate upper half of result, incorporating carry-ins.
        let sum1 = ac
            .wrapping_add(hi(ad))
            .wrapping_add(hi(bc))
            .wrapping_add(carry0 as u128)
            .wrapping_add(carry1 as u128);
        Self(sum1, sum0)
    }

    /// Returns `floor(sqrt(self))`.
    pub fn isqrt(&self) -> u128 {
        if self.0 == 0 {
            isqrt_rem_u128(self.1).0
        } else {
            let small_candidate = (self >> 2).isqrt() << 1;
            let large_candidate = small_candidate + 1;
            let product = U256::from_product(large_candidate, large_candidate);
            if product > *self {
                small_candidate
            } else {
                large_candidate
            }
        }
    }

    /// Divides by `v` and returns the quotient and remainder if the quotient
    /// fits in `u128` or `None` otherwise.
    ///
    /// Algorithm from H. S. Warren, _Hacker's Delight, 2nd Ed._, Fig. 9-3.
    pub fn narrowing_div_rem(self, v: u128) -> Option<(u128, u128)> {
        let Self(u1, u0) = self;
        if v == 0 {
            None
        } else if u1 == 0 {
            Some((u0 / v, u0 % v))
        } else if u1 >= v {
            None
        } else {
            // We're doing grade-school division in base 2**64.  This is the number
            // base.
            const BASE: u128 = 1 << 64;

            // Shift `v` so that it occupies the most-significant bits.
            let s = v.leading_zeros();
            let v = v << s;

            let (vn1, vn0) = hi_lo(v);
            let un32 = (u1 << s) | u0.unbounded_shr(128 - s);
            let (un1, un0) = hi_lo(u0 << s);

            let mut q1 = un32 / vn1;
            let mut rhat = un32 - q1 * vn1;
            while q1 >= BASE || q1 * vn0 > BASE * rhat + un1 {
                q1 -= 1;
                rhat += vn1;
                if rhat >= BASE {
                    break;
                }
            }

            let un21 = un32
                .wrapping_mul(BASE)
                .wrapping_add(un1)
                .wrapping_sub(q1.wrapping_mul(v));

            let mut q0 = un21 / vn1;
            let mut rhat = un21 - q0 * vn1;
            while q0 >= BASE || q0 * vn0 > BASE * rhat + un0 {
                q0 -= 1;
                rhat += vn1;
                if rhat >= BASE {
                    break;
                }
            }

            // The true remainder is less than `v`, so wrapping arithmetic
            // recovers it exactly.
            let remainder = un21
                .wrapping_mul(BASE)
                .wrapping_add(un0)
                .wrapping_sub(q0.wrapping_mul(v))
                >> s;

            Some((q1 * BASE + q0, remainder))
        }
    }

    fn to_biguint(self) -> BigUint {
        (BigUint::from(self.0) << 128u32) | BigUint::from(self.1)
    }
}

impl Debug for U256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:032x}:{:032x}]", self.0, self.1)
    }
}

impl Add for U256 {
    type Output = U256;

    fn add(self, other: U256) -> Self::Output {
        let (sum0, carry) = self.1.overflowing_add(other.1);
        let sum1 = self.0.wrapping_add(other.0).wrapping_add(carry as u128);
        Self(sum1, sum0)
    }
}

impl Sub for U256 {
    type Output = U256;

    fn sub(self, other: U256) -> Self::Output {
        let (diff0, borrow) = self.1.overflowing_sub(other.1);
        let diff1 = self.0.wrapping_sub(other.0).wrapping_sub(borrow as u128);
        Self(diff1, diff0)
    }
}

impl Shr<u32> for &U256 {
    type Output = U256;

    fn shr(self, n: u32) -> Self::Output {
        U256(
            self.0.unbounded_shr(n),
            self.1.unbounded_shr(n)
                | self.0.unbounded_shl(128u32.wrapping_sub(n))
                | self.0.unbounded_shr(n.wrapping_sub(128)),
        )
    }
}

impl Shl<u32> for &U256 {
    type Output = U256;

    fn shl(self, n: u32) -> Self::Output {
        U256(
            self.0.unbounded_shl(n)
                | self.1.unbounded_shr(128u32.wrapping_sub(n))
                | self.1.unbounded_shl(n.wrapping_sub(128)),
            self.1.unbounded_shl(n),
        )
    }
}

impl Zero for U256 {
    fn zero() -> Self {
        Self::ZERO
    }

    fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl From<u128> for U256 {
    fn from(value: u128) -> Self {
        Self(0, value)
    }
}

/// A 256-bit signed integer in sign-magnitude form.
#[derive(Copy, Clone, Debug)]
pub struct I256 {
    value: U256,
    negative: bool,
}

impl I256 {
    /// Returns `x * y`.
    pub fn from_product(x: i128, y: i128) -> Self {
        Self {
            value: U256::from_product(x.unsigned_abs(), y.unsigned_abs()),
            negative: (x < 0) != (y < 0),
        }
    }

    /// Converts `value`, whose magnitude must be less than `2**256`.
    fn from_bigint(value: &BigInt) -> Self {
        let mut digits = value.magnitude().iter_u64_digits();
        let mut limb = || digits.next().unwrap_or(0) as u128;
        let low = limb() | (limb() << 64);
        let high = limb() | (limb() << 64);
        Self {
            value: U256(high, low),
            negative: Unbounded::is_negative(value),
        }
    }

    fn with_magnitude(&self, value: U256) -> Self {
        Self {
            value,
            negative: self.negative,
        }
    }
}

impl Add for I256 {
    type Output = I256;

    fn add(self, other: Self) -> Self::Output {
        if self.negative == other.negative {
            Self {
                value: self.value + other.value,
                negative: self.negative,
            }
        } else if other.value <= self.value {
            Self {
                value: self.value - other.value,
                negative: self.negative,
            }
        } else {
            Self {
                value: other.value - self.value,
                negative: other.negative,
            }
        }
    }
}

impl From<i128> for I256 {
    fn from(value: i128) -> Self {
        Self {
            value: U256::from(value.unsigned_abs()),
            negative: value < 0,
        }
    }
}

impl Sealed for I256 {}

impl Unbounded for I256 {
    fn is_negative(&self) -> bool {
        self.negative && self.value != U256::ZERO
    }

    fn is_zero(&self) -> bool {
        self.value == U256::ZERO
    }

    fn add(&self, other: &Self) -> Self {
        *self + *other
    }

    fn sub(&self, other: &Self) -> Self {
        *self + other.neg()
    }

    fn neg(&self) -> Self {
        Self {
            value: self.value,
            negative: !self.negative,
        }
    }

    fn shl(&self, n: u32) -> Self {
        self.with_magnitude(&self.value << n)
    }

    fn shr_round(&self, n: u32, rounding: Rounding) -> Self {
        if n == 0 {
            return *self;
        }
        let q = &self.value >> n;
        let r = self.value - (&q << n);
        let half_cmp = if n > 256 {
            Ordering::Less
        } else {
            r.cmp(&(&U256::ONE << (n - 1)))
        };
        let remainder = Remainder::classify(r.is_zero(), half_cmp);
        let q = if rounding.round_away(self.is_negative(), q.1 & 1 == 1, remainder) {
            q + U256::ONE
        } else {
            q
        };
        self.with_magnitude(q)
    }

    fn div_round(&self, divisor: &Self, rounding: Rounding) -> Self {
        let negative = self.is_negative() != divisor.is_negative();
        match (divisor.value.0, self.value.narrowing_div_rem(divisor.value.1)) {
            (0, Some((q, r))) => {
                let d = divisor.value.1;
                // Compares `2*r` against `d` without overflowing.
                let remainder = Remainder::classify(r == 0, r.cmp(&(d - r)));
                let q = U256::from(q);
                let q = if rounding.round_away(negative, q.1 & 1 == 1, remainder) {
                    q + U256::ONE
                } else {
                    q
                };
                Self { value: q, negative }
            }
            _ => Self::from_bigint(&self.to_bigint().div_round(&divisor.to_bigint(), rounding)),
        }
    }

    fn isqrt_round(&self, rounding: Rounding) -> Self {
        debug_assert!(!self.is_negative());
        let root = self.value.isqrt();
        let rem = self.value - U256::from_product(root, root);
        let root = U256::from(root);
        let remainder = classify_sqrt(&root, &rem);
        let root = if rounding.round_away(false, root.1 & 1 == 1, remainder) {
            root + U256::ONE
        } else {
            root
        };
        Self {
            value: root,
            negative: false,
        }
    }

    fn fits(&self, bits: u32) -> bool {
        if bits > 256 {
            return true;
        }
        let limit = &U256::ONE << (bits - 1);
        if self.is_negative() {
            self.value <= limit
        } else {
            self.value < limit
        }
    }

    fn low_i128(&self) -> i128 {
        let low = self.value.1 as i128;
        if self.is_negative() {
            low.wrapping_neg()
        } else {
            low
        }
    }

    fn to_bigint(&self) -> BigInt {
        with_sign(self.is_negative(), self.value.to_biguint())
    }
}

#[cfg(test)]
mod test {
    use itertools::Itertools;
    use num_bigint::{BigInt, BigUint};
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::{I256, U256};
    use crate::{rounding::Rounding, storage::Unbounded};

    /// Iterator for 32 key values of `u64`.
    ///
    /// This iterates through all the possible 1-bit values of `a`, `b`, `c`,
    /// `d`, and `e`, producing the bit patterns shown below:
    ///
    /// ```ignore
    /// abccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccde
    /// ```
    ///
    /// This tries to exercise arithmetic tests for all the ways that carry may
    /// or may not occur (especially with `c = 1`).
    #[derive(Clone)]
    struct Values64(u64);
    impl Iterator for Values64 {
        type Item = u64;

        fn next(&mut self) -> Option<Self::Item> {
            if self.0 < (1 << 5) {
                // Bits 62,63 come from bits 3,4.
                let high = (self.0 & 0b11000) << 59;

                // Copy bit 3 into all the middle bits 2..=61.
                //
                // This ensures that we test cases that require carries.
                let mid = if (self.0 & 0b100) != 0 {
                    (u64::MAX >> 4) << 2
                } else {
                    0
                };

                // Bits 0,1 come from bits 0,1.
                let low = self.0 & 0b11;

                self.0 += 1;
                Some(low | mid | high)
            } else {
                None
            }
        }
    }

    fn u128_from_hi_lo(hi: u64, lo: u64) -> u128 {
        (u128::from(hi) << 64) | u128::from(lo)
    }

    // Iterator for 1,024 key values of u128.
    fn values128() -> impl Iterator<Item = u128> + Clone {
        Values64(0)
            .cartesian_product(Values64(0))
            .map(|(a, b)| u128_from_hi_lo(a, b))
    }

    // Iterator for 32,768 key values of U256.
    fn values256() -> impl Iterator<Item = U256> {
        Values64(0)
            .cartesian_product(Values64(0))
            .cartesian_product(Values64(0))
            .map(|((a, b), c)| U256(u128_from_hi_lo(a, b), u128_from_hi_lo(b, c)))
    }

    #[test]
    fn u256_from_product() {
        for x in values128() {
            for y in values128() {
                let product_u256 = U256::from_product(x, y);
                let product_biguint = BigUint::from(x) * BigUint::from(y);
                assert_eq!(product_biguint, product_u256.to_biguint());
            }
        }
    }

    #[test]
    fn u256_narrowing_div_rem() {
        for u in values256() {
            for v in values128() {
                match u.narrowing_div_rem(v) {
                    None => assert!(u.0 >= v || v == 0,),
                    Some((q, r)) => {
                        assert!(r < v);
                        assert_eq!(U256::from_product(q, v) + U256::from(r), u);
                    }
                }
            }
        }
    }

    #[test]
    fn u256_isqrt() {
        for value in values256() {
            let root = value.isqrt();
            assert!(U256::from_product(root, root) <= value);
            if root < u128::MAX {
                assert!(
                    U256::from_product(root + 1, root + 1) > value,
                    "{:032x}:{:032x} => {root:032x}",
                    value.0,
                    value.1
                );
            }
        }
    }

    #[test]
    fn u256_shifts() {
        for value in values256().step_by(7) {
            let big = value.to_biguint();
            for n in [0, 1, 63, 64, 65, 127, 128, 129, 200, 255, 256, 300] {
                assert_eq!((&value >> n).to_biguint(), &big >> n, "{value:?} >> {n}");
                let mask = (BigUint::from(1u32) << 256u32) - 1u32;
                assert_eq!((&value << n).to_biguint(), (&big << n) & mask, "{value:?} << {n}");
            }
        }
    }

    /// `I256` rounding agrees with `BigInt` rounding for products and shifted
    /// dividends of random `i128`s.
    #[test]
    fn i256_rounding() {
        let mut rng = SmallRng::seed_from_u64(256);
        let roundings = [
            Rounding::TowardZero,
            Rounding::TowardNegInfinity,
            Rounding::TowardPosInfinity,
            Rounding::NearestAway,
            Rounding::NearestEven,
            Rounding::NearestOdd,
        ];
        for _ in 0..5_000 {
            let x: i128 = rng.gen::<i128>() >> rng.gen_range(0..127);
            let y: i128 = rng.gen::<i128>() >> rng.gen_range(0..127);
            let n = rng.gen_range(0..260);
            let product = I256::from_product(x, y);
            let big = BigInt::from(x) * BigInt::from(y);
            assert_eq!(product.to_bigint(), big);
            for rounding in roundings {
                assert_eq!(
                    product.shr_round(n, rounding).to_bigint(),
                    big.shr_round(n, rounding),
                    "{x} * {y} >> {n} {rounding:?}"
                );
                if y != 0 {
                    let shift = rng.gen_range(0..=128);
                    let dividend = I256::from(x).shl(shift);
                    assert_eq!(
                        dividend.div_round(&I256::from(y), rounding).to_bigint(),
                        (BigInt::from(x) << shift).div_round(&BigInt::from(y), rounding),
                        "({x} << {shift}) / {y} {rounding:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn i256_fits() {
        let min = I256::from(i128::MIN);
        assert!(min.fits(128));
        assert!(!min.sub(&I256::from(1)).fits(128));
        assert!(I256::from(i128::MAX).fits(128));
        assert!(!I256::from(i128::MAX).add(&I256::from(1)).fits(128));
        assert_eq!(I256::from(-5).low_i128(), -5);
        assert_eq!(I256::from_product(i128::MIN, -1).to_bigint(), -BigInt::from(i128::MIN));
    }
}
