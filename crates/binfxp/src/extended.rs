//! Storage wider than 128 bits.

use num_bigint::BigInt;
use num_traits::{One, ToPrimitive};

use crate::storage::{bigint_to_f64, Repr, Sealed, Unbounded};

/// A signed integer of `BITS` bits, for fixed-point formats too wide for
/// `i128`.
///
/// The value is always kept within `BITS`-bit two's complement range.
/// [FixedPoint] selects this type automatically through the [fixed_point]
/// macro; `BITS` is then the format's width rounded up to a multiple of 32.
///
/// [FixedPoint]: crate::FixedPoint
/// [fixed_point]: crate::fixed_point
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Extended<const BITS: u32>(BigInt);

impl<const BITS: u32> Extended<BITS> {
    /// Returns `value` wrapped into `BITS`-bit two's complement.
    pub fn from_bigint(value: BigInt) -> Self {
        Self(wrap(value, BITS))
    }

    /// Returns the underlying integer.
    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }
}

/// Wraps `value` into `bits`-bit two's complement.
fn wrap(value: BigInt, bits: u32) -> BigInt {
    if value.fits(bits) {
        value
    } else {
        let modulus = BigInt::one() << bits;
        let low = value & (&modulus - 1u32);
        if low.bits() == bits as u64 {
            low - modulus
        } else {
            low
        }
    }
}

impl<const BITS: u32> Sealed for Extended<BITS> {}

impl<const BITS: u32> Repr for Extended<BITS> {
    const BITS: u32 = BITS;

    type Wide = BigInt;

    fn widen(&self) -> Self::Wide {
        self.0.clone()
    }

    fn widening_mul(&self, other: &Self) -> Self::Wide {
        &self.0 * &other.0
    }

    fn from_unbounded<U: Unbounded>(value: &U, bits: u32) -> Self {
        Self(wrap(value.to_bigint(), bits))
    }

    fn min_for(bits: u32) -> Self {
        Self(-(BigInt::one() << (bits - 1)))
    }

    fn max_for(bits: u32) -> Self {
        Self((BigInt::one() << (bits - 1)) - 1u32)
    }

    fn to_i128(&self) -> Option<i128> {
        self.0.to_i128()
    }

    fn to_bigint(&self) -> BigInt {
        self.0.clone()
    }

    fn is_negative(&self) -> bool {
        Unbounded::is_negative(&self.0)
    }

    fn is_zero(&self) -> bool {
        Unbounded::is_zero(&self.0)
    }

    fn to_f64(&self, exp2: i32) -> f64 {
        bigint_to_f64(&self.0, exp2)
    }
}

#[cfg(test)]
mod test {
    use num_bigint::BigInt;

    use super::Extended;
    use crate::storage::Repr;

    type E = Extended<160>;

    #[test]
    fn wrapping() {
        let one = BigInt::from(1);
        assert_eq!(E::from_bigint(&one << 159u32).as_bigint(), &-(&one << 159u32));
        assert_eq!(E::from_bigint((&one << 160u32) + 5u32).as_bigint(), &BigInt::from(5));
        assert_eq!(E::from_bigint(BigInt::from(-5)).as_bigint(), &BigInt::from(-5));
        assert_eq!(
            E::from_unbounded(&((&one << 139u32) + 3u32), 140).as_bigint(),
            &(-(&one << 139u32) + 3u32)
        );
        assert_eq!(E::from_unbounded(&-(&one << 139u32), 140).as_bigint(), &-(&one << 139u32));
        assert_eq!(E::max_for(140).as_bigint(), &((&one << 139u32) - 1u32));
        assert!(E::min_for(140) < E::from_bigint(BigInt::from(0)));
    }

    #[test]
    fn conversions() {
        let x = E::from_bigint(BigInt::from(-3) << 150u32);
        assert_eq!(x.to_i128(), None);
        assert_eq!(x.to_f64(-150), -3.0);
        assert_eq!(E::from_bigint(BigInt::from(7)).to_i128(), Some(7));
        assert_eq!(x.widening_mul(&x), BigInt::from(9) << 300u32);
    }
}
