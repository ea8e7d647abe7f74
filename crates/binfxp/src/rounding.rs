//! Rounding policies.
//!
//! Every operation that produces bits below a type's resolution funnels them
//! through [Rounding::round_away], so that construction, multiplication,
//! division, rescaling, square root and parsing all agree bit-for-bit.

use std::fmt::Debug;

/// How the bits discarded by an operation compare to half of the last
/// retained unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Remainder {
    /// Nothing nonzero was discarded.  The result is exact.
    Zero,

    /// The discarded part is nonzero but less than one half.
    BelowHalf,

    /// The discarded part is exactly one half.
    Half,

    /// The discarded part is more than one half.
    AboveHalf,
}

impl Remainder {
    /// Classifies a discarded remainder `r` against divisor `d`, given whether
    /// `r` is zero and the comparison of `2*r` with `d`.
    pub(crate) fn classify(is_zero: bool, twice_r_cmp_d: std::cmp::Ordering) -> Self {
        use std::cmp::Ordering::*;
        match (is_zero, twice_r_cmp_d) {
            (true, _) => Remainder::Zero,
            (false, Less) => Remainder::BelowHalf,
            (false, Equal) => Remainder::Half,
            (false, Greater) => Remainder::AboveHalf,
        }
    }
}

/// Runtime description of a rounding mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rounding {
    /// Whatever is cheapest.  In this crate, this truncates toward zero, the
    /// same as Rust integer division.
    Fastest,

    /// Truncate toward zero.
    TowardZero,

    /// Round toward negative infinity (floor).
    TowardNegInfinity,

    /// Round toward positive infinity (ceiling).
    TowardPosInfinity,

    /// Round to nearest, with ties away from zero.
    NearestAway,

    /// Round to nearest, with ties to an even last bit.
    NearestEven,

    /// Round to nearest, with ties to an odd last bit.
    NearestOdd,
}

impl Rounding {
    /// Given a value that has been truncated toward zero to magnitude `q`,
    /// whose sign is `negative`, whose low bit is `odd`, and whose discarded
    /// part is classified as `remainder`, returns true if the magnitude must
    /// be incremented by one unit.
    ///
    /// This is the only place in the crate where a rounding decision is made.
    pub const fn round_away(self, negative: bool, odd: bool, remainder: Remainder) -> bool {
        use Remainder::*;
        match self {
            Rounding::Fastest | Rounding::TowardZero => false,
            Rounding::TowardNegInfinity => negative && !matches!(remainder, Zero),
            Rounding::TowardPosInfinity => !negative && !matches!(remainder, Zero),
            Rounding::NearestAway => matches!(remainder, Half | AboveHalf),
            Rounding::NearestEven => match remainder {
                AboveHalf => true,
                Half => odd,
                _ => false,
            },
            Rounding::NearestOdd => match remainder {
                AboveHalf => true,
                Half => !odd,
                _ => false,
            },
        }
    }

    /// Returns true if this is one of the round-to-nearest modes.
    pub const fn is_nearest(self) -> bool {
        matches!(
            self,
            Rounding::NearestAway | Rounding::NearestEven | Rounding::NearestOdd
        )
    }
}

/// Compile-time rounding mode, supplied to [FixedPoint] as a type parameter.
///
/// [FixedPoint]: crate::FixedPoint
pub trait RoundMode: Copy + Clone + Debug + Default + Send + Sync + 'static {
    /// The mode this marker selects.
    const MODE: Rounding;
}

macro_rules! round_mode {
    ($(#[$meta:meta])* $name:ident => $mode:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name;

        impl RoundMode for $name {
            const MODE: Rounding = Rounding::$mode;
        }
    };
}

round_mode!(
    /// Truncate in whatever way is fastest (toward zero).
    Fastest => Fastest
);
round_mode!(
    /// Truncate toward zero.
    TowardZero => TowardZero
);
round_mode!(
    /// Round toward negative infinity.
    TowardNegInfinity => TowardNegInfinity
);
round_mode!(
    /// Round toward positive infinity.
    TowardPosInfinity => TowardPosInfinity
);
round_mode!(
    /// Round to nearest, ties away from zero.
    NearestAway => NearestAway
);
round_mode!(
    /// Round to nearest, ties to even.
    NearestEven => NearestEven
);
round_mode!(
    /// Round to nearest, ties to odd.
    NearestOdd => NearestOdd
);

#[cfg(test)]
mod test {
    use super::{Remainder, Rounding};

    /// Rounds `x / 4` to an integer using the shared routine.
    fn quarter(x: i64, rounding: Rounding) -> i64 {
        let negative = x < 0;
        let q = x.unsigned_abs() / 4;
        let r = x.unsigned_abs() % 4;
        let remainder = Remainder::classify(r == 0, (2 * r).cmp(&4));
        let q = q + rounding.round_away(negative, q % 2 == 1, remainder) as u64;
        if negative {
            -(q as i64)
        } else {
            q as i64
        }
    }

    #[test]
    fn modes() {
        // Inputs are quarters: -2.5, -2.25, -1.5, -0.75, 0.5, 1.5, 2.25, 2.5, 2.75.
        let inputs = [-10, -9, -6, -3, 2, 6, 9, 10, 11];
        for (rounding, expect) in [
            (Rounding::Fastest, [-2, -2, -1, 0, 0, 1, 2, 2, 2]),
            (Rounding::TowardZero, [-2, -2, -1, 0, 0, 1, 2, 2, 2]),
            (Rounding::TowardNegInfinity, [-3, -3, -2, -1, 0, 1, 2, 2, 2]),
            (Rounding::TowardPosInfinity, [-2, -2, -1, 0, 1, 2, 3, 3, 3]),
            (Rounding::NearestAway, [-3, -2, -2, -1, 1, 2, 2, 3, 3]),
            (Rounding::NearestEven, [-2, -2, -2, -1, 0, 2, 2, 2, 3]),
            (Rounding::NearestOdd, [-3, -2, -1, -1, 1, 1, 2, 3, 3]),
        ] {
            let actual = inputs.map(|x| quarter(x, rounding));
            assert_eq!(actual, expect, "{rounding:?}");
        }
    }

    #[test]
    fn exact_values_are_untouched() {
        for rounding in [
            Rounding::Fastest,
            Rounding::TowardZero,
            Rounding::TowardNegInfinity,
            Rounding::TowardPosInfinity,
            Rounding::NearestAway,
            Rounding::NearestEven,
            Rounding::NearestOdd,
        ] {
            for x in -40..=40 {
                assert_eq!(quarter(x * 4, rounding), x);
            }
        }
    }
}
