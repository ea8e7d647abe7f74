//! Overflow policies.

use std::fmt::Debug;

use crate::{
    storage::{Repr, Unbounded},
    ArithmeticError,
};

/// Runtime description of an overflow mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Overflow {
    /// Overflow is a bug in the caller.  The result wraps, which is what the
    /// hardware does anyway.
    Undefined,

    /// Results clamp to the type's minimum or maximum.
    Saturate,

    /// Results wrap modulo `2**ALL_BITS`.
    Modulo,

    /// Overflow panics in operators and is reported as
    /// [ArithmeticError::Overflow] elsewhere.
    Throw,

    /// The program has been shown not to overflow.  Debug builds check the
    /// claim and panic if it is wrong; release builds wrap.
    Impossible,
}

/// Compile-time overflow mode, supplied to [FixedPoint] as a type parameter.
///
/// [FixedPoint]: crate::FixedPoint
pub trait OverflowMode: Copy + Clone + Debug + Default + Send + Sync + 'static {
    /// The mode this marker selects.
    const MODE: Overflow;
}

macro_rules! overflow_mode {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name;

        impl OverflowMode for $name {
            const MODE: Overflow = Overflow::$name;
        }
    };
}

overflow_mode!(
    /// Overflow wraps silently.  This is the default.
    Undefined
);
overflow_mode!(
    /// Overflow clamps to the nearest bound.
    Saturate
);
overflow_mode!(
    /// Overflow wraps modulo `2**ALL_BITS`.
    Modulo
);
overflow_mode!(
    /// Overflow is an error.
    Throw
);
overflow_mode!(
    /// Overflow cannot happen.  Checked in debug builds.
    Impossible
);

/// Narrows `value`, an exact intermediate result, to `bits` bits of two's
/// complement storage of type `I`, resolving overflow according to `mode`.
///
/// Returns an error only for [Overflow::Throw].
pub(crate) fn resolve<I, U>(mode: Overflow, value: &U, bits: u32) -> Result<I, ArithmeticError>
where
    I: Repr,
    U: Unbounded,
{
    if value.fits(bits) {
        return Ok(I::from_unbounded(value, bits));
    }
    match mode {
        Overflow::Undefined | Overflow::Modulo => Ok(I::from_unbounded(value, bits)),
        Overflow::Saturate => Ok(if value.is_negative() {
            I::min_for(bits)
        } else {
            I::max_for(bits)
        }),
        Overflow::Throw => Err(ArithmeticError::Overflow),
        Overflow::Impossible => {
            if cfg!(debug_assertions) {
                panic!("fixed-point overflow in a type declared never to overflow");
            }
            Ok(I::from_unbounded(value, bits))
        }
    }
}

/// Narrows `value` to `bits` bits of `I`, reporting any overflow as an error
/// regardless of the type's overflow mode.
pub(crate) fn checked<I, U>(value: &U, bits: u32) -> Result<I, ArithmeticError>
where
    I: Repr,
    U: Unbounded,
{
    if value.fits(bits) {
        Ok(I::from_unbounded(value, bits))
    } else {
        Err(ArithmeticError::Overflow)
    }
}
