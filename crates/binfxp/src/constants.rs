//! Mathematical constants, computed on first use and cached for the life of
//! the process.
//!
//! There are two caches in one registry.  Working-precision values, used by
//! the math kernels, are keyed by constant and precision, rounded up to a
//! multiple of 64 bits so that nearby precisions share an entry.  Values
//! rounded into a [FixedPoint] type are keyed by constant, range, resolution
//! and rounding mode, so that every type with the same format shares one
//! entry regardless of its storage or overflow mode.
//!
//! Each entry is a [OnceCell], so a constant is computed once even when
//! several threads ask for it at the same time.  The registry lock is held
//! only to find the entry, never while computing, which lets the computation
//! of one constant look up others.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use num_bigint::BigInt;
use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use crate::{
    fixed::OnOverflow,
    math::kernel,
    overflow::OverflowMode,
    rounding::{RoundMode, Rounding},
    storage::{Repr, Unbounded},
    ArithmeticError, FixedPoint,
};

/// A mathematical constant available through [FixedPoint::constant].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    /// `pi`, the ratio of a circle's circumference to its diameter.
    Pi,
    /// `pi / 2`.
    FracPi2,
    /// The natural logarithm of 2.
    Ln2,
    /// The natural logarithm of 10.
    Ln10,
    /// Euler's number, `e`.
    E,
    /// The golden ratio, `(1 + sqrt(5)) / 2`.
    Phi,
    /// The square root of 2.
    Sqrt2,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum CacheKey {
    Working {
        constant: Constant,
        precision: u32,
    },
    Type {
        constant: Constant,
        range: u32,
        resolution: i32,
        rounding: Rounding,
    },
}

static REGISTRY: Lazy<Mutex<HashMap<CacheKey, Arc<OnceCell<BigInt>>>>> = Lazy::new(Default::default);

/// Returns the cache entry for `key`, or computes it with `compute`.
fn cached(key: CacheKey, compute: impl FnOnce() -> BigInt) -> BigInt {
    let cell = {
        let mut registry = REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        registry.entry(key).or_default().clone()
    };
    cell.get_or_init(|| {
        debug!(?key, "computing constant");
        compute()
    })
    .clone()
}

/// Returns `constant` at working precision `p`, that is, times `2**p` and
/// truncated.
pub(crate) fn working(constant: Constant, p: u32) -> BigInt {
    let precision = p.div_ceil(64) * 64;
    let value = cached(CacheKey::Working { constant, precision }, || {
        compute(constant, precision)
    });
    value >> (precision - p)
}

fn compute(constant: Constant, p: u32) -> BigInt {
    // Room for the kernels' own rounding errors.
    let q = p + 16;
    let value = match constant {
        Constant::Pi => kernel::compute_pi(q),
        Constant::FracPi2 => working(Constant::Pi, q) >> 1u32,
        Constant::Ln2 => kernel::compute_ln2(q),
        Constant::Ln10 => kernel::ln(&(BigInt::from(10) << q), q),
        Constant::E => kernel::exp(&kernel::one(q), q),
        Constant::Phi => (kernel::one(q) + kernel::sqrt(&(BigInt::from(5) << q), q)) >> 1u32,
        Constant::Sqrt2 => kernel::sqrt(&(BigInt::from(2) << q), q),
    };
    value >> 16u32
}

impl<I, const RANGE: u32, const RESOLUTION: i32, R, O> FixedPoint<I, RANGE, RESOLUTION, R, O>
where
    I: Repr,
    R: RoundMode,
    O: OverflowMode,
{
    fn constant_with(constant: Constant, on_overflow: OnOverflow) -> Result<Self, ArithmeticError> {
        let key = CacheKey::Type {
            constant,
            range: RANGE,
            resolution: RESOLUTION,
            rounding: R::MODE,
        };
        let value = cached(key, || {
            working(constant, Self::FRACTION_BITS + 64).shr_round(64, R::MODE)
        });
        Self::narrow(&value, on_overflow)
    }

    /// Returns `constant` rounded into this type, or an error if it is out
    /// of range.
    pub fn checked_constant(constant: Constant) -> Result<Self, ArithmeticError> {
        Self::constant_with(constant, OnOverflow::Error)
    }

    /// Returns `constant` rounded into this type with its rounding mode.  If
    /// it is out of range, it is resolved with this type's overflow mode.
    pub fn constant(constant: Constant) -> Self {
        Self::constant_with(constant, OnOverflow::Policy)
            .unwrap_or_else(|error| panic!("{constant:?}: {error}"))
    }

    /// `pi`.
    pub fn pi() -> Self {
        Self::constant(Constant::Pi)
    }

    /// `pi / 2`.
    pub fn frac_pi_2() -> Self {
        Self::constant(Constant::FracPi2)
    }

    /// `ln(2)`.
    pub fn ln2() -> Self {
        Self::constant(Constant::Ln2)
    }

    /// `ln(10)`.
    pub fn ln10() -> Self {
        Self::constant(Constant::Ln10)
    }

    /// `e`.
    pub fn e() -> Self {
        Self::constant(Constant::E)
    }

    /// The golden ratio.
    pub fn phi() -> Self {
        Self::constant(Constant::Phi)
    }

    /// `sqrt(2)`.
    pub fn sqrt2() -> Self {
        Self::constant(Constant::Sqrt2)
    }
}
