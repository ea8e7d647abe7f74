//! Elementary functions at working precision.
//!
//! A working-precision number is a [BigInt] `n` that stands for `n * 2**-p`
//! for a precision `p` chosen by the caller.  The kernels here are accurate
//! to a few units in the last place of `p`, so callers pick `p` with enough
//! guard bits that the error disappears when the result is rounded into its
//! final type.

use num_bigint::{BigInt, Sign};
use num_traits::{One, ToPrimitive};
use tracing::warn;

use crate::{
    constants::{working, Constant},
    rounding::Rounding,
    storage::Unbounded,
};

/// Maximum number of terms summed by any series, or steps taken by any
/// iteration, before giving up on convergence.
pub(crate) const MAX_ITERATIONS: u32 = 10_000;

/// Extra bits that the kernels carry internally.
const GUARD: u32 = 32;

/// Returns 1 at precision `p`.
pub(crate) fn one(p: u32) -> BigInt {
    BigInt::one() << p
}

pub(crate) fn mul(a: &BigInt, b: &BigInt, p: u32) -> BigInt {
    (a * b) >> p
}

pub(crate) fn div(a: &BigInt, b: &BigInt, p: u32) -> BigInt {
    (a << p) / b
}

/// Returns `sqrt(a)` for `a >= 0`.
pub(crate) fn sqrt(a: &BigInt, p: u32) -> BigInt {
    (a << p).isqrt_round(Rounding::TowardZero)
}

/// Returns `sqrt(a * b)` for `a * b >= 0`, without rounding the product to
/// precision `p` first, which loses most of its bits when one factor is tiny.
pub(crate) fn sqrt_of_product(a: &BigInt, b: &BigInt) -> BigInt {
    (a * b).isqrt_round(Rounding::TowardZero)
}

pub(crate) fn abs(a: &BigInt) -> BigInt {
    if a.is_negative() {
        -a
    } else {
        a.clone()
    }
}

/// Returns `a * 2**shift`, truncating if `shift` is negative.
pub(crate) fn scale(a: BigInt, shift: i64) -> BigInt {
    if shift >= 0 {
        a << u32::try_from(shift).unwrap_or(u32::MAX)
    } else {
        a >> u32::try_from(shift.unsigned_abs()).unwrap_or(u32::MAX)
    }
}

/// Number of bits in the magnitude of `n`.
fn bits_of(n: i64) -> u32 {
    64 - n.unsigned_abs().leading_zeros()
}

/// Returns `first + t1 + t2 + ...`, where `t[i] = next(t[i - 1], i)`,
/// stopping at the first zero term.
pub(crate) fn sum_series(first: BigInt, next: impl FnMut(&BigInt, u32) -> BigInt, what: &str) -> BigInt {
    sum_series_up_to(first, next, MAX_ITERATIONS, what)
}

/// Like [sum_series], for a series known to need up to `limit` terms.
fn sum_series_up_to(
    first: BigInt,
    mut next: impl FnMut(&BigInt, u32) -> BigInt,
    limit: u32,
    what: &str,
) -> BigInt {
    let mut sum = first.clone();
    let mut term = first;
    for i in 1..=limit {
        term = next(&term, i);
        if term.is_zero() {
            return sum;
        }
        sum += &term;
    }
    warn!("{what} series did not converge in {limit} terms");
    sum
}

/// Returns the arithmetic-geometric mean of `a` and `b`, both positive.
pub(crate) fn agm(mut a: BigInt, mut b: BigInt, p: u32) -> BigInt {
    for _ in 0..MAX_ITERATIONS {
        if abs(&(&a - &b)).bits() <= 2 {
            return a;
        }
        let next = (&a + &b) >> 1u32;
        b = sqrt_of_product(&a, &b);
        a = next;
    }
    warn!("arithmetic-geometric mean did not converge at precision {p}");
    a
}

/// Returns `pi`, by the Gauss-Legendre algorithm.
pub(crate) fn compute_pi(p: u32) -> BigInt {
    let w = p + GUARD;
    let one = one(w);
    let mut a = one.clone();
    let mut b = sqrt(&(&one >> 1u32), w);
    let mut t = &one >> 2u32;
    let mut doublings = 0u32;
    for _ in 0..MAX_ITERATIONS {
        let next = (&a + &b) >> 1u32;
        let diff = &a - &next;
        b = sqrt_of_product(&a, &b);
        t -= mul(&diff, &diff, w) << doublings;
        doublings += 1;
        a = next;
        if abs(&(&a - &b)).bits() <= 2 {
            let sum = &a + &b;
            return div(&mul(&sum, &sum, w), &(t << 2u32), w) >> GUARD;
        }
    }
    warn!("pi did not converge at precision {p}");
    let sum = &a + &b;
    div(&mul(&sum, &sum, w), &(t << 2u32), w) >> GUARD
}

/// Returns `ln(2)`, using `ln(2**m) ~= pi / (2 * agm(1, 4 / 2**m))` for
/// `2**m` much larger than `2**(p / 2)`.
pub(crate) fn compute_ln2(p: u32) -> BigInt {
    let m = p / 2 + 8;
    let w = p + m + GUARD;
    let pi = working(Constant::Pi, w);
    let mean = agm(one(w), one(w) >> (m - 2), w);
    div(&pi, &(mean * (2 * m)), w) >> (w - p)
}

/// Returns `e**x`.
///
/// `x` must be less than `2**32`, which keeps the result's exponent
/// representable.
pub(crate) fn exp(x: &BigInt, p: u32) -> BigInt {
    // `e**-p < 2**-p`.
    if *x < -(BigInt::from(p) << p) {
        return BigInt::ZERO;
    }

    // Reduce to `x = k * ln(2) + r` with `|r| <= ln(2) / 2`.
    let k = (x << 8u32).div_round(&working(Constant::Ln2, p + 8), Rounding::NearestEven);
    let k = k.to_i64().unwrap_or(i64::MAX);
    let k_bits = bits_of(k);

    // `e**r` is computed as `(e**(r / 2**HALVINGS))**(2**HALVINGS)`, each
    // squaring doubling the relative error, and then scaled by `2**k`.
    const HALVINGS: u32 = 8;
    let q = p
        .saturating_add(GUARD + HALVINGS)
        .saturating_add(u32::try_from(k.max(0)).unwrap_or(u32::MAX));
    let ln2 = working(Constant::Ln2, q + k_bits);
    let r = ((x << (q - p + k_bits)) - ln2 * k) >> (k_bits + HALVINGS);
    let mut y = sum_series(one(q), |term, i| mul(term, &r, q) / i, "exponential");
    for _ in 0..HALVINGS {
        y = mul(&y, &y, q);
    }
    scale(y, k - (q - p) as i64)
}

/// Returns `ln(x)` for `x > 0`.
pub(crate) fn ln(x: &BigInt, p: u32) -> BigInt {
    // Split `x = m * 2**e` with `m` in `[0.75, 1.5)`.
    let mut e = x.bits() as i64 - 1 - p as i64;
    let q = p + GUARD;
    let mut m = scale(x.clone(), q as i64 - p as i64 - e);
    if m > one(q) + (one(q) >> 1u32) {
        m >>= 1u32;
        e += 1;
    }

    // `ln(m) = 2 * atanh((m - 1) / (m + 1))`, with `|z| < 1/5`.
    let z = div(&(&m - one(q)), &(&m + one(q)), q);
    let z2 = mul(&z, &z, q);
    let mut power = z.clone();
    let atanh = sum_series(
        z,
        |_, i| {
            power = mul(&power, &z2, q);
            &power / (2 * i + 1)
        },
        "logarithm",
    );

    let e_bits = bits_of(e);
    let ln2 = working(Constant::Ln2, q + e_bits);
    ((atanh << 1u32) + ((ln2 * e) >> e_bits)) >> (q - p)
}

/// Returns `(sin(x), cos(x))`.
pub(crate) fn sin_cos(x: &BigInt, p: u32) -> (BigInt, BigInt) {
    // Reduce to `x = k * pi/2 + r` with `|r| <= pi/4`, carrying enough bits
    // of `pi` that `k * pi/2` is exact to precision `q`.
    let k = (x << 8u32).div_round(&working(Constant::FracPi2, p + 8), Rounding::NearestEven);
    let k_bits = k.bits() as u32;
    let q = p + GUARD;
    let half_pi = working(Constant::FracPi2, q + k_bits);
    let r = ((x << (q - p + k_bits)) - half_pi * &k) >> k_bits;

    let r2 = mul(&r, &r, q);
    let sin = sum_series(
        r.clone(),
        |term, i| -(mul(term, &r2, q) / ((2 * i) * (2 * i + 1))),
        "sine",
    );
    let cos = sum_series(
        one(q),
        |term, i| -(mul(term, &r2, q) / ((2 * i - 1) * (2 * i))),
        "cosine",
    );

    let quadrant = (&k & BigInt::from(3)).to_u8().unwrap_or_default();
    let (sin, cos) = match quadrant {
        0 => (sin, cos),
        1 => (cos, -sin),
        2 => (-sin, -cos),
        _ => (-cos, sin),
    };
    (sin >> (q - p), cos >> (q - p))
}

/// Returns `atan(x)`.
pub(crate) fn atan(x: &BigInt, p: u32) -> BigInt {
    let q = p + GUARD;
    let one = one(q);
    let x_abs = abs(x) << (q - p);

    // `atan(x) = pi/2 - atan(1/x)` for `x > 1`.
    let (mut t, complement) = if x_abs > one {
        (div(&one, &x_abs, q), true)
    } else {
        (x_abs, false)
    };

    // `atan(t) = 2 * atan(t / (1 + sqrt(1 + t**2)))`, three times, so that
    // `t <= tan(pi/32)`.
    const HALVINGS: u32 = 3;
    for _ in 0..HALVINGS {
        let root = sqrt(&(&one + mul(&t, &t, q)), q);
        t = div(&t, &(&one + root), q);
    }

    let t2 = mul(&t, &t, q);
    let mut power = t.clone();
    let series = sum_series(
        t,
        |_, i| {
            power = -mul(&power, &t2, q);
            &power / (2 * i + 1)
        },
        "arctangent",
    );
    let mut y = series << HALVINGS;
    if complement {
        y = working(Constant::FracPi2, q) - y;
    }
    let y = y >> (q - p);
    if x.is_negative() {
        -y
    } else {
        y
    }
}

/// Returns the angle of the point `(x, y)`, in `[-pi, pi]`, or 0 for the
/// origin.
pub(crate) fn atan2(y: &BigInt, x: &BigInt, p: u32) -> BigInt {
    let q = p + 2;
    let (y, x) = (y << 2u32, x << 2u32);
    let angle = if x.is_zero() {
        match y.sign() {
            Sign::Plus => working(Constant::FracPi2, q),
            Sign::Minus => -working(Constant::FracPi2, q),
            Sign::NoSign => BigInt::ZERO,
        }
    } else if abs(&y) > abs(&x) {
        let angle = atan(&div(&x, &y, q), q);
        if y.is_negative() {
            -working(Constant::FracPi2, q) - angle
        } else {
            working(Constant::FracPi2, q) - angle
        }
    } else {
        let angle = atan(&div(&y, &x, q), q);
        if !x.is_negative() {
            angle
        } else if y.is_negative() {
            angle - working(Constant::Pi, q)
        } else {
            angle + working(Constant::Pi, q)
        }
    };
    angle >> 2u32
}

/// Returns the Bessel function of the first kind `J_n(x)`.
pub(crate) fn bessel_j(n: u32, x: &BigInt, p: u32) -> BigInt {
    let x_abs = abs(x);
    let negate = x.is_negative() && n % 2 == 1;
    let magnitude = &x_abs >> p;

    // The power series cancels terms as large as `e**|x|`, so it needs about
    // `1.45 * |x|` more bits.  For `|x|` large compared to the precision and
    // to `n`, the asymptotic expansion converges faster and needs no extra
    // bits.
    let threshold = BigInt::from(64 + p / 2) + BigInt::from(n) * n;
    let y = if magnitude > threshold {
        bessel_j_asymptotic(n, &x_abs, p)
    } else {
        let magnitude = magnitude.to_u32().unwrap_or(u32::MAX);
        let q = p
            .saturating_add(GUARD)
            .saturating_add(magnitude.saturating_mul(3) / 2 + 1);
        let half_x = &x_abs << (q - p - 1);

        // First term: `(x/2)**n / n!`, which bounds `|J_n(x)|`, so once it
        // underflows the result is zero.
        let mut first = one(q);
        for i in 1..=n {
            first = mul(&first, &half_x, q) / i;
            if first.is_zero() {
                break;
            }
        }

        // Next terms: `t[k] = -t[k - 1] * (x/2)**2 / (k * (k + n))`.  They
        // grow until `k * (k + n)` passes `(x/2)**2` and then need to shrink
        // by `2**q`, within a few times `|x|` terms beyond that.
        let quarter_x2 = mul(&half_x, &half_x, q);
        let limit = MAX_ITERATIONS
            .saturating_add(magnitude.saturating_mul(3))
            .saturating_add(q / 2);
        let sum = sum_series_up_to(
            first,
            |term, k| -(mul(term, &quarter_x2, q) / (BigInt::from(k) * (BigInt::from(k) + n))),
            limit,
            "Bessel",
        );
        sum >> (q - p)
    };
    if negate {
        -y
    } else {
        y
    }
}

/// `J_n(x)` for `x > 0` by Hankel's asymptotic expansion:
/// `sqrt(2/(pi x)) * (P cos(w) - Q sin(w))` with `w = x - (n/2 + 1/4) pi`.
fn bessel_j_asymptotic(n: u32, x: &BigInt, p: u32) -> BigInt {
    let q = p + GUARD;
    let x = x << GUARD;
    let mu = BigInt::from(4u64 * n as u64 * n as u64);

    // `t[k] = t[k - 1] * (mu - (2k - 1)**2) / (8 k x)`, where `P` collects the
    // even terms and `Q` the odd ones, with alternating signs.
    let (mut big_p, mut big_q) = (one(q), BigInt::ZERO);
    let mut term = one(q);
    for k in 1..=MAX_ITERATIONS {
        let odd = BigInt::from(2 * k - 1);
        let next = div(&(&term * (&mu - &odd * &odd)), &(&x * (8 * k)), q);
        if next.is_zero() || abs(&next) >= abs(&term) {
            break;
        }
        term = next;
        let term = if (k / 2) % 2 == 1 { -&term } else { term.clone() };
        if k % 2 == 0 {
            big_p += term;
        } else {
            big_q += term;
        }
    }

    // `w = x - (2n + 1) * pi/4`.
    let w = &x - (working(Constant::FracPi2, q) * (2 * n as u64 + 1) >> 1u32);
    let (sin, cos) = sin_cos(&w, q);
    let amplitude = sqrt(&div(&one(q), &(working(Constant::FracPi2, q) * &x >> q), q), q);
    mul(&amplitude, &(mul(&big_p, &cos, q) - mul(&big_q, &sin, q)), q) >> GUARD
}
