//! Normalization and joining constants.
//!
//! `N_mn` is the integral of the squared angular function over `[-1, 1]`;
//! `F_mn`, `k1_mn` and `k2_mn` relate the Legendre expansion to the
//! spherical-Bessel and power-series forms of the radial functions; `Q_mn`
//! is the coefficient of the logarithmic part of the oblate second-kind
//! function at the origin.

use crate::coefficients::{get_c2k, get_dr, get_dr_neg};
use crate::error::SolverError;
use crate::number::Real;
use crate::recurrence::Mode;
use crate::sequence::Indexed;
use crate::summation::{sum_series, Series};

/// `Σ' d_r^j (2m + r)! / r!` with `j = 1`, or with `j = 2` and the extra
/// factor `1 / (2m + 2r + 1)`.
fn factorial_series(mode: &Mode, lambda: &Real, dr: &mut Indexed<Real>, routine: &'static str, squared: bool) -> Result<Real, SolverError> {
    let ctx = mode.ctx();
    let m = mode.m();
    let p = mode.parity();

    let mut a = ctx.zero();
    let mut series = Series::new(ctx);
    sum_series(ctx, routine, &mut series, (p..=mode.index_bound()).step_by(2), |r| {
        if r == p {
            a = ctx.factorial(2 * m + p);
        } else {
            a *= ctx.quotient(&[2 * m + r - 1, 2 * m + r], &[r - 1, r]);
        }
        let d = get_dr(mode, lambda, dr, r)?;
        if squared {
            Ok(&d * &d * &a / &ctx.int(2 * m + 2 * r + 1))
        } else {
            Ok(d * &a)
        }
    })?;
    Ok(series.total())
}

/// `N_mn = ∫ S_mn(η)^2 dη` over `[-1, 1]`.
pub fn calculate_nmn(mode: &Mode, lambda: &Real, dr: &mut Indexed<Real>) -> Result<Real, SolverError> {
    Ok(factorial_series(mode, lambda, dr, "calculate_nmn", true)? * 2)
}

pub fn calculate_fmn(mode: &Mode, lambda: &Real, dr: &mut Indexed<Real>) -> Result<Real, SolverError> {
    factorial_series(mode, lambda, dr, "calculate_fmn", false)
}

/// Joining factor between the Legendre and power-series forms of the
/// first-kind radial function.
pub fn calculate_kmn1(mode: &Mode, dr: &Indexed<Real>, f: &Real) -> Result<Real, SolverError> {
    let ctx = mode.ctx();
    let (m, n) = (mode.m(), mode.n());
    let p = mode.parity();
    let d = dr.get(p).ok_or(SolverError::MissingCoefficients("dr"))?;

    let (num, den) = if mode.is_even() {
        (
            ctx.int(2 * m + 1) * &ctx.factorial(m + n) * f,
            ctx.pow2(m + n) * d * &mode.c().powi(m as i32) * &ctx.factorial(m)
                * &ctx.factorial((n - m) / 2) * &ctx.factorial((m + n) / 2),
        )
    } else {
        (
            ctx.int(2 * m + 3) * &ctx.factorial(m + n + 1) * f,
            ctx.pow2(m + n) * d * &mode.c().powi(m as i32 + 1) * &ctx.factorial(m)
                * &ctx.factorial((n - m - 1) / 2) * &ctx.factorial((m + n + 1) / 2),
        )
    };
    Ok(num / &den)
}

/// Joining factor between the Legendre-function form of the second-kind
/// radial function and its asymptotic normalization. Uses `d_{-2m}` or
/// `d_{-2m+1}`, extending the negative branch if necessary.
pub fn calculate_kmn2(mode: &Mode, lambda: &Real, dr: &mut Indexed<Real>, f: &Real) -> Result<Real, SolverError> {
    let ctx = mode.ctx();
    let (m, n) = (mode.m(), mode.n());
    let p = mode.parity();

    let d = if m > 0 {
        get_dr_neg(mode, lambda, dr, -2 * m + p)?
    } else {
        dr.get(p).cloned().ok_or(SolverError::MissingCoefficients("dr"))?
    };

    if mode.is_even() {
        let num = ctx.pow2(n - m) * &ctx.factorial(2 * m) * &ctx.factorial((n - m) / 2)
            * &ctx.factorial((m + n) / 2) * &d * f;
        let den = ctx.int(2 * m - 1) * &ctx.factorial(m) * &ctx.factorial(m + n)
            * &mode.c().powi(m as i32 - 1);
        Ok(num / &den)
    } else {
        let num = ctx.pow2(n - m) * &ctx.factorial(2 * m) * &ctx.factorial((n - m - 1) / 2)
            * &ctx.factorial((m + n + 1) / 2) * &d * f;
        let den = ctx.quotient(&[2 * m - 3, 2 * m - 1], &[]) * &ctx.factorial(m)
            * &ctx.factorial(m + n + 1) * &mode.c().powi(m as i32 - 2);
        Ok(-(num / &den))
    }
}

/// `Q_mn` for oblate modes, from the reciprocal of the squared power
/// series `(Σ c_2k t^k)^2` truncated at order `m`.
pub fn calculate_qmn(mode: &Mode, lambda: &Real, dr: &mut Indexed<Real>, c2k: &mut Vec<Real>, k1: &Real) -> Result<Real, SolverError> {
    if mode.shape().is_prolate() {
        return Err(SolverError::WrongGeometry("calculate_qmn"));
    }
    let ctx = mode.ctx();
    let m = mode.m() as usize;

    let mut ck = Vec::with_capacity(m + 1);
    for k in 0..=m {
        ck.push(get_c2k(mode, lambda, dr, c2k, k)?);
    }

    let bk: Vec<Real> = (0..=m)
        .map(|i| (0..=i).fold(ctx.zero(), |acc, k| acc + &(&ck[k] * &ck[i - k])))
        .collect();

    let mut ak = vec![bk[0].recip()];
    for i in 1..=m {
        let s = (0..i).fold(ctx.zero(), |acc, k| acc + &(&ak[k] * &bk[i - k]));
        ak.push(-(s / &bk[0]));
    }

    let shift = if mode.is_even() { 0 } else { 1 };
    let q = ak.iter().enumerate().fold(ctx.zero(), |acc, (k, a)| {
        let j = (m - k) as i64;
        let denom = ctx.pow2(j) * &ctx.factorial(j);
        acc + &(a * &ctx.factorial(2 * j + shift) / &(&denom * &denom))
    });

    let q = k1 * k1 / mode.c() * &q;
    Ok(if mode.is_even() { q } else { -q })
}
