//! Angular functions of the first kind, `S_mn^(1)(c, η)`, and their
//! derivatives with respect to `η`.
//!
//! Two representations are available: the Legendre expansion
//! `Σ' d_r P_{m+r}^m(η)`, which converges for all `η` in `[-1, 1]`, and the
//! power series in `1 - η^2` built from `c_2k`, which is the better choice
//! close to the poles. Neither is normalized: divide by `√N_mn` for unit
//! norm on `[-1, 1]`.

use crate::number::{Context, Real};
use crate::recurrence::Mode;
use crate::error::SolverError;
use crate::sequence::Indexed;
use crate::summation::{sum_series, Paired, Series};

/// Slope of `P_{m+r}^m` at `η = ±1`, where the recurrence for the
/// derivative is singular.
fn pole_slope(ctx: &Context, m: i64, r: i64) -> Real {
    match m {
        0 => ctx.ratio((m + r) * (m + r + 1), 2),
        1 => ctx.one() / &ctx.zero(),
        2 => -ctx.quotient(&[m + r - 1, m + r, m + r + 1, m + r + 2], &[4]),
        _ => ctx.zero(),
    }
}

/// Evaluates the Legendre expansion using the coefficients already in
/// `dr`. The sum stops early once a term is negligible in both value and
/// slope, and otherwise runs to the end of the available coefficients.
pub fn calculate_smn1_1(mode: &Mode, dr: &Indexed<Real>, eta: &Real) -> Result<(Real, Real), SolverError> {
    let ctx = mode.ctx();
    let m = mode.m();
    let p = mode.parity();
    if dr.nonneg_len() == 0 {
        return Err(SolverError::MissingCoefficients("dr"));
    }
    let top = dr.nonneg_len() as i64 - 2 + p;

    let one_minus = ctx.one() - &(eta * eta);
    let interior = eta.abs() < 1;
    let root = one_minus.sqrt();

    // P_m^m and P_{m+1}^m
    let mut p0 = (1..=m).fold(ctx.one(), |acc, v| -(acc * &root) * (2 * v as i32 - 1));
    let mut p1 = &p0 * eta * (2 * m as i32 + 1);

    let mut acc = Paired::<Series>::new(ctx);
    sum_series(ctx, "calculate_smn1_1", &mut acc, (p..=top).step_by(2), |r| {
        let d = &dr[r];
        if p == 0 {
            if r > 0 {
                p0 = (-(&p0 * (2 * m + r - 1) as i32) + &(&p1 * eta * (2 * m + 2 * r - 1) as i32)) / &ctx.int(r);
                p1 = (-(&p1 * (2 * m + r) as i32) + &(&p0 * eta * (2 * m + 2 * r + 1) as i32)) / &ctx.int(r + 1);
            }
            let slope = if interior {
                (&p0 * eta * (m + r + 1) as i32 - &(&p1 * (r + 1) as i32)) / &one_minus
            } else if eta.is_sign_negative() {
                -pole_slope(ctx, m, r)
            } else {
                pole_slope(ctx, m, r)
            };
            Ok((d * &p0, d * &slope))
        } else {
            if r > 1 {
                p0 = (-(&p0 * (2 * m + r - 2) as i32) + &(&p1 * eta * (2 * m + 2 * r - 3) as i32)) / &ctx.int(r - 1);
                p1 = (-(&p1 * (2 * m + r - 1) as i32) + &(&p0 * eta * (2 * m + 2 * r - 1) as i32)) / &ctx.int(r);
            }
            // odd in η, so the slope at the poles does not change sign
            let slope = if interior {
                (&p0 * (2 * m + r) as i32 - &(&p1 * eta * (m + r) as i32)) / &one_minus
            } else {
                pole_slope(ctx, m, r)
            };
            Ok((d * &p1, d * &slope))
        }
    })?;

    Ok(acc.totals())
}

/// Evaluates the power series in `1 - η^2` using the coefficients in
/// `c2k`, then applies the factor `(-1)^m (1 - η^2)^{m/2}`, times `η` when
/// `n - m` is odd.
pub fn calculate_smn1_2(mode: &Mode, c2k: &[Real], eta: &Real) -> Result<(Real, Real), SolverError> {
    let ctx = mode.ctx();
    let m = mode.m();
    if c2k.is_empty() {
        return Err(SolverError::MissingCoefficients("c2k"));
    }
    let w = ctx.one() - &(eta * eta);
    let dw = eta * -2;
    let (value, slope) = power_series(ctx, "calculate_smn1_2", c2k, &w, &dw)?;

    let sign = ctx.sign_pow(m);
    let wm = w.pow(&ctx.ratio(m, 2));
    // derivative of (1 - η^2)^{m/2}
    let dwm = if m > 0 {
        w.pow(&ctx.ratio(m - 2, 2)) * &dw * &ctx.ratio(m, 2)
    } else {
        ctx.zero()
    };

    let (s, sp) = with_prefactor(!mode.is_even(), eta, &wm, &dwm, &value, &slope);
    Ok((s * &sign, sp * &sign))
}

/// `Σ a_k w^k` over the coefficients given, and its derivative, where
/// `dw` is the derivative of `w`.
pub(crate) fn power_series(ctx: &Context, routine: &'static str, a: &[Real], w: &Real, dw: &Real) -> Result<(Real, Real), SolverError> {
    let top = a.len() as i64 - 1;

    let mut wk = ctx.zero();
    let mut value = Series::new(ctx);
    sum_series(ctx, routine, &mut value, 0..=top, |k| {
        wk = if k == 0 { ctx.one() } else { &wk * w };
        Ok(&a[k as usize] * &wk)
    })?;

    let mut wk = ctx.zero();
    let mut slope = Series::new(ctx);
    sum_series(ctx, routine, &mut slope, 1..=top, |k| {
        wk = if k == 1 { ctx.one() } else { &wk * w };
        Ok(&a[k as usize] * &wk * k as i32 * dw)
    })?;

    Ok((value.total(), slope.total()))
}

/// Multiplies a series `s` with derivative `sp` by the prefactor `f`
/// with derivative `fp`, and by the coordinate `t` as well if `odd`.
/// Returns the product and its derivative.
pub(crate) fn with_prefactor(odd: bool, t: &Real, f: &Real, fp: &Real, s: &Real, sp: &Real) -> (Real, Real) {
    let value = f * s;
    let slope = fp * s + &(f * sp);
    if odd {
        (t * &value, value + &(t * &slope))
    } else {
        (value, slope)
    }
}
