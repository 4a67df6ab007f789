//! Legendre coefficients `d_r`, `r >= 0`.

use crate::continued_fraction;
use crate::error::{Convergence, SolverError};
use crate::number::Real;
use crate::recurrence::Mode;
use crate::report;
use crate::report::Diagnostic;
use crate::sequence::Indexed;
use crate::summation::{sum_series, Series};

use super::{double, even_length};

/// Ratio `N_r = d_{r-2} / d_r` (up to the factor `-α(r - 2)`) from the
/// continued fraction over all indices `>= r`.
fn tail_ratio(mode: &Mode, lambda: &Real, r: i64) -> Result<Real, SolverError> {
    let ctx = mode.ctx();
    let zero = ctx.zero();
    let mut a = vec![];
    let mut b = vec![];
    let mut previous: Option<Real> = None;
    let mut i = r;

    while a.len() < ctx.max_iterations() {
        a.push(mode.beta_rm(i));
        b.push(mode.gamma_rm(i) - lambda);
        let ratio = -continued_fraction::evaluate(&zero, &a, &b);
        if let Some(prev) = &previous {
            if ctx.has_settled(&ratio, prev) {
                report!(Diagnostic::Trace, ctx.verbose(), "tail_ratio: r = {}, depth = {}, N = {:.12}", r, a.len(), ratio);
                return Ok(ratio);
            }
        }
        previous = Some(ratio);
        i += 2;
    }

    Err(SolverError::IterationLimit("tail_ratio", ctx.max_iterations()))
}

/// Flammer's normalization: the angular function and P_n^m agree at
/// η = 0, in value for even `n - m` and in slope for odd `n - m`.
fn closed_form(mode: &Mode) -> Real {
    let ctx = mode.ctx();
    let (m, n) = (mode.m(), mode.n());
    if mode.is_even() {
        ctx.sign_pow((n - m) / 2) * &ctx.factorial(n + m)
            / &(ctx.pow2(n - m) * &ctx.factorial((n + m) / 2) * &ctx.factorial((n - m) / 2))
    } else {
        ctx.sign_pow((n - m - 1) / 2) * &ctx.factorial(n + m + 1)
            / &(ctx.pow2(n - m) * &ctx.factorial((n + m + 1) / 2) * &ctx.factorial((n - m - 1) / 2))
    }
}

/// Sums the unnormalized coefficients against the factors that the
/// closed form is matched to.
fn normalization_series(mode: &Mode, d: &[Real]) -> Result<Convergence<Real>, SolverError> {
    let ctx = mode.ctx();
    let m = mode.m();
    let p = mode.parity();
    let top = d.len() as i64 - 2 + p;

    let mut a = ctx.zero();
    let mut series = Series::new(ctx);
    let converged = sum_series(ctx, "calculate_dr", &mut series, (p..=top).step_by(2), |r| {
        if r == p {
            a = if p == 0 {
                ctx.factorial(2 * m) / &ctx.factorial(m)
            } else {
                ctx.factorial(2 * m + 2) / &(ctx.factorial(m + 1) * 2)
            };
        } else if p == 0 {
            a *= ctx.quotient(&[-(2 * m + r - 1)], &[r]);
        } else {
            a *= ctx.quotient(&[-(2 * m + r)], &[r - 1]);
        }
        Ok(&d[r as usize] * &a)
    })?;

    let total = series.total();
    if converged {
        Ok(Convergence::Converged(total))
    } else {
        Ok(Convergence::NotConverged(total))
    }
}

/// Generates `d_r` for `0 <= r < n_dr` into the non-negative branch of
/// `dr`, doubling `n_dr` until the normalization converges and the last
/// coefficient is below `dr_min`. Returns the final length.
pub fn calculate_dr(mode: &Mode, lambda: &Real, dr: &mut Indexed<Real>, n_dr: usize, dr_min: &Real) -> Result<usize, SolverError> {
    let ctx = mode.ctx();
    let p = mode.parity();
    let zero = ctx.zero();

    let n_orig = even_length(n_dr.max((mode.n() - mode.m() + 2) as usize));
    let mut n_dr = n_orig;

    loop {
        let top = n_dr as i64 - 2 + p;
        let mut d = vec![zero.clone(); n_dr];

        if mode.is_spherical() {
            // the recurrence decouples: only d_{n-m} survives
            d[(mode.n() - mode.m()) as usize] = ctx.one();
        } else {
            d[top as usize] = ctx.one();
            let mut ratio = zero.clone();
            let mut r = top;
            while r >= 2 + p {
                ratio = if r == top {
                    tail_ratio(mode, lambda, r)?
                } else {
                    mode.beta_rm(r) / &(mode.gamma_rm(r) - lambda - &ratio)
                };
                d[(r - 2) as usize] = -(mode.alpha(r - 2) / &ratio) * &d[r as usize];
                r -= 2;
            }
        }

        let x = normalization_series(mode, &d)?;
        let converged = x.is_converged() || mode.is_spherical();
        report!(Diagnostic::Warning, !converged && ctx.verbose(), "calculate_dr: normalization did not converge for n_dr = {}", n_dr);

        let s = closed_form(mode) / &x.into_inner();
        for v in d.iter_mut() {
            *v *= &s;
        }

        let done = converged && (dr_min.is_zero() || d[top as usize].abs() < *dr_min);
        dr.replace_nonneg(d);
        if done {
            break;
        }
        n_dr = double(ctx, "calculate_dr", n_dr)?;
    }

    if !dr_min.is_zero() {
        let top = n_dr as i64 - 2 + p;
        let found = (p..=top).rev().step_by(2).find(|&r| dr[r].abs() >= *dr_min);
        if let Some(r) = found {
            let remove_where = (if p == 0 { r + 4 } else { r + 3 }) as usize;
            if remove_where >= n_orig && remove_where + 2 <= n_dr {
                dr.truncate_nonneg(remove_where);
            }
        }
    }

    report!(Diagnostic::Trace, ctx.verbose(), "calculate_dr: n_dr = {}", dr.nonneg_len());
    Ok(dr.nonneg_len())
}

/// Returns `d_r`, regenerating the coefficients at a longer length if `r`
/// lies beyond the current one.
pub fn get_dr(mode: &Mode, lambda: &Real, dr: &mut Indexed<Real>, r: i64) -> Result<Real, SolverError> {
    if r >= dr.nonneg_len() as i64 {
        let mut n = dr.nonneg_len().max(2);
        while r >= n as i64 {
            n *= 2;
        }
        calculate_dr(mode, lambda, dr, n, &mode.ctx().zero())?;
    }
    Ok(dr[r].clone())
}
