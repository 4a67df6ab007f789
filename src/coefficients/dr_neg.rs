//! Continuation of the Legendre coefficients to negative indices.
//!
//! The recurrence is run upward from the bottom of the requested range,
//! `A(r) d_{r+2} + B(r) d_r + C(r) d_{r-2} = 0`, with the ratio
//! `d_r / d_{r+2}` seeded by a continued fraction over the indices below.
//! At `r = -2m - 2` (even) or `r = -2m - 1` (odd) `A(r + 2)` has a removable
//! singularity and is replaced by its limit. The branch is scaled so that it
//! continues onto `d_0` or `d_1`.

use crate::continued_fraction;
use crate::error::SolverError;
use crate::number::Real;
use crate::recurrence::Mode;
use crate::report;
use crate::report::Diagnostic;
use crate::sequence::Indexed;

use super::{double, even_length};

/// Index at which the upper coefficient must be replaced by its limit.
fn singular_index(mode: &Mode) -> i64 {
    -2 * mode.m() - 2 + mode.parity()
}

/// `A(r + 2)`, or its limiting value at the singular index.
fn upper(mode: &Mode, r: i64) -> Real {
    if r != singular_index(mode) {
        return mode.a_rm(r + 2);
    }
    let ctx = mode.ctx();
    let m = mode.m();
    if mode.is_even() {
        -ctx.quotient(&[1], &[2 * m - 1, 2 * m + 1]) * mode.c2()
    } else {
        ctx.quotient(&[1], &[2 * m - 1, 2 * m - 3]) * mode.c2()
    }
}

/// Ratio `d_r / d_{r+2}` at the bottom of the range, from the continued
/// fraction over all lower indices.
fn bottom_ratio(mode: &Mode, lambda: &Real, r: i64) -> Result<Real, SolverError> {
    let ctx = mode.ctx();
    let zero = ctx.zero();
    let mut a = vec![upper(mode, r)];
    let mut b = vec![mode.b_rm(lambda, r)];
    let mut previous: Option<Real> = None;
    let mut i = r - 2;

    while a.len() < ctx.max_iterations() {
        a.push(mode.c_rm(i) * &mode.a_rm(i + 2));
        b.push(mode.b_rm(lambda, i));
        let ratio = continued_fraction::evaluate(&zero, &a, &b);
        if let Some(prev) = &previous {
            if ctx.has_settled(&ratio, prev) {
                report!(Diagnostic::Trace, ctx.verbose(), "bottom_ratio: r = {}, depth = {}", r, a.len());
                return Ok(ratio);
            }
        }
        previous = Some(ratio);
        i -= 2;
    }

    Err(SolverError::IterationLimit("bottom_ratio", ctx.max_iterations()))
}

/// Generates `d_r` for `-n_dr_neg <= r < 0` into the negative branch of
/// `dr`, whose non-negative branch must already hold `d_0` or `d_1`.
/// The length is doubled until the lowest coefficient is below
/// `dr_neg_min`. Returns the final length.
pub fn calculate_dr_neg(mode: &Mode, lambda: &Real, dr: &mut Indexed<Real>, n_dr_neg: usize, dr_neg_min: &Real) -> Result<usize, SolverError> {
    let ctx = mode.ctx();
    let p = mode.parity();
    let zero = ctx.zero();

    let anchor = dr.get(p).cloned().ok_or(SolverError::MissingCoefficients("dr"))?;

    let n_orig = even_length(n_dr_neg);
    let mut n_dr_neg = n_orig;

    loop {
        let first = -(n_dr_neg as i64) + p;
        let last = -2 + p;
        let mut d = Indexed::new();
        d.ensure_len(-(n_dr_neg as i64), &zero);

        if mode.is_spherical() {
            // nothing couples to the negative indices
            dr.replace_neg(d.into_branches().1);
            break;
        }

        d[first] = ctx.one();
        let mut ratio = zero.clone();
        for r in (first..=last).step_by(2) {
            ratio = if r == first {
                bottom_ratio(mode, lambda, r)?
            } else {
                -upper(mode, r) / &(mode.b_rm(lambda, r) + &(mode.c_rm(r - 2) * &ratio))
            };
            if r < last {
                d[r + 2] = &d[r] / &ratio;
                if r == singular_index(mode) {
                    ratio = zero.clone();
                }
            }
        }

        let s = &anchor / &(&d[last] / &ratio);
        let (_, mut neg) = d.into_branches();
        for v in neg.iter_mut() {
            *v *= &s;
        }

        let lowest = neg[(-first - 1) as usize].abs();
        dr.replace_neg(neg);
        if dr_neg_min.is_zero() || lowest < *dr_neg_min {
            break;
        }
        n_dr_neg = double(ctx, "calculate_dr_neg", n_dr_neg)?;
    }

    if !dr_neg_min.is_zero() {
        let first = -(n_dr_neg as i64) + p;
        let last = -2 + p;
        let found = (first..=last).step_by(2).find(|&r| dr[r].abs() >= *dr_neg_min);
        if let Some(r) = found {
            let remove_where = if p == 0 { r - 3 } else { r - 4 };
            if remove_where <= -(n_orig as i64) - 1 && remove_where >= first + 1 - p {
                dr.truncate_neg((-remove_where - 1) as usize);
            }
        }
    }

    report!(Diagnostic::Trace, ctx.verbose(), "calculate_dr_neg: n_dr_neg = {}", dr.neg_len());
    Ok(dr.neg_len())
}

/// Returns `d_r` for `r < 0`, regenerating the negative branch at a
/// longer length if needed.
pub fn get_dr_neg(mode: &Mode, lambda: &Real, dr: &mut Indexed<Real>, r: i64) -> Result<Real, SolverError> {
    if r <= -(dr.neg_len() as i64) - 1 {
        let mut n = dr.neg_len().max(2);
        while r <= -(n as i64) - 1 {
            n *= 2;
        }
        calculate_dr_neg(mode, lambda, dr, n, &mode.ctx().zero())?;
    }
    Ok(dr[r].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coefficients::calculate_dr;
    use crate::eigenvalue::{calculate_lambda, default_lambda_approx};
    use crate::geometry::{Prolate, Oblate, Spheroid};
    use crate::number::Context;

    fn setup(ctx: &Context, shape: Spheroid, c: f64, m: i64, n: i64) -> (Mode, Real, Indexed<Real>) {
        let mode = Mode::new(ctx, shape, &ctx.float(c), m, n).unwrap();
        let lambda = calculate_lambda(&mode, &default_lambda_approx(&mode)).unwrap();
        let mut dr = Indexed::new();
        calculate_dr(&mode, &lambda, &mut dr, 16, &ctx.zero()).unwrap();
        (mode, lambda, dr)
    }

    #[test]
    fn requires_nonnegative_branch() {
        let ctx = Context::new(64);
        let mode = Mode::new(&ctx, Prolate.into(), &ctx.one(), 0, 0).unwrap();
        let mut dr = Indexed::new();
        let result = calculate_dr_neg(&mode, &ctx.one(), &mut dr, 8, &ctx.zero());
        assert!(result.is_err());
    }

    #[test]
    fn recurrence_below_zero() {
        let ctx = Context::new(160);
        let cases: [(Spheroid, i64, i64); 3] = [(Prolate.into(), 1, 3), (Oblate.into(), 2, 3), (Oblate.into(), 0, 0)];
        for &(shape, m, n) in cases.iter() {
            let (mode, lambda, mut dr) = setup(&ctx, shape, 1.5, m, n);
            let n_dr_neg = calculate_dr_neg(&mode, &lambda, &mut dr, 16, &ctx.zero()).unwrap();
            let p = mode.parity();
            let singular = singular_index(&mode);

            // rows strictly inside the negative range; the branch decouples
            // at the singular index
            let bottom = -(n_dr_neg as i64) + p + 2;
            for r in (bottom..=(-4 + p)).step_by(2).filter(|&r| (r - singular).abs() > 2) {
                let row = mode.a_rm(r + 2) * &dr[r + 2] + &(mode.b_rm(&lambda, r) * &dr[r]) + &(mode.c_rm(r - 2) * &dr[r - 2]);
                let scale = (mode.b_rm(&lambda, r) * &dr[r]).abs();
                if scale.is_zero() {
                    continue;
                }
                let error = (row / &scale).abs();
                println!("{:?}, m = {}, n = {}, r = {}: relative residual = {:.3}", shape, m, n, r, error);
                assert!(error < ctx.float(1.0e-35));
            }
        }
    }

    #[test]
    fn lazy_extension() {
        let ctx = Context::new(128);
        let (mode, lambda, mut dr) = setup(&ctx, Oblate.into(), 1.0, 1, 2);
        calculate_dr_neg(&mode, &lambda, &mut dr, 4, &ctx.zero()).unwrap();
        // n - m is odd, so only odd indices are populated
        let d = dr[-1].clone();
        let deep = get_dr_neg(&mode, &lambda, &mut dr, -41).unwrap();
        assert!(dr.neg_len() >= 41);
        assert!(deep.is_finite());
        let error = ((&dr[-1] - &d) / &d).abs();
        println!("d_-1 = {:.30}, relative change = {:.3}", d, error);
        assert!(error < ctx.float(1.0e-30));
    }
}
