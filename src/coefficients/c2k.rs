//! Power-series coefficients `c_2k` of the angular function in `1 - η^2`.
//!
//! Each `c_2k` is itself a series over the Legendre coefficients starting
//! at `r = 2k + p`. The factor multiplying `d_{2k+p}` follows from the one
//! multiplying `d_{2k+p}` in the series for `c_2(k-1)`, so it is kept from
//! one order to the next and only rebuilt from factorials at the first
//! order of each extension.

use crate::error::SolverError;
use crate::number::Real;
use crate::recurrence::Mode;
use crate::report;
use crate::report::Diagnostic;
use crate::sequence::Indexed;
use crate::summation::{sum_series, Series};

use super::{double, get_dr};

/// Generates `c_2k` for `0 <= k < n_c2k`, keeping any coefficients
/// already present in `c2k` and computing only the new orders. The length
/// is doubled until the last coefficient is below `c2k_min`. Returns the
/// final length.
pub fn calculate_c2k(mode: &Mode, lambda: &Real, dr: &mut Indexed<Real>, c2k: &mut Vec<Real>, n_c2k: usize, c2k_min: &Real) -> Result<usize, SolverError> {
    let ctx = mode.ctx();
    let m = mode.m();
    let p = mode.parity();
    let zero = ctx.zero();

    let n_orig = n_c2k.max(1);
    let mut n_c2k = n_orig;
    let mut prev = c2k.len();
    // factor multiplying d_{2k+p} in the series for the previous order
    let mut a0 = zero.clone();

    loop {
        if c2k.len() < n_c2k {
            c2k.resize(n_c2k, zero.clone());
        }

        for k in prev..n_c2k {
            let ki = k as i64;
            let start = 2 * ki + p;
            let mut a = zero.clone();
            let mut series = Series::new(ctx);

            sum_series(ctx, "calculate_c2k", &mut series, (start..=mode.index_bound()).step_by(2), |r| {
                if r == start {
                    a = if k > prev {
                        let shift = if p == 0 { 2 * m + 4 * ki - 1 } else { 2 * m + 4 * ki + 1 };
                        &a0 * &ctx.ratio(-shift, 2)
                    } else {
                        let h = (r - p) / 2;
                        let second = if p == 0 { ctx.ratio(2 * m + 2 * h + 1, 2) } else { ctx.ratio(2 * m + 2 * h + 3, 2) };
                        ctx.factorial(2 * m + r) / &ctx.factorial(r)
                            * &ctx.pochhammer(&ctx.int(-h), prev as i64)
                            * &ctx.pochhammer(&second, prev as i64)
                    };
                } else {
                    let h = (r - p) / 2;
                    a *= if p == 0 {
                        ctx.quotient(&[2 * m + r - 1, 2 * m + r, -h, 2 * m + 2 * h + 2 * ki - 1], &[r - 1, r, ki - h, 2 * m + 2 * h - 1])
                    } else {
                        ctx.quotient(&[2 * m + r - 1, -h, 2 * m + r + 2 * ki], &[r - 1, r, ki - h])
                    };
                    if r == start + 2 {
                        a0 = a.clone();
                    }
                }
                Ok(get_dr(mode, lambda, dr, r)? * &a)
            })?;

            let scale = ctx.pow2(m) * &ctx.factorial(m + ki) * &ctx.factorial(ki);
            c2k[k] = series.total() / &scale;
        }

        let last = c2k[n_c2k - 1].abs();
        if c2k_min.is_zero() || last < *c2k_min {
            break;
        }
        prev = n_c2k;
        n_c2k = double(ctx, "calculate_c2k", n_c2k)?;
    }

    if !c2k_min.is_zero() {
        let found = (0..n_c2k).rev().find(|&k| c2k[k].abs() >= *c2k_min);
        if let Some(k) = found {
            let remove_where = k + 2;
            if remove_where >= n_orig && remove_where < n_c2k {
                c2k.truncate(remove_where);
            }
        }
    }

    report!(Diagnostic::Trace, ctx.verbose(), "calculate_c2k: n_c2k = {}", c2k.len());
    Ok(c2k.len())
}

/// Returns `c_2k`, extending the coefficients if `k` lies beyond them.
pub fn get_c2k(mode: &Mode, lambda: &Real, dr: &mut Indexed<Real>, c2k: &mut Vec<Real>, k: usize) -> Result<Real, SolverError> {
    if k >= c2k.len() {
        let mut n = c2k.len().max(1);
        while k >= n {
            n *= 2;
        }
        calculate_c2k(mode, lambda, dr, c2k, n, &mode.ctx().zero())?;
    }
    Ok(c2k[k].clone())
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
    fn extension_matches_direct_computation() {
        let ctx = Context::new(160);
        let cases: [(Spheroid, i64, i64); 2] = [(Prolate.into(), 1, 2), (Oblate.into(), 2, 4)];
        for &(shape, m, n) in cases.iter() {
            let (mode, lambda, mut dr) = setup(&ctx, shape, 1.0, m, n);

            // grown one doubling at a time, reusing the cached factor
            let mut grown = vec![];
            calculate_c2k(&mode, &lambda, &mut dr, &mut grown, 2, &ctx.zero()).unwrap();
            get_c2k(&mode, &lambda, &mut dr, &mut grown, 5).unwrap();
            assert_eq!(grown.len(), 8);

            // built from factorials at every order
            let mut direct = vec![];
            calculate_c2k(&mode, &lambda, &mut dr, &mut direct, 8, &ctx.zero()).unwrap();

            for (k, (g, d)) in grown.iter().zip(direct.iter()).enumerate() {
                let error = ((g - d) / d).abs();
                println!("{:?}, k = {}: c2k = {:.20}, relative difference = {:.3}", shape, k, d, error);
                assert!(error < ctx.float(1.0e-40));
            }
        }
    }

    #[test]
    fn spherical_coefficients() {
        // at c = 0 the angular function is P_n^m, and for m = 0, n = 2,
        // P_2(η) = (3η^2 - 1) / 2 = 1 - (3/2)(1 - η^2)
        let ctx = Context::new(128);
        let (mode, lambda, mut dr) = setup(&ctx, Prolate.into(), 0.0, 0, 2);
        let mut c2k = vec![];
        calculate_c2k(&mode, &lambda, &mut dr, &mut c2k, 4, &ctx.zero()).unwrap();
        println!("c2k = {:?}", c2k);
        assert_eq!(c2k[0], 1);
        assert_eq!(c2k[1], ctx.ratio(-3, 2));
        assert!(c2k[2].is_zero() && c2k[3].is_zero());
    }

    #[test]
    fn floor_trims() {
        let ctx = Context::new(128);
        let (mode, lambda, mut dr) = setup(&ctx, Oblate.into(), 2.0, 0, 1);
        let c2k_min = ctx.float(1.0e-30);
        let mut c2k = vec![];
        let n_c2k = calculate_c2k(&mode, &lambda, &mut dr, &mut c2k, 2, &c2k_min).unwrap();
        println!("n_c2k = {}, last = {:.6}", n_c2k, c2k[n_c2k - 1]);
        assert!(c2k[n_c2k - 1].abs() < c2k_min);
        assert!(c2k[n_c2k - 2].abs() >= c2k_min);
    }
}
