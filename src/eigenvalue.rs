//! The characteristic value λ of a spheroidal mode.
//!
//! λ is the root of `U(λ) = U1(λ) + U2(λ)`, where `U1` is the finite
//! continued fraction running from `r = n - m` down to the bottom of the
//! recurrence and `U2` the infinite one running upward from `r = n - m + 2`.
//! The root is bracketed by widening a symmetric interval around an
//! approximation and then refined by false position.

use crate::continued_fraction;
use crate::error::SolverError;
use crate::number::Real;
use crate::recurrence::Mode;
use crate::report;
use crate::report::Diagnostic;

/// The infinite continued fraction is re-evaluated every time its depth
/// grows by this many indices.
const BLOCK: i64 = 100;

/// Evaluates the characteristic function `U(λ)`.
pub fn characteristic(mode: &Mode, lambda: &Real) -> Result<Real, SolverError> {
    let ctx = mode.ctx();
    let r = mode.n() - mode.m();

    let b0 = mode.gamma_rm(r) - lambda;
    let mut a = vec![];
    let mut b = vec![];
    let bottom = if mode.is_even() { 2 } else { 3 };
    let mut i = r;
    while i >= bottom {
        a.push(mode.beta_rm(i));
        b.push(mode.gamma_rm(i - 2) - lambda);
        i -= 2;
    }
    let u1 = continued_fraction::evaluate(&b0, &a, &b);

    a.clear();
    b.clear();
    let zero = ctx.zero();
    let mut previous: Option<Real> = None;
    let mut i = r + 2;
    let u2 = loop {
        a.push(mode.beta_rm(i));
        b.push(mode.gamma_rm(i) - lambda);
        if (i - r - 2) % BLOCK == 0 {
            let u2 = continued_fraction::evaluate(&zero, &a, &b);
            if let Some(prev) = &previous {
                if ctx.has_settled(&u2, prev) {
                    break u2;
                }
            }
            previous = Some(u2);
        }
        if a.len() >= ctx.max_iterations() {
            return Err(SolverError::IterationLimit("characteristic", ctx.max_iterations()));
        }
        i += 2;
    };

    Ok(u1 + &u2)
}

/// First-order small-c estimate of λ, `β(n - m)`, which is exact at `c = 0`.
pub fn default_lambda_approx(mode: &Mode) -> Real {
    mode.beta(mode.n() - mode.m())
}

/// Finds the characteristic value nearest `lambda_approx`.
pub fn calculate_lambda(mode: &Mode, lambda_approx: &Real) -> Result<Real, SolverError> {
    let ctx = mode.ctx();
    let verbose = ctx.verbose();

    if mode.is_spherical() {
        let n = mode.n();
        return Ok(ctx.int(n * (n + 1)));
    }

    let x = ctx.convert(lambda_approx);
    let mut d = if x.is_zero() {
        ctx.pow2(-100)
    } else {
        ctx.pow2(-100) * &x.abs()
    };

    let mut count = 0;
    let (mut a, mut ua, mut b, mut ub) = loop {
        let a = &x - &d;
        let b = &x + &d;
        let ua = characteristic(mode, &a)?;
        if ua.is_zero() {
            return Ok(a);
        }
        let ub = characteristic(mode, &b)?;
        if ub.is_zero() {
            return Ok(b);
        }
        report!(Diagnostic::Trace, verbose, "calculate_lambda: d = {:.6}, U(x - d) = {:.6}, U(x + d) = {:.6}", d, ua, ub);
        if ua.is_sign_negative() != ub.is_sign_negative() {
            break (a, ua, b, ub);
        }
        d *= 2;
        count += 1;
        if count >= ctx.max_iterations() {
            return Err(SolverError::IterationLimit("calculate_lambda (bracket)", ctx.max_iterations()));
        }
    };

    let low_is_negative = ua.is_sign_negative();
    let mut previous: Option<Real> = None;

    for _ in 0..ctx.max_iterations() {
        let x = &a - &(&ua / &(&ub - &ua) * &(&b - &a));
        let ux = characteristic(mode, &x)?;
        if ux.is_zero() {
            return Err(SolverError::SingularContinuedFraction(x.to_sci_string(0)));
        }

        let replace_low = if low_is_negative { ux < 0 } else { ux > 0 };
        if replace_low {
            a = x.clone();
            ua = ux;
        } else {
            b = x.clone();
            ub = ux;
        }

        if let Some(prev) = &previous {
            report!(Diagnostic::Trace, verbose, "calculate_lambda: x = {:.24}, change = {:.6}", x, (&x - prev).abs());
            if ctx.has_settled(&x, prev) {
                return Ok(x);
            }
        }
        previous = Some(x);
    }

    Err(SolverError::IterationLimit("calculate_lambda", ctx.max_iterations()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Prolate, Oblate, Spheroid};
    use crate::number::Context;

    #[test]
    fn spherical_limit_is_exact() {
        let ctx = Context::new(128);
        let zero = ctx.zero();
        for &(m, n) in &[(0, 0), (1, 3), (2, 2)] {
            let mode = Mode::new(&ctx, Prolate.into(), &zero, m, n).unwrap();
            let lambda = calculate_lambda(&mode, &default_lambda_approx(&mode)).unwrap();
            assert_eq!(lambda, ctx.int(n * (n + 1)));
        }
    }

    #[test]
    fn lowest_modes_at_c_equal_one() {
        let ctx = Context::new(128);
        let c = ctx.one();
        // tabulated values: prolate 0.319000, oblate -0.348602
        let targets: [(Spheroid, f64); 2] = [(Prolate.into(), 0.319000), (Oblate.into(), -0.348602)];
        for &(shape, target) in targets.iter() {
            let mode = Mode::new(&ctx, shape, &c, 0, 0).unwrap();
            let lambda = calculate_lambda(&mode, &default_lambda_approx(&mode)).unwrap();
            let error = (lambda.to_f64() - target).abs();
            println!("λ = {:.20}, target = {}, error = {:.3e}", lambda, target, error);
            assert!(error < 2.0e-6);
        }
    }

    #[test]
    fn root_is_self_consistent() {
        let ctx = Context::new(160);
        let c = ctx.float(1.5);
        for &(m, n) in &[(0, 1), (1, 4), (3, 3)] {
            let mode = Mode::new(&ctx, Oblate.into(), &c, m, n).unwrap();
            let lambda = calculate_lambda(&mode, &default_lambda_approx(&mode)).unwrap();
            let u = characteristic(&mode, &lambda).unwrap();
            println!("m = {}, n = {}: λ = {:.30}, U(λ) = {:.6}", m, n, lambda, u);
            assert!(u.abs() < ctx.float(1.0e-35));
        }
    }
}
