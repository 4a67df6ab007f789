//! Spherical Bessel functions j_v(x) and y_v(x) of integer order, with
//! their derivatives, at arbitrary precision.

use crate::continued_fraction;
use crate::error::SolverError;
use crate::number::{Context, Real};
use crate::report;
use crate::report::Diagnostic;

/// Depth at which the continued fraction seeding the backward recurrence
/// for j_v is abandoned.
const SEED_MAX_DEPTH: usize = 10_000;

pub trait SphericalBessel {
    /// Returns `j_v(x)` for `0 <= v <= top` and `j_v'(x)` for `0 <= v < top`.
    fn spherical_j(&self, ctx: &Context, top: usize) -> Result<(Vec<Real>, Vec<Real>), SolverError>;

    /// Returns `y_v(x)` for `0 <= v <= top` and `y_v'(x)` for `0 <= v < top`.
    fn spherical_y(&self, ctx: &Context, top: usize) -> (Vec<Real>, Vec<Real>);
}

impl SphericalBessel for Real {
    fn spherical_j(&self, ctx: &Context, top: usize) -> Result<(Vec<Real>, Vec<Real>), SolverError> {
        let x = self;
        let zero = ctx.zero();

        if x.is_zero() {
            let mut j = vec![zero.clone(); top + 1];
            let mut jp = vec![zero; top];
            j[0] = ctx.one();
            if top > 1 {
                jp[1] = ctx.ratio(1, 3);
            }
            return Ok((j, jp));
        }

        // Backward recurrence on the ratio j_v / j_{v-1}, which is stable
        // for the minimal solution.
        let mut j = vec![zero.clone(); top + 1];
        j[top] = ctx.one();
        let mut ratio = zero.clone();
        for v in (1..=top).rev() {
            ratio = if v == top {
                seed_ratio(ctx, x, v as i64)
            } else {
                (ctx.int(2 * v as i64 + 1) / x - &ratio).recip()
            };
            j[v - 1] = &j[v] / &ratio;
        }

        let s = x.sin() / x / &j[0];
        for jv in j.iter_mut() {
            *jv *= &s;
        }

        let jp = (0..top)
            .map(|v| &j[v] * v as i32 / x - &j[v + 1])
            .collect();

        Ok((j, jp))
    }

    fn spherical_y(&self, ctx: &Context, top: usize) -> (Vec<Real>, Vec<Real>) {
        let x = self;
        let (s, c) = (x.sin(), x.cos());
        let mut y = Vec::with_capacity(top + 2);
        y.push(-(&c / x));
        y.push(-(&c / &(x * x)) - &(&s / x));

        // upward recurrence, stable for the dominant solution
        for v in 1..=top {
            let next = &y[v] * (2 * v as i32 + 1) / x - &y[v - 1];
            y.push(next);
        }

        let yp = (0..top)
            .map(|v| &y[v] * v as i32 / x - &y[v + 1])
            .collect();
        y.truncate(top + 1);

        (y, yp)
    }
}

/// Ratio `j_v(x) / j_{v-1}(x)` from its continued fraction, re-evaluated
/// at every depth until it stops changing.
fn seed_ratio(ctx: &Context, x: &Real, v: i64) -> Real {
    let zero = ctx.zero();
    let mut a = vec![];
    let mut b = vec![];
    let mut previous: Option<Real> = None;

    for i in v..(v + SEED_MAX_DEPTH as i64) {
        a.push(ctx.one());
        b.push(ctx.int(2 * i + 1) / x);
        let ratio = -continued_fraction::evaluate(&zero, &a, &b);
        if let Some(prev) = &previous {
            if ctx.has_settled(&ratio, prev) {
                report!(Diagnostic::Trace, ctx.verbose(), "spherical_j: seeded at v = {} with depth {}", v, a.len());
                return ratio;
            }
        }
        previous = Some(ratio);
    }

    report!(Diagnostic::Warning, true, "spherical_j: seed ratio at v = {} unsettled after {} terms", v, SEED_MAX_DEPTH);
    previous.unwrap_or(zero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_forms() {
        let ctx = Context::new(160);
        for &x in &[0.3, 2.5, 17.0] {
            let x = ctx.float(x);
            let (s, c) = (x.sin(), x.cos());
            let x2 = &x * &x;

            // j_2 = (3/x^3 - 1/x) sin x - 3 cos x / x^2
            let j2 = (ctx.int(3) / &(&x2 * &x) - &x.recip()) * &s - &(&c * 3 / &x2);
            // y_2 = -(3/x^3 - 1/x) cos x - 3 sin x / x^2
            let y2 = -((ctx.int(3) / &(&x2 * &x) - &x.recip()) * &c) - &(&s * 3 / &x2);
            // j_0' = -j_1, y_0' = -y_1
            let j1 = &s / &x2 - &(&c / &x);

            let (j, jp) = x.spherical_j(&ctx, 12).unwrap();
            let (y, yp) = x.spherical_y(&ctx, 12);

            let errors = [
                ((&j[2] - &j2) / &j2).abs(),
                ((&y[2] - &y2) / &y2).abs(),
                ((&jp[0] + &j1) / &j1).abs(),
                ((&yp[0] + &y[1]) / &y[1]).abs(),
            ];
            println!("x = {:.3}: j_2 = {:.20}, y_2 = {:.20}, errors = {:?}", x, j[2], y2, errors);
            for e in errors.iter() {
                assert!(*e < ctx.float(1.0e-40));
            }
        }
    }

    #[test]
    fn cross_product() {
        // j_v y_{v-1} - j_{v-1} y_v = 1 / x^2
        let ctx = Context::new(128);
        let x = ctx.ratio(7, 4);
        let (j, _) = x.spherical_j(&ctx, 30).unwrap();
        let (y, _) = x.spherical_y(&ctx, 30);
        let target = (&x * &x).recip();
        for v in 1..=30 {
            let w = &j[v] * &y[v - 1] - &(&j[v - 1] * &y[v]);
            let error = ((&w - &target) / &target).abs();
            assert!(error < ctx.float(1.0e-25), "v = {}: error = {}", v, error);
        }
    }

    #[test]
    fn origin() {
        let ctx = Context::new(64);
        let (j, jp) = ctx.zero().spherical_j(&ctx, 4).unwrap();
        assert_eq!(j[0], 1);
        assert!(j[1..].iter().all(|v| v.is_zero()));
        assert_eq!(jp[1], ctx.ratio(1, 3));
    }
}
