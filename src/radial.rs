//! Radial functions of the first and second kind, `R_mn^(1)(c, ξ)` and
//! `R_mn^(2)(c, ξ)`, and their derivatives with respect to `ξ`.
//!
//! Each kind has more than one representation, with different ranges of
//! usefulness; the Wronskian `R1 R2' - R1' R2 = 1 / (c (ξ^2 ∓ 1))` checks
//! any pairing of them.
//!
//! - `R1_1`, `R2_1`: products of `d_r` and spherical Bessel functions of
//!   argument `cξ`, best for large `ξ`.
//! - `R1_2`: the power series in `1 ∓ ξ^2` from `c_2k`, best close to
//!   the focus.
//! - `R2_2`: associated Legendre functions of `ξ` (prolate) or `iξ`
//!   (oblate), using both branches of `d_r`.
//! - `R2_3`: oblate only, the `B_2r` power series in `ξ^2` plus the
//!   logarithmic part `Q R1 (atan ξ - π/2)`.

use crate::angular::{power_series, with_prefactor};
use crate::error::SolverError;
use crate::geometry::Geometry;
use crate::number::{Context, Real};
use crate::recurrence::Mode;
use crate::sequence::Indexed;
use crate::special_functions::{LegendreTable, SphericalBessel};
use crate::summation::{sum_series, ComplexSeries, Paired, Series};

/// `b^{e/2}` and its derivative with respect to `b`.
fn half_power(ctx: &Context, b: &Real, e: i64) -> (Real, Real) {
    let value = b.pow(&ctx.ratio(e, 2));
    let slope = if e == 0 {
        ctx.zero()
    } else {
        b.pow(&ctx.ratio(e - 2, 2)) * &ctx.ratio(e, 2)
    };
    (value, slope)
}

/// `Σ' a_r d_r f_{m+r}(cξ)` with its derivative, where `f` is `j` for the
/// first kind and `y` for the second.
fn bessel_series(mode: &Mode, dr: &Indexed<Real>, xi: &Real, second: bool) -> Result<(Real, Real), SolverError> {
    let ctx = mode.ctx();
    let (m, n) = (mode.m(), mode.n());
    let p = mode.parity();
    let n_dr = dr.nonneg_len() as i64;
    if n_dr == 0 {
        return Err(SolverError::MissingCoefficients("dr"));
    }

    let x = mode.c() * xi;
    let top = (m + n_dr) as usize;
    let (f, fp) = if second {
        x.spherical_y(ctx, top)
    } else {
        x.spherical_j(ctx, top)?
    };
    let routine = if second { "calculate_rmn2_1" } else { "calculate_rmn1_1" };

    let mut a = ctx.zero();
    let mut acc = Paired::<Series>::new(ctx);
    sum_series(ctx, routine, &mut acc, (p..=(n_dr - 2 + p)).step_by(2), |r| {
        if r == p {
            a = ctx.sign_pow((n - m - p) / 2) * &ctx.factorial(2 * m + p);
        } else {
            a *= ctx.quotient(&[-(2 * m + r - 1), 2 * m + r], &[r - 1, r]);
        }
        let v = (m + r) as usize;
        let ad = &a * &dr[r];
        Ok((&ad * &f[v], &ad * &fp[v] * mode.c()))
    })?;

    let (s, sp) = acc.totals();
    Ok((s, sp))
}

/// Applies `(1 ∓ 1/ξ^2)^{m/2} / F` to a spherical-Bessel expansion.
fn far_prefactor(mode: &Mode, f: &Real, xi: &Real, (s, sp): (Real, Real)) -> (Real, Real) {
    let ctx = mode.ctx();
    let shape = mode.shape();
    let (pw, dpw) = half_power(ctx, &shape.far_base(xi), mode.m());
    // d/dξ (1 ∓ 1/ξ^2) = ±2/ξ^3
    let dbase = ctx.int(2 * shape.sign() as i64) / &xi.powi(3);
    let (r, rp) = with_prefactor(false, xi, &pw, &(dpw * &dbase), &s, &sp);
    (r / f, rp / f)
}

/// First-kind radial function from spherical Bessel functions `j`. Needs
/// `ξ > 0` when `m > 0`.
pub fn calculate_rmn1_1(mode: &Mode, dr: &Indexed<Real>, f: &Real, xi: &Real) -> Result<(Real, Real), SolverError> {
    let series = bessel_series(mode, dr, xi, false)?;
    Ok(far_prefactor(mode, f, xi, series))
}

/// First-kind radial function from the power series with coefficients
/// `c2k`, scaled by the joining factor `k1`.
pub fn calculate_rmn1_2(mode: &Mode, c2k: &[Real], k1: &Real, xi: &Real) -> Result<(Real, Real), SolverError> {
    let ctx = mode.ctx();
    let shape = mode.shape();
    if c2k.is_empty() {
        return Err(SolverError::MissingCoefficients("c2k"));
    }

    // 1 ∓ ξ^2
    let w = ctx.one() - &(xi * xi * shape.sign());
    let dw = xi * (-2 * shape.sign());
    let (s, sp) = power_series(ctx, "calculate_rmn1_2", c2k, &w, &dw)?;

    let (pw, dpw) = half_power(ctx, &shape.near_base(xi), mode.m());
    let (r, rp) = with_prefactor(!mode.is_even(), xi, &pw, &(dpw * xi * 2), &s, &sp);
    Ok((r / k1, rp / k1))
}

/// Second-kind radial function from spherical Bessel functions `y`.
pub fn calculate_rmn2_1(mode: &Mode, dr: &Indexed<Real>, f: &Real, xi: &Real) -> Result<(Real, Real), SolverError> {
    let series = bessel_series(mode, dr, xi, true)?;
    Ok(far_prefactor(mode, f, xi, series))
}

/// Second-kind radial function from associated Legendre functions, using
/// the coefficients on both sides of `r = 0`. The prolate function is
/// singular at `ξ = 1`, where NaN is returned.
pub fn calculate_rmn2_2(mode: &Mode, dr: &Indexed<Real>, k2: &Real, xi: &Real) -> Result<(Real, Real), SolverError> {
    let ctx = mode.ctx();
    let shape = mode.shape();
    let m = mode.m();
    let p = mode.parity();

    if shape.is_prolate() && *xi == 1 {
        return Ok((ctx.nan(), ctx.nan()));
    }

    let n_dr = dr.nonneg_len() as i64;
    let n_dr_neg = dr.neg_len() as i64;
    if n_dr == 0 {
        return Err(SolverError::MissingCoefficients("dr"));
    }

    let table = if !shape.is_prolate() && xi.is_zero() {
        LegendreTable::at_origin(ctx, m, (n_dr_neg - m - 1).max(0) as usize, (m + n_dr - 1) as usize)
    } else {
        let x = shape.legendre_argument(ctx, xi);
        LegendreTable::new(ctx, m, &x, (n_dr_neg - m).max(m + 1) as usize, (m + n_dr) as usize)?
    };

    let mut acc = Paired::<ComplexSeries>::new(ctx);

    // d_r with r <= -2m - 2 multiply P_{-r-m-1}
    let low = -n_dr_neg + p;
    let high = -2 * m - 2 + p;
    sum_series(ctx, "calculate_rmn2_2", &mut acc, (low..=high).rev().step_by(2), |r| {
        let (v, vp) = table.p(-r - m - 1);
        Ok((v.scale(&dr[r]), vp.scale(&dr[r])))
    })?;

    // -2m <= r < 0, where Q has negative degree
    let low = (-n_dr_neg + p).max(-2 * m + p);
    sum_series(ctx, "calculate_rmn2_2", &mut acc, (low..=(p - 2)).rev().step_by(2), |r| {
        let (v, vp) = table.q(m + r);
        Ok((v.scale(&dr[r]), vp.scale(&dr[r])))
    })?;

    sum_series(ctx, "calculate_rmn2_2", &mut acc, (p..=(n_dr - 2 + p)).step_by(2), |r| {
        let (v, vp) = table.q(m + r);
        Ok((v.scale(&dr[r]), vp.scale(&dr[r])))
    })?;

    let (s, sp) = acc.totals();
    let factor = ctx.i_pow(shape.legendre_phase(m, mode.is_even())).scale(&k2.recip());
    let r2 = (&factor * &s).real();
    let r2p = (&factor * &shape.legendre_slope(ctx) * &sp).real();
    Ok((r2, r2p))
}

/// Oblate second-kind radial function from the `B_2r` power series in
/// `ξ^2` and the logarithmic part `Q R1 (atan ξ - π/2)`, where `r1` is a
/// first-kind value and derivative at the same `ξ`.
pub fn calculate_rmn2_3(mode: &Mode, q: &Real, b2r: &[Real], xi: &Real, r1: &(Real, Real)) -> Result<(Real, Real), SolverError> {
    let ctx = mode.ctx();
    let shape = mode.shape();
    if shape.is_prolate() {
        return Err(SolverError::WrongGeometry("calculate_rmn2_3"));
    }
    if b2r.is_empty() {
        return Err(SolverError::MissingCoefficients("B2r"));
    }

    let (s, sp) = power_series(ctx, "calculate_rmn2_3", b2r, &(xi * xi), &(xi * 2))?;

    let base = shape.near_base(xi);
    let (pw, dpw) = half_power(ctx, &base, -mode.m());
    let (r, rp) = with_prefactor(mode.is_even(), xi, &pw, &(dpw * xi * 2), &s, &sp);

    let t = xi.atan() - &(ctx.pi() / &ctx.int(2));
    let (r1, r1p) = r1;
    let r2 = q * r1 * &t + &r;
    let r2p = q * r1p * &t + &(q * r1 / &base) + &rp;
    Ok((r2, r2p))
}

/// `R1 R2' - R1' R2`, to compare with [`Geometry::wronskian`].
pub fn wronskian(r1: &(Real, Real), r2: &(Real, Real)) -> Real {
    &r1.0 * &r2.1 - &(&r1.1 * &r2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coefficients::{calculate_c2k, calculate_dr, calculate_dr_neg};
    use crate::eigenvalue::{calculate_lambda, default_lambda_approx};
    use crate::geometry::{Prolate, Oblate, Spheroid};
    use crate::normalization::{calculate_fmn, calculate_kmn1, calculate_kmn2, calculate_qmn};
    use crate::tridiagonal::calculate_b2r;

    /// Everything the radial functions need for one mode.
    struct Setup {
        mode: Mode,
        dr: Indexed<Real>,
        c2k: Vec<Real>,
        b2r: Vec<Real>,
        f: Real,
        k1: Real,
        k2: Real,
        q: Real,
    }

    fn setup(ctx: &Context, shape: Spheroid, c: f64, m: i64, n: i64) -> Setup {
        let mode = Mode::new(ctx, shape, &ctx.float(c), m, n).unwrap();
        let lambda = calculate_lambda(&mode, &default_lambda_approx(&mode)).unwrap();
        let mut dr = Indexed::new();
        calculate_dr(&mode, &lambda, &mut dr, 80, &ctx.zero()).unwrap();
        calculate_dr_neg(&mode, &lambda, &mut dr, 80, &ctx.zero()).unwrap();
        let mut c2k = vec![];
        calculate_c2k(&mode, &lambda, &mut dr, &mut c2k, 80, &ctx.zero()).unwrap();
        let f = calculate_fmn(&mode, &lambda, &mut dr).unwrap();
        let k1 = calculate_kmn1(&mode, &dr, &f).unwrap();
        let k2 = calculate_kmn2(&mode, &lambda, &mut dr, &f).unwrap();

        let (q, b2r) = if shape.is_prolate() {
            (ctx.zero(), vec![])
        } else {
            let q = calculate_qmn(&mode, &lambda, &mut dr, &mut c2k, &k1).unwrap();
            let mut b2r = vec![];
            calculate_b2r(&mode, &lambda, &mut dr, &mut c2k, &k1, &q, &mut b2r, 80, &ctx.zero()).unwrap();
            (q, b2r)
        };

        Setup { mode, dr, c2k, b2r, f, k1, k2, q }
    }

    fn wronskian_error(s: &Setup, xi: &Real, r1: &(Real, Real), r2: &(Real, Real)) -> Real {
        let target = s.mode.shape().wronskian(s.mode.c(), xi);
        let w = wronskian(r1, r2);
        let error = ((&w - &target) / &target).abs();
        println!(
            "{:?}, m = {}, n = {}, ξ = {:.3}: R1 = {:.20}, R2 = {:.20}, W = {:.20}, error = {:.3}",
            s.mode.shape(), s.mode.m(), s.mode.n(), xi, r1.0, r2.0, w, error,
        );
        error
    }

    /// Largest difference in value or slope, relative to the larger of
    /// the two in `a`.
    fn agree(a: &(Real, Real), b: &(Real, Real)) -> Real {
        let scale = a.0.abs().max(&a.1.abs());
        let error = (&a.0 - &b.0).abs().max(&(&a.1 - &b.1).abs()) / &scale;
        println!("  {:.20} vs {:.20}: difference = {:.3}", a.0, b.0, error);
        error
    }

    /// `10^-(d - 2)` for the `d` decimal digits carried by `ctx`.
    fn tolerance(ctx: &Context) -> Real {
        let digits = (ctx.precision() as f64 * std::f64::consts::LOG10_2).floor() as i64;
        ctx.parse(&format!("1e-{}", digits - 2)).unwrap()
    }

    #[test]
    fn prolate_wronskians() {
        let ctx = Context::new(128);
        let tol = tolerance(&ctx);
        for &(c, m, n) in &[(1.0, 0, 0), (1.0, 1, 2), (2.5, 2, 3)] {
            let s = setup(&ctx, Prolate.into(), c, m, n);
            for &x in &[1.25, 2.0, 5.0] {
                let xi = ctx.float(x);
                let r1_1 = calculate_rmn1_1(&s.mode, &s.dr, &s.f, &xi).unwrap();
                let r2_2 = calculate_rmn2_2(&s.mode, &s.dr, &s.k2, &xi).unwrap();
                assert!(wronskian_error(&s, &xi, &r1_1, &r2_2) < tol);

                if x < 1.5 {
                    // the power series is only used close to the focus
                    let r1_2 = calculate_rmn1_2(&s.mode, &s.c2k, &s.k1, &xi).unwrap();
                    assert!(agree(&r1_1, &r1_2) < tol);
                    assert!(wronskian_error(&s, &xi, &r1_2, &r2_2) < tol);
                } else {
                    let r2_1 = calculate_rmn2_1(&s.mode, &s.dr, &s.f, &xi).unwrap();
                    assert!(wronskian_error(&s, &xi, &r1_1, &r2_1) < tol);
                    assert!(agree(&r2_1, &r2_2) < tol);
                }
            }
        }
    }

    #[test]
    fn oblate_wronskians() {
        let ctx = Context::new(128);
        let tol = tolerance(&ctx);
        for &(c, m, n) in &[(1.0, 0, 0), (1.0, 1, 2), (1.5, 2, 5)] {
            let s = setup(&ctx, Oblate.into(), c, m, n);
            for &x in &[0.25, 0.5, 2.0] {
                let xi = ctx.float(x);
                let r1_1 = calculate_rmn1_1(&s.mode, &s.dr, &s.f, &xi).unwrap();
                let r2_2 = calculate_rmn2_2(&s.mode, &s.dr, &s.k2, &xi).unwrap();

                if x < 1.0 {
                    // the B_2r series converges inside |ξ| = 1
                    let r1_2 = calculate_rmn1_2(&s.mode, &s.c2k, &s.k1, &xi).unwrap();
                    assert!(agree(&r1_1, &r1_2) < tol);

                    let r2_3 = calculate_rmn2_3(&s.mode, &s.q, &s.b2r, &xi, &r1_2).unwrap();
                    assert!(wronskian_error(&s, &xi, &r1_2, &r2_2) < tol);
                    assert!(wronskian_error(&s, &xi, &r1_2, &r2_3) < tol);
                    // the Wronskian alone allows R2 + κ R1
                    assert!(agree(&r2_2, &r2_3) < tol);
                } else {
                    let r2_1 = calculate_rmn2_1(&s.mode, &s.dr, &s.f, &xi).unwrap();
                    assert!(wronskian_error(&s, &xi, &r1_1, &r2_1) < tol);
                    assert!(wronskian_error(&s, &xi, &r1_1, &r2_2) < tol);
                    assert!(agree(&r2_1, &r2_2) < tol);
                }
            }
        }
    }

    #[test]
    fn oblate_origin() {
        // the closed-form Legendre table at ξ = 0 matches the B_2r form
        let ctx = Context::new(128);
        let tol = tolerance(&ctx);
        let xi = ctx.zero();
        for &(m, n) in &[(0, 0), (0, 1), (1, 3)] {
            let s = setup(&ctx, Oblate.into(), 1.0, m, n);
            let r1 = calculate_rmn1_2(&s.mode, &s.c2k, &s.k1, &xi).unwrap();
            let r2_2 = calculate_rmn2_2(&s.mode, &s.dr, &s.k2, &xi).unwrap();
            let r2_3 = calculate_rmn2_3(&s.mode, &s.q, &s.b2r, &xi, &r1).unwrap();
            assert!(wronskian_error(&s, &xi, &r1, &r2_2) < tol);
            assert!(wronskian_error(&s, &xi, &r1, &r2_3) < tol);
            assert!(agree(&r2_2, &r2_3) < tol);
        }
    }

    #[test]
    fn no_coefficients() {
        let ctx = Context::new(64);
        let mode = Mode::new(&ctx, Oblate.into(), &ctx.one(), 0, 0).unwrap();
        let xi = ctx.float(0.5);
        let r1 = calculate_rmn1_2(&mode, &[], &ctx.one(), &xi);
        assert!(matches!(r1, Err(SolverError::MissingCoefficients("c2k"))));
        let r2 = calculate_rmn2_2(&mode, &Indexed::new(), &ctx.one(), &xi);
        assert!(matches!(r2, Err(SolverError::MissingCoefficients("dr"))));
    }

    #[test]
    fn prolate_focus_is_singular() {
        let ctx = Context::new(64);
        let s = setup(&ctx, Prolate.into(), 1.0, 0, 0);
        let (r2, r2p) = calculate_rmn2_2(&s.mode, &s.dr, &s.k2, &ctx.one()).unwrap();
        assert!(r2.is_nan() && r2p.is_nan());
        assert!(calculate_rmn2_3(&s.mode, &s.q, &[ctx.one()], &ctx.int(2), &(ctx.one(), ctx.one())).is_err());
    }
}
