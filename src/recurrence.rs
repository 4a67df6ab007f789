//! Coefficients of the three-term recurrences satisfied by the
//! Legendre expansion coefficients d_r of a spheroidal mode.

use crate::error::SolverError;
use crate::geometry::{Geometry, Spheroid};
use crate::number::{Context, Real};

/// A spheroidal mode `(c, m, n)` of a given geometry, together with the
/// working precision.
#[derive(Debug, Clone)]
pub struct Mode {
    ctx: Context,
    shape: Spheroid,
    c: Real,
    c2: Real,
    m: i64,
    n: i64,
}

impl Mode {
    pub fn new(ctx: &Context, shape: Spheroid, c: &Real, m: i64, n: i64) -> Result<Self, SolverError> {
        if m < 0 || n < m {
            return Err(SolverError::InvalidMode(m, n));
        }
        let c = ctx.convert(c);
        let c2 = &c * &c * shape.sign();
        Ok(Mode { ctx: ctx.clone(), shape, c, c2, m, n })
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub fn shape(&self) -> Spheroid {
        self.shape
    }

    pub fn c(&self) -> &Real {
        &self.c
    }

    /// `c^2` for prolate and `-c^2` for oblate modes.
    pub fn c2(&self) -> &Real {
        &self.c2
    }

    pub fn m(&self) -> i64 {
        self.m
    }

    pub fn n(&self) -> i64 {
        self.n
    }

    /// True if `n - m` is even.
    pub fn is_even(&self) -> bool {
        (self.n - self.m) % 2 == 0
    }

    /// `(n - m) mod 2`: the lowest index present in the expansion.
    pub fn parity(&self) -> i64 {
        (self.n - self.m) % 2
    }

    pub fn is_spherical(&self) -> bool {
        self.c.is_zero()
    }

    /// Largest index with a nonzero coefficient: `n - m` when `c = 0`,
    /// unbounded otherwise. Open-ended series over `d_r` stop here.
    pub fn index_bound(&self) -> i64 {
        if self.is_spherical() { self.n - self.m } else { i64::MAX }
    }

    pub fn alpha(&self, r: i64) -> Real {
        let m = self.m;
        self.ctx.quotient(
            &[2 * m + r + 2, 2 * m + r + 1],
            &[2 * m + 2 * r + 5, 2 * m + 2 * r + 3],
        ) * &self.c2
    }

    pub fn beta(&self, r: i64) -> Real {
        let m = self.m;
        let k = (m + r) * (m + r + 1);
        let shift = self.ctx.quotient(
            &[2 * k - 2 * m * m - 1],
            &[2 * m + 2 * r - 1, 2 * m + 2 * r + 3],
        ) * &self.c2;
        self.ctx.int(k) + &shift
    }

    pub fn gamma(&self, r: i64) -> Real {
        let m = self.m;
        self.ctx.quotient(
            &[r, r - 1],
            &[2 * m + 2 * r - 3, 2 * m + 2 * r - 1],
        ) * &self.c2
    }

    /// Off-diagonal product `γ(r) α(r - 2)` of the recurrence written for
    /// ratios `d_r / d_{r-2}`.
    pub fn beta_rm(&self, r: i64) -> Real {
        self.gamma(r) * &self.alpha(r - 2)
    }

    pub fn gamma_rm(&self, r: i64) -> Real {
        self.beta(r)
    }

    /// Coefficients of `A(r) d_{r+2} + B(r) d_r + C(r) d_{r-2} = 0`
    /// in the form used for negative `r`.
    pub fn a_rm(&self, r: i64) -> Real {
        self.alpha(r - 2)
    }

    pub fn b_rm(&self, lambda: &Real, r: i64) -> Real {
        self.beta(r) - lambda
    }

    pub fn c_rm(&self, r: i64) -> Real {
        self.gamma(r + 2)
    }

    /// Recurrence residual `α(r) d_{r+2} + (β(r) - λ) d_r + γ(r) d_{r-2}`,
    /// with `d` taken as zero outside the given accessor's range.
    pub fn residual<F>(&self, lambda: &Real, r: i64, d: F) -> Real
    where
        F: Fn(i64) -> Option<Real>,
    {
        let zero = self.ctx.zero();
        let up = d(r + 2).unwrap_or_else(|| zero.clone());
        let mid = d(r).unwrap_or_else(|| zero.clone());
        let down = d(r - 2).unwrap_or(zero);
        self.alpha(r) * &up + &((self.beta(r) - lambda) * &mid) + &(self.gamma(r) * &down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Prolate, Oblate};

    #[test]
    fn invalid_modes_are_rejected() {
        let ctx = Context::new(64);
        let c = ctx.one();
        assert!(Mode::new(&ctx, Prolate.into(), &c, 3, 2).is_err());
        assert!(Mode::new(&ctx, Prolate.into(), &c, -1, 2).is_err());
        assert!(Mode::new(&ctx, Oblate.into(), &c, 2, 2).is_ok());
    }

    #[test]
    fn coefficients_for_m0() {
        let ctx = Context::new(128);
        let c = ctx.int(2);
        let pro = Mode::new(&ctx, Prolate.into(), &c, 0, 0).unwrap();
        let obl = Mode::new(&ctx, Oblate.into(), &c, 0, 0).unwrap();

        // α(0) = 2 * 1 / (5 * 3) c^2
        assert_eq!(pro.alpha(0), ctx.ratio(8, 15));
        assert_eq!(obl.alpha(0), ctx.ratio(-8, 15));
        // β(0) = 0 + (-1) / (-1 * 3) c^2
        assert_eq!(pro.beta(0), ctx.ratio(4, 3));
        // γ(2) = 2 / (1 * 3) c^2
        assert_eq!(pro.gamma(2), ctx.ratio(8, 3));
        assert!(pro.gamma(0).is_zero() && pro.gamma(1).is_zero());
        assert_eq!(pro.beta_rm(2), pro.gamma(2) * &pro.alpha(0));
        assert_eq!(pro.c_rm(0), pro.gamma(2));
    }

    #[test]
    fn spherical_limit() {
        let ctx = Context::new(64);
        let mode = Mode::new(&ctx, Prolate.into(), &ctx.zero(), 2, 5).unwrap();
        assert!(mode.is_spherical());
        assert!(!mode.is_even());
        assert_eq!(mode.parity(), 1);
        // β reduces to (m + r)(m + r + 1)
        assert_eq!(mode.beta(3), 30);
        assert!(mode.alpha(1).is_zero());
    }
}
