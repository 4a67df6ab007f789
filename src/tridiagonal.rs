//! Coefficients `B_2r` of the power series in the oblate second-kind
//! radial function,
//!
//! `R2 = Q R1 (atan ξ - π/2) + (ξ^2 + 1)^{-m/2} ξ^{1-p} Σ B_2r ξ^{2r}`,
//!
//! which satisfy the inhomogeneous three-term recurrence
//! `α(r) B_{2r+2} + β(r) B_2r + γ B_{2r-2} = h(r)`.
//!
//! `B_0` is fixed by the Wronskian at `ξ = 0`. The recurrence is run
//! forward while the solution grows; past the largest coefficient it is
//! solved instead as a tridiagonal system by forward elimination and
//! back substitution, with the system extended until the coefficients it
//! returns stop changing.

use crate::coefficients::{double, get_c2k};
use crate::error::SolverError;
use crate::number::Real;
use crate::radial::calculate_rmn1_2;
use crate::recurrence::Mode;
use crate::report;
use crate::report::Diagnostic;
use crate::sequence::Indexed;
use crate::summation::{sum_series, Series};

/// Rows added to the tridiagonal system per extension.
const BLOCK: usize = 100;

/// Inhomogeneous terms `h(r)`, each computed at most once.
#[derive(Debug, Clone, Default)]
pub struct HCache {
    values: Vec<Option<Real>>,
}

impl HCache {
    pub fn new() -> Self {
        HCache { values: Vec::new() }
    }

    pub fn get(&self, r: usize) -> Option<&Real> {
        self.values.get(r).and_then(|h| h.as_ref())
    }

    fn insert(&mut self, r: usize, h: Real) {
        if self.values.len() <= r {
            self.values.resize(r + 1, None);
        }
        self.values[r] = Some(h);
    }

    /// Number of indices with a stored value.
    pub fn count(&self) -> usize {
        self.values.iter().filter(|h| h.is_some()).count()
    }
}

/// The recurrence for one mode, with everything `h(r)` draws on.
struct System<'a> {
    mode: &'a Mode,
    lambda: &'a Real,
    dr: &'a mut Indexed<Real>,
    c2k: &'a mut Vec<Real>,
    k1: &'a Real,
    q: &'a Real,
    cache: HCache,
}

impl<'a> System<'a> {
    fn alpha(&self, r: usize) -> Real {
        let r = r as i64;
        let k = if self.mode.is_even() { (2 * r + 2) * (2 * r + 3) } else { (2 * r + 1) * (2 * r + 2) };
        self.mode.ctx().int(k)
    }

    fn beta(&self, r: usize) -> Real {
        let (r, m) = (r as i64, self.mode.m());
        let k = if self.mode.is_even() {
            (2 * r + 1) * (2 * r - 2 * m + 2)
        } else {
            2 * r * (2 * r - 2 * m + 1)
        };
        self.mode.ctx().int(k + m * (m - 1)) - self.lambda
    }

    fn gamma(&self) -> Real {
        self.mode.c() * self.mode.c()
    }

    /// `Σ_k c_2k (m + 2k + shift) a_k`, with `a_k` the binomial-like factor
    /// `(top + k)! / ((top + k - r)! ...)` normalized to one at its first
    /// nonzero term.
    fn binomial_series(&mut self, r: i64, top: i64, shift: i64) -> Result<Real, SolverError> {
        let mode = self.mode;
        let ctx = mode.ctx();
        let m = mode.m();
        let k0 = (r - top).max(0);
        // c_2k vanishes beyond (n - m) / 2 when c = 0
        let bound = if mode.is_spherical() { (mode.index_bound() - mode.parity()) / 2 } else { i64::MAX };

        let (lambda, dr, c2k) = (self.lambda, &mut *self.dr, &mut *self.c2k);
        let mut a = ctx.zero();
        let mut series = Series::new(ctx);
        sum_series(ctx, "calculate_b2r", &mut series, k0..=bound, |k| {
            if k == k0 {
                a = if k0 == r - top {
                    ctx.one()
                } else {
                    ctx.factorial(top) / &(ctx.factorial(top - r) * &ctx.factorial(r))
                };
            } else {
                a *= ctx.quotient(&[top + k], &[top + k - r]);
            }
            let c = get_c2k(mode, lambda, dr, c2k, k as usize)?;
            Ok(c * &a * (m + 2 * k + shift) as i32)
        })?;
        Ok(series.total())
    }

    fn h(&mut self, r: usize) -> Result<Real, SolverError> {
        if let Some(h) = self.cache.get(r) {
            return Ok(h.clone());
        }
        let m = self.mode.m();
        let ri = r as i64;
        let s1 = self.binomial_series(ri, m - 1, 0)?;
        let s = if self.mode.is_even() {
            s1
        } else {
            self.binomial_series(ri, m, 1)? - &s1
        };
        let h = -(self.q * 2 / self.k1 * &s);
        self.cache.insert(r, h.clone());
        Ok(h)
    }

    /// `B_0`, from the Wronskian of the first- and second-kind functions
    /// at `ξ = 0`.
    fn initial(&self) -> Result<Real, SolverError> {
        let ctx = self.mode.ctx();
        let c = self.mode.c();
        let (r1, r1p) = calculate_rmn1_2(self.mode, self.c2k.as_slice(), self.k1, &ctx.zero())?;
        if self.mode.is_even() {
            Ok((c * &r1).recip() - &(self.q * &r1))
        } else {
            Ok(-(c * &r1p).recip())
        }
    }

    fn forward(&mut self, n: usize) -> Result<Vec<Real>, SolverError> {
        let zero = self.mode.ctx().zero();
        let mut b = vec![zero.clone(); n];
        b[0] = self.initial()?;
        for r in 0..(n - 1) {
            let below = if r > 0 { self.gamma() * &b[r - 1] } else { zero.clone() };
            b[r + 1] = (self.h(r)? - &(self.beta(r) * &b[r]) - &below) / &self.alpha(r);
        }
        Ok(b)
    }

    /// Solves rows `r0 + 1 ..` with `B_{2 r0} = b0` held fixed, growing the
    /// system in blocks until the first `n` coefficients have settled.
    fn backward(&mut self, n: usize, r0: usize, b0: &Real) -> Result<Vec<Real>, SolverError> {
        let ctx = self.mode.ctx();
        let zero = ctx.zero();
        let gamma = self.gamma();

        // elimination factors for rows r0 + 1 + i
        let mut p: Vec<Real> = Vec::new();
        let mut e: Vec<Real> = Vec::new();
        let mut previous: Option<Vec<Real>> = None;
        let mut len = n;

        loop {
            for r in (r0 + 1 + p.len())..len {
                let (p_prev, e_prev) = match (p.last(), e.last()) {
                    (Some(pp), Some(ep)) => (pp.clone(), ep.clone()),
                    _ => (zero.clone(), b0.clone()),
                };
                let den = self.beta(r) - &(&gamma * &p_prev);
                let num = self.h(r)? - &(&gamma * &e_prev);
                p.push(self.alpha(r) / &den);
                e.push(num / &den);
            }

            let mut b = vec![zero.clone(); len];
            b[len - 1] = e[len - r0 - 2].clone();
            for r in ((r0 + 1)..(len - 1)).rev() {
                let i = r - r0 - 1;
                b[r] = &e[i] - &(&p[i] * &b[r + 1]);
            }
            b[r0] = b0.clone();
            b.truncate(n);

            if let Some(prev) = &previous {
                if (r0..n).all(|r| ctx.has_settled(&b[r], &prev[r])) {
                    report!(Diagnostic::Trace, ctx.verbose(), "calculate_b2r: backward pass settled with {} rows", len);
                    return Ok(b);
                }
            }
            if len - n >= ctx.max_iterations() {
                return Err(SolverError::IterationLimit("calculate_b2r", ctx.max_iterations()));
            }
            previous = Some(b);
            len += BLOCK;
        }
    }

    fn once(&mut self, n: usize) -> Result<Vec<Real>, SolverError> {
        let mut b = self.forward(n)?;

        // first index of largest magnitude
        let mut max_r = 0;
        for r in 1..n {
            if b[r].cmp_abs(&b[max_r]).is_gt() {
                max_r = r;
            }
        }

        if max_r < n - 1 {
            report!(Diagnostic::Trace, self.mode.ctx().verbose(), "calculate_b2r: switching to the backward pass at r = {}", max_r);
            let tail = self.backward(n, max_r, &b[max_r])?;
            for (r, value) in tail.into_iter().enumerate().skip(max_r + 1) {
                b[r] = value;
            }
        }
        Ok(b)
    }
}

/// Generates `B_2r` for `0 <= r < n_b2r` into `b2r`, doubling the length
/// until the last coefficient is below `b2r_min`, then trimming to two
/// beyond the last coefficient above it. Oblate modes only. Returns the
/// final length.
#[allow(clippy::too_many_arguments)]
pub fn calculate_b2r(
    mode: &Mode,
    lambda: &Real,
    dr: &mut Indexed<Real>,
    c2k: &mut Vec<Real>,
    k1: &Real,
    q: &Real,
    b2r: &mut Vec<Real>,
    n_b2r: usize,
    b2r_min: &Real,
) -> Result<usize, SolverError> {
    if mode.shape().is_prolate() {
        return Err(SolverError::WrongGeometry("calculate_b2r"));
    }
    if c2k.is_empty() {
        return Err(SolverError::MissingCoefficients("c2k"));
    }

    let ctx = mode.ctx();
    let n_orig = n_b2r.max(1);
    let mut n = n_orig;
    let mut system = System { mode, lambda, dr, c2k, k1, q, cache: HCache::new() };

    loop {
        *b2r = system.once(n)?;
        if b2r_min.is_zero() || b2r[n - 1].abs() < *b2r_min {
            break;
        }
        n = double(ctx, "calculate_b2r", n)?;
    }

    if !b2r_min.is_zero() {
        if let Some(r) = (0..n).rev().find(|&r| b2r[r].abs() >= *b2r_min) {
            let remove_where = r + 2;
            if remove_where >= n_orig && remove_where < n {
                b2r.truncate(remove_where);
            }
        }
    }

    report!(Diagnostic::Trace, ctx.verbose(), "calculate_b2r: n_B2r = {}, {} values of h computed", b2r.len(), system.cache.count());
    Ok(b2r.len())
}
