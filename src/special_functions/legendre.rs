//! Associated Legendre functions `P_v^m(x)` and `Q_v^m(x)` of fixed order
//! at a complex argument off the cut `[-1, 1]`, tabulated over the degree.
//!
//! The normalization is the one appropriate for `x > 1`:
//! `P_m^m(x) = (2m - 1)!! (x^2 - 1)^{m/2}`, without the Condon-Shortley
//! phase. `Q` is tabulated for negative degrees down to `-m` as well, by
//! running its recurrence below zero.

use crate::continued_fraction;
use crate::error::SolverError;
use crate::number::{Context, Complex, Real};
use crate::report;
use crate::report::Diagnostic;
use crate::sequence::Indexed;

/// Deepest continued fraction tried for the ratio `Q_v / Q_{v-1}`.
const RATIO_MAX_DEPTH: usize = 8_388_608;

/// Values and `x`-derivatives of `P_v^m` and `Q_v^m` for one order `m`.
#[derive(Debug, Clone)]
pub struct LegendreTable {
    m: i64,
    p: Vec<Complex>,
    pp: Vec<Complex>,
    q: Indexed<Complex>,
    qp: Indexed<Complex>,
}

impl LegendreTable {
    /// Tabulates `P_v^m` for `0 <= v <= p_top` and `Q_v^m` for
    /// `-m <= v <= q_top` at `x`. Derivatives are available one degree
    /// short of each top.
    pub fn new(ctx: &Context, m: i64, x: &Complex, p_top: usize, q_top: usize) -> Result<Self, SolverError> {
        let int = |k: i64| Complex::from_real(&ctx.int(k));
        let zero = ctx.complex_zero();
        let w = x * x - &int(1);
        let root = w.sqrt();
        let p_top = p_top.max(m as usize + 1);

        // P_v^m vanishes for v < m
        let mut p = vec![zero.clone(); p_top + 1];
        let mut pm = int(1);
        for v in 1..=m {
            pm = &pm * &root * &int(2 * v - 1);
        }
        let mu = m as usize;
        p[mu + 1] = x * &pm * &int(2 * m + 1);
        p[mu] = pm;
        for v in (mu + 2)..=p_top {
            let vi = v as i64;
            p[v] = (&(x * &p[v - 1]) * &int(2 * vi - 1) - &(&p[v - 2] * &int(vi + m - 1))) / &int(vi - m);
        }

        let mut pp = vec![zero.clone(); p_top];
        for v in mu..p_top {
            pp[v] = derivative(x, &w, m, v as i64, &p[v], &p[v + 1], &int);
        }

        // Q_0^m from the two lowest orders
        let mut q0 = ((x + &int(1)) / &(x - &int(1))).ln() / &int(2);
        let mut q1 = -root.recip();
        let base = match m {
            0 => q0,
            1 => q1,
            _ => {
                for k in 2..=m {
                    let q2 = &q0 * &int((k - 1) * (2 - k)) - &(x * &q1 * &int(2 * (k - 1)) / &root);
                    q0 = q1;
                    q1 = q2;
                }
                q1
            },
        };

        // then upward in degree through the ratios Q_v / Q_{v-1}
        let mut ratios = vec![zero.clone(); q_top + 1];
        for v in (1..=q_top).rev() {
            let vi = v as i64;
            ratios[v] = if v == q_top {
                top_ratio(ctx, m, x, vi)?
            } else {
                &int(vi + m) / &(&(x * &int(2 * vi + 1)) - &(&ratios[v + 1] * &int(vi - m + 1)))
            };
        }

        let mut q = Indexed::new();
        q.ensure_len(q_top as i64, &zero);
        q.ensure_len(-m, &zero);
        q[0] = base;
        for v in 1..=(q_top as i64) {
            q[v] = &q[v - 1] * &ratios[v as usize];
        }

        let mut qp = Indexed::new();
        qp.ensure_len(q_top as i64 - 1, &zero);
        qp.ensure_len(-m, &zero);
        for v in 0..(q_top as i64) {
            qp[v] = derivative(x, &w, m, v, &q[v], &q[v + 1], &int);
        }

        // and downward below zero
        for v in (-m..=-1).rev() {
            q[v] = (&(x * &q[v + 1]) * &int(2 * v + 3) - &(&q[v + 2] * &int(v - m + 2))) / &int(v + m + 1);
            qp[v] = derivative(x, &w, m, v, &q[v], &q[v + 1], &int);
        }

        Ok(LegendreTable { m, p, pp, q, qp })
    }

    /// The table at `x = 0` approached from the upper half plane, built
    /// from closed forms. Its `Q` has the `-iπ/2 P` cut term included.
    pub fn at_origin(ctx: &Context, m: i64, p_top: usize, q_top: usize) -> Self {
        let zero = ctx.complex_zero();
        let mu = m as usize;
        let p_top = p_top.max(q_top).max(mu + 1);
        let real = |x: Real| Complex::from_real(&x);

        let mut p = vec![zero.clone(); p_top + 1];
        let mut pp = vec![zero.clone(); p_top + 1];
        for v in mu..=p_top {
            let v = v as i64;
            let k = v - m;
            let (value, n) = if k % 2 == 0 { (&mut p, v + m) } else { (&mut pp, v + m + 1) };
            let j = (k - k % 2) / 2;
            value[v as usize] = real(
                ctx.sign_pow(j) * &ctx.factorial(n)
                / &(ctx.pow2(v) * &ctx.factorial(n / 2) * &ctx.factorial(j))
            );
        }

        let top = q_top.max(mu + 1) as i64;
        let mut q = Indexed::new();
        let mut qp = Indexed::new();
        q.ensure_len(top, &zero);
        qp.ensure_len(top, &zero);
        q.ensure_len(-m, &zero);
        qp.ensure_len(-m, &zero);
        // Q_v^m(0) for odd v - m; it vanishes for even v - m
        let odd = |v: i64| {
            let k = v - m;
            ctx.sign_pow((k + 1) / 2) * &ctx.pow2(v - 1) * &ctx.factorial((v + m - 1) / 2)
                * &ctx.factorial((k - 1) / 2) / &ctx.factorial(k)
        };
        for v in m..=top {
            if (v - m) % 2 == 0 {
                qp[v] = real(odd(v + 1) * (m - v - 1) as i32);
            } else {
                q[v] = real(odd(v));
            }
        }
        for v in (-m..m).rev() {
            let ratio = ctx.ratio(-(v - m + 2), v + m + 1);
            q[v] = &q[v + 2] * &real(ratio);
            qp[v] = &q[v + 1] * &real(ctx.int(-(v - m + 1)));
        }

        // rotate onto the upper half plane
        let phase = ctx.i_pow(m);
        let cut = ctx.complex(&ctx.zero(), &(ctx.pi() / &ctx.int(2)));
        for v in -m..=top {
            let (pv, ppv) = if v >= 0 && (v as usize) <= p_top {
                (p[v as usize].clone(), pp[v as usize].clone())
            } else {
                (zero.clone(), zero.clone())
            };
            q[v] = &phase * &(&q[v] - &(&cut * &pv));
            qp[v] = &phase * &(&qp[v] - &(&cut * &ppv));
        }
        for v in mu..=p_top {
            p[v] = &phase * &p[v];
            pp[v] = &phase * &pp[v];
        }

        LegendreTable { m, p, pp, q, qp }
    }

    pub fn order(&self) -> i64 {
        self.m
    }

    /// `(P_v^m, dP_v^m/dx)`.
    pub fn p(&self, v: i64) -> (&Complex, &Complex) {
        (&self.p[v as usize], &self.pp[v as usize])
    }

    /// `(Q_v^m, dQ_v^m/dx)` for `v >= -m`.
    pub fn q(&self, v: i64) -> (&Complex, &Complex) {
        (&self.q[v], &self.qp[v])
    }
}

/// `dF_v/dx = (-(v + 1) x F_v + (v - m + 1) F_{v+1}) / (x^2 - 1)`, for
/// either kind.
fn derivative<F>(x: &Complex, w: &Complex, m: i64, v: i64, fv: &Complex, next: &Complex, int: &F) -> Complex
where
    F: Fn(i64) -> Complex,
{
    (&(next * &int(v - m + 1)) - &(&(x * fv) * &int(v + 1))) / w
}

/// Ratio `Q_v^m / Q_{v-1}^m` from its continued fraction, evaluated at
/// power-of-two depths until it settles.
fn top_ratio(ctx: &Context, m: i64, x: &Complex, v: i64) -> Result<Complex, SolverError> {
    let int = |k: i64| Complex::from_real(&ctx.int(k));
    let zero = ctx.complex_zero();
    let limit = RATIO_MAX_DEPTH.min(ctx.max_iterations());

    let mut a = vec![int(1)];
    let mut b = vec![];
    let mut previous: Option<Complex> = None;

    for depth in 0..=limit {
        let i = v + depth as i64;
        let last = a.len() - 1;
        a[last] = &a[last] * &int(i + m);
        b.push(x * &int(2 * i + 1));
        a.push(int(i - m + 1));

        if depth > 0 && depth.is_power_of_two() {
            let ratio = -continued_fraction::evaluate(&zero, &a, &b);
            if let Some(prev) = &previous {
                if ctx.has_settled_complex(&ratio, prev) {
                    report!(Diagnostic::Trace, ctx.verbose(), "legendre: Q ratio at v = {} settled at depth {}", v, depth);
                    return Ok(ratio);
                }
            }
            previous = Some(ratio);
        }
    }

    Err(SolverError::IterationLimit("legendre", limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(ctx: &Context, z: &Complex, target: &Real, tol: f64) -> bool {
        let error = (z - &Complex::from_real(target)).abs() / &target.abs();
        println!("value = {:?}, target = {:.20}, error = {:.3}", z, target, error);
        error < ctx.float(tol)
    }

    #[test]
    fn closed_forms_beyond_the_cut() {
        let ctx = Context::new(160);
        let x = ctx.int(3);
        let z = Complex::from_real(&x);
        let table = LegendreTable::new(&ctx, 0, &z, 6, 8).unwrap();

        // P_2 = (3x^2 - 1) / 2, Q_0 = atanh(1/x), Q_1 = x Q_0 - 1
        let q0 = (ctx.int(4) / &ctx.int(2)).ln() / &ctx.int(2);
        let q1 = &x * &q0 - &ctx.one();
        assert!(close(&ctx, table.p(2).0, &ctx.int(13), 1.0e-40));
        assert!(close(&ctx, table.p(2).1, &ctx.int(9), 1.0e-40));
        assert!(close(&ctx, table.q(0).0, &q0, 1.0e-40));
        assert!(close(&ctx, table.q(1).0, &q1, 1.0e-40));
        // Q_0' = 1 / (1 - x^2)
        assert!(close(&ctx, table.q(0).1, &ctx.ratio(-1, 8), 1.0e-40));
    }

    #[test]
    fn wronskian_in_degree() {
        // P_v^m Q_{v-1}^m - P_{v-1}^m Q_v^m = (-1)^m (v + m - 1)! / (v - m)!
        let ctx = Context::new(160);
        let z = Complex::from_real(&ctx.ratio(5, 4));
        let m = 2;
        let table = LegendreTable::new(&ctx, m, &z, 12, 12).unwrap();
        for v in (m + 1)..=10 {
            let w = table.p(v).0 * table.q(v - 1).0 - &(table.p(v - 1).0 * table.q(v).0);
            let target = ctx.sign_pow(m) * &ctx.factorial(v + m - 1) / &ctx.factorial(v - m);
            assert!(close(&ctx, &w, &target, 1.0e-35));
        }
    }

    #[test]
    fn negative_degrees_satisfy_the_recurrence() {
        let ctx = Context::new(128);
        let z = ctx.complex(&ctx.zero(), &ctx.ratio(1, 2));
        let m = 3;
        let table = LegendreTable::new(&ctx, m, &z, 8, 8).unwrap();
        let int = |k: i64| Complex::from_real(&ctx.int(k));
        // (v - m + 1) Q_{v+1} = (2v + 1) x Q_v - (v + m) Q_{v-1}
        for v in (-m + 1)..=5 {
            let lhs = table.q(v + 1).0 * &int(v - m + 1);
            let rhs = &(&(&z * table.q(v).0) * &int(2 * v + 1)) - &(table.q(v - 1).0 * &int(v + m));
            let error = (&lhs - &rhs).abs() / &table.q(v).0.abs();
            println!("v = {}: residual = {:.3}", v, error);
            assert!(error < ctx.float(1.0e-30));
        }
    }
}
