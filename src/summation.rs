//! Pairwise summation and the adaptive series driver built on it.
//!
//! The terms of the series met in this crate span many orders of
//! magnitude and frequently alternate in sign. `Adder` keeps every term,
//! sorts them by magnitude and combines them in a binary cascade, so that
//! partial sums of similar size are added to each other.

use crate::error::SolverError;
use crate::number::{Context, Complex, Real};
use crate::report;
use crate::report::Diagnostic;

/// A growing multiset of real terms with a cached pairwise sum.
#[derive(Debug, Clone)]
pub struct Adder {
    terms: Vec<Real>,
    zero: Real,
    sum: Option<Real>,
}

impl Adder {
    pub fn new(ctx: &Context) -> Self {
        Adder {
            terms: Vec::new(),
            zero: ctx.zero(),
            sum: None,
        }
    }

    pub fn add(&mut self, x: Real) {
        self.terms.push(x);
        self.sum = None;
    }

    pub fn clear(&mut self) {
        self.terms.clear();
        self.sum = None;
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns the sum of all terms added so far.
    pub fn sum(&mut self) -> Real {
        if let Some(s) = &self.sum {
            return s.clone();
        }

        let mut sorted = self.terms.clone();
        sorted.sort_by(|a, b| a.cmp_abs(b));

        // (weight, partial sum), weights strictly decreasing from the bottom
        let mut stack: Vec<(usize, Real)> = Vec::new();
        for x in sorted.into_iter() {
            stack.push((1, x));
            loop {
                let n = stack.len();
                if n < 2 || stack[n - 1].0 != stack[n - 2].0 {
                    break;
                }
                if let (Some((w, b)), Some((_, a))) = (stack.pop(), stack.pop()) {
                    stack.push((2 * w, a + &b));
                }
            }
        }

        let mut partials: Vec<Real> = stack.into_iter().map(|(_, s)| s).collect();
        partials.sort_by(|a, b| a.cmp_abs(b));
        let total = partials.iter().fold(self.zero.clone(), |acc, x| acc + x);

        self.sum = Some(total.clone());
        total
    }
}

/// Complex counterpart of [`Adder`], summing real and imaginary parts
/// independently.
#[derive(Debug, Clone)]
pub struct ComplexAdder {
    re: Adder,
    im: Adder,
    ctx: Context,
}

impl ComplexAdder {
    pub fn new(ctx: &Context) -> Self {
        ComplexAdder {
            re: Adder::new(ctx),
            im: Adder::new(ctx),
            ctx: ctx.clone(),
        }
    }

    pub fn add(&mut self, z: &Complex) {
        self.re.add(z.real());
        self.im.add(z.imag());
    }

    pub fn clear(&mut self) {
        self.re.clear();
        self.im.clear();
    }

    pub fn sum(&mut self) -> Complex {
        let re = self.re.sum();
        let im = self.im.sum();
        self.ctx.complex(&re, &im)
    }
}

/// Something that series terms can be fed into.
pub trait Accumulate {
    type Term;

    /// Adds a term, returning `true` if it was negligible compared to
    /// the running total.
    fn accumulate(&mut self, term: Self::Term) -> bool;
}

/// A real series: a running total for the stopping test and a pairwise
/// accumulator for the value that is returned.
#[derive(Debug, Clone)]
pub struct Series {
    running: Real,
    adder: Adder,
    eps: Real,
}

impl Series {
    pub fn new(ctx: &Context) -> Self {
        Series {
            running: ctx.zero(),
            adder: Adder::new(ctx),
            eps: ctx.epsilon().clone(),
        }
    }

    pub fn total(&mut self) -> Real {
        self.adder.sum()
    }

    pub fn terms(&self) -> usize {
        self.adder.len()
    }
}

impl Accumulate for Series {
    type Term = Real;

    fn accumulate(&mut self, term: Real) -> bool {
        self.running += &term;
        let negligible = !term.is_zero() && (&term / &self.running).abs() < self.eps;
        self.adder.add(term);
        negligible
    }
}

/// A complex series, tested on the modulus of the relative change.
#[derive(Debug, Clone)]
pub struct ComplexSeries {
    running: Complex,
    adder: ComplexAdder,
    eps: Real,
}

impl ComplexSeries {
    pub fn new(ctx: &Context) -> Self {
        ComplexSeries {
            running: ctx.complex_zero(),
            adder: ComplexAdder::new(ctx),
            eps: ctx.epsilon().clone(),
        }
    }

    pub fn total(&mut self) -> Complex {
        self.adder.sum()
    }
}

impl Accumulate for ComplexSeries {
    type Term = Complex;

    fn accumulate(&mut self, term: Complex) -> bool {
        self.running = &self.running + &term;
        let negligible = !term.is_zero() && (&term / &self.running).abs() < self.eps;
        self.adder.add(&term);
        negligible
    }
}

/// A function and its derivative summed together: a term only counts as
/// negligible when both halves are.
#[derive(Debug, Clone)]
pub struct Paired<S> {
    pub value: S,
    pub derivative: S,
}

impl Paired<Series> {
    pub fn new(ctx: &Context) -> Self {
        Paired { value: Series::new(ctx), derivative: Series::new(ctx) }
    }

    pub fn totals(&mut self) -> (Real, Real) {
        (self.value.total(), self.derivative.total())
    }
}

impl Paired<ComplexSeries> {
    pub fn new(ctx: &Context) -> Self {
        Paired { value: ComplexSeries::new(ctx), derivative: ComplexSeries::new(ctx) }
    }

    pub fn totals(&mut self) -> (Complex, Complex) {
        (self.value.total(), self.derivative.total())
    }
}

impl<S: Accumulate> Accumulate for Paired<S> {
    type Term = (S::Term, S::Term);

    fn accumulate(&mut self, (v, d): Self::Term) -> bool {
        let v_small = self.value.accumulate(v);
        let d_small = self.derivative.accumulate(d);
        v_small && d_small
    }
}

/// Feeds `term(r)` into `acc` for each `r` in `indices` until a term other
/// than the first is negligible. Returns whether that happened before
/// the indices ran out.
///
/// Open-ended index ranges are cut off after `ctx.max_iterations()` terms.
pub fn sum_series<A, I, F>(ctx: &Context, routine: &'static str, acc: &mut A, indices: I, mut term: F) -> Result<bool, SolverError>
where
    A: Accumulate,
    I: IntoIterator<Item = i64>,
    F: FnMut(i64) -> Result<A::Term, SolverError>,
{
    for (count, r) in indices.into_iter().enumerate() {
        if count >= ctx.max_iterations() {
            return Err(SolverError::IterationLimit(routine, ctx.max_iterations()));
        }
        let negligible = acc.accumulate(term(r)?);
        if count > 0 && negligible {
            report!(Diagnostic::Trace, ctx.verbose(), "{}: converged at r = {} after {} terms", routine, r, count + 1);
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_xoshiro::*;

    #[test]
    fn pairwise_beats_naive() {
        let ctx = Context::new(128);
        let reference_ctx = Context::new(1024);
        let t = ctx.pow2(-300);
        let u = -ctx.pow2(-360);

        let mut terms = vec![ctx.one(), -ctx.one()];
        for _ in 0..500 {
            terms.push(t.clone());
            terms.push(u.clone());
        }

        // 500 (2^-300 - 2^-360), exactly
        let exact = reference_ctx.int(500) * &(reference_ctx.pow2(-300) - &reference_ctx.pow2(-360));

        let mut rng = Xoshiro256StarStar::seed_from_u64(0x5eed);
        let mut first: Option<Real> = None;

        for _ in 0..20 {
            terms.shuffle(&mut rng);

            let mut adder = Adder::new(&ctx);
            for x in terms.iter() {
                adder.add(x.clone());
            }
            let pairwise = adder.sum();
            let naive = terms.iter().fold(ctx.zero(), |acc, x| acc + x);

            let pairwise_error = (reference_ctx.convert(&pairwise) - &exact).abs();
            let naive_error = (reference_ctx.convert(&naive) - &exact).abs();
            println!("pairwise error = {:.6}, naive error = {:.6}", pairwise_error, naive_error);
            assert!(pairwise_error < naive_error);

            // the cascade only depends on the sorted terms
            match &first {
                Some(s) => assert_eq!(s, &pairwise),
                None => first = Some(pairwise),
            }
        }
    }

    #[test]
    fn cached_sum_is_invalidated() {
        let ctx = Context::new(64);
        let mut adder = Adder::new(&ctx);
        assert!(adder.sum().is_zero());
        adder.add(ctx.int(3));
        adder.add(ctx.int(-5));
        assert_eq!(adder.sum(), -2);
        adder.add(ctx.int(7));
        assert_eq!(adder.sum(), 5);
        adder.clear();
        assert!(adder.is_empty());
        assert!(adder.sum().is_zero());
    }

    #[test]
    fn geometric_series_converges() {
        let ctx = Context::new(96);
        let half = ctx.ratio(1, 2);
        let mut series = Series::new(&ctx);
        let mut a = ctx.one();
        let converged = sum_series(&ctx, "geometric", &mut series, 0.., |_| {
            let term = a.clone();
            a *= &half;
            Ok(term)
        }).unwrap();
        let total = series.total();
        let error = (&total - &ctx.int(2)).abs();
        println!("sum = {}, terms = {}, error = {:.3}", total, series.terms(), error);
        assert!(converged);
        assert!(error < ctx.epsilon().clone() * 8);
    }

    #[test]
    fn paired_series_waits_for_both() {
        let ctx = Context::new(64);
        let mut acc = Paired::<Series>::new(&ctx);
        // the value converges immediately, the derivative never does
        let converged = sum_series(&ctx, "paired", &mut acc, 0..50, |r| {
            let value = if r == 0 { ctx.one() } else { ctx.pow2(-200) };
            Ok((value, ctx.one()))
        }).unwrap();
        let (v, d) = acc.totals();
        assert!(!converged);
        assert_eq!(d, 50);
        assert!(v > 1);
    }

    #[test]
    fn open_ended_series_is_bounded() {
        let ctx = Context::new(64).with_max_iterations(100);
        let mut series = Series::new(&ctx);
        let result = sum_series(&ctx, "divergent", &mut series, 0.., |_| Ok(ctx.one()));
        match result {
            Err(SolverError::IterationLimit(name, limit)) => {
                assert_eq!(name, "divergent");
                assert_eq!(limit, 100);
            },
            _ => panic!("expected the iteration limit to be hit"),
        }
    }
}
