//! Evaluation of finite continued fractions
//! `b0 - a[0] / (b[0] - a[1] / (b[1] - ...))`, innermost term first.

use std::ops::{Sub, Div};

/// Evaluates the continued fraction with leading term `b0`, numerators
/// `a` and denominators `b`.
///
/// If `a` and `b` differ in length, the trailing entries of the longer
/// one are ignored.
pub fn evaluate<T>(b0: &T, a: &[T], b: &[T]) -> T
where
    T: Clone,
    for<'x> &'x T: Sub<&'x T, Output = T> + Div<&'x T, Output = T>,
{
    let len = a.len().min(b.len());
    let tail = a[..len].iter()
        .zip(b[..len].iter())
        .rev()
        .fold(None, |x: Option<T>, (ai, bi)| {
            let denom = match x {
                Some(x) => bi - &x,
                None => bi.clone(),
            };
            Some(ai / &denom)
        });

    match tail {
        Some(x) => b0 - &x,
        None => b0.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Context;

    #[test]
    fn twos_and_ones() {
        let ctx = Context::new(192);
        let a = vec![ctx.one(); 3];
        let b = vec![ctx.int(2); 3];
        let value = evaluate(&ctx.int(2), &a, &b);
        // 2 - 1/(2 - 1/(2 - 1/2)) = 5/4
        let target = ctx.ratio(5, 4);
        let error = (&value - &target).abs();
        println!("value = {}, target = {}, error = {:.3e}", value, target, error.to_f64());
        assert!(error <= *ctx.epsilon());
    }

    #[test]
    fn unequal_lengths_use_the_shorter() {
        let ctx = Context::new(64);
        let a = vec![ctx.one(); 3];
        let b = vec![ctx.int(2); 1];
        // only a[0], b[0] take part: 2 - 1/2
        assert_eq!(evaluate(&ctx.int(2), &a, &b), ctx.ratio(3, 2));
        assert_eq!(evaluate(&ctx.int(7), &a[..0], &b), 7);
    }

    #[test]
    fn complex_fraction() {
        let ctx = Context::new(128);
        let i = ctx.i_pow(1);
        let one = ctx.i_pow(0);
        // 0 - 1/i = i
        let value = evaluate(&ctx.complex_zero(), &[one], &[i.clone()]);
        assert!((&value - &i).abs().is_zero());
    }
}
