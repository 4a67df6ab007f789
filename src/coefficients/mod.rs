//! Expansion coefficients of the angular function.
//!
//! * `dr`: the Legendre coefficients d_r for `r >= 0`,
//! * `dr_neg`: their continuation to `r < 0`, needed by the Legendre
//!   form of the second-kind radial function,
//! * `c2k`: coefficients of the power series in `1 - η^2`.
//!
//! `dr` and `dr_neg` live in the two branches of one [`Indexed`] sequence.
//! All three are generated at a requested length, which is doubled until
//! the last coefficient falls below a floor, and are then trimmed back to
//! a few recurrence steps beyond the last coefficient above that floor.
//! A floor of zero means "any converged length" and never trims.
//!
//! [`Indexed`]: crate::sequence::Indexed

mod dr;
mod dr_neg;
mod c2k;

pub use dr::{calculate_dr, get_dr};
pub use dr_neg::{calculate_dr_neg, get_dr_neg};
pub use c2k::{calculate_c2k, get_c2k};

use crate::error::SolverError;
use crate::number::Context;

/// Rounds a requested length up to an even number, at least two.
fn even_length(n: usize) -> usize {
    let n = n.max(2);
    n + n % 2
}

/// Doubles a length, failing once it exceeds the iteration bound.
pub(crate) fn double(ctx: &Context, routine: &'static str, n: usize) -> Result<usize, SolverError> {
    if n >= ctx.max_iterations() {
        Err(SolverError::IterationLimit(routine, ctx.max_iterations()))
    } else {
        Ok(2 * n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths() {
        assert_eq!(even_length(0), 2);
        assert_eq!(even_length(7), 8);
        assert_eq!(even_length(40), 40);
        let ctx = Context::new(32).with_max_iterations(100);
        assert_eq!(double(&ctx, "test", 64).unwrap(), 128);
        assert!(double(&ctx, "test", 128).is_err());
    }
}
