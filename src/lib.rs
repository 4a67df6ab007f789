//! Prolate and oblate spheroidal wave functions at arbitrary precision.
//!
//! For a spheroidal mode `(c, m, n)` this crate computes the eigenvalue
//! `λ_mn(c)`, the expansion coefficients of the angular function, the
//! normalization and joining constants, and from them the angular
//! function of the first kind `S_mn^(1)` and the radial functions
//! `R_mn^(1)`, `R_mn^(2)`, with derivatives. Every function can be
//! obtained in at least two independent ways, so that results can be
//! checked against each other and against the Wronskian.
//!
//! All arithmetic is done with MPFR at a precision fixed by a
//! [`Context`](number::Context):
//! ```ignore
//! let ctx = Context::new(256);
//! let mode = Mode::new(&ctx, Prolate.into(), &ctx.float(1.5), 0, 2)?;
//! let lambda = calculate_lambda(&mode, &default_lambda_approx(&mode))?;
//! let mut dr = Indexed::new();
//! calculate_dr(&mode, &lambda, &mut dr, 40, &ctx.parse("1e-70").unwrap())?;
//! let (s1, s1p) = calculate_smn1_1(&mode, &dr, &ctx.float(0.5))?;
//! ```

pub mod report;

pub mod number;
pub mod error;
pub mod summation;
pub mod continued_fraction;
pub mod sequence;
pub mod geometry;
pub mod recurrence;
pub mod eigenvalue;
pub mod coefficients;
pub mod normalization;
pub mod angular;
pub mod special_functions;
pub mod radial;
pub mod tridiagonal;
pub mod input;
pub mod output;

pub use number::{Context, Real, Complex};
pub use error::{SolverError, Convergence};
pub use geometry::{Geometry, Spheroid, Prolate, Oblate};
pub use recurrence::Mode;
pub use sequence::Indexed;
pub use eigenvalue::{calculate_lambda, characteristic, default_lambda_approx};
pub use coefficients::{calculate_dr, calculate_dr_neg, calculate_c2k, get_dr, get_dr_neg, get_c2k};
pub use normalization::{calculate_nmn, calculate_fmn, calculate_kmn1, calculate_kmn2, calculate_qmn};
pub use angular::{calculate_smn1_1, calculate_smn1_2};
pub use radial::{calculate_rmn1_1, calculate_rmn1_2, calculate_rmn2_1, calculate_rmn2_2, calculate_rmn2_3, wronskian};
pub use tridiagonal::calculate_b2r;
