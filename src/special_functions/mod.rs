//! Special functions evaluated at the working precision.

mod bessel;
mod legendre;

pub use bessel::*;
pub use legendre::*;
