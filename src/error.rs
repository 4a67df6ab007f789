//! Solver errors

use std::fmt;
use std::error::Error;

/// Why a solver routine could not produce a value.
pub enum SolverError {
    /// The characteristic continued fraction vanished exactly at an
    /// interior point of the eigenvalue bracket.
    SingularContinuedFraction(String),
    /// An open-ended loop ran for the maximum permitted number of passes.
    IterationLimit(&'static str, usize),
    /// The mode indices do not satisfy `0 <= m <= n`.
    InvalidMode(i64, i64),
    /// A stage was handed an empty coefficient array.
    MissingCoefficients(&'static str),
    /// The routine is only defined for the other family of spheroids.
    WrongGeometry(&'static str),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolverError::SingularContinuedFraction(at) => write!(f, "characteristic function is exactly zero at lambda = {}", at),
            SolverError::IterationLimit(routine, limit) => write!(f, "{} did not converge within {} iterations", routine, limit),
            SolverError::InvalidMode(m, n) => write!(f, "mode (m = {}, n = {}) is invalid, require 0 <= m <= n", m, n),
            SolverError::MissingCoefficients(name) => write!(f, "no {} coefficients are available", name),
            SolverError::WrongGeometry(routine) => write!(f, "{} does not apply to this geometry", routine),
        }
    }
}

impl fmt::Debug for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Error for SolverError {}

/// Outcome of a series that is allowed to return a best estimate
/// when it runs out of terms before converging.
#[derive(Debug, Clone, PartialEq)]
pub enum Convergence<T> {
    Converged(T),
    NotConverged(T),
}

impl<T> Convergence<T> {
    pub fn is_converged(&self) -> bool {
        match self {
            Convergence::Converged(_) => true,
            Convergence::NotConverged(_) => false,
        }
    }

    /// Returns the value, converged or not.
    pub fn into_inner(self) -> T {
        match self {
            Convergence::Converged(v) | Convergence::NotConverged(v) => v,
        }
    }
}
