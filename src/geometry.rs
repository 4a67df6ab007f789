//! Prolate and oblate spheroidal coordinates.
//!
//! The two families share all of their recurrences up to the sign of
//! `c^2`; where the radial functions differ, the difference is captured
//! by the methods of [`Geometry`].

use enum_dispatch::enum_dispatch;

use crate::number::{Context, Complex, Real};

#[enum_dispatch]
pub trait Geometry {
    /// `+1` for prolate, `-1` for oblate: the sign of `c^2` in the
    /// recurrence coefficients.
    fn sign(&self) -> i32;

    /// Prefix used in data file names.
    fn tag(&self) -> &'static str;

    fn name(&self) -> &'static str;

    /// The Wronskian `R1 R2' - R1' R2 = 1 / (c (ξ^2 ∓ 1))`.
    fn wronskian(&self, c: &Real, xi: &Real) -> Real {
        (c * &self.near_base(xi)).recip()
    }

    /// `ξ^2 ∓ 1`, raised to `m/2` in the power-series radial functions.
    fn near_base(&self, xi: &Real) -> Real {
        xi * xi - self.sign()
    }

    /// `1 ∓ 1/ξ^2`, raised to `m/2` in the spherical-Bessel expansions.
    fn far_base(&self, xi: &Real) -> Real {
        self.near_base(xi) / &(xi * xi)
    }

    /// The argument at which the associated Legendre functions are
    /// evaluated for radial coordinate `ξ`.
    fn legendre_argument(&self, ctx: &Context, xi: &Real) -> Complex;

    /// Derivative of the Legendre argument with respect to `ξ`.
    fn legendre_slope(&self, ctx: &Context) -> Complex;

    /// Exponent `e` such that the Legendre form of the second-kind radial
    /// function is the real part of `i^e / k2` times the series.
    fn legendre_phase(&self, m: i64, even: bool) -> i64;
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Prolate;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Oblate;

impl Geometry for Prolate {
    fn sign(&self) -> i32 {
        1
    }

    fn tag(&self) -> &'static str {
        "pro"
    }

    fn name(&self) -> &'static str {
        "prolate"
    }

    fn legendre_argument(&self, ctx: &Context, xi: &Real) -> Complex {
        ctx.complex(xi, &ctx.zero())
    }

    fn legendre_slope(&self, ctx: &Context) -> Complex {
        ctx.i_pow(0)
    }

    fn legendre_phase(&self, _m: i64, _even: bool) -> i64 {
        0
    }
}

impl Geometry for Oblate {
    fn sign(&self) -> i32 {
        -1
    }

    fn tag(&self) -> &'static str {
        "obl"
    }

    fn name(&self) -> &'static str {
        "oblate"
    }

    fn legendre_argument(&self, ctx: &Context, xi: &Real) -> Complex {
        ctx.complex(&ctx.zero(), xi)
    }

    fn legendre_slope(&self, ctx: &Context) -> Complex {
        ctx.i_pow(1)
    }

    // 1 / (k2 / (-i)^(m - 1)) = i^(1 - m) / k2 for n - m even,
    // and (-i)^(m - 2) = i^(2 - m) for n - m odd
    fn legendre_phase(&self, m: i64, even: bool) -> i64 {
        if even { 1 - m } else { 2 - m }
    }
}

/// The family of spheroidal coordinates.
#[enum_dispatch(Geometry)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Spheroid {
    Prolate,
    Oblate,
}

impl Spheroid {
    /// Parses `prolate`/`pro` or `oblate`/`obl`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "prolate" | "pro" => Some(Prolate.into()),
            "oblate" | "obl" => Some(Oblate.into()),
            _ => None,
        }
    }

    pub fn is_prolate(&self) -> bool {
        matches!(self, Spheroid::Prolate(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_signs() {
        let pro = Spheroid::from_name("prolate").unwrap();
        let obl = Spheroid::from_name("obl").unwrap();
        assert!(pro.is_prolate() && !obl.is_prolate());
        assert_eq!(pro.sign(), 1);
        assert_eq!(obl.sign(), -1);
        assert_eq!(obl.tag(), "obl");
        assert!(Spheroid::from_name("spherical").is_none());
    }

    #[test]
    fn wronskians() {
        let ctx = Context::new(64);
        let c = ctx.int(2);
        let xi = ctx.int(3);
        let pro: Spheroid = Prolate.into();
        let obl: Spheroid = Oblate.into();
        assert_eq!(pro.wronskian(&c, &xi), ctx.ratio(1, 16));
        assert_eq!(obl.wronskian(&c, &xi), ctx.ratio(1, 20));
        assert_eq!(pro.far_base(&xi), ctx.ratio(8, 9));
        assert_eq!(obl.near_base(&xi), 10);
        assert_eq!(obl.legendre_argument(&ctx, &xi).imag(), 3);
        assert_eq!(obl.legendre_phase(3, true), -2);
    }
}
