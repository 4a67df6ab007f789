//! Arbitrary-precision real and complex numbers, backed by MPFR via `rug`,
//! and the context that fixes their working precision.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub, Mul, Div, Neg, AddAssign, SubAssign, MulAssign, DivAssign};

use rug::Float;
use rug::float::{Constant, Special};
use rug::ops::Pow;

/// Default bound on the number of passes through any open-ended loop.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000_000;

/// Working precision, convergence tolerance and loop bounds shared by
/// every solver in the crate.
#[derive(Clone)]
pub struct Context {
    precision: u32,
    epsilon: Real,
    max_iterations: usize,
    verbose: bool,
}

impl Context {
    /// Creates a context with the given precision, in bits.
    pub fn new(precision: u32) -> Self {
        let precision = precision.max(2);
        let one = Float::with_val(precision, 1);
        let mut eps = one.clone();
        // smallest power of two that no longer changes 1
        loop {
            let sum = Float::with_val(precision, &one + &eps);
            if sum == one {
                break;
            }
            eps /= 2;
        }

        Context {
            precision,
            epsilon: Real(eps),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            verbose: false,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_verbosity(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Relative change below which a series or iteration is converged.
    pub fn epsilon(&self) -> &Real {
        &self.epsilon
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn zero(&self) -> Real {
        Real(Float::with_val(self.precision, 0))
    }

    pub fn one(&self) -> Real {
        Real(Float::with_val(self.precision, 1))
    }

    pub fn int(&self, k: i64) -> Real {
        Real(Float::with_val(self.precision, k))
    }

    /// The exact ratio `p / q`, rounded once.
    pub fn ratio(&self, p: i64, q: i64) -> Real {
        self.int(p) / &self.int(q)
    }

    pub fn float(&self, x: f64) -> Real {
        Real(Float::with_val(self.precision, x))
    }

    pub fn nan(&self) -> Real {
        Real(Float::with_val(self.precision, Special::Nan))
    }

    pub fn pi(&self) -> Real {
        Real(Float::with_val(self.precision, Constant::Pi))
    }

    /// Parses a decimal string at the full working precision.
    pub fn parse(&self, s: &str) -> Option<Real> {
        let incomplete = Float::parse(s.trim()).ok()?;
        Some(Real(Float::with_val(self.precision, incomplete)))
    }

    /// `k!`, where negative arguments are treated as `0!`.
    pub fn factorial(&self, k: i64) -> Real {
        let k = k.max(0) as u32;
        Real(Float::with_val(self.precision, Float::factorial(k)))
    }

    /// Rising factorial `x (x + 1) ... (x + k - 1)`.
    pub fn pochhammer(&self, x: &Real, k: i64) -> Real {
        let mut p = self.one();
        for i in 0..k {
            p *= &(x + &self.int(i));
        }
        p
    }

    /// `(-1)^k`.
    pub fn sign_pow(&self, k: i64) -> Real {
        if k.rem_euclid(2) == 0 {
            self.one()
        } else {
            -self.one()
        }
    }

    /// `2^k`.
    pub fn pow2(&self, k: i64) -> Real {
        self.int(2).powi(k as i32)
    }

    /// Rounds `x` to this context's precision.
    pub fn convert(&self, x: &Real) -> Real {
        Real(Float::with_val(self.precision, &x.0))
    }

    /// The product of `num` divided by the product of `den`, formed from
    /// exact integers and rounded once per factor.
    pub fn quotient(&self, num: &[i64], den: &[i64]) -> Real {
        let mut p = self.one();
        for &k in num {
            p *= &self.int(k);
        }
        let mut q = self.one();
        for &k in den {
            q *= &self.int(k);
        }
        p / &q
    }

    /// True once `new` agrees with `old` to a relative change below epsilon.
    pub fn has_settled(&self, new: &Real, old: &Real) -> bool {
        let diff = new - old;
        diff.is_zero() || (diff / old).abs() < self.epsilon
    }

    /// As [`has_settled`](Self::has_settled), for complex iterates.
    pub fn has_settled_complex(&self, new: &Complex, old: &Complex) -> bool {
        let diff = new - old;
        diff.is_zero() || (diff / old).abs() < self.epsilon
    }

    pub fn complex(&self, re: &Real, im: &Real) -> Complex {
        Complex(rug::Complex::with_val(self.precision, (&re.0, &im.0)))
    }

    pub fn complex_zero(&self) -> Complex {
        Complex(rug::Complex::with_val(self.precision, (0, 0)))
    }

    /// Exact integer powers of the imaginary unit.
    pub fn i_pow(&self, k: i64) -> Complex {
        let (re, im) = match k.rem_euclid(4) {
            0 => (1, 0),
            1 => (0, 1),
            2 => (-1, 0),
            _ => (0, -1),
        };
        Complex(rug::Complex::with_val(self.precision, (re, im)))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Context {{ precision: {}, epsilon: {}, max_iterations: {} }}",
            self.precision, self.epsilon.to_sci_string(6), self.max_iterations)
    }
}

/// An arbitrary-precision real number.
///
/// Arithmetic results take the precision of the left-hand operand.
#[derive(Clone, PartialEq, PartialOrd)]
pub struct Real(Float);

impl Real {
    pub fn from_float(f: Float) -> Self {
        Real(f)
    }

    pub fn as_float(&self) -> &Float {
        &self.0
    }

    pub fn prec(&self) -> u32 {
        self.0.prec()
    }

    pub fn abs(&self) -> Real {
        Real(self.0.clone().abs())
    }

    pub fn ln(&self) -> Real {
        Real(self.0.clone().ln())
    }

    pub fn exp(&self) -> Real {
        Real(self.0.clone().exp())
    }

    pub fn sqrt(&self) -> Real {
        Real(self.0.clone().sqrt())
    }

    pub fn sin(&self) -> Real {
        Real(self.0.clone().sin())
    }

    pub fn cos(&self) -> Real {
        Real(self.0.clone().cos())
    }

    pub fn atan(&self) -> Real {
        Real(self.0.clone().atan())
    }

    /// Four-quadrant arctangent of `self / x`.
    pub fn atan2(&self, x: &Real) -> Real {
        Real(self.0.clone().atan2(&x.0))
    }

    pub fn recip(&self) -> Real {
        Real(self.0.clone().recip())
    }

    pub fn pow(&self, e: &Real) -> Real {
        Real(self.0.clone().pow(&e.0))
    }

    pub fn powi(&self, k: i32) -> Real {
        Real(self.0.clone().pow(k))
    }

    pub fn max(&self, other: &Real) -> Real {
        if other.0 > self.0 { other.clone() } else { self.clone() }
    }

    /// Compares magnitudes; NaN compares equal to everything.
    pub fn cmp_abs(&self, other: &Real) -> Ordering {
        self.0.cmp_abs(&other.0).unwrap_or(Ordering::Equal)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_nan(&self) -> bool {
        self.0.is_nan()
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    pub fn is_sign_negative(&self) -> bool {
        self.0.is_sign_negative()
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64()
    }

    /// Truncates towards zero, saturating at the bounds of `i64`.
    pub fn to_i64(&self) -> i64 {
        let t = self.0.clone().trunc();
        t.to_integer()
            .and_then(|i| i.to_i64())
            .unwrap_or(if t.is_sign_negative() { i64::MIN } else { i64::MAX })
    }

    /// Formats the number as `d.ddd...eX` with `digits` significant
    /// digits; zero asks for as many digits as are needed to read the
    /// value back exactly.
    pub fn to_sci_string(&self, digits: usize) -> String {
        if self.0.is_nan() {
            return "nan".to_owned();
        }
        if self.0.is_infinite() {
            return if self.0.is_sign_negative() { "-inf" } else { "inf" }.to_owned();
        }

        let num_digits = if digits == 0 { None } else { Some(digits) };
        let (negative, mantissa, exponent) = self.0.to_sign_string_exp(10, num_digits);
        let exponent = if self.0.is_zero() { 0 } else { exponent.unwrap_or(1) - 1 };
        let sign = if negative { "-" } else { "" };
        let (lead, rest) = mantissa.split_at(1);
        if rest.is_empty() {
            format!("{}{}e{}", sign, lead, exponent)
        } else {
            format!("{}{}.{}e{}", sign, lead, rest, exponent)
        }
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let digits = f.precision().unwrap_or(0);
        write!(f, "{}", self.to_sci_string(digits))
    }
}

impl fmt::Debug for Real {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_sci_string(0))
    }
}

impl PartialEq<i32> for Real {
    fn eq(&self, other: &i32) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<i32> for Real {
    fn partial_cmp(&self, other: &i32) -> Option<Ordering> {
        self.0.partial_cmp(other)
    }
}

macro_rules! real_binop {
    ($tr:ident, $method:ident, $tr_assign:ident, $method_assign:ident) => {
        impl<'a, 'b> $tr<&'b Real> for &'a Real {
            type Output = Real;
            fn $method(self, rhs: &'b Real) -> Real {
                Real(Float::with_val(self.0.prec(), $tr::$method(&self.0, &rhs.0)))
            }
        }

        impl<'a> $tr<Real> for &'a Real {
            type Output = Real;
            fn $method(self, rhs: Real) -> Real {
                $tr::$method(self, &rhs)
            }
        }

        impl<'b> $tr<&'b Real> for Real {
            type Output = Real;
            fn $method(self, rhs: &'b Real) -> Real {
                $tr::$method(&self, rhs)
            }
        }

        impl $tr<Real> for Real {
            type Output = Real;
            fn $method(self, rhs: Real) -> Real {
                $tr::$method(&self, &rhs)
            }
        }

        impl<'a> $tr<i32> for &'a Real {
            type Output = Real;
            fn $method(self, rhs: i32) -> Real {
                Real(Float::with_val(self.0.prec(), $tr::$method(&self.0, rhs)))
            }
        }

        impl $tr<i32> for Real {
            type Output = Real;
            fn $method(self, rhs: i32) -> Real {
                $tr::$method(&self, rhs)
            }
        }

        impl<'b> $tr_assign<&'b Real> for Real {
            fn $method_assign(&mut self, rhs: &'b Real) {
                $tr_assign::$method_assign(&mut self.0, &rhs.0);
            }
        }

        impl $tr_assign<Real> for Real {
            fn $method_assign(&mut self, rhs: Real) {
                $tr_assign::$method_assign(&mut self.0, rhs.0);
            }
        }

        impl $tr_assign<i32> for Real {
            fn $method_assign(&mut self, rhs: i32) {
                $tr_assign::$method_assign(&mut self.0, rhs);
            }
        }
    };
}

real_binop!(Add, add, AddAssign, add_assign);
real_binop!(Sub, sub, SubAssign, sub_assign);
real_binop!(Mul, mul, MulAssign, mul_assign);
real_binop!(Div, div, DivAssign, div_assign);

impl<'a> Neg for &'a Real {
    type Output = Real;
    fn neg(self) -> Real {
        Real(Float::with_val(self.0.prec(), -&self.0))
    }
}

impl Neg for Real {
    type Output = Real;
    fn neg(self) -> Real {
        Real(-self.0)
    }
}

/// An arbitrary-precision complex number.
#[derive(Clone, PartialEq)]
pub struct Complex(rug::Complex);

impl Complex {
    /// Promotes a real to the complex plane.
    pub fn from_real(x: &Real) -> Self {
        Complex(rug::Complex::with_val(x.prec(), (&x.0, 0)))
    }

    pub fn real(&self) -> Real {
        Real(self.0.real().clone())
    }

    pub fn imag(&self) -> Real {
        Real(self.0.imag().clone())
    }

    /// Modulus.
    pub fn abs(&self) -> Real {
        let (prec, _) = self.0.prec();
        Real(Float::with_val(prec, self.0.abs_ref()))
    }

    pub fn ln(&self) -> Complex {
        Complex(self.0.clone().ln())
    }

    /// Principal square root.
    pub fn sqrt(&self) -> Complex {
        Complex(self.0.clone().sqrt())
    }

    pub fn recip(&self) -> Complex {
        Complex(self.0.clone().recip())
    }

    pub fn powi(&self, k: i32) -> Complex {
        Complex(self.0.clone().pow(k))
    }

    pub fn is_zero(&self) -> bool {
        self.0.real().is_zero() && self.0.imag().is_zero()
    }

    pub fn scale(&self, x: &Real) -> Complex {
        self * &Complex::from_real(x)
    }

    pub fn to_sci_string(&self, digits: usize) -> String {
        format!("{} + i * {}", self.real().to_sci_string(digits), self.imag().to_sci_string(digits))
    }
}

impl fmt::Debug for Complex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_sci_string(0))
    }
}

macro_rules! complex_binop {
    ($tr:ident, $method:ident) => {
        impl<'a, 'b> $tr<&'b Complex> for &'a Complex {
            type Output = Complex;
            fn $method(self, rhs: &'b Complex) -> Complex {
                Complex(rug::Complex::with_val(self.0.prec(), $tr::$method(&self.0, &rhs.0)))
            }
        }

        impl<'a> $tr<Complex> for &'a Complex {
            type Output = Complex;
            fn $method(self, rhs: Complex) -> Complex {
                $tr::$method(self, &rhs)
            }
        }

        impl<'b> $tr<&'b Complex> for Complex {
            type Output = Complex;
            fn $method(self, rhs: &'b Complex) -> Complex {
                $tr::$method(&self, rhs)
            }
        }

        impl $tr<Complex> for Complex {
            type Output = Complex;
            fn $method(self, rhs: Complex) -> Complex {
                $tr::$method(&self, &rhs)
            }
        }

    };
}

complex_binop!(Add, add);
complex_binop!(Sub, sub);
complex_binop!(Mul, mul);
complex_binop!(Div, div);

impl<'a> Neg for &'a Complex {
    type Output = Complex;
    fn neg(self) -> Complex {
        Complex(rug::Complex::with_val(self.0.prec(), -&self.0))
    }
}

impl Neg for Complex {
    type Output = Complex;
    fn neg(self) -> Complex {
        Complex(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_matches_precision() {
        let ctx = Context::new(128);
        let eps = ctx.epsilon().clone();
        println!("eps = {}", eps.to_sci_string(10));
        assert!(&ctx.one() + &eps == ctx.one());
        assert!(&ctx.one() + &(&eps * 2) != ctx.one());
        assert_eq!(eps, ctx.pow2(-128));
    }

    #[test]
    fn scientific_strings() {
        let ctx = Context::new(64);
        assert_eq!(ctx.ratio(-1, 8).to_sci_string(3), "-1.25e-1");
        assert_eq!(ctx.int(1200).to_sci_string(2), "1.2e3");
        assert_eq!(ctx.nan().to_sci_string(5), "nan");
        let x = ctx.parse("3.14159265358979323846").unwrap();
        let y = ctx.parse(&x.to_sci_string(0)).unwrap();
        assert_eq!(x, y);
    }

    #[test]
    fn special_values() {
        let ctx = Context::new(96);
        assert_eq!(ctx.factorial(5), 120);
        assert_eq!(ctx.factorial(-3), 1);
        let half = ctx.ratio(1, 2);
        // (1/2)(3/2)(5/2) = 15/8
        assert_eq!(ctx.pochhammer(&half, 3), ctx.ratio(15, 8));
        assert_eq!(ctx.sign_pow(-3), -1);
        assert_eq!(ctx.i_pow(-1).imag(), -1);
        assert_eq!(ctx.float(-2.7).to_i64(), -2);
    }
}
