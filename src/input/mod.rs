//! Parse input configuration file

use std::path::Path;
use yaml_rust::{YamlLoader, yaml::Yaml};
use evalexpr::*;

use crate::number::{Context, Real};

mod error;
mod types;

pub use error::*;
pub use types::*;

/// Represents the input configuration, which defines the spheroid,
/// the stages to run and the parameters of each stage.
pub struct Config {
    input: Yaml,
    ctx: HashMapContext,
}

impl Config {
    /// Loads a configuration file.
    /// Fails if the file cannot be opened or if it is not
    /// YAML-formatted.
    pub fn from_file(path: &Path) -> Result<Self, InputError> {
        let name = path.display().to_string();
        let contents = std::fs::read_to_string(path)
            .map_err(|_| InputError::file(&name))?;
        Self::from_string(&contents)
            .map_err(|_| InputError::file(&name))
    }

    /// Loads a YAML configuration from a string.
    /// Fails if the string is not formatted correctly.
    pub fn from_string(s: &str) -> Result<Self, InputError> {
        let input = YamlLoader::load_from_str(s)
            .map_err(|_| InputError::file("<string>"))?;
        let input = input.first()
            .ok_or_else(|| InputError::file("<string>"))?;

        Ok(Config {
            input: input.clone(),
            ctx: HashMapContext::new(),
        })
    }

    /// Loads mathematical constants and functions, then evaluates
    /// the expressions given in the specified `section`, in order,
    /// so that later entries may refer to earlier ones.
    pub fn with_context(&mut self, section: &str) -> Result<&mut Self, InputError> {
        use helper::context_function;

        let mut ctx = context_map! {
            "pi" => std::f64::consts::PI,
            "tau" => std::f64::consts::TAU,
            "e" => std::f64::consts::E,
            "degree" => std::f64::consts::PI / 180.0,
        }.map_err(|_| InputError::conversion(section, "context"))?;

        context_function!(ctx, section, "sqrt",   f64::sqrt);
        context_function!(ctx, section, "cbrt",   f64::cbrt);
        context_function!(ctx, section, "abs",    f64::abs);
        context_function!(ctx, section, "exp",    f64::exp);
        context_function!(ctx, section, "ln",     f64::ln);
        context_function!(ctx, section, "log10",  f64::log10);
        context_function!(ctx, section, "sin",    f64::sin);
        context_function!(ctx, section, "cos",    f64::cos);
        context_function!(ctx, section, "tan",    f64::tan);
        context_function!(ctx, section, "asin",   f64::asin);
        context_function!(ctx, section, "acos",   f64::acos);
        context_function!(ctx, section, "atan",   f64::atan);
        context_function!(ctx, section, "atan2",  f64::atan2, 2);
        context_function!(ctx, section, "sinh",   f64::sinh);
        context_function!(ctx, section, "cosh",   f64::cosh);
        context_function!(ctx, section, "tanh",   f64::tanh);
        context_function!(ctx, section, "floor",  f64::floor);
        context_function!(ctx, section, "ceil",   f64::ceil);
        context_function!(ctx, section, "round",  f64::round);

        self.ctx = ctx;

        let entries = match self.input[section].as_hash() {
            Some(entries) => entries.clone(),
            None => return Ok(self),
        };

        for (a, b) in entries.iter() {
            let key = match a {
                Yaml::String(k) => k,
                _ => continue,
            };

            let value = match b {
                Yaml::Integer(i) => Some(*i as f64),
                Yaml::Real(s) => s.parse::<f64>().ok(),
                Yaml::String(s) => eval_number_with_context(s, &self.ctx).ok(),
                _ => None,
            };

            // insert it into the context so it's available for the next read
            let v = value.ok_or_else(|| InputError::conversion(section, key))?;
            self.ctx.set_value(key.clone(), Value::from(v))
                .map_err(|_| InputError::conversion(section, key))?;
        }

        Ok(self)
    }

    /// Locates a key-value pair in the configuration file and attempts
    /// to parse the value as the specified type.
    /// The path to the key-value pair is specified by a string of colon-separated
    /// sections, e.g. `'section:subsection:key'`.
    pub fn read<T, S>(&self, path: S) -> Result<T, InputError>
    where
        T: FromYaml,
        S: AsRef<str>,
    {
        let path = path.as_ref();
        let address: Vec<&str> = path.split(':').collect();
        let arg = address.iter()
            .try_fold(&self.input, |y, s| {
                if y[*s].is_badvalue() {
                    Err(InputError::location(path, s))
                } else {
                    Ok(&y[*s])
                }
            })?;
        let last = address.last().copied().unwrap_or(path);
        T::from_yaml(arg.clone(), &self.ctx)
            .map_err(|_| InputError::conversion(path, last))
    }

    /// Like `Config::read`, but falls back to `default` if the key is
    /// absent. A key that is present but cannot be converted is still
    /// an error.
    pub fn read_or<T, S>(&self, path: S, default: T) -> Result<T, InputError>
    where
        T: FromYaml,
        S: AsRef<str>,
    {
        match self.read(path) {
            Err(e) if e.kind() == InputErrorKind::Location => Ok(default),
            other => other,
        }
    }

    /// Parses a string argument and evaluates it using the default context, e.g.
    /// ```ignore
    /// let val = input.evaluate("2.0 / (1.0 + a)").unwrap();
    /// ```
    /// where 'a' is specified in the `constants` section.
    pub fn evaluate<S: AsRef<str>>(&self, arg: S) -> Option<f64> {
        eval_number_with_context(arg.as_ref(), &self.ctx).ok()
    }

    /// Reads a real number at the working precision of `prec`.
    /// Plain decimals, like `0.1`, and powers of two written `2^k` or
    /// `1+2^k` are parsed exactly to the working precision; anything else
    /// is evaluated as an expression in double precision and then
    /// converted.
    pub fn read_real<S: AsRef<str>>(&self, prec: &Context, path: S) -> Result<Real, InputError> {
        let path = path.as_ref();
        let s: String = self.read(path)?;
        prec.parse(&s)
            .or_else(|| power_of_two(prec, &s))
            .or_else(|| self.evaluate(&s).map(|x| prec.float(x)))
            .ok_or_else(|| InputError::conversion(path, &s))
    }

    /// Locates a key-value pair in the configuration file and attempts
    /// to parse it as a looped variable, returning a Vec of the values.
    /// The loop is defined by a `start`, `stop` and `step`, each read with
    /// `Config::read_real`, and advanced by repeated addition of `step`:
    ///
    /// ```ignore
    /// let text: &str = "---
    ///     x:
    ///         start: 1.0
    ///         stop: 1.5
    ///         step: 0.25
    /// ";
    ///
    /// let values = Config::from_string(&text).unwrap()
    ///     .read_real_loop(&prec, "x").unwrap();
    ///
    /// assert_eq!(values.len(), 3);
    /// ```
    pub fn read_real_loop<S: AsRef<str>>(&self, prec: &Context, path: S) -> Result<Vec<Real>, InputError> {
        let key = path.as_ref();
        let start_key = format!("{}:start", key);

        if self.read::<String, _>(&start_key).is_err() {
            let value = self.read_real(prec, key)?;
            return Ok(vec![value]);
        }

        let start = self.read_real(prec, &start_key)?;
        let stop = self.read_real(prec, format!("{}:stop", key))?;
        let step = self.read_real(prec, format!("{}:step", key))?;

        if !(step > 0) {
            return Err(InputError::conversion(key, "step"));
        }

        let mut v = Vec::new();
        let mut x = start;
        while x <= stop {
            let next = &x + &step;
            v.push(x);
            x = next;
        }
        Ok(v)
    }
}

/// `2^k` or `1+2^k` for integer `k`, so that points like `ξ = 1 + 2^-200`
/// survive at precisions beyond `f64`.
fn power_of_two(prec: &Context, s: &str) -> Option<Real> {
    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let (offset, rest) = match s.strip_prefix("1+") {
        Some(rest) => (1, rest),
        None => (0, s.as_str()),
    };
    let k = rest.strip_prefix("2^")?;
    let k = k.strip_prefix('(')
        .and_then(|k| k.strip_suffix(')'))
        .unwrap_or(k);
    let k: i64 = k.parse().ok()?;
    Some(prec.pow2(k) + offset)
}

mod helper {
    macro_rules! context_function {
        ($ctx:expr, $section:expr, $name:literal, $func:expr) => {
            $ctx.set_function(
                $name.to_string(),
                Function::new(|arg| {
                    let x = arg.as_number()?;
                    Ok(Value::Float($func(x)))
                })
            ).map_err(|_| InputError::conversion($section, $name))?
        };
        ($ctx:expr, $section:expr, $name:literal, $func:expr, 2) => {
            $ctx.set_function(
                $name.to_string(),
                Function::new(|arg| {
                    let arg = arg.as_fixed_len_tuple(2)?;
                    let x = arg[0].as_number()?;
                    let y = arg[1].as_number()?;
                    Ok(Value::Float($func(x, y)))
                })
            ).map_err(|_| InputError::conversion($section, $name))?
        };
    }

    pub(super) use context_function;
}

#[cfg(test)]
mod tests {
    use std::f64::consts;
    use super::*;

    #[test]
    fn config_parser() {
        let text = "---
        control:
          precision: 256
          verbose: false

        spheroid:
          shape: oblate
          c: 0.1
          lambda_approx: 2 * a + b^2

        stages: [lambda, dr]

        extra:
          single: R1_1
          angle: pi / 4

        constants:
          a: 3.0
          b: a - 1.0

        deep:
          nested:
            section:
              key: 1.0
        ";

        let mut config = Config::from_string(&text).unwrap();
        config.with_context("constants").unwrap();
        let prec = Context::new(256);

        // Plain usize and bool
        let precision: usize = config.read("control:precision").unwrap();
        assert_eq!(precision, 256);
        let verbose: bool = config.read("control:verbose").unwrap();
        assert!(!verbose);

        // Decimal parsed at full precision, not via f64
        let c = config.read_real(&prec, "spheroid:c").unwrap();
        let target = prec.int(1) / &prec.int(10);
        println!("c = {:.40}, target = {:.40}", c, target);
        assert_eq!(c, target);
        assert!(c != prec.float(0.1));

        // Evaluates math expr with constants
        let lambda = config.read_real(&prec, "spheroid:lambda_approx").unwrap();
        assert_eq!(lambda, 10);
        let angle = config.read_real(&prec, "extra:angle").unwrap();
        assert_eq!(angle.to_f64(), consts::PI / 4.0);

        // Lists, and single values promoted to lists
        let stages: Vec<String> = config.read("stages").unwrap();
        assert_eq!(stages, vec!["lambda".to_owned(), "dr".to_owned()]);
        let single: Vec<String> = config.read("extra:single").unwrap();
        assert_eq!(single, vec!["R1_1".to_owned()]);

        let key = config.read_real(&prec, "deep:nested:section:key").unwrap();
        assert_eq!(key, 1);

        // Missing and malformed keys
        let n_dr: usize = config.read_or("coefficients:n_dr", 40).unwrap();
        assert_eq!(n_dr, 40);
        let shape: Result<usize, _> = config.read_or("spheroid:shape", 0);
        assert!(shape.is_err());
        let bad: Result<usize, _> = config.read("control:missing");
        assert_eq!(bad.unwrap_err().kind(), InputErrorKind::Location);

        // evaluate arb string
        let val = config.evaluate("1.0 / (1.0 + b)").unwrap();
        assert_eq!(val, 1.0 / 3.0);
    }

    #[test]
    fn looper() {
        let prec = Context::new(128);

        // Test extraction of single value
        let text: &str = "---
        evaluate:
            values: 0.5
        ";
        let config = Config::from_string(&text).unwrap();
        let values = config.read_real_loop(&prec, "evaluate:values").unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], prec.ratio(1, 2));

        // Test extraction of looped values
        let text: &str = "---
        evaluate:
            values:
                start: 1.0
                stop: 10.0
                step: 2.0
        ";
        let config = Config::from_string(&text).unwrap();
        let values = config.read_real_loop(&prec, "evaluate:values").unwrap();
        let values: Vec<f64> = values.iter().map(Real::to_f64).collect();
        assert_eq!(values, vec![1.0, 3.0, 5.0, 7.0, 9.0]);

        // A loop that never advances is rejected
        let text: &str = "---
        values:
            start: 1.0
            stop: 2.0
            step: 0.0
        ";
        let config = Config::from_string(&text).unwrap();
        assert!(config.read_real_loop(&prec, "values").is_err());
    }

    #[test]
    fn close_to_the_focus() {
        let text = "---
        near: 1 + 2^-200
        tiny: 2^(-300)
        ";
        let config = Config::from_string(&text).unwrap();
        let prec = Context::new(512);

        let near = config.read_real(&prec, "near").unwrap();
        let offset = &near - &prec.one();
        println!("ξ - 1 = {:.10}", offset);
        assert!(!offset.is_zero());
        assert_eq!(offset, prec.pow2(-200));

        let tiny = config.read_real(&prec, "tiny").unwrap();
        assert_eq!(tiny, prec.pow2(-300));

        // not an integer exponent, so left to the expression evaluator
        assert!(power_of_two(&prec, "1+2^k").is_none());
        assert!(power_of_two(&prec, "2^0.5").is_none());
    }
}
