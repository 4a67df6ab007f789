//! Runs the stages of the spheroidal wave function pipeline, as
//! specified by a YAML input file:
//! ```text
//! spheroidal input.yaml
//! ```
//! Every stage reads what it needs from the data directory and saves its
//! result there, so stages can be run in separate invocations.

use std::error::Error;
use std::path::PathBuf;

use colored::Colorize;

use spheroidal::*;
use spheroidal::input::{Config, InputError, InputErrorKind};
use spheroidal::number::DEFAULT_MAX_ITERATIONS;
use spheroidal::output::{AsData, DataStore, OutputError};
use spheroidal::report;
use spheroidal::report::Diagnostic;

#[derive(Debug, Copy, Clone, PartialEq)]
enum Stage {
    Lambda,
    Dr,
    DrNeg,
    N,
    F,
    K1,
    K2,
    C2k,
    Q,
    B2r,
    S1,
    R,
}

impl Stage {
    /// Parses a list of stage names, expanding `everything` to all the
    /// stages that generate data for the given geometry.
    fn parse_all(names: &[String], shape: Spheroid) -> Result<Vec<Stage>, InputError> {
        let mut stages = vec![];
        for name in names {
            match name.as_str() {
                "lambda" => stages.push(Stage::Lambda),
                "dr" => stages.push(Stage::Dr),
                "dr_neg" => stages.push(Stage::DrNeg),
                "N" => stages.push(Stage::N),
                "F" => stages.push(Stage::F),
                "k1" => stages.push(Stage::K1),
                "k2" => stages.push(Stage::K2),
                "c2k" => stages.push(Stage::C2k),
                "Q" => stages.push(Stage::Q),
                "B2r" => stages.push(Stage::B2r),
                "S1" => stages.push(Stage::S1),
                "R" => stages.push(Stage::R),
                "everything" => {
                    stages.extend_from_slice(&[
                        Stage::Lambda, Stage::Dr, Stage::DrNeg, Stage::N, Stage::F,
                        Stage::K1, Stage::K2, Stage::C2k,
                    ]);
                    if !shape.is_prolate() {
                        stages.extend_from_slice(&[Stage::Q, Stage::B2r]);
                    }
                },
                other => return Err(InputError::stage(other)),
            }
        }
        Ok(stages)
    }
}

/// Requested lengths and truncation floors of the coefficient arrays.
struct Limits {
    n_dr: usize,
    dr_min: Real,
    n_dr_neg: usize,
    dr_neg_min: Real,
    n_c2k: usize,
    c2k_min: Real,
    n_b2r: usize,
    b2r_min: Real,
}

impl Limits {
    fn from_config(config: &Config, ctx: &Context) -> Result<Self, InputError> {
        let floor = |key: &str| {
            match config.read_real(ctx, format!("coefficients:{}", key)) {
                Err(e) if e.kind() == InputErrorKind::Location => Ok(ctx.zero()),
                other => other,
            }
        };

        Ok(Limits {
            n_dr: config.read_or("coefficients:n_dr", 40)?,
            dr_min: floor("dr_min")?,
            n_dr_neg: config.read_or("coefficients:n_dr_neg", 40)?,
            dr_neg_min: floor("dr_neg_min")?,
            n_c2k: config.read_or("coefficients:n_c2k", 40)?,
            c2k_min: floor("c2k_min")?,
            n_b2r: config.read_or("coefficients:n_B2r", 40)?,
            b2r_min: floor("B2r_min")?,
        })
    }
}

/// Where and how the angular or radial functions are tabulated.
struct Sweep {
    argument: String,
    values: Vec<Real>,
    which: Vec<String>,
    digits: usize,
}

impl Sweep {
    fn from_config(config: &Config, ctx: &Context) -> Result<Self, InputError> {
        let all = ["R1_1", "R1_2", "R2_1", "R2_2", "R2_31", "R2_32"];
        let which = match config.read("evaluate:which") {
            Err(e) if e.kind() == InputErrorKind::Location => all.iter().map(|s| s.to_string()).collect(),
            other => other?,
        };

        Ok(Sweep {
            argument: config.read("evaluate:argument")?,
            values: config.read_real_loop(ctx, "evaluate:values")?,
            which,
            digits: config.read_or("evaluate:digits", 0)?,
        })
    }

    fn wants(&self, name: &str) -> bool {
        self.which.iter().any(|w| w == name)
    }

    fn format(&self, values: &[Real]) -> String {
        values.iter()
            .map(|v| v.to_sci_string(self.digits))
            .collect::<Vec<String>>()
            .join(",")
    }
}

/// Data needed by the radial functions, loaded only if one of the
/// requested representations uses it.
struct RadialData {
    dr: Indexed<Real>,
    f: Option<Real>,
    k1: Option<Real>,
    k2: Option<Real>,
    c2k: Vec<Real>,
    q: Option<Real>,
    b2r: Vec<Real>,
}

struct Pipeline {
    ctx: Context,
    mode: Mode,
    store: DataStore,
    lambda_approx: Option<Real>,
    limits: Limits,
}

fn log_abs_difference(a: &Real, b: &Real) -> Real {
    (a - b).abs().ln()
}

fn require<'a>(x: &'a Option<Real>, name: &'static str) -> Result<&'a Real, SolverError> {
    x.as_ref().ok_or(SolverError::MissingCoefficients(name))
}

impl Pipeline {
    fn announce(&self, what: &str) {
        println!(
            "{} {} for {} mode c = {}, m = {}, n = {}...",
            "Computing".bold().cyan(), what, self.mode.shape().name(),
            self.mode.c().to_f64(), self.mode.m(), self.mode.n(),
        );
    }

    fn save<T: AsData + ?Sized>(&self, name: &str, data: &T) -> Result<(), OutputError> {
        let path = self.store.save(name, data)?;
        println!("{} {} to {}.", "Saved".bold().bright_green(), name, path.display().to_string().bold().blue());
        Ok(())
    }

    fn scalar(&self, name: &str) -> Result<Real, OutputError> {
        self.store.open_scalar(&self.ctx, name)
    }

    fn array(&self, name: &str) -> Result<Vec<Real>, OutputError> {
        self.store.open(&self.ctx, name)
    }

    fn dr(&self, with_neg: bool) -> Result<Indexed<Real>, OutputError> {
        let neg = if with_neg { self.array("dr_neg")? } else { vec![] };
        Ok(Indexed::from_branches(self.array("dr")?, neg))
    }

    /// Evaluates one representation of a function at one point, or NaN
    /// if it was not requested or could not be computed there.
    fn attempt<F>(&self, wanted: bool, name: &str, at: &Real, f: F) -> (Real, Real)
    where F: FnOnce() -> Result<(Real, Real), SolverError> {
        if !wanted {
            return (self.ctx.nan(), self.ctx.nan());
        }
        f().unwrap_or_else(|e| {
            report!(Diagnostic::Warning, true, "{} at {}: {}", name, at.to_sci_string(10), e);
            (self.ctx.nan(), self.ctx.nan())
        })
    }

    fn run(&self, stage: Stage, sweep: Option<&Sweep>) -> Result<(), Box<dyn Error>> {
        let ctx = &self.ctx;
        let mode = &self.mode;
        let limits = &self.limits;

        match stage {
            Stage::Lambda => {
                self.announce("lambda");
                let approx = match &self.lambda_approx {
                    Some(x) => x.clone(),
                    None if self.store.path("lambda_approx").exists() => self.scalar("lambda_approx")?,
                    None => default_lambda_approx(mode),
                };
                let lambda = calculate_lambda(mode, &approx)?;
                self.save("lambda", &lambda)?;
            },
            Stage::Dr => {
                self.announce("dr");
                let lambda = self.scalar("lambda")?;
                let mut dr = Indexed::new();
                calculate_dr(mode, &lambda, &mut dr, limits.n_dr, &limits.dr_min)?;
                self.save("dr", dr.nonneg())?;
            },
            Stage::DrNeg => {
                self.announce("dr_neg");
                let lambda = self.scalar("lambda")?;
                let mut dr = self.dr(false)?;
                calculate_dr_neg(mode, &lambda, &mut dr, limits.n_dr_neg, &limits.dr_neg_min)?;
                self.save("dr_neg", dr.neg())?;
            },
            Stage::N => {
                self.announce("N");
                let lambda = self.scalar("lambda")?;
                let norm = calculate_nmn(mode, &lambda, &mut self.dr(false)?)?;
                self.save("N", &norm)?;
            },
            Stage::F => {
                self.announce("F");
                let lambda = self.scalar("lambda")?;
                let f = calculate_fmn(mode, &lambda, &mut self.dr(false)?)?;
                self.save("F", &f)?;
            },
            Stage::K1 => {
                self.announce("k1");
                let k1 = calculate_kmn1(mode, &self.dr(false)?, &self.scalar("F")?)?;
                self.save("k1", &k1)?;
            },
            Stage::K2 => {
                self.announce("k2");
                let lambda = self.scalar("lambda")?;
                let k2 = calculate_kmn2(mode, &lambda, &mut self.dr(true)?, &self.scalar("F")?)?;
                self.save("k2", &k2)?;
            },
            Stage::C2k => {
                self.announce("c2k");
                let lambda = self.scalar("lambda")?;
                let mut c2k = vec![];
                calculate_c2k(mode, &lambda, &mut self.dr(false)?, &mut c2k, limits.n_c2k, &limits.c2k_min)?;
                self.save("c2k", &c2k)?;
            },
            Stage::Q => {
                self.announce("Q");
                let lambda = self.scalar("lambda")?;
                let mut c2k = self.array("c2k")?;
                let q = calculate_qmn(mode, &lambda, &mut self.dr(false)?, &mut c2k, &self.scalar("k1")?)?;
                self.save("Q", &q)?;
            },
            Stage::B2r => {
                self.announce("B2r");
                let lambda = self.scalar("lambda")?;
                let mut c2k = self.array("c2k")?;
                let mut b2r = vec![];
                calculate_b2r(
                    mode, &lambda, &mut self.dr(false)?, &mut c2k,
                    &self.scalar("k1")?, &self.scalar("Q")?,
                    &mut b2r, limits.n_b2r, &limits.b2r_min,
                )?;
                self.save("B2r", &b2r)?;
            },
            Stage::S1 => {
                let sweep = sweep.ok_or_else(|| InputError::location("evaluate", "evaluate"))?;
                self.angular(sweep)?;
            },
            Stage::R => {
                let sweep = sweep.ok_or_else(|| InputError::location("evaluate", "evaluate"))?;
                self.radial(sweep)?;
            },
        }

        report!(Diagnostic::Trace, ctx.verbose(), "completed stage {:?}", stage);
        Ok(())
    }

    /// Prints `arg, η, S1_1, S1_1', S1_2, S1_2', ln|ΔS1|, ln|ΔS1'|` for
    /// every value of the sweep, normalized to unit norm on `[-1, 1]`.
    fn angular(&self, sweep: &Sweep) -> Result<(), Box<dyn Error>> {
        let ctx = &self.ctx;
        let mode = &self.mode;
        if sweep.argument != "eta" && sweep.argument != "theta" {
            return Err(InputError::conversion("evaluate:argument", &sweep.argument).into());
        }

        let dr = self.dr(false)?;
        let c2k = self.array("c2k")?;
        let norm = self.scalar("N")?.sqrt();

        println!("{},eta,S1_1,S1p_1,S1_2,S1p_2,S1_log_abs_difference,S1p_log_abs_difference", sweep.argument);
        for x in sweep.values.iter() {
            let eta = if sweep.argument == "eta" { x.clone() } else { (x * &ctx.pi()).cos() };
            let (s1, s1p) = self.attempt(true, "S1_1", &eta, || calculate_smn1_1(mode, &dr, &eta));
            let (s2, s2p) = self.attempt(true, "S1_2", &eta, || calculate_smn1_2(mode, &c2k, &eta));
            let (s1, s1p, s2, s2p) = (s1 / &norm, s1p / &norm, s2 / &norm, s2p / &norm);
            let d = log_abs_difference(&s1, &s2);
            let dp = log_abs_difference(&s1p, &s2p);
            println!("{}", sweep.format(&[x.clone(), eta, s1, s1p, s2, s2p, d, dp]));
        }

        Ok(())
    }

    fn load_radial(&self, sweep: &Sweep) -> Result<RadialData, OutputError> {
        let oblate = !self.mode.shape().is_prolate();
        let needs = |names: &[&str]| names.iter().any(|n| sweep.wants(n));
        let r2_3 = oblate && needs(&["R2_31", "R2_32"]);

        let scalar = |wanted: bool, name: &str| -> Result<Option<Real>, OutputError> {
            if wanted { self.scalar(name).map(Some) } else { Ok(None) }
        };
        let array = |wanted: bool, name: &str| -> Result<Vec<Real>, OutputError> {
            if wanted { self.array(name) } else { Ok(vec![]) }
        };

        let dr = if needs(&["R1_1", "R2_1", "R2_2", "R2_31"]) {
            self.dr(sweep.wants("R2_2"))?
        } else {
            Indexed::new()
        };

        Ok(RadialData {
            dr,
            f: scalar(needs(&["R1_1", "R2_1", "R2_31"]), "F")?,
            k1: scalar(needs(&["R1_2", "R2_32"]), "k1")?,
            k2: scalar(sweep.wants("R2_2"), "k2")?,
            c2k: array(needs(&["R1_2", "R2_32"]), "c2k")?,
            q: scalar(r2_3, "Q")?,
            b2r: array(r2_3, "B2r")?,
        })
    }

    /// Prints every requested representation of the radial functions,
    /// the differences between them and the error in the Wronskian of
    /// every first-kind/second-kind pairing.
    fn radial(&self, sweep: &Sweep) -> Result<(), Box<dyn Error>> {
        let mode = &self.mode;
        let shape = mode.shape();
        let prolate = shape.is_prolate();
        if sweep.argument != "xi" && sweep.argument != "x" {
            return Err(InputError::conversion("evaluate:argument", &sweep.argument).into());
        }

        let data = self.load_radial(sweep)?;
        let r1_names = ["1", "2"];
        let r2_names: &[&str] = if prolate { &["1", "2"] } else { &["1", "2", "31", "32"] };

        // header
        let mut header = vec![sweep.argument.clone(), "xi".to_owned()];
        if prolate {
            header.push("log_xi_minus_one".to_owned());
        }
        let push_pairs = |header: &mut Vec<String>, kind: &str, names: &[&str]| {
            for a in names {
                header.push(format!("{}_{}", kind, a));
                header.push(format!("{}p_{}", kind, a));
            }
            for (i, a) in names.iter().enumerate() {
                for b in &names[i + 1..] {
                    header.push(format!("{}_log_abs_difference_{}_{}", kind, a, b));
                    header.push(format!("{}p_log_abs_difference_{}_{}", kind, a, b));
                }
            }
        };
        push_pairs(&mut header, "R1", &r1_names[..]);
        push_pairs(&mut header, "R2", r2_names);
        header.push("W".to_owned());
        header.push("log_W".to_owned());
        for a in r1_names.iter() {
            for b in r2_names {
                header.push(format!("W_{}_{}_log_abs_error", a, b));
            }
        }
        println!("{}", header.join(","));

        let pair_columns = |row: &mut Vec<Real>, fs: &[(Real, Real)]| {
            for f in fs {
                row.push(f.0.clone());
                row.push(f.1.clone());
            }
            for (i, a) in fs.iter().enumerate() {
                for b in &fs[i + 1..] {
                    row.push(log_abs_difference(&a.0, &b.0));
                    row.push(log_abs_difference(&a.1, &b.1));
                }
            }
        };

        for x in sweep.values.iter() {
            let xi = if sweep.argument == "x" && prolate {
                (x * x + 1).sqrt()
            } else {
                x.clone()
            };

            let r1_1 = self.attempt(sweep.wants("R1_1") || (!prolate && sweep.wants("R2_31")), "R1_1", &xi, || {
                calculate_rmn1_1(mode, &data.dr, require(&data.f, "F")?, &xi)
            });
            let r1_2 = self.attempt(sweep.wants("R1_2") || (!prolate && sweep.wants("R2_32")), "R1_2", &xi, || {
                calculate_rmn1_2(mode, &data.c2k, require(&data.k1, "k1")?, &xi)
            });
            let mut r2 = vec![
                self.attempt(sweep.wants("R2_1"), "R2_1", &xi, || {
                    calculate_rmn2_1(mode, &data.dr, require(&data.f, "F")?, &xi)
                }),
                self.attempt(sweep.wants("R2_2"), "R2_2", &xi, || {
                    calculate_rmn2_2(mode, &data.dr, require(&data.k2, "k2")?, &xi)
                }),
            ];
            if !prolate {
                for (name, r1) in [("R2_31", &r1_1), ("R2_32", &r1_2)].iter() {
                    r2.push(self.attempt(sweep.wants(name), name, &xi, || {
                        calculate_rmn2_3(mode, require(&data.q, "Q")?, &data.b2r, &xi, r1)
                    }));
                }
            }
            let r1 = [r1_1, r1_2];

            let mut row = vec![x.clone(), xi.clone()];
            if prolate {
                row.push((&xi - 1).ln());
            }
            pair_columns(&mut row, &r1[..]);
            pair_columns(&mut row, &r2[..]);

            let w = shape.wronskian(mode.c(), &xi);
            row.push(w.clone());
            row.push(w.ln());
            for a in r1.iter() {
                for b in r2.iter() {
                    row.push((wronskian(a, b) - &w).abs().ln());
                }
            }
            println!("{}", sweep.format(&row));
        }

        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args().nth(1).map(PathBuf::from).ok_or_else(InputError::usage)?;

    let mut config = Config::from_file(&path)?;
    config.with_context("constants")?;

    let precision: u32 = config.read("control:precision")?;
    let max_iterations: usize = config.read_or("control:max_iterations", DEFAULT_MAX_ITERATIONS)?;
    let verbose: bool = config.read_or("control:verbose", false)?;
    let data_dir: String = config.read_or("control:data", "data".to_owned())?;

    let ctx = Context::new(precision)
        .with_max_iterations(max_iterations)
        .with_verbosity(verbose);

    let shape: Spheroid = config.read("spheroid:shape")?;
    let c = config.read_real(&ctx, "spheroid:c")?;
    let m: i64 = config.read("spheroid:m")?;
    let n: i64 = config.read("spheroid:n")?;
    let lambda_approx = match config.read_real(&ctx, "spheroid:lambda_approx") {
        Ok(x) => Some(x),
        Err(e) if e.kind() == InputErrorKind::Location => None,
        Err(e) => return Err(e.into()),
    };

    let names: Vec<String> = config.read("stages")?;
    let stages = Stage::parse_all(&names, shape)?;
    let sweep = if stages.iter().any(|s| *s == Stage::S1 || *s == Stage::R) {
        Some(Sweep::from_config(&config, &ctx)?)
    } else {
        None
    };

    let data_dir = PathBuf::from(data_dir);
    std::fs::create_dir_all(&data_dir)
        .map_err(|_| OutputError::Open(data_dir.display().to_string()))?;

    let mode = Mode::new(&ctx, shape, &c, m, n)?;
    let pipeline = Pipeline {
        store: DataStore::new(&data_dir, shape, &c, m, n),
        limits: Limits::from_config(&config, &ctx)?,
        ctx,
        mode,
        lambda_approx,
    };

    report!(Diagnostic::Info, pipeline.ctx.verbose(), "running {} stages at {} bits", stages.len(), precision);
    for stage in stages {
        pipeline.run(stage, sweep.as_ref())?;
    }

    Ok(())
}
