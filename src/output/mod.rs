//! Persistence of coefficient arrays and scalars between pipeline
//! stages: one value per line, in scientific notation with enough
//! digits to be read back exactly.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::geometry::{Geometry, Spheroid};
use crate::number::{Context, Real};

mod error;
mod store;

pub use error::*;
pub use store::*;

/// Path of the data file for quantity `name` of mode `(m, n)` at size
/// parameter `c`, i.e. `dir/pro_00001500_000_002_lambda.txt` for the
/// prolate eigenvalue at `c = 1.5`.
pub fn generate_name(dir: &Path, shape: Spheroid, c: &Real, m: i64, n: i64, name: &str) -> PathBuf {
    let c = (c * 1000).to_i64();
    dir.join(format!("{}_{:08}_{:03}_{:03}_{}.txt", shape.tag(), c, m, n, name))
}

/// Writes `data` to `path`, one value per line.
pub fn save_data(path: &Path, data: &[Real]) -> Result<(), OutputError> {
    let name = path.display().to_string();
    let file = File::create(path).map_err(|_| OutputError::Open(name.clone()))?;
    let mut file = BufWriter::new(file);
    for x in data {
        writeln!(file, "{}", x.to_sci_string(0))
            .map_err(|_| OutputError::Write(name.clone()))?;
    }
    file.flush().map_err(|_| OutputError::Write(name))
}

/// Writes `ln |x|` for each value in `data` to `path`, one value per line.
pub fn save_log_abs_data(path: &Path, data: &[Real]) -> Result<(), OutputError> {
    let logs: Vec<Real> = data.iter().map(|x| x.abs().ln()).collect();
    save_data(path, &logs)
}

/// Reads a file written by `save_data`, at the working precision of
/// `ctx`. Blank lines are skipped.
pub fn open_data(ctx: &Context, path: &Path) -> Result<Vec<Real>, OutputError> {
    let name = path.display().to_string();
    let file = File::open(path).map_err(|_| OutputError::Open(name.clone()))?;
    let mut data = vec![];

    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|_| OutputError::Open(name.clone()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let x = ctx.parse(line)
            .ok_or_else(|| OutputError::conversion(&name, i + 1, line))?;
        data.push(x);
    }

    Ok(data)
}
