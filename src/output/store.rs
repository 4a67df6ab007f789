//! Named data files for a single spheroidal mode

use std::path::{Path, PathBuf};

use crate::geometry::Spheroid;
use crate::number::{Context, Real};
use super::{generate_name, open_data, save_data, save_log_abs_data, OutputError};

/// Quantities that can be written to a data file: a scalar or a slice.
pub trait AsData {
    fn values(&self) -> &[Real];
}

impl AsData for Real {
    fn values(&self) -> &[Real] {
        std::slice::from_ref(self)
    }
}

impl AsData for [Real] {
    fn values(&self) -> &[Real] {
        self
    }
}

impl AsData for Vec<Real> {
    fn values(&self) -> &[Real] {
        self
    }
}

/// The data directory of one mode `(c, m, n)` of one geometry.
/// Every quantity is stored under its own name, next to a `log_abs_`
/// companion.
pub struct DataStore {
    dir: PathBuf,
    shape: Spheroid,
    c: Real,
    m: i64,
    n: i64,
}

impl DataStore {
    pub fn new(dir: &Path, shape: Spheroid, c: &Real, m: i64, n: i64) -> Self {
        DataStore {
            dir: dir.to_owned(),
            shape,
            c: c.clone(),
            m,
            n,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        generate_name(&self.dir, self.shape, &self.c, self.m, self.n, name)
    }

    /// Writes `data` under `name`, and its log-magnitude under
    /// `log_abs_name`. Returns the path of the first.
    pub fn save<T: AsData + ?Sized>(&self, name: &str, data: &T) -> Result<PathBuf, OutputError> {
        let path = self.path(name);
        save_data(&path, data.values())?;
        save_log_abs_data(&self.path(&format!("log_abs_{}", name)), data.values())?;
        Ok(path)
    }

    /// Reads every value stored under `name`.
    pub fn open(&self, ctx: &Context, name: &str) -> Result<Vec<Real>, OutputError> {
        open_data(ctx, &self.path(name))
    }

    /// Reads the first value stored under `name`.
    pub fn open_scalar(&self, ctx: &Context, name: &str) -> Result<Real, OutputError> {
        let path = self.path(name);
        open_data(ctx, &path)?
            .into_iter()
            .next()
            .ok_or_else(|| OutputError::Empty(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Oblate;

    #[test]
    fn scalars_and_arrays() {
        let ctx = Context::new(128);
        let dir = super::super::tests::scratch("store");
        let store = DataStore::new(&dir, Oblate.into(), &ctx.float(2.0), 1, 3);

        let lambda = ctx.ratio(-17, 3);
        let dr = vec![ctx.one(), ctx.float(-0.25), ctx.float(1.0e-40)];
        let path = store.save("lambda", &lambda).unwrap();
        store.save("dr", &dr).unwrap();
        assert!(path.ends_with("obl_00002000_001_003_lambda.txt"));

        assert_eq!(store.open_scalar(&ctx, "lambda").unwrap(), lambda);
        assert_eq!(store.open(&ctx, "dr").unwrap(), dr);

        let logs = store.open(&ctx, "log_abs_dr").unwrap();
        println!("log |dr| = {:?}", logs);
        assert!(logs[0].is_zero());
        assert!(logs[2] < -90);

        store.save("empty", &dr[..0]).unwrap();
        assert!(store.open_scalar(&ctx, "empty").is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
