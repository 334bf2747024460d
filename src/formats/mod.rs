//! Record formats that are not plain delimited text.

pub mod cml;
pub mod ord;
pub mod pickle;
pub mod rxn_file;

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::DataSourceError;

/// Runs `task` over `files` on a pool of `workers` threads. Results come back
/// in input order.
pub fn map_files<T, F>(files: &[PathBuf], workers: usize, task: F) -> Result<Vec<T>, DataSourceError>
where
    T: Send,
    F: Fn(&Path) -> T + Sync + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|err| DataSourceError::WorkerPool(err.to_string()))?;
    Ok(pool.install(|| files.par_iter().map(|path| task(path)).collect()))
}
