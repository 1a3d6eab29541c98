//! Batch execution on a bounded worker pool.

use std::path::PathBuf;

use rayon::prelude::*;

use super::{Engine, JobReport};
use crate::error::Result;

/// One input/output pair of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl BatchJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Outcome of one batch job.
#[derive(Debug)]
pub struct BatchResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: Result<JobReport>,
}

impl BatchResult {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub(super) fn run(
    engine: &Engine,
    jobs: Vec<BatchJob>,
    progress: &(dyn Fn(&BatchResult) + Sync),
) -> Vec<BatchResult> {
    let run_one = |job: BatchJob| {
        let result = engine
            .process_file(&job.input, &job.output)
            .map(|output| output.report);
        if let Err(ref e) = result {
            log::warn!("{}: {}", job.input.display(), e);
        }
        let done = BatchResult {
            input: job.input,
            output: job.output,
            result,
        };
        progress(&done);
        done
    };

    let workers = engine.options().workers;
    if workers == 0 {
        return jobs.into_par_iter().map(run_one).collect();
    }

    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(|| jobs.into_par_iter().map(run_one).collect()),
        Err(e) => {
            log::warn!("cannot start {} workers ({}), using the global pool", workers, e);
            jobs.into_par_iter().map(run_one).collect()
        }
    }
}
