//! Fixed-size worker pool for batch resizing
//!
//! Jobs are independent, so they are handed to a dedicated rayon pool one
//! job per task. Results are collected through an indexed parallel iterator:
//! slot `i` of the returned vector always holds the result of job `i`, no
//! matter which worker ran it or when it finished.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{error, info};

use crate::error::{ResizeError, Result};
use crate::processing::{JobOutcome, JobResult, ResizeJob, Resizer};

/// Anything that turns one job into one result
pub trait JobProcessor: Sync {
    fn process(&self, job: &ResizeJob) -> JobResult;
}

impl JobProcessor for Resizer {
    fn process(&self, job: &ResizeJob) -> JobResult {
        Resizer::process(self, job)
    }
}

impl<F> JobProcessor for F
where
    F: Fn(&ResizeJob) -> JobResult + Sync,
{
    fn process(&self, job: &ResizeJob) -> JobResult {
        self(job)
    }
}

/// Worker pool dispatcher
pub struct Dispatcher {
    pool: ThreadPool,
    worker_count: usize,
    live_output: bool,
}

impl Dispatcher {
    /// Create a dispatcher backed by exactly `worker_count` threads
    pub fn new(worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(ResizeError::invalid_config("Worker count must be greater than 0"));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(|i| format!("resize-worker-{i}"))
            .build()?;

        info!("Initialized worker pool with {} workers", worker_count);

        Ok(Self {
            pool,
            worker_count,
            live_output: false,
        })
    }

    /// Print each result's message as soon as its job completes
    pub fn with_live_output(mut self, enabled: bool) -> Self {
        self.live_output = enabled;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Run every job through `processor` and wait for the pool to drain
    ///
    /// The returned vector has one entry per job, in submission order. A job
    /// that panics is reported as [`JobOutcome::UnknownError`]; its siblings
    /// keep running.
    pub fn run<P: JobProcessor + ?Sized>(&self, jobs: &[ResizeJob], processor: &P) -> Vec<JobResult> {
        let live_output = self.live_output;

        self.pool.install(|| {
            jobs.par_iter()
                .with_max_len(1)
                .map(|job| {
                    let result = run_isolated(processor, job);
                    if live_output {
                        println!("{}", result.message);
                    }
                    result
                })
                .collect()
        })
    }

    /// Like [`Dispatcher::run`], also measuring how long the batch took
    pub fn run_timed<P: JobProcessor + ?Sized>(
        &self,
        jobs: &[ResizeJob],
        processor: &P,
    ) -> (Vec<JobResult>, Duration) {
        let start = Instant::now();
        let results = self.run(jobs, processor);
        let elapsed = start.elapsed();

        info!(
            "Processed {} jobs in {:.2}s",
            results.len(),
            elapsed.as_secs_f64()
        );

        (results, elapsed)
    }
}

fn run_isolated<P: JobProcessor + ?Sized>(processor: &P, job: &ResizeJob) -> JobResult {
    panic::catch_unwind(AssertUnwindSafe(|| processor.process(job))).unwrap_or_else(|_| {
        error!("Worker panicked on {:?}", job.input);
        JobResult::new(job, JobOutcome::UnknownError)
    })
}
