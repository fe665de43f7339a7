//! Batch run record and the persisted run log

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::config::{BatchConfig, LOG_FILE_NAME};
use crate::error::Result;
use crate::processing::{JobOutcome, JobResult};

/// Everything known about a finished run
#[derive(Debug, Clone)]
pub struct BatchRunRecord {
    config: BatchConfig,
    results: Vec<JobResult>,
    elapsed: Duration,
}

impl BatchRunRecord {
    pub fn new(config: BatchConfig, results: Vec<JobResult>, elapsed: Duration) -> Self {
        Self {
            config,
            results,
            elapsed,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Results in submission order
    pub fn results(&self) -> &[JobResult] {
        &self.results
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The `--- N seconds ---` line
    pub fn time_line(&self) -> String {
        format!("--- {} seconds ---", self.elapsed.as_secs_f64())
    }

    pub fn count(&self, outcome: JobOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    /// Non-zero outcome counts
    pub fn summary(&self) -> BTreeMap<JobOutcome, usize> {
        let mut counts = BTreeMap::new();
        for result in &self.results {
            *counts.entry(result.outcome).or_insert(0) += 1;
        }
        counts
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| r.outcome.is_failure())
    }

    /// Log file contents
    pub fn render(&self) -> Result<String> {
        let mut log = String::new();

        log.push_str("Used parameters:\n");
        log.push_str(&self.config.to_pretty_json()?);
        log.push_str("\n\n");
        log.push_str(&self.time_line());
        log.push('\n');

        for result in &self.results {
            // Writing into a String cannot fail
            let _ = writeln!(log, "{}", result.message);
        }

        Ok(log)
    }

    /// Write the log to `<dir>/resizeLog.txt`, replacing any previous one
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join(LOG_FILE_NAME);
        std::fs::write(&path, self.render()?)?;

        info!("Wrote run log to {:?}", path);
        Ok(path)
    }
}
