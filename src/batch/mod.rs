//! Batch orchestration
//!
//! Turns a [`BatchConfig`] into a finished run: input checks, the
//! low-quality confirmation gate, source discovery, output tree creation,
//! dispatch, and the run log.

use std::io::{self, BufRead};

use console::{style, Term};
use tracing::{info, warn};

use crate::config::{BatchConfig, Interpolation, QUALITY_WARNING_THRESHOLD};
use crate::error::{ResizeError, Result};
use crate::parallel::{Dispatcher, JobProcessor};
use crate::processing::{ResizeJob, Resizer};

pub mod discovery;
pub mod record;

pub use discovery::{discover_sources, mirror_path};
pub use record::BatchRunRecord;

/// Asks the user whether to go on with a risky run
pub trait Confirm {
    /// Show `prompt` and report whether the reply accepts it
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Prompts on the terminal and reads one line from stdin
#[derive(Debug, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let term = Term::stdout();
        term.write_str(&format!("{} ", style(prompt).yellow().bold()))?;
        term.flush()?;

        let mut reply = String::new();
        io::stdin().lock().read_line(&mut reply)?;

        Ok(is_affirmative(&reply))
    }
}

/// Always gives the same answer
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(self.0)
    }
}

/// Whether a prompt reply means yes
pub fn is_affirmative(reply: &str) -> bool {
    matches!(reply.trim(), "j" | "J" | "y" | "Y")
}

/// Text of the low-quality confirmation prompt
pub fn quality_prompt() -> String {
    format!("WARNING: Quality below {QUALITY_WARNING_THRESHOLD}%. Continue? [j,y/N]")
}

/// Runs one batch from configuration to written log
#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: BatchConfig,
    live_output: bool,
}

impl BatchRunner {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            live_output: false,
        }
    }

    /// Print each job's message as it completes
    pub fn live_output(mut self, enabled: bool) -> Self {
        self.live_output = enabled;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Run the batch with the standard resizer
    pub fn run(&self, confirm: &mut dyn Confirm) -> Result<BatchRunRecord> {
        self.run_with(confirm, &Resizer::new())
    }

    /// Run the batch, handing each job to `processor`
    pub fn run_with<P: JobProcessor + ?Sized>(
        &self,
        confirm: &mut dyn Confirm,
        processor: &P,
    ) -> Result<BatchRunRecord> {
        let jobs = self.prepare(confirm)?;

        let dispatcher = Dispatcher::new(self.config.threads)?.with_live_output(self.live_output);
        let (results, elapsed) = dispatcher.run_timed(&jobs, processor);

        let record = BatchRunRecord::new(self.config.clone(), results, elapsed);
        record.write_to_dir(&self.config.output)?;

        Ok(record)
    }

    /// Everything up to dispatch: checks, confirmation, discovery, output tree
    ///
    /// Any error returned here means no job has been started.
    pub fn prepare(&self, confirm: &mut dyn Confirm) -> Result<Vec<ResizeJob>> {
        let config = &self.config;
        config.validate()?;

        if !config.input.is_dir() {
            return Err(ResizeError::InputNotDirectory {
                path: config.input.clone(),
            });
        }

        if config.needs_confirmation() && !confirm.confirm(&quality_prompt())? {
            return Err(ResizeError::ConfirmationDeclined {
                quality: config.quality,
                threshold: QUALITY_WARNING_THRESHOLD,
            });
        }

        if config.interpolation == Interpolation::Max {
            warn!("Interpolation {} does not resample; images keep their source size", config.interpolation);
        }

        let sources = discover_sources(&config.input, &config.pattern)?;
        info!("Discovered {} source files under {:?}", sources.len(), config.input);

        std::fs::create_dir_all(&config.output)?;

        let mut jobs = Vec::with_capacity(sources.len());
        for source in sources {
            let output = mirror_path(&source, &config.input, &config.output)?;
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            jobs.push(ResizeJob::from_config(source, output, config));
        }

        Ok(jobs)
    }
}
