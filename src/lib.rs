//! BatchResize - Parallel Batch JPEG Resizer
//!
//! Walks a directory tree of JPEG photographs, scales each one so its longer
//! side matches a target pixel count, and writes the result into a mirrored
//! output tree. Orientation metadata is reset to "normal" on every output.
//!
//! # Features
//!
//! - **Parallel Processing**: fixed-size worker pool, results in submission order
//! - **Fault Isolation**: a broken file becomes a reported outcome, never a crash
//! - **Resumable**: existing outputs are skipped unless a restart is requested
//! - **Auditable**: every run leaves a `resizeLog.txt` in the output root
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use batchresize::{BatchConfig, BatchRunner, FixedAnswer, Interpolation};
//!
//! let config = BatchConfig::new("photos", "photos_small")
//!     .longside(2000)
//!     .quality(85)
//!     .interpolation(Interpolation::Lanczos4);
//!
//! let record = BatchRunner::new(config).run(&mut FixedAnswer(true))?;
//! println!("{}", record.time_line());
//! # Ok::<(), batchresize::ResizeError>(())
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod error;
pub mod parallel;
pub mod processing;

// Re-export commonly used types
pub use batch::{BatchRunRecord, BatchRunner, Confirm, FixedAnswer, TerminalConfirm};
pub use config::{BatchConfig, Interpolation};
pub use error::{JobError, ResizeError, Result};
pub use parallel::{Dispatcher, JobProcessor};
pub use processing::{JobOutcome, JobResult, ResizeJob, Resizer};

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the diagnostic log subscriber
///
/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`).
/// Calling this more than once is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!("BatchResize v{} initialized", VERSION);
    }
}
