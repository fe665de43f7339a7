//! Error types and handling for BatchResize
//!
//! Two layers exist. [`ResizeError`] covers orchestration problems that stop
//! a whole run before any job is dispatched. [`JobError`] covers a single
//! file and never leaves the resizer: it is folded into a [`JobOutcome`].

use std::path::PathBuf;
use thiserror::Error;

use crate::processing::JobOutcome;

/// Result type alias for BatchResize operations
pub type Result<T> = std::result::Result<T, ResizeError>;

/// Orchestration-level error type
#[derive(Debug, Error)]
pub enum ResizeError {
    /// Input root is missing or not a directory
    #[error("Input path '{}' does not exist", path.display())]
    InputNotDirectory { path: PathBuf },

    /// The low-quality confirmation prompt was not accepted
    #[error("Aborted: quality {quality} is below {threshold} and was not confirmed")]
    ConfirmationDeclined { quality: u8, threshold: u8 },

    /// Configuration values out of range
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk errors
    #[error("Directory discovery failed: {0}")]
    Discovery(#[from] walkdir::Error),

    /// Invalid filename pattern
    #[error("Invalid filename pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// Worker pool could not be created
    #[error("Failed to create worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// Configuration serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ResizeError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Exit status the binary should report for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfirmationDeclined { .. } => 2,
            _ => 1,
        }
    }
}

/// Failure of a single resize job
#[derive(Debug, Error)]
pub enum JobError {
    /// Source is empty, unreadable or not an image at all
    #[error("source is broken: {reason}")]
    SourceBroken { reason: String },

    /// Output exists and restart is disabled
    #[error("output already exists: {}", path.display())]
    OutputExists { path: PathBuf },

    /// Image data or metadata is malformed or missing
    #[error("malformed image attributes: {reason}")]
    Attribute { reason: String },

    /// Anything else
    #[error("unexpected failure: {reason}")]
    Unknown { reason: String },
}

impl JobError {
    pub fn broken<S: Into<String>>(reason: S) -> Self {
        Self::SourceBroken {
            reason: reason.into(),
        }
    }

    pub fn attribute<S: Into<String>>(reason: S) -> Self {
        Self::Attribute {
            reason: reason.into(),
        }
    }

    pub fn unknown<S: Into<String>>(reason: S) -> Self {
        Self::Unknown {
            reason: reason.into(),
        }
    }

    /// The outcome kind this failure is reported as
    pub fn outcome(&self) -> JobOutcome {
        match self {
            Self::SourceBroken { .. } => JobOutcome::SourceBroken,
            Self::OutputExists { .. } => JobOutcome::SkippedExisting,
            Self::Attribute { .. } => JobOutcome::DecodeAttributeError,
            Self::Unknown { .. } => JobOutcome::UnknownError,
        }
    }
}

impl From<image::ImageError> for JobError {
    fn from(err: image::ImageError) -> Self {
        use image::ImageError;

        match err {
            ImageError::Decoding(_)
            | ImageError::Unsupported(_)
            | ImageError::Limits(_)
            | ImageError::Parameter(_) => Self::attribute(err.to_string()),
            _ => Self::unknown(err.to_string()),
        }
    }
}

impl From<exif::Error> for JobError {
    fn from(err: exif::Error) -> Self {
        match err {
            exif::Error::Io(e) => Self::unknown(format!("reading EXIF: {e}")),
            other => Self::attribute(format!("EXIF: {other}")),
        }
    }
}
