//! Configuration management for BatchResize

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ResizeError, Result};

/// Quality below this value requires interactive confirmation
pub const QUALITY_WARNING_THRESHOLD: u8 = 80;

/// Filename pattern used when none is configured
pub const DEFAULT_PATTERN: &str = "*.JPG";

/// Name of the run log written into the output root
pub const LOG_FILE_NAME: &str = "resizeLog.txt";

/// Resampling method, identified by its numeric selector code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Interpolation {
    /// 0: nearest neighbour
    Nearest,
    /// 1: bilinear
    Linear,
    /// 2: bicubic
    Cubic,
    /// 3: pixel area relation, moire-free when shrinking
    #[default]
    Area,
    /// 4: Lanczos
    Lanczos4,
    /// 7: no resampling, the image passes through at source size
    Max,
}

impl Interpolation {
    /// All selectable methods in code order
    pub const ALL: [Interpolation; 6] = [
        Self::Nearest,
        Self::Linear,
        Self::Cubic,
        Self::Area,
        Self::Lanczos4,
        Self::Max,
    ];

    /// Numeric selector code
    pub fn code(self) -> u8 {
        match self {
            Self::Nearest => 0,
            Self::Linear => 1,
            Self::Cubic => 2,
            Self::Area => 3,
            Self::Lanczos4 => 4,
            Self::Max => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Nearest => "Nearest",
            Self::Linear => "Linear",
            Self::Cubic => "Cubic",
            Self::Area => "Area",
            Self::Lanczos4 => "Lanczos4",
            Self::Max => "Max",
        }
    }
}

impl From<Interpolation> for u8 {
    fn from(method: Interpolation) -> Self {
        method.code()
    }
}

impl TryFrom<u8> for Interpolation {
    type Error = String;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|method| method.code() == code)
            .ok_or_else(|| format!("invalid interpolation code {code} (choose from 0, 1, 2, 3, 4, 7)"))
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}

/// Effective configuration of one batch run
///
/// Serializes to the keys shown on the command line, in command-line order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Source root directory
    pub input: PathBuf,

    /// Destination root directory
    pub output: PathBuf,

    /// Worker pool size
    pub threads: usize,

    /// Target long-side pixel count
    pub longside: u32,

    /// JPEG encode quality (0-100)
    pub quality: u8,

    /// Resampling method
    pub interpolation: Interpolation,

    /// Overwrite existing outputs instead of skipping them
    pub restart: bool,

    /// Filename pattern of eligible sources
    #[serde(skip, default = "default_pattern")]
    pub pattern: String,
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            threads: 8,
            longside: 4000,
            quality: 90,
            interpolation: Interpolation::default(),
            restart: false,
            pattern: default_pattern(),
        }
    }
}

impl BatchConfig {
    /// Create a configuration with default settings for the given roots
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(input: P, output: Q) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn longside(mut self, longside: u32) -> Self {
        self.longside = longside;
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    pub fn pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Whether this configuration needs the low-quality confirmation
    pub fn needs_confirmation(&self) -> bool {
        self.quality < QUALITY_WARNING_THRESHOLD
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(ResizeError::invalid_config("Thread count must be greater than 0"));
        }

        if self.longside == 0 {
            return Err(ResizeError::invalid_config("Long side must be greater than 0"));
        }

        if self.quality > 100 {
            return Err(ResizeError::invalid_config(format!(
                "Quality must be between 0 and 100, got {}",
                self.quality
            )));
        }

        globset::Glob::new(&self.pattern)?;

        Ok(())
    }

    /// Render as pretty JSON with four-space indentation
    pub fn to_pretty_json(&self) -> Result<String> {
        use serde_json::ser::{PrettyFormatter, Serializer};

        let mut buf = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer)?;

        String::from_utf8(buf).map_err(|e| ResizeError::invalid_config(e.to_string()))
    }
}
