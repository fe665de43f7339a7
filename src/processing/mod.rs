//! Core image processing functionality
//!
//! A [`ResizeJob`] goes in, exactly one [`JobResult`] comes out. Nothing a
//! single file can do (empty, corrupt, unwritable, panicking decoder) escapes
//! [`Resizer::process`].

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::{debug, error};

use crate::config::{BatchConfig, Interpolation};
use crate::error::JobError;

pub mod metadata;
pub mod resize;
pub mod validation;

pub use resize::{resample, target_dimensions};

/// One source-file-to-output-file resize task
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub longside: u32,
    pub quality: u8,
    pub interpolation: Interpolation,
    pub restart: bool,
}

impl ResizeJob {
    /// Build a job for one file using the run's settings
    pub fn from_config<P: Into<PathBuf>, Q: Into<PathBuf>>(
        input: P,
        output: Q,
        config: &BatchConfig,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            longside: config.longside,
            quality: config.quality,
            interpolation: config.interpolation,
            restart: config.restart,
        }
    }
}

/// How a job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobOutcome {
    Resized,
    SourceBroken,
    SkippedExisting,
    DecodeAttributeError,
    UnknownError,
}

impl JobOutcome {
    /// All outcome kinds in reporting order
    pub const ALL: [JobOutcome; 5] = [
        Self::Resized,
        Self::SourceBroken,
        Self::SkippedExisting,
        Self::DecodeAttributeError,
        Self::UnknownError,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Resized => "Resized",
            Self::SourceBroken => "Broken",
            Self::SkippedExisting => "Skipped",
            Self::DecodeAttributeError => "Attribute errors",
            Self::UnknownError => "Unknown errors",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::SourceBroken | Self::DecodeAttributeError | Self::UnknownError
        )
    }
}

/// Outcome of one job plus the line reported for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub outcome: JobOutcome,
    pub message: String,
}

impl JobResult {
    /// Create the result for `job`, with the message its outcome calls for
    pub fn new(job: &ResizeJob, outcome: JobOutcome) -> Self {
        let message = match outcome {
            JobOutcome::Resized => format!("Image resized: {}", job.input.display()),
            JobOutcome::SourceBroken => format!("File broken: {}", job.input.display()),
            JobOutcome::SkippedExisting => format!("Skip existing file: {}", job.output.display()),
            JobOutcome::DecodeAttributeError => {
                format!("Attribute Error for file: {}", job.input.display())
            }
            JobOutcome::UnknownError => format!("Unknown Error for file: {}", job.input.display()),
        };

        Self { outcome, message }
    }
}

impl fmt::Display for JobResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Single-job resizer: decode, resample, re-encode with normalized EXIF, write
#[derive(Debug, Default, Clone, Copy)]
pub struct Resizer;

impl Resizer {
    pub fn new() -> Self {
        Self
    }

    /// Process one job. Every failure, including a panic, becomes an outcome.
    pub fn process(&self, job: &ResizeJob) -> JobResult {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.try_process(job))) {
            Ok(Ok(())) => JobOutcome::Resized,
            Ok(Err(e)) => {
                debug!("{:?}: {}", job.input, e);
                e.outcome()
            }
            Err(_) => {
                error!("Panic while processing {:?}", job.input);
                JobOutcome::UnknownError
            }
        };

        JobResult::new(job, outcome)
    }

    fn try_process(&self, job: &ResizeJob) -> Result<(), JobError> {
        validation::check_source(&job.input)?;

        if !job.restart && job.output.is_file() {
            return Err(JobError::OutputExists {
                path: job.output.clone(),
            });
        }

        let data = validation::read_source(&job.input)?;
        let image = decode(&data)?;
        debug!(
            "Decoded {:?}: {}x{}",
            job.input,
            image.width(),
            image.height()
        );

        let (width, height) = match job.interpolation {
            Interpolation::Max => (image.width(), image.height()),
            _ => target_dimensions(image.width(), image.height(), job.longside),
        };
        if width == 0 || height == 0 {
            return Err(JobError::unknown(format!(
                "target size {width}x{height} is empty"
            )));
        }

        let resized = resample(&image, width, height, job.interpolation)?;
        debug!(
            "Resampled {:?} to {}x{} using {}",
            job.input, width, height, job.interpolation
        );

        let encoded = encode_jpeg(&resized, job.quality)?;
        let encoded = match metadata::read_source_exif(&data)? {
            Some(source_exif) => metadata::embed(&encoded, &metadata::normalized_block(&source_exif)?)?,
            None => encoded,
        };

        write_output(&job.output, &encoded)
    }
}

/// Decode and normalize to 8-bit gray or RGB
fn decode(data: &[u8]) -> Result<DynamicImage, JobError> {
    // Decoding reads from memory, so an I/O error can only mean truncated data
    let image = image::load_from_memory(data).map_err(|e| match e {
        image::ImageError::IoError(io) => JobError::attribute(format!("truncated image data: {io}")),
        other => other.into(),
    })?;

    if image.width() == 0 || image.height() == 0 {
        return Err(JobError::attribute("image has no pixel data"));
    }

    Ok(match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image,
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
            DynamicImage::ImageLuma8(image.to_luma8())
        }
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    })
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, JobError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    image
        .write_with_encoder(encoder)
        .map_err(|e| JobError::unknown(format!("encoding JPEG: {e}")))?;
    Ok(buf)
}

fn write_output(path: &Path, data: &[u8]) -> Result<(), JobError> {
    std::fs::write(path, data)
        .map_err(|e| JobError::unknown(format!("writing {}: {e}", path.display())))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::BatchConfig;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    /// Encode a gradient JPEG of the given size
    pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 90))
            .unwrap();
        buf
    }

    fn open_output(path: &Path) -> DynamicImage {
        image::load_from_memory(&std::fs::read(path).unwrap()).unwrap()
    }

    fn job(dir: &TempDir, name: &str, longside: u32) -> ResizeJob {
        let config = BatchConfig::new(dir.path(), dir.path()).longside(longside);
        ResizeJob::from_config(
            dir.path().join(name),
            dir.path().join(format!("out_{name}")),
            &config,
        )
    }

    #[test]
    fn test_resize_landscape() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("wide.JPG"), jpeg_bytes(400, 200)).unwrap();

        let job = job(&dir, "wide.JPG", 100);
        let result = Resizer::new().process(&job);

        assert_eq!(result.outcome, JobOutcome::Resized);
        assert_eq!(result.message, format!("Image resized: {}", job.input.display()));
        let out = open_output(&job.output);
        assert_eq!((out.width(), out.height()), (100, 50));
    }

    #[test]
    fn test_resize_portrait_with_every_method() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("tall.JPG"), jpeg_bytes(200, 400)).unwrap();

        for method in Interpolation::ALL {
            let mut job = job(&dir, "tall.JPG", 100);
            job.interpolation = method;
            job.restart = true;

            let result = Resizer::new().process(&job);
            assert_eq!(result.outcome, JobOutcome::Resized, "{method}");

            let out = open_output(&job.output);
            let expected = if method == Interpolation::Max { (200, 400) } else { (50, 100) };
            assert_eq!((out.width(), out.height()), expected, "{method}");
        }
    }

    #[test]
    fn test_empty_source_is_broken() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("empty.JPG"), b"").unwrap();
        // Broken wins over an existing output
        std::fs::write(dir.path().join("out_empty.JPG"), b"old").unwrap();

        let job = job(&dir, "empty.JPG", 100);
        let result = Resizer::new().process(&job);

        assert_eq!(result.outcome, JobOutcome::SourceBroken);
        assert_eq!(result.message, format!("File broken: {}", job.input.display()));
    }

    #[test]
    fn test_missing_source_is_broken() {
        let dir = TempDir::new().unwrap();
        let result = Resizer::new().process(&job(&dir, "nope.JPG", 100));
        assert_eq!(result.outcome, JobOutcome::SourceBroken);
    }

    #[test]
    fn test_non_image_source_is_broken() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("text.JPG"), b"definitely not a picture").unwrap();

        let job = job(&dir, "text.JPG", 100);
        assert_eq!(Resizer::new().process(&job).outcome, JobOutcome::SourceBroken);
        assert!(!job.output.exists());
    }

    #[test]
    fn test_truncated_jpeg_is_attribute_error() {
        let dir = TempDir::new().unwrap();
        let mut data = jpeg_bytes(64, 64);
        data.truncate(40);
        std::fs::write(dir.path().join("cut.JPG"), data).unwrap();

        let job = job(&dir, "cut.JPG", 32);
        let result = Resizer::new().process(&job);

        assert_eq!(result.outcome, JobOutcome::DecodeAttributeError);
        assert_eq!(result.message, format!("Attribute Error for file: {}", job.input.display()));
        assert!(!job.output.exists());
    }

    #[test]
    fn test_existing_output_is_skipped_untouched() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.JPG"), jpeg_bytes(40, 20)).unwrap();
        std::fs::write(dir.path().join("out_a.JPG"), b"previous bytes").unwrap();

        let job = job(&dir, "a.JPG", 10);
        let result = Resizer::new().process(&job);

        assert_eq!(result.outcome, JobOutcome::SkippedExisting);
        assert_eq!(result.message, format!("Skip existing file: {}", job.output.display()));
        assert_eq!(std::fs::read(&job.output).unwrap(), b"previous bytes");
    }

    #[test]
    fn test_restart_overwrites_existing_output() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.JPG"), jpeg_bytes(40, 20)).unwrap();
        std::fs::write(dir.path().join("out_a.JPG"), b"previous bytes").unwrap();

        let mut job = job(&dir, "a.JPG", 10);
        job.restart = true;

        assert_eq!(Resizer::new().process(&job).outcome, JobOutcome::Resized);
        let written = std::fs::read(&job.output).unwrap();
        assert_ne!(written, b"previous bytes");
        let out = image::load_from_memory(&written).unwrap();
        assert_eq!((out.width(), out.height()), (10, 5));
    }

    #[test]
    fn test_degenerate_target_is_unknown_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("strip.JPG"), jpeg_bytes(300, 2)).unwrap();

        // 2 / 300 * 100 truncates to zero rows
        let job = job(&dir, "strip.JPG", 100);
        let result = Resizer::new().process(&job);

        assert_eq!(result.outcome, JobOutcome::UnknownError);
        assert_eq!(result.message, format!("Unknown Error for file: {}", job.input.display()));
    }

    #[test]
    fn test_missing_output_directory_is_unknown_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.JPG"), jpeg_bytes(40, 20)).unwrap();

        let mut job = job(&dir, "a.JPG", 10);
        job.output = dir.path().join("not").join("created").join("a.JPG");

        assert_eq!(Resizer::new().process(&job).outcome, JobOutcome::UnknownError);
    }

    #[test]
    fn test_input_is_never_modified() {
        let dir = TempDir::new().unwrap();
        let original = jpeg_bytes(80, 60);
        std::fs::write(dir.path().join("keep.JPG"), &original).unwrap();

        let job = job(&dir, "keep.JPG", 20);
        assert_eq!(Resizer::new().process(&job).outcome, JobOutcome::Resized);
        assert_eq!(std::fs::read(&job.input).unwrap(), original);
    }

    #[test]
    fn test_orientation_is_normalized() {
        use crate::processing::metadata::tests::tiff_with_orientation;
        use ::exif::{In, Tag};

        let dir = TempDir::new().unwrap();
        let source = metadata::embed(&jpeg_bytes(60, 30), &tiff_with_orientation(6, false)).unwrap();
        std::fs::write(dir.path().join("rotated.JPG"), source).unwrap();

        let job = job(&dir, "rotated.JPG", 20);
        assert_eq!(Resizer::new().process(&job).outcome, JobOutcome::Resized);

        let written = std::fs::read(&job.output).unwrap();
        let exif = metadata::read_source_exif(&written).unwrap().unwrap();
        let orientation = exif.get_field(Tag::Orientation, In::PRIMARY).unwrap();
        assert_eq!(orientation.value.get_uint(0), Some(1));

        let out = image::load_from_memory(&written).unwrap();
        assert_eq!((out.width(), out.height()), (20, 10));
    }

    #[test]
    fn test_source_without_exif_produces_output_without_exif() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("plain.JPG"), jpeg_bytes(30, 30)).unwrap();

        let job = job(&dir, "plain.JPG", 10);
        assert_eq!(Resizer::new().process(&job).outcome, JobOutcome::Resized);

        let written = std::fs::read(&job.output).unwrap();
        assert!(metadata::read_source_exif(&written).unwrap().is_none());
    }

    #[test]
    fn test_malformed_exif_is_attribute_error() {
        let dir = TempDir::new().unwrap();
        let source = metadata::embed(&jpeg_bytes(30, 30), b"XXXXXXXX").unwrap();
        std::fs::write(dir.path().join("badexif.JPG"), source).unwrap();

        let job = job(&dir, "badexif.JPG", 10);
        assert_eq!(Resizer::new().process(&job).outcome, JobOutcome::DecodeAttributeError);
        assert!(!job.output.exists());
    }

    #[test]
    fn test_outcome_failure_flags() {
        assert!(!JobOutcome::Resized.is_failure());
        assert!(!JobOutcome::SkippedExisting.is_failure());
        assert!(JobOutcome::SourceBroken.is_failure());
        assert!(JobOutcome::DecodeAttributeError.is_failure());
        assert!(JobOutcome::UnknownError.is_failure());
    }
}
