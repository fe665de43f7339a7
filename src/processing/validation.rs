//! Source file validation

use std::path::Path;

use tracing::debug;

use crate::error::JobError;

/// Check that the source exists, is a regular file and is not empty
pub fn check_source(path: &Path) -> Result<u64, JobError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| JobError::broken(format!("cannot access file: {e}")))?;

    if !metadata.is_file() {
        return Err(JobError::broken("path is not a regular file"));
    }

    let file_size = metadata.len();
    if file_size == 0 {
        return Err(JobError::broken("file is empty"));
    }

    Ok(file_size)
}

/// Read the whole source and make sure it at least looks like an image
pub fn read_source(path: &Path) -> Result<Vec<u8>, JobError> {
    let data = std::fs::read(path).map_err(|e| JobError::broken(format!("cannot read file: {e}")))?;

    if data.is_empty() {
        return Err(JobError::broken("file is empty"));
    }

    match infer::get(&data) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
            debug!("{:?} sniffed as {}", path, kind.mime_type());
            Ok(data)
        }
        Some(kind) => Err(JobError::broken(format!(
            "content is {}, not an image",
            kind.mime_type()
        ))),
        None => Err(JobError::broken("content is not a recognizable image")),
    }
}
