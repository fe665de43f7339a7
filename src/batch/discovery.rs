//! Source discovery and output path mirroring

use std::path::{Path, PathBuf};

use globset::Glob;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{ResizeError, Result};

/// Recursively collect files under `root` whose name matches `pattern`
///
/// Hidden entries below the root are neither matched nor descended into.
/// The result is sorted so submission order is reproducible.
pub fn discover_sources(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = Glob::new(pattern)?.compile_matcher();
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() > 0 => {
                warn!("Skipping unreadable entry: {}", err);
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        if entry.depth() > 0 && entry.path().is_file() && matcher.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!("Found {} files matching {:?} under {:?}", files.len(), pattern, root);

    Ok(files)
}

/// Path of `source` re-rooted from `input_root` to `output_root`
pub fn mirror_path(source: &Path, input_root: &Path, output_root: &Path) -> Result<PathBuf> {
    let relative = source.strip_prefix(input_root).map_err(|_| {
        ResizeError::invalid_config(format!(
            "{} is not inside {}",
            source.display(),
            input_root.display()
        ))
    })?;

    Ok(output_root.join(relative))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map_or(false, |name| name.starts_with('.'))
}
