use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{BatchError, Result};

/// Whether `path` ends in `.extension`, ignoring ASCII case
pub fn matches_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Every file under `folder`, at any depth, whose extension matches
///
/// Results are sorted by path. Unreadable entries are logged and skipped.
pub fn discover_videos(folder: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(BatchError::InputNotFound {
            path: folder.display().to_string(),
        }
        .into());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", folder.display(), e);
                continue;
            }
        };

        if entry.file_type().is_file() && matches_extension(entry.path(), extension) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!("Found {} .{} files under {}", files.len(), extension, folder.display());
    Ok(files)
}

/// Where the transformed copy of `input` goes
///
/// By default the file lands directly in `output_root` under its own name.
/// With `preserve_structure` its path relative to `input_root` is kept.
pub fn output_path_for(
    input: &Path,
    input_root: &Path,
    output_root: &Path,
    preserve_structure: bool,
) -> PathBuf {
    if preserve_structure {
        if let Ok(relative) = input.strip_prefix(input_root) {
            return output_root.join(relative);
        }
    }

    match input.file_name() {
        Some(name) => output_root.join(name),
        None => output_root.join(input),
    }
}

/// Basenames shared by more than one input, with the inputs sharing them
pub fn basename_collisions(inputs: &[PathBuf]) -> Vec<(OsString, Vec<PathBuf>)> {
    let mut by_name: HashMap<OsString, Vec<PathBuf>> = HashMap::new();
    for input in inputs {
        if let Some(name) = input.file_name() {
            by_name.entry(name.to_os_string()).or_default().push(input.clone());
        }
    }

    let mut collisions: Vec<_> = by_name
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .collect();
    collisions.sort();
    collisions
}
