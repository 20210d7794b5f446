//! Finds the newest snapshot artifact in the input directory.
//!
//! Recency is decided by file name alone: the scraper embeds a sortable date
//! in every name, so the lexicographically greatest match is the newest.
//! Modification times are never consulted.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

/// Why no snapshot could be located. All variants mean "nothing to sync".
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("input directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("no files matching `{pattern}` in {}", .dir.display())]
    NoMatches { dir: PathBuf, pattern: String },
    #[error("failed to read input directory {}: {source}", .dir.display())]
    Io {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid file pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Returns the path of the newest file in `dir` whose name matches `pattern`.
pub fn find_latest_snapshot(dir: &Path, pattern: &str) -> Result<PathBuf, LocateError> {
    info!(dir = %dir.display(), pattern, "[LOCATE] Searching for latest snapshot");

    let matcher = Regex::new(pattern).map_err(|source| LocateError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    if !dir.is_dir() {
        error!(dir = %dir.display(), "[LOCATE] Input directory not found");
        return Err(LocateError::MissingDirectory(dir.to_path_buf()));
    }

    let io_err = |source: std::io::Error| LocateError::Io {
        dir: dir.to_path_buf(),
        source,
    };

    let mut latest: Option<(String, PathBuf)> = None;
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !matcher.is_match(&name) {
            continue;
        }
        debug!(file = %name, "[LOCATE] Candidate snapshot");
        if latest.as_ref().map_or(true, |(best, _)| name > *best) {
            latest = Some((name, entry.path()));
        }
    }

    match latest {
        Some((name, path)) => {
            info!(file = %name, "[LOCATE] Found latest snapshot");
            Ok(path)
        }
        None => {
            error!(dir = %dir.display(), pattern, "[LOCATE] No snapshot files found");
            Err(LocateError::NoMatches {
                dir: dir.to_path_buf(),
                pattern: pattern.to_string(),
            })
        }
    }
}
