//! Decoding of the scraper's JSON snapshot.
//!
//! The loader only decodes. Every field is optional at this level so that a
//! snapshot with gaps still loads; filling defaults and rejecting unusable
//! snapshots happens in [`crate::transform`] and [`crate::synchronise`].

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

/// One JSON artifact describing all shows for a single date.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Snapshot {
    /// `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(rename = "lastUpdated", default, deserialize_with = "null_as_default")]
    pub last_updated: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shows: Vec<Show>,
}

/// One scheduled screening as the scraper reported it.
///
/// Fields are raw JSON values of any type. Exports disagree on types (ids as
/// strings or numbers, counts as integers or floats, `skipped` as a bool or
/// `0`/`1`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Show {
    #[serde(default)]
    pub show_id: Option<Value>,
    #[serde(default)]
    pub movie_id: Option<Value>,
    #[serde(default)]
    pub movie_name: Option<Value>,
    #[serde(default)]
    pub venue: Option<Value>,
    #[serde(default)]
    pub theatre: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub time: Option<Value>,
    #[serde(default)]
    pub seats: Option<Value>,
    #[serde(default)]
    pub sold: Option<Value>,
    #[serde(default)]
    pub reserved: Option<Value>,
    #[serde(default)]
    pub available: Option<Value>,
    #[serde(default)]
    pub gross: Option<Value>,
    #[serde(default)]
    pub occupancy_percent: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub skipped: Option<Value>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("snapshot file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read snapshot {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshot {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads and decodes the snapshot at `path`.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| {
        error!(error = ?source, path = %path.display(), "[LOAD] Failed to read snapshot");
        match source.kind() {
            ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    })?;

    let snapshot: Snapshot = serde_json::from_str(&content).map_err(|source| {
        error!(error = %source, path = %path.display(), "[LOAD] Snapshot could not be decoded");
        LoadError::Malformed {
            path: path.to_path_buf(),
            source,
        }
    })?;

    info!(
        path = %path.display(),
        date = %snapshot.date,
        shows = snapshot.shows.len(),
        "[LOAD] Snapshot decoded"
    );
    Ok(snapshot)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
