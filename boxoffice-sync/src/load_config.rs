/// `load_config` module: merges the optional YAML config file with environment
/// secrets into the settings the CLI needs.
///
/// This module is the only place where untrusted YAML and environment values are
/// parsed and mapped to strongly-typed structs.
///
/// # Responsibilities
/// - Parse the optional YAML file (`input` and `store` sections; every key optional)
/// - Inject `MONGODB_URI` (required) and `MONGODB_DATABASE` (optional override) from the environment
/// - Fill defaults for everything not given
///
/// # Errors
/// All errors use `anyhow::Error` and abort the process before any sync work starts.
///
/// Accepted YAML:
///
/// ```yaml
/// input:
///   dir: "Nepal Boxoffice"
///   pattern: "_Detailed\\.json$"
/// store:
///   database: movie-blog
///   collection: nepal_detailed
/// ```
///
/// `synced_at` is always stamped in UTC+05:30; there is no key for it.
use anyhow::{bail, Result};
use boxoffice_sync_core::config::SyncConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const MONGODB_URI_VAR: &str = "MONGODB_URI";
pub const MONGODB_DATABASE_VAR: &str = "MONGODB_DATABASE";
pub const DEFAULT_DATABASE: &str = "movie-blog";
pub const DEFAULT_COLLECTION: &str = "nepal_detailed";

/// Where and how to reach the document store.
#[derive(Clone)]
pub struct StoreSettings {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl std::fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The URI usually embeds credentials.
        f.debug_struct("StoreSettings")
            .field("uri", &"<redacted>")
            .field("database", &self.database)
            .field("collection", &self.collection)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub sync: SyncConfig,
    pub store: StoreSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    input: InputSection,
    store: StoreSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct InputSection {
    dir: Option<PathBuf>,
    pattern: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StoreSection {
    database: Option<String>,
    collection: Option<String>,
}

/// Loads the YAML file at `path` (if any) and injects required env vars.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let raw = match path {
        Some(path) => read_raw_config(path)?,
        None => {
            info!("No config file given, using defaults");
            RawConfig::default()
        }
    };

    let uri = match std::env::var(MONGODB_URI_VAR) {
        Ok(uri) if !uri.trim().is_empty() => {
            info!("MONGODB_URI found in env");
            uri
        }
        Ok(_) => {
            error!("MONGODB_URI environment variable is empty");
            bail!("MONGODB_URI environment variable is empty");
        }
        Err(e) => {
            error!(error = ?e, "MONGODB_URI environment variable not set");
            bail!("MONGODB_URI environment variable not set: {e}");
        }
    };

    let database = std::env::var(MONGODB_DATABASE_VAR)
        .ok()
        .filter(|db| !db.trim().is_empty())
        .or(raw.store.database)
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

    let defaults = SyncConfig::default();
    let sync = SyncConfig {
        input_dir: raw.input.dir.unwrap_or(defaults.input_dir),
        file_pattern: raw.input.pattern.unwrap_or(defaults.file_pattern),
        utc_offset: defaults.utc_offset,
    };
    let store = StoreSettings {
        uri,
        database,
        collection: raw
            .store
            .collection
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
    };

    info!(
        database = %store.database,
        collection = %store.collection,
        input_dir = %sync.input_dir.display(),
        "Config loaded and merged successfully"
    );
    Ok(CliConfig { sync, store })
}

fn read_raw_config(path: &Path) -> Result<RawConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path, e)
    })?;

    // An empty file is a valid "all defaults" config.
    if content.trim().is_empty() {
        return Ok(RawConfig::default());
    }

    serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })
}
