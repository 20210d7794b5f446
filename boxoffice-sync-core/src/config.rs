use chrono::FixedOffset;
use std::path::PathBuf;
use tracing::{debug, info};

/// Directory the scraper writes its daily snapshots into.
pub const DEFAULT_INPUT_DIR: &str = "Nepal Boxoffice";

/// File-name pattern of the detailed snapshot artifacts (`*_Detailed.json`).
pub const DEFAULT_FILE_PATTERN: &str = r"_Detailed\.json$";

/// Offset used for every `synced_at` timestamp (UTC+05:30).
pub const SYNC_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// The fixed UTC+05:30 offset.
pub fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(SYNC_OFFSET_SECONDS).expect("UTC+05:30 is within chrono's offset range")
}

/// Everything a single sync run needs to know that is not the store itself.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Where snapshot artifacts are looked up.
    pub input_dir: PathBuf,
    /// Regular expression matched against file names in `input_dir`.
    pub file_pattern: String,
    /// Offset `synced_at` is expressed in.
    pub utc_offset: FixedOffset,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            utc_offset: default_offset(),
        }
    }
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            input_dir = %self.input_dir.display(),
            file_pattern = %self.file_pattern,
            utc_offset = %self.utc_offset,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}
