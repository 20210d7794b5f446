//! High-level pipeline: orchestrates locate → load → transform → persist → index.
//!
//! One call to [`SyncEngine::synchronise`] is one sync attempt for the newest
//! snapshot in the configured input directory. The attempt walks the stages
//! of [`SyncStage`] strictly in order and stops at the first failing stage.
//!
//! # Idempotency
//! The persisted document's id is derived from the snapshot date only
//! (`nepal_<YYYYMMDD>`), and persisting is a single replace-with-upsert. Re-running
//! a sync for the same date converges on one document holding the latest data.
//!
//! # Error Handling
//! Every failure is returned as a [`SyncFailure`]; nothing escapes the engine as
//! a panic or an untyped error. Index failures are downgraded to warnings inside
//! the [`SyncReport`] and never fail a run whose document was persisted.
//!
//! # Resources
//! The engine borrows its [`DocumentStore`]; the caller acquires and closes the
//! underlying connection. `synchronise` returns a value on every path.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::contract::{Clock, DocumentStore, StoreError, SystemClock, UpsertOutcome};
use crate::indexes::{ensure_indexes, IndexReport};
use crate::locate::{find_latest_snapshot, LocateError};
use crate::snapshot::{load_snapshot, LoadError};
use crate::transform::{build_document, TransformError};

/// Stages of a single sync attempt, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Idle,
    Locating,
    Loading,
    TransformValidating,
    Persisting,
    IndexBuilding,
    Done,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why a sync attempt did not persist anything.
#[derive(Debug, Error)]
pub enum SyncFailure {
    #[error("no snapshot to sync: {0}")]
    NoInput(#[from] LocateError),
    #[error("could not load snapshot: {0}")]
    Load(#[from] LoadError),
    #[error("snapshot {} contains no shows", .0.display())]
    NoShows(PathBuf),
    #[error("snapshot {} rejected: {source}", .path.display())]
    InvalidDate {
        path: PathBuf,
        #[source]
        source: TransformError,
    },
    #[error("failed to persist {document_id}: {source}")]
    Persist {
        document_id: String,
        #[source]
        source: StoreError,
    },
}

impl SyncFailure {
    /// The stage the run was in when it failed.
    pub fn stage(&self) -> SyncStage {
        match self {
            SyncFailure::NoInput(_) => SyncStage::Locating,
            SyncFailure::Load(_) | SyncFailure::NoShows(_) => SyncStage::Loading,
            SyncFailure::InvalidDate { .. } => SyncStage::TransformValidating,
            SyncFailure::Persist { .. } => SyncStage::Persisting,
        }
    }
}

/// What a successful run did.
#[derive(Debug)]
pub struct SyncReport {
    pub source: PathBuf,
    pub document_id: String,
    pub date: String,
    pub total_shows: i64,
    pub total_movies: i64,
    pub upsert: UpsertOutcome,
    pub indexes: IndexReport,
}

pub struct SyncEngine<'a, S: ?Sized, C = SystemClock> {
    config: SyncConfig,
    store: &'a S,
    clock: C,
}

impl<'a, S> SyncEngine<'a, S, SystemClock>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(config: SyncConfig, store: &'a S) -> Self {
        Self {
            config,
            store,
            clock: SystemClock,
        }
    }
}

impl<'a, S, C> SyncEngine<'a, S, C>
where
    S: DocumentStore + ?Sized,
    C: Clock,
{
    /// Replaces the clock `synced_at` is read from.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> SyncEngine<'a, S, C2> {
        SyncEngine {
            config: self.config,
            store: self.store,
            clock,
        }
    }

    /// Runs one sync attempt end to end.
    pub async fn synchronise(&self) -> Result<SyncReport, SyncFailure> {
        info!(stage = %SyncStage::Idle, "[SYNC] Starting sync run");
        let result = self.run_stages().await;
        match &result {
            Ok(report) => info!(
                stage = %SyncStage::Done,
                document_id = %report.document_id,
                upsert = ?report.upsert,
                total_shows = report.total_shows,
                total_movies = report.total_movies,
                "[SYNC] Sync completed"
            ),
            Err(e) => error!(stage = %e.stage(), error = %e, "[SYNC][ERROR] Sync failed"),
        }
        result
    }

    /// Ensures the query indexes without syncing anything.
    pub async fn ensure_indexes(&self) -> IndexReport {
        ensure_indexes(self.store).await
    }

    async fn run_stages(&self) -> Result<SyncReport, SyncFailure> {
        info!(stage = %SyncStage::Locating, "[SYNC] Locating latest snapshot");
        let source = find_latest_snapshot(&self.config.input_dir, &self.config.file_pattern)?;

        info!(stage = %SyncStage::Loading, path = %source.display(), "[SYNC] Loading snapshot");
        let snapshot = load_snapshot(&source)?;
        if snapshot.shows.is_empty() {
            warn!(path = %source.display(), "[SYNC] No shows in snapshot");
            return Err(SyncFailure::NoShows(source));
        }

        info!(stage = %SyncStage::TransformValidating, shows = snapshot.shows.len(), "[SYNC] Building document");
        let synced_at = self.clock.now().with_timezone(&self.config.utc_offset);
        let document = match build_document(&snapshot, synced_at) {
            Ok(document) => document,
            Err(err) => {
                return Err(SyncFailure::InvalidDate {
                    path: source,
                    source: err,
                })
            }
        };

        info!(
            stage = %SyncStage::Persisting,
            document_id = %document.id,
            total_shows = document.total_shows,
            total_movies = document.total_movies,
            "[SYNC] Upserting document"
        );
        let upsert = self
            .store
            .replace_document(&document)
            .await
            .map_err(|e| SyncFailure::Persist {
                document_id: document.id.clone(),
                source: e,
            })?;
        info!(document_id = %document.id, upsert = ?upsert, "[SYNC] Document persisted");

        info!(stage = %SyncStage::IndexBuilding, "[SYNC] Ensuring indexes");
        let indexes = ensure_indexes(self.store).await;

        Ok(SyncReport {
            source,
            document_id: document.id,
            date: document.date,
            total_shows: document.total_shows,
            total_movies: document.total_movies,
            upsert,
            indexes,
        })
    }
}
