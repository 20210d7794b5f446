///
/// This module implements the CLI interface for boxoffice-sync: command
/// parsing, configuration loading, store lifetime, and turning the sync
/// outcome into a process result.
///
/// All pipeline logic (locating, loading, transforming, upserting, indexing)
/// lives in the [`boxoffice-sync-core`] crate. This module is strictly glue.
///
/// ## Store lifetime
/// The MongoDB client is opened once per invocation by [`with_store`], lent to
/// the engine, and closed exactly once after the work finishes, whatever the
/// outcome, including a panic inside the engine.
///
/// [`boxoffice-sync-core`]: ../../boxoffice-sync-core/
use crate::load_config::load_config;
use crate::store::MongoStore;
use crate::load_config::StoreSettings;
use anyhow::Result;
use boxoffice_sync_core::synchronise::{SyncEngine, SyncReport};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for boxoffice-sync: persist the latest box-office snapshot as one document per date.
#[derive(Parser)]
#[clap(
    name = "boxoffice-sync",
    version,
    about = "Sync the latest Nepal box-office snapshot into MongoDB"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync the newest snapshot in the input directory and ensure indexes
    Sync {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Overrides the directory snapshots are read from
        #[clap(long)]
        input_dir: Option<PathBuf>,
    },
    /// Only ensure the query indexes on the target collection
    Indexes {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config, input_dir } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = input_dir {
                config.sync.input_dir = dir;
            }
            config.sync.trace_loaded();

            let sync = config.sync;
            let outcome = with_store(&config.store, move |store| async move {
                tracing::info!(command = "sync", "Starting synchronisation");
                SyncEngine::new(sync, &*store).synchronise().await
            })
            .await?;

            match outcome {
                Ok(report) => {
                    print_report(&report);
                    tracing::info!(command = "sync", document_id = %report.document_id, "Synchronisation complete");
                    Ok(())
                }
                Err(e) => {
                    println!("Sync failed at {}: {}", e.stage(), e);
                    tracing::error!(command = "sync", stage = %e.stage(), error = %e, "Synchronisation failed");
                    Err(anyhow::Error::new(e).context("Sync failed"))
                }
            }
        }
        Commands::Indexes { config } => {
            let config = load_config(config.as_deref())?;
            let sync = config.sync;
            let report = with_store(&config.store, move |store| async move {
                SyncEngine::new(sync, &*store).ensure_indexes().await
            })
            .await?;

            println!(
                "Indexes ensured on {}: {}/{}",
                config.store.collection,
                report.ensured.len(),
                report.ensured.len() + report.warnings.len()
            );
            for warning in &report.warnings {
                println!("  warning: {} ({})", warning.index, warning.message);
            }
            Ok(())
        }
    }
}

/// Opens the store, runs `work` with it on its own task, then closes the store.
///
/// `close` is reached on every path once the connection is open. A panic in
/// `work` surfaces as an error after the store is closed.
pub async fn with_store<T, F, Fut>(settings: &StoreSettings, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(Arc<MongoStore>) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let store = MongoStore::connect(settings)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to MongoDB: {e}"))?;
    let store = Arc::new(store);

    let joined = tokio::spawn(work(Arc::clone(&store))).await;

    // The task's handle is gone once it has been joined.
    match Arc::try_unwrap(store) {
        Ok(store) => store.close().await,
        Err(_) => tracing::warn!("Store still shared after work finished, not closing"),
    }

    joined.map_err(|e| {
        tracing::error!(error = %e, "Store work aborted");
        anyhow::anyhow!("Store work aborted: {e}")
    })
}

fn print_report(report: &SyncReport) {
    println!("Synchronise complete.");
    println!("  source:       {}", report.source.display());
    println!("  document:     {} ({:?})", report.document_id, report.upsert);
    println!("  total shows:  {}", report.total_shows);
    println!("  total movies: {}", report.total_movies);
    println!(
        "  indexes:      {} ensured, {} warnings",
        report.indexes.ensured.len(),
        report.indexes.warnings.len()
    );
}
