use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("boxoffice-sync").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sync").and(predicate::str::contains("indexes")));
}

#[test]
fn sync_cli_fails_without_mongodb_uri() {
    // Empty working directory so no .env is picked up.
    let workdir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("boxoffice-sync").expect("Binary exists");

    cmd.current_dir(workdir.path())
        .env_remove("MONGODB_URI")
        .arg("sync");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("MONGODB_URI"));
}

#[test]
fn sync_cli_fails_for_unreadable_config() {
    let workdir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("boxoffice-sync").expect("Binary exists");

    cmd.current_dir(workdir.path())
        .env("MONGODB_URI", "mongodb://localhost:27017")
        .arg("sync")
        .arg("--config")
        .arg("missing.yaml");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use boxoffice_sync::cli::{run, Cli, Commands};

    // A config path that does not exist: run fails at config loading,
    // after the initial event.
    let cli = Cli {
        command: Commands::Sync {
            config: Some(std::path::PathBuf::from("dummy.yaml")),
            input_dir: None,
        },
    };

    let result = run(cli).await;
    assert!(result.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}

#[tokio::test]
async fn store_is_closed_when_work_panics() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use boxoffice_sync::cli::with_store;
    use boxoffice_sync::load_config::StoreSettings;

    // The driver connects lazily, so no server is needed.
    let settings = StoreSettings {
        uri: "mongodb://localhost:27017".into(),
        database: "movie-blog".into(),
        collection: "nepal_detailed".into(),
    };

    let result = with_store(&settings, |_store| async move {
        panic!("engine blew up");
    })
    .await;
    let err: anyhow::Error = match result {
        Ok(()) => panic!("a panicking run must not succeed"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("panicked"), "got: {err}");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("MongoDB connection closed")),
        "Expected the store to be closed, got: {:?}",
        event_msgs
    );
}

