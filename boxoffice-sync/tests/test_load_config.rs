use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use boxoffice_sync::load_config::load_config;

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

/// A full YAML file plus the required env var produces fully merged settings.
#[test]
#[serial]
fn test_load_config_success_merges_yaml_and_env() {
    let file = config_file(
        r#"
input:
  dir: ./tmp/boxoffice
  pattern: "_Detailed\\.json$"
store:
  database: analytics
  collection: nepal_detailed_staging
"#,
    );
    env::set_var("MONGODB_URI", "mongodb://localhost:27017");
    env::remove_var("MONGODB_DATABASE");

    let config = load_config(Some(file.path())).expect("Config should load");

    assert_eq!(config.sync.input_dir, PathBuf::from("./tmp/boxoffice"));
    assert_eq!(config.sync.file_pattern, r"_Detailed\.json$");
    assert_eq!(config.sync.utc_offset.to_string(), "+05:30");
    assert_eq!(config.store.uri, "mongodb://localhost:27017");
    assert_eq!(config.store.database, "analytics");
    assert_eq!(config.store.collection, "nepal_detailed_staging");
}

/// Without a file every setting falls back to its default.
#[test]
#[serial]
fn test_load_config_defaults_without_file() {
    env::set_var("MONGODB_URI", "mongodb://localhost:27017");
    env::remove_var("MONGODB_DATABASE");

    let config = load_config(None).expect("Config should load");

    assert_eq!(config.sync.input_dir, PathBuf::from("Nepal Boxoffice"));
    assert_eq!(config.sync.utc_offset.to_string(), "+05:30");
    assert_eq!(config.store.database, "movie-blog");
    assert_eq!(config.store.collection, "nepal_detailed");
}

/// MONGODB_DATABASE wins over the YAML database.
#[test]
#[serial]
fn test_load_config_database_env_overrides_yaml() {
    let file = config_file("store:\n  database: from-yaml\n");
    env::set_var("MONGODB_URI", "mongodb://localhost:27017");
    env::set_var("MONGODB_DATABASE", "from-env");

    let config = load_config(Some(file.path())).expect("Config should load");
    assert_eq!(config.store.database, "from-env");

    env::remove_var("MONGODB_DATABASE");
}

/// Missing connection string is a fatal startup error.
#[test]
#[serial]
fn test_load_config_errors_on_missing_uri() {
    env::remove_var("MONGODB_URI");

    let err = load_config(None).unwrap_err();
    assert!(
        err.to_string().contains("MONGODB_URI"),
        "Must error for missing env var, got: {err}"
    );
}

#[test]
#[serial]
fn test_load_config_errors_on_empty_uri() {
    env::set_var("MONGODB_URI", "  ");

    let err = load_config(None).unwrap_err();
    assert!(err.to_string().contains("MONGODB_URI"), "got: {err}");

    env::remove_var("MONGODB_URI");
}

/// If the config file is not valid YAML, load_config reports it as such.
#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    let file = config_file("not-yaml: [:::");
    env::set_var("MONGODB_URI", "mongodb://localhost:27017");

    let err = load_config(Some(file.path())).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_load_config_rejects_unknown_keys() {
    let file = config_file("store:\n  collecton: typo\n");
    env::set_var("MONGODB_URI", "mongodb://localhost:27017");

    assert!(load_config(Some(file.path())).is_err());
}

#[test]
#[serial]
fn test_load_config_offset_cannot_be_overridden() {
    let file = config_file("timezone: \"+05:45\"\n");
    env::set_var("MONGODB_URI", "mongodb://localhost:27017");

    let err = load_config(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("timezone"), "got: {err}");
}

#[test]
#[serial]
fn test_load_config_errors_for_missing_file() {
    env::set_var("MONGODB_URI", "mongodb://localhost:27017");

    let err = load_config(Some(std::path::Path::new("does-not-exist.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"), "got: {err}");
}
