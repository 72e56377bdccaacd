//! Tests for ClientConfig TOML loading.

use std::fs;
use std::time::Duration;
use tempfile::TempDir;

use remote_explorer::ClientConfig;

/// Writes a config file into the temporary directory and returns its path.
fn write_config(dir: &TempDir, filename: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(filename);
    fs::write(&path, content).expect("Failed to write TOML");
    path
}

#[test]
fn test_load_full_config() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "explorer.toml",
        r#"server_url = "http://game.local:8080/"
username = "Example"
timeout_secs = 3
"#,
    );

    let config = ClientConfig::from_file(&path).expect("Load failed");
    assert_eq!(config.server_url(), "http://game.local:8080/");
    assert_eq!(config.username(), "Example");
    assert_eq!(config.timeout(), Duration::from_secs(3));
}

#[test]
fn test_missing_keys_take_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&dir, "partial.toml", "username = \"Solo\"\n");

    let config = ClientConfig::from_file(&path).expect("Load failed");
    assert_eq!(config.username(), "Solo");
    assert_eq!(config.server_url(), "http://127.0.0.1:8080");
    assert_eq!(*config.timeout_secs(), 10);
}

#[test]
fn test_invalid_toml_is_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&dir, "bad.toml", "this is not valid toml !!!@@@");

    let err = ClientConfig::from_file(&path).unwrap_err();
    assert!(err.message.starts_with("Failed to parse config"));
}

#[test]
fn test_missing_file_is_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");

    let err = ClientConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.message.starts_with("Failed to read config file"));
}

#[test]
fn test_wrong_type_is_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&dir, "typed.toml", "timeout_secs = \"soon\"\n");

    assert!(ClientConfig::from_file(&path).is_err());
}
