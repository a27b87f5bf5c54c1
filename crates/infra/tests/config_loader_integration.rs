//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;

use leadflow_domain::{LeadFlowError, StorageBackend};
use leadflow_infra::config;
use tempfile::{Builder, NamedTempFile};

fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    file
}

#[test]
fn test_load_config_from_json_file() {
    let file = config_file(
        ".json",
        r#"{
            "api": {
                "base_url": "https://leads.example.com",
                "timeout_secs": 10,
                "email": "ops@example.com"
            },
            "storage": {
                "backend": "file",
                "path": "/var/lib/leadflow",
                "max_batches": 50
            },
            "logging": {
                "level": "debug",
                "json": true
            }
        }"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf())).unwrap();

    assert_eq!(config.api.base_url, "https://leads.example.com");
    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.api.max_attempts, 3);
    assert_eq!(config.api.email.as_deref(), Some("ops@example.com"));
    assert_eq!(config.storage.backend, StorageBackend::File);
    assert_eq!(config.storage.max_batches, 50);
    assert!(config.logging.json);
}

#[test]
fn test_load_config_from_toml_file() {
    let file = config_file(
        ".toml",
        r#"
[api]
base_url = "http://127.0.0.1:8000"

[storage]
backend = "memory"
"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf())).unwrap();

    assert_eq!(config.api.base_url, "http://127.0.0.1:8000");
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.storage.max_batches, 20);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_invalid_toml_is_a_config_error() {
    let file = config_file(".toml", "[api\nbase_url = ");

    let err = config::load_from_file(Some(file.path().to_path_buf())).unwrap_err();
    assert!(matches!(err, LeadFlowError::Config(msg) if msg.contains("TOML")));
}

#[test]
fn test_missing_file_is_a_config_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = config::load_from_file(Some(dir.path().join("absent.json"))).unwrap_err();
    assert!(matches!(err, LeadFlowError::Config(msg) if msg.contains("not found")));
}
