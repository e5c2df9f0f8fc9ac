//! Integration tests for the layered configuration

use locus_core::config::{ServiceConfig, StorageKind};
use std::fs;
use tempfile::TempDir;

#[test]
fn defaults_match_the_documented_knobs() {
    let config = ServiceConfig::default();

    assert_eq!(config.storage.kind, StorageKind::Local);
    assert_eq!(config.query.default_srid, 4326);
    assert_eq!(config.query.max_features, 1000);
    assert!(!config.query.with_geometry);
    assert_eq!(config.sync.cooldown_secs, 30);
    assert!(!config.sync.enabled);
    assert_eq!(config.watcher.debounce_ms, 500);
    assert_eq!(config.storage.http.index_file, "index.txt");
    assert_eq!(config.download.timeout_secs, 300);
}

#[test]
fn file_values_layer_over_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("locus.toml");
    fs::write(
        &path,
        r#"
[storage]
type = "http"
cache_dir = "/var/cache/locus"

[storage.http]
base_url = "https://data.example.org/packages/"

[query]
max_features = 250

[sync]
enabled = true
interval_secs = 60
"#,
    )
    .unwrap();

    let config = ServiceConfig::load_from_file(&path).unwrap();

    assert_eq!(config.storage.kind, StorageKind::Http);
    assert_eq!(
        config.storage.http.base_url,
        "https://data.example.org/packages/"
    );
    // untouched sections keep their defaults
    assert_eq!(config.storage.http.index_file, "index.txt");
    assert_eq!(config.query.max_features, 250);
    assert_eq!(config.query.default_srid, 4326);
    assert!(config.sync.enabled);
    assert_eq!(config.sync.interval_secs, 60);
}

#[test]
fn malformed_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "storage = not toml at all [").unwrap();

    assert!(ServiceConfig::load_from_file(&path).is_err());
}

#[test]
fn validation_requires_backend_settings() {
    let mut config = ServiceConfig::default();
    assert!(config.validate().is_ok());

    config.storage.kind = StorageKind::Http;
    assert!(config.validate().is_err());

    config.storage.http.base_url = "https://data.example.org/".to_string();
    assert!(config.validate().is_ok());

    config.storage.kind = StorageKind::S3;
    assert!(config.validate().is_err());
    config.storage.s3.bucket = "packages".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn storage_kind_parsing() {
    assert_eq!(StorageKind::parse("local").unwrap(), StorageKind::Local);
    assert_eq!(StorageKind::parse("S3").unwrap(), StorageKind::S3);
    assert_eq!(StorageKind::parse(" azure ").unwrap(), StorageKind::Azure);
    assert!(StorageKind::parse("ftp").is_err());
}
