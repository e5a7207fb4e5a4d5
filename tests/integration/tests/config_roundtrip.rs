//! Config save/load roundtrip integration tests.
//!
//! These tests verify that configuration can be serialized, written to disk,
//! and loaded back with identical field values.

use ksm_core::config::{Config, LogLevel, StoreBackend};
use ksm_core::{ConfigError, SecretString};
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ksm.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.server.port, config.server.port);
    assert_eq!(loaded.server.host, config.server.host);
    assert_eq!(loaded.store.backend, config.store.backend);
    assert_eq!(loaded.store.timeout_secs, config.store.timeout_secs);
    assert_eq!(loaded.manager.default_namespace, "default");
    assert_eq!(loaded.manager.default_kind, "Opaque");
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ksm.json5");

    let mut config = Config::default();
    config.server.port = 9090;
    config.store.backend = StoreBackend::Memory;
    config.store.token = Some(SecretString::new("t0ken"));
    config.logging.level = LogLevel::Debug;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.server.port, 9090);
    assert_eq!(loaded.store.backend, StoreBackend::Memory);
    assert_eq!(loaded.store.token.unwrap().expose_secret(), "t0ken");
    assert_eq!(loaded.logging.level, LogLevel::Debug);
}

#[test]
fn test_config_save_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("ksm.json5");

    Config::default().save(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/ksm.json5"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_config_resolve_missing_explicit_path() {
    let result = Config::resolve(Some(Path::new("/nonexistent/ksm.json5")));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_config_parse_invalid() {
    let result = Config::parse("not valid json");
    assert!(result.is_err());
}

#[test]
fn test_config_parse_json5_comments() {
    let config = Config::parse(
        r#"{
  // hand-written
  server: { port: 7000, cors: false },
  store: { backend: 'memory' },
}"#,
    )
    .unwrap();
    assert_eq!(config.server.port, 7000);
    assert!(!config.server.cors);
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_default_validates() {
    assert!(Config::default().validate().is_ok());

    let mut config = Config::default();
    config.store.api_server = Some("https://10.0.0.1:6443".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_in_cluster_excludes_kubeconfig() {
    let mut config = Config::default();
    config.store.in_cluster = true;
    config.store.kubeconfig = Some("/etc/ksm/kubeconfig".into());
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("kubeconfig"));
}

#[test]
fn test_config_kubeconfig_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ksm.json5");

    let mut config = Config::default();
    config.store.kubeconfig = Some(dir.path().join("kubeconfig"));
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.store.kubeconfig, config.store.kubeconfig);
}
