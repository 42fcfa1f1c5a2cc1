//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading client settings from files.

use std::path::PathBuf;
use std::time::Duration;

use lightspeed_domain::{ClientConfig, RetailError};
use lightspeed_infra::config;
use tempfile::{tempdir, TempDir};

fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Failed to write config file");
    path
}

#[test]
fn test_load_config_from_json_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "lightspeed.json",
        r#"{
            "client_id": "json-client",
            "client_secret": "json-secret",
            "account_id": "98765",
            "refresh_token": "seed-refresh",
            "base_url": "http://localhost:8080/API/V3/Account",
            "max_retries": 5,
            "retry_backoff_ms": 250,
            "alert_webhook": "https://hooks.example.com/retail"
        }"#,
    );

    let settings = config::load_from_file(Some(path)).expect("config from JSON file");

    assert_eq!(settings.credentials.client_id, "json-client");
    assert_eq!(settings.credentials.account_id, "98765");
    assert_eq!(settings.credentials.refresh_token.as_deref(), Some("seed-refresh"));
    assert_eq!(settings.client.base_url, "http://localhost:8080/API/V3/Account");
    assert_eq!(settings.client.account_url("98765"), "http://localhost:8080/API/V3/Account/98765");
    assert_eq!(settings.client.max_retries, 5);
    assert_eq!(settings.client.retry_backoff, Duration::from_millis(250));
    assert_eq!(settings.alert_webhook.as_deref(), Some("https://hooks.example.com/retail"));
}

#[test]
fn test_load_config_from_toml_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "lightspeed.toml",
        r#"
client_id = "toml-client"
client_secret = "toml-secret"
account_id = "24680"
token_url = "http://localhost:8080/oauth/token"
alert_webhook = "  "
"#,
    );

    let settings = config::load_from_file(Some(path)).expect("config from TOML file");

    assert_eq!(settings.credentials.client_secret, "toml-secret");
    assert_eq!(settings.credentials.refresh_token, None);
    assert_eq!(settings.client.token_url, "http://localhost:8080/oauth/token");
    assert_eq!(settings.alert_webhook, None);
}

#[test]
fn test_load_config_with_minimal_fields() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "lightspeed.json",
        r#"{"client_id": "c", "client_secret": "s", "account_id": "1"}"#,
    );

    let settings = config::load_from_file(Some(path)).expect("minimal config");
    let defaults = ClientConfig::default();

    assert_eq!(settings.client, defaults);
    assert_eq!(settings.alert_webhook, None);
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some(PathBuf::from("/nonexistent/lightspeed.json")));
    assert!(
        matches!(result, Err(RetailError::Config(ref m)) if m.contains("not found")),
        "Should fail when file doesn't exist: {result:?}"
    );
}

#[test]
fn test_load_config_with_invalid_format() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_config(&dir, "lightspeed.json", "{ this is not json");

    let result = config::load_from_file(Some(path));
    assert!(
        matches!(result, Err(RetailError::Config(ref m)) if m.contains("Invalid JSON")),
        "Should fail with invalid JSON: {result:?}"
    );
}

#[test]
fn test_load_config_with_unsupported_extension() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_config(&dir, "lightspeed.yaml", "client_id: c");

    let result = config::load_from_file(Some(path));
    assert!(matches!(result, Err(RetailError::Config(ref m)) if m.contains("yaml")));
}

#[test]
fn test_load_config_rejects_blank_credentials() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "lightspeed.json",
        r#"{"client_id": "c", "client_secret": "", "account_id": "1"}"#,
    );

    let result = config::load_from_file(Some(path));
    assert!(matches!(result, Err(RetailError::Config(_))), "{result:?}");
}
