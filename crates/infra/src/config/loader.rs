//! Configuration loader
//!
//! Loads client credentials and endpoint settings from environment
//! variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `LIGHTSPEED_CLIENT_ID`: OAuth client id (required)
//! - `LIGHTSPEED_CLIENT_SECRET`: OAuth client secret (required)
//! - `LIGHTSPEED_ACCOUNT_ID`: Retail account id (required)
//! - `LIGHTSPEED_REFRESH_TOKEN`: Initial refresh token (optional)
//! - `LIGHTSPEED_BASE_URL`: API base URL (optional)
//! - `LIGHTSPEED_TOKEN_URL`: OAuth token URL (optional)
//! - `LIGHTSPEED_ALERT_WEBHOOK`: Refresh-failure webhook (optional)
//!
//! ## File Locations
//! `lightspeed.json` or `lightspeed.toml` in the working directory, then in
//! up to two parent directories.

use std::path::{Path, PathBuf};
use std::time::Duration;

use lightspeed_domain::{ClientConfig, Credentials, Result, RetailError};
use serde::Deserialize;
use url::Url;

/// Everything needed to construct a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightspeedSettings {
    pub credentials: Credentials,
    pub client: ClientConfig,
    pub alert_webhook: Option<String>,
}

/// On-disk layout of `lightspeed.{json,toml}`.
#[derive(Debug, Deserialize)]
struct RawConfig {
    client_id: String,
    client_secret: String,
    account_id: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    token_url: Option<String>,
    #[serde(default)]
    max_retries: Option<u32>,
    #[serde(default)]
    retry_backoff_ms: Option<u64>,
    #[serde(default)]
    alert_webhook: Option<String>,
}

impl RawConfig {
    fn into_settings(self) -> LightspeedSettings {
        let defaults = ClientConfig::default();
        let mut credentials = Credentials::new(self.client_id, self.client_secret, self.account_id);
        if let Some(token) = self.refresh_token {
            credentials = credentials.with_refresh_token(token);
        }

        LightspeedSettings {
            credentials,
            client: ClientConfig {
                base_url: self.base_url.unwrap_or(defaults.base_url),
                token_url: self.token_url.unwrap_or(defaults.token_url),
                max_retries: self.max_retries.unwrap_or(defaults.max_retries),
                retry_backoff: self
                    .retry_backoff_ms
                    .map_or(defaults.retry_backoff, Duration::from_millis),
                expiry_buffer: defaults.expiry_buffer,
            },
            alert_webhook: self.alert_webhook.filter(|url| !url.trim().is_empty()),
        }
    }
}

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `RetailError::Config` if neither source yields a valid
/// configuration.
pub fn load() -> Result<LightspeedSettings> {
    match load_from_env() {
        Ok(settings) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(settings)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `RetailError::Config` if a required variable is missing or the
/// credentials are incomplete.
pub fn load_from_env() -> Result<LightspeedSettings> {
    let raw = RawConfig {
        client_id: env_var("LIGHTSPEED_CLIENT_ID")?,
        client_secret: env_var("LIGHTSPEED_CLIENT_SECRET")?,
        account_id: env_var("LIGHTSPEED_ACCOUNT_ID")?,
        refresh_token: optional_env("LIGHTSPEED_REFRESH_TOKEN"),
        base_url: optional_env("LIGHTSPEED_BASE_URL"),
        token_url: optional_env("LIGHTSPEED_TOKEN_URL"),
        max_retries: None,
        retry_backoff_ms: None,
        alert_webhook: optional_env("LIGHTSPEED_ALERT_WEBHOOK"),
    };

    finish(raw)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `RetailError::Config` if no file is found, the format is
/// invalid, or the credentials are incomplete.
pub fn load_from_file(path: Option<PathBuf>) -> Result<LightspeedSettings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RetailError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            RetailError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| RetailError::Config(format!("Failed to read config file: {e}")))?;

    finish(parse_config(&contents, &config_path)?)
}

fn finish(raw: RawConfig) -> Result<LightspeedSettings> {
    let settings = raw.into_settings();
    settings.credentials.validate()?;

    check_url("base_url", &settings.client.base_url)?;
    check_url("token_url", &settings.client.token_url)?;
    if let Some(webhook) = &settings.alert_webhook {
        check_url("alert_webhook", webhook)?;
    }
    Ok(settings)
}

fn check_url(field: &str, value: &str) -> Result<()> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => {
            Err(RetailError::Config(format!("{field} must be http(s), got {}", url.scheme())))
        }
        Err(e) => Err(RetailError::Config(format!("{field} is not a valid URL ({value}): {e}"))),
    }
}

fn parse_config(contents: &str, path: &Path) -> Result<RawConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| RetailError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| RetailError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(RetailError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing `lightspeed.{json,toml}` in the working directory or its
/// two nearest parents.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .take(3)
        .flat_map(|dir| [dir.join("lightspeed.json"), dir.join("lightspeed.toml")])
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| RetailError::Config(format!("Missing required environment variable: {key}")))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
