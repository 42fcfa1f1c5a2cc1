//! Storage selection: the persisted storage config file and auto-discovery
//!
//! ## Discovery order
//! 1. A saved storage config (`.lightspeed-storage-config.json`)
//! 2. `LIGHTSPEED_TOKEN_FILE`, encrypted when `LIGHTSPEED_ENCRYPTION_KEY` is set
//! 3. The first existing default token file
//!
//! If none applies, discovery yields `None` and the caller picks a backend.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lightspeed_core::TokenStorage;
use lightspeed_domain::constants::{DEFAULT_STORAGE_CONFIG_FILE, STORAGE_CONFIG_VERSION};
use lightspeed_domain::{Result, RetailError, StorageKind, StorageSettings};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::encrypted::EncryptedTokenStorage;
use super::file::FileTokenStorage;
use super::sqlite::SqliteTokenStorage;
use crate::errors::to_retail;

const LAST_UPDATED_KEY: &str = "lastUpdated";
const VERSION_KEY: &str = "version";

/// Default token file locations probed during discovery.
pub const DEFAULT_TOKEN_PATHS: [&str; 3] =
    [".lightspeed-tokens.json", "./tokens/encrypted-tokens.json", "./lightspeed-tokens.json"];

/// Contents of the storage config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedStorageConfig {
    pub settings: StorageSettings,
    pub last_updated: Option<DateTime<Utc>>,
    pub version: String,
}

/// The JSON file remembering which storage backend is in use.
#[derive(Debug, Clone)]
pub struct StorageConfigFile {
    path: PathBuf,
}

impl StorageConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `settings`, stamping `lastUpdated` and `version`.
    ///
    /// # Errors
    /// Returns a storage error if the file cannot be written.
    pub async fn save(&self, settings: &StorageSettings) -> Result<()> {
        let mut document = serde_json::to_value(settings)?;
        if let Value::Object(map) = &mut document {
            map.insert(LAST_UPDATED_KEY.to_string(), Value::String(Utc::now().to_rfc3339()));
            map.insert(VERSION_KEY.to_string(), Value::String(STORAGE_CONFIG_VERSION.to_string()));
        }

        let bytes = serde_json::to_vec_pretty(&document)?;
        tokio::fs::write(&self.path, bytes).await.map_err(to_retail)?;
        info!(path = %self.path.display(), kind = %settings.kind(), "Storage configuration saved");
        Ok(())
    }

    /// Load the saved configuration. A missing or unreadable file yields
    /// `None`; unreadable files are logged.
    pub async fn load(&self) -> Option<SavedStorageConfig> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Could not read storage config");
                return None;
            }
        };

        match parse_saved_config(&contents) {
            Ok(config) => Some(config),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Could not parse storage config");
                None
            }
        }
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Delete the config file. A file that is already gone is not an error.
    ///
    /// # Errors
    /// Returns a storage error for any other removal failure.
    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(to_retail(err)),
        }
    }
}

impl Default for StorageConfigFile {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_CONFIG_FILE)
    }
}

fn parse_saved_config(contents: &str) -> Result<SavedStorageConfig> {
    let mut document: Value = serde_json::from_str(contents)?;
    let map = document
        .as_object_mut()
        .ok_or_else(|| RetailError::Config("storage config must be a JSON object".to_string()))?;

    let last_updated = map
        .remove(LAST_UPDATED_KEY)
        .and_then(|v| v.as_str().and_then(|s| DateTime::parse_from_rfc3339(s).ok()))
        .map(|dt| dt.with_timezone(&Utc));
    let version = map
        .remove(VERSION_KEY)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| STORAGE_CONFIG_VERSION.to_string());

    let settings: StorageSettings = serde_json::from_value(document)
        .map_err(|e| RetailError::Config(format!("invalid storage settings: {e}")))?;

    Ok(SavedStorageConfig { settings, last_updated, version })
}

/// Build the backend described by `settings`.
///
/// # Errors
/// - [`RetailError::Config`] for unsupported database types, a missing or
///   malformed encryption key
/// - [`RetailError::Storage`] if a database cannot be opened
pub fn create_storage_from_settings(settings: &StorageSettings) -> Result<Arc<dyn TokenStorage>> {
    match settings {
        StorageSettings::File { file_path } => Ok(Arc::new(FileTokenStorage::new(file_path))),
        StorageSettings::EncryptedFile { file_path, encryption_key } => Ok(Arc::new(
            EncryptedTokenStorage::new(FileTokenStorage::new(file_path), encryption_key)?,
        )),
        StorageSettings::Database {
            connection_string,
            db_type,
            table_name,
            app_id,
            encrypted,
            encryption_key,
        } => {
            if let Some(db_type) = db_type.as_deref().filter(|t| !t.eq_ignore_ascii_case("sqlite")) {
                return Err(RetailError::Config(format!(
                    "unsupported token database type: {db_type} (only sqlite is available)"
                )));
            }

            let storage = SqliteTokenStorage::open(
                connection_string,
                table_name.as_deref(),
                app_id.as_deref(),
            )?;

            if !*encrypted {
                return Ok(Arc::new(storage));
            }

            let key = encryption_key.as_deref().ok_or_else(|| {
                RetailError::Config("encrypted database storage requires an encryption key".into())
            })?;
            Ok(Arc::new(EncryptedTokenStorage::new(storage, key)?))
        }
    }
}

/// Inputs to [`discover_storage`].
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub config_file: StorageConfigFile,
    pub token_file: Option<PathBuf>,
    pub encryption_key: Option<String>,
    pub default_paths: Vec<PathBuf>,
}

impl DiscoveryOptions {
    /// Options from `LIGHTSPEED_TOKEN_FILE`, `LIGHTSPEED_ENCRYPTION_KEY` and
    /// the default locations.
    #[must_use]
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            config_file: StorageConfigFile::default(),
            token_file: non_empty("LIGHTSPEED_TOKEN_FILE").map(PathBuf::from),
            encryption_key: non_empty("LIGHTSPEED_ENCRYPTION_KEY"),
            default_paths: DEFAULT_TOKEN_PATHS.iter().map(PathBuf::from).collect(),
        }
    }
}

/// Where a discovered backend came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoverySource {
    SavedConfig(StorageKind),
    Environment { encrypted: bool },
    DefaultPath(PathBuf),
}

/// A discovered backend and its origin.
pub struct DiscoveredStorage {
    pub storage: Arc<dyn TokenStorage>,
    pub source: DiscoverySource,
}

impl std::fmt::Debug for DiscoveredStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveredStorage").field("source", &self.source).finish_non_exhaustive()
    }
}

/// Locate a previously used backend.
pub async fn discover_storage(options: &DiscoveryOptions) -> Option<DiscoveredStorage> {
    if let Some(saved) = options.config_file.load().await {
        match create_storage_from_settings(&saved.settings) {
            Ok(storage) => {
                debug!(kind = %saved.settings.kind(), "Using saved storage configuration");
                return Some(DiscoveredStorage {
                    storage,
                    source: DiscoverySource::SavedConfig(saved.settings.kind()),
                });
            }
            Err(err) => {
                warn!(error = %err, "Could not create storage from saved configuration");
            }
        }
    }

    if let Some(token_file) = &options.token_file {
        let file = FileTokenStorage::new(token_file);
        match &options.encryption_key {
            Some(key) => match EncryptedTokenStorage::new(file, key) {
                Ok(storage) => {
                    return Some(DiscoveredStorage {
                        storage: Arc::new(storage),
                        source: DiscoverySource::Environment { encrypted: true },
                    });
                }
                Err(err) => warn!(error = %err, "Ignoring LIGHTSPEED_ENCRYPTION_KEY"),
            },
            None => {
                return Some(DiscoveredStorage {
                    storage: Arc::new(file),
                    source: DiscoverySource::Environment { encrypted: false },
                });
            }
        }
    }

    for path in &options.default_paths {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            debug!(path = %path.display(), "Found default token file");
            return Some(DiscoveredStorage {
                storage: Arc::new(FileTokenStorage::new(path)),
                source: DiscoverySource::DefaultPath(path.clone()),
            });
        }
    }

    None
}

/// [`discover_storage`] with options read from the environment.
pub async fn auto_discover_storage() -> Option<DiscoveredStorage> {
    discover_storage(&DiscoveryOptions::from_env()).await
}
