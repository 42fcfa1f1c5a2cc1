//! JSON file token storage

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lightspeed_core::TokenStorage;
use lightspeed_domain::constants::DEFAULT_TOKEN_FILE;
use lightspeed_domain::{Result, RetailError, TokenRecord};
use serde_json::Value;
use tracing::{debug, warn};

use super::document::{record_to_document, DocumentStore};
use crate::errors::to_retail;

/// Stores the token document as pretty-printed JSON in a single file.
///
/// A missing file reads as "no tokens". Through [`TokenStorage`], other read
/// problems are logged and also read as "no tokens"; write problems are
/// returned to the caller. [`DocumentStore::load_document`] is strict and
/// reports unreadable or unparseable files as [`RetailError::Storage`].
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(ToOwned::to_owned).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for FileTokenStorage {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_FILE)
    }
}

#[async_trait]
impl DocumentStore for FileTokenStorage {
    async fn load_document(&self) -> Result<Option<Value>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Token file does not exist yet");
                return Ok(None);
            }
            Err(err) => {
                return Err(RetailError::Storage(format!(
                    "could not read token file {}: {err}",
                    self.path.display()
                )));
            }
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&contents).map(Some).map_err(|err| {
            RetailError::Storage(format!(
                "token file {} is not valid JSON: {err}",
                self.path.display()
            ))
        })
    }

    async fn save_document(&self, document: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(to_retail)?;
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await.map_err(to_retail)?;
        restrict_permissions(&temp).await?;
        tokio::fs::rename(&temp, &self.path).await.map_err(to_retail)?;

        debug!(path = %self.path.display(), "Token file written");
        Ok(())
    }
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
    async fn get_tokens(&self) -> Result<TokenRecord> {
        let document = match self.load_document().await {
            Ok(Some(document)) => document,
            Ok(None) => return Ok(TokenRecord::empty()),
            Err(err) => {
                warn!(error = %err, "Token file unreadable, treating as empty");
                return Ok(TokenRecord::empty());
            }
        };
        match serde_json::from_value(document) {
            Ok(record) => Ok(record),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Token file has unexpected shape");
                Ok(TokenRecord::empty())
            }
        }
    }

    async fn set_tokens(&self, record: &TokenRecord) -> Result<()> {
        self.save_document(&record_to_document(record)?).await
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .map_err(to_retail)
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
