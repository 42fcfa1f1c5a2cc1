//! Client configuration structures

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_URL, DEFAULT_APP_ID, DEFAULT_TOKEN_TABLE, MAX_RETRIES, RETRY_BACKOFF_MS,
    TOKEN_EXPIRY_BUFFER_SECS, TOKEN_URL,
};
use crate::errors::{Result, RetailError};
use crate::impl_status_conversions;

/// OAuth application credentials and the target account.
///
/// `refresh_token` is only the initial fallback: once a refresh has
/// succeeded the operative token lives in the token store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub account_id: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: None,
            account_id: account_id.into(),
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        let token = refresh_token.into();
        self.refresh_token = (!token.is_empty()).then_some(token);
        self
    }

    /// Reject missing identifiers before anything touches the network.
    ///
    /// # Errors
    /// Returns [`RetailError::Config`] naming every missing field.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("account_id", &self.account_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RetailError::Config(format!("missing required credentials: {}", missing.join(", "))))
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Endpoint and retry configuration for one client instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token_url: String,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    /// Refresh once the access token is this close to expiry.
    pub expiry_buffer: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            max_retries: MAX_RETRIES,
            retry_backoff: Duration::from_millis(RETRY_BACKOFF_MS),
            expiry_buffer: Duration::from_secs(TOKEN_EXPIRY_BUFFER_SECS.unsigned_abs()),
        }
    }
}

impl ClientConfig {
    /// `<base>/<account_id>`
    #[must_use]
    pub fn account_url(&self, account_id: &str) -> String {
        format!("{}/{account_id}", self.base_url.trim_end_matches('/'))
    }
}

/// Token storage backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    File,
    EncryptedFile,
    Database,
}

impl_status_conversions!(StorageKind {
    File => "file",
    EncryptedFile => "encrypted-file",
    Database => "database",
});

/// Persisted storage selection, as written to the storage config file.
///
/// Serialized adjacently tagged: `{"type": "...", "settings": {...}}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "settings", rename_all = "kebab-case")]
pub enum StorageSettings {
    #[serde(rename_all = "camelCase")]
    File { file_path: String },

    #[serde(rename_all = "camelCase")]
    EncryptedFile { file_path: String, encryption_key: String },

    #[serde(rename_all = "camelCase")]
    Database {
        /// SQLite database path.
        connection_string: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        db_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        table_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        app_id: Option<String>,
        #[serde(default)]
        encrypted: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        encryption_key: Option<String>,
    },
}

impl StorageSettings {
    #[must_use]
    pub fn kind(&self) -> StorageKind {
        match self {
            Self::File { .. } => StorageKind::File,
            Self::EncryptedFile { .. } => StorageKind::EncryptedFile,
            Self::Database { .. } => StorageKind::Database,
        }
    }

    /// Table name for the database backend, defaulted.
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::Database { table_name: Some(name), .. } => name,
            _ => DEFAULT_TOKEN_TABLE,
        }
    }

    /// Application id for the database backend, defaulted.
    #[must_use]
    pub fn app_id(&self) -> &str {
        match self {
            Self::Database { app_id: Some(id), .. } => id,
            _ => DEFAULT_APP_ID,
        }
    }
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { file_path } => f.debug_struct("File").field("file_path", file_path).finish(),
            Self::EncryptedFile { file_path, .. } => f
                .debug_struct("EncryptedFile")
                .field("file_path", file_path)
                .field("encryption_key", &"<redacted>")
                .finish(),
            Self::Database { connection_string, table_name, app_id, encrypted, .. } => f
                .debug_struct("Database")
                .field("connection_string", connection_string)
                .field("table_name", table_name)
                .field("app_id", app_id)
                .field("encrypted", encrypted)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_credentials_validate_lists_missing_fields() {
        let creds = Credentials::new("", "secret", " ");
        let err = creds.validate().unwrap_err();
        assert_eq!(
            err,
            RetailError::Config("missing required credentials: client_id, account_id".to_string())
        );

        assert!(Credentials::new("id", "secret", "1").validate().is_ok());
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = Credentials::new("id", "super-secret", "1").with_refresh_token("rt-123");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("rt-123"));
    }

    #[test]
    fn test_empty_refresh_token_is_none() {
        let creds = Credentials::new("id", "s", "1").with_refresh_token("");
        assert_eq!(creds.refresh_token, None);
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, BASE_URL);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_backoff, Duration::from_secs(2));
        assert_eq!(config.expiry_buffer, Duration::from_secs(60));
        assert_eq!(config.account_url("42"), format!("{BASE_URL}/42"));
    }

    #[test]
    fn test_storage_settings_wire_format() {
        let settings = StorageSettings::EncryptedFile {
            file_path: "./tokens/encrypted-tokens.json".to_string(),
            encryption_key: "ab".repeat(32),
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["type"], "encrypted-file");
        assert_eq!(value["settings"]["filePath"], "./tokens/encrypted-tokens.json");

        let parsed: StorageSettings = serde_json::from_value(json!({
            "type": "database",
            "settings": {"connectionString": "tokens.db", "encrypted": false}
        }))
        .unwrap();
        assert_eq!(parsed.kind(), StorageKind::Database);
        assert_eq!(parsed.table_name(), "oauth_tokens");
        assert_eq!(parsed.app_id(), "default");
    }

    #[test]
    fn test_storage_kind_conversions() {
        assert_eq!(StorageKind::EncryptedFile.to_string(), "encrypted-file");
        assert_eq!(StorageKind::from_str("DATABASE").unwrap(), StorageKind::Database);
        assert!(StorageKind::from_str("redis").is_err());
    }
}
