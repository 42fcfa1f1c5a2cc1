//! Integration tests for token stores on real files and databases
//!
//! **Coverage:**
//! - Missing token file reads as an empty record
//! - Encrypted-over-file round trip and tamper detection
//! - Truncated encrypted file is a loud error
//! - SQLite persistence across reopen, plain and encrypted
//! - Storage config save and rediscovery

use std::path::Path;

use chrono::{Duration, TimeZone, Utc};
use lightspeed_core::TokenStorage;
use lightspeed_domain::{RetailError, StorageKind, StorageSettings, TokenRecord};
use lightspeed_infra::{
    create_storage_from_settings, discover_storage, DiscoveryOptions, DiscoverySource,
    EncryptedTokenStorage, EncryptionService, FileTokenStorage, SqliteTokenStorage,
    StorageConfigFile,
};
use serde_json::Value;
use tempfile::tempdir;

fn record() -> TokenRecord {
    TokenRecord {
        access_token: Some("access-123".into()),
        refresh_token: Some("refresh-456".into()),
        expires_at: Some(Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()),
        expires_in: Some(3600),
    }
}

fn encrypted_file(path: &Path, key: &str) -> EncryptedTokenStorage<FileTokenStorage> {
    EncryptedTokenStorage::new(FileTokenStorage::new(path), key).unwrap()
}

/// Flip the lowest bit of the first byte of a hex field in the stored document.
fn tamper(path: &Path, field: &str) {
    let mut document: Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    let mut bytes = hex::decode(document[field].as_str().unwrap()).unwrap();
    bytes[0] ^= 0x01;
    document[field] = Value::String(hex::encode(bytes));
    std::fs::write(path, serde_json::to_vec(&document).unwrap()).unwrap();
}

#[tokio::test]
async fn missing_file_reads_empty_record() {
    let dir = tempdir().unwrap();
    let storage = FileTokenStorage::new(dir.path().join("nope").join("tokens.json"));
    assert_eq!(storage.get_tokens().await.unwrap(), TokenRecord::empty());
}

/// Validates round trip and authenticated failure on tampering.
///
/// Assertions:
/// - The file never contains the plaintext tokens
/// - Reading back yields an equal record
/// - A flipped ciphertext or tag byte is a decryption error
#[tokio::test]
async fn encrypted_file_round_trip_and_tamper_detection() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("encrypted-tokens.json");
    let key = EncryptionService::generate_key_hex();

    let storage = encrypted_file(&path, &key);
    storage.set_tokens(&record()).await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("access-123"));
    assert!(!raw.contains("refresh-456"));
    assert_eq!(storage.get_tokens().await.unwrap(), record());

    tamper(&path, "ciphertext");
    assert!(matches!(storage.get_tokens().await, Err(RetailError::Decryption(_))));

    storage.set_tokens(&record()).await.unwrap();
    tamper(&path, "tag");
    assert!(matches!(storage.get_tokens().await, Err(RetailError::Decryption(_))));
}

/// Validates that a damaged encrypted file never reads back as empty.
///
/// Assertions:
/// - A file truncated mid-document fails with a storage error
/// - The file is left as found
/// - The plain file store still degrades the same file to an empty record
#[tokio::test]
async fn truncated_encrypted_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("encrypted-tokens.json");
    let storage = encrypted_file(&path, &EncryptionService::generate_key_hex());
    storage.set_tokens(&record()).await.unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let truncated = &bytes[..bytes.len() - 5];
    std::fs::write(&path, truncated).unwrap();

    let result = storage.get_tokens().await;
    assert!(matches!(result, Err(RetailError::Storage(_))), "{result:?}");
    assert_eq!(std::fs::read(&path).unwrap(), truncated);

    assert_eq!(FileTokenStorage::new(&path).get_tokens().await.unwrap(), TokenRecord::empty());
}

#[tokio::test]
async fn plaintext_file_is_upgraded_on_next_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    FileTokenStorage::new(&path).set_tokens(&record()).await.unwrap();

    let storage = encrypted_file(&path, &"aa".repeat(32));
    assert_eq!(storage.get_tokens().await.unwrap(), record());

    let rotated = TokenRecord { refresh_token: Some("rotated".into()), ..record() };
    storage.set_tokens(&rotated).await.unwrap();

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(raw.get("access_token").is_none());
    assert!(raw.get("ciphertext").is_some());
    assert_eq!(storage.get_tokens().await.unwrap(), rotated);
}

#[tokio::test]
async fn sqlite_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("tokens.db");

    {
        let storage = SqliteTokenStorage::open(&db, None, Some("pos-1")).unwrap();
        storage.set_tokens(&record()).await.unwrap();
    }

    let reopened = SqliteTokenStorage::open(&db, None, Some("pos-1")).unwrap();
    assert_eq!(reopened.get_tokens().await.unwrap(), record());

    let second_register = SqliteTokenStorage::open(&db, None, Some("pos-2")).unwrap();
    let encrypted = EncryptedTokenStorage::new(second_register, &"bb".repeat(32)).unwrap();
    let expiring = TokenRecord { expires_at: Some(Utc::now() + Duration::seconds(30)), ..record() };
    encrypted.set_tokens(&expiring).await.unwrap();
    assert_eq!(encrypted.get_tokens().await.unwrap(), expiring);
    assert_eq!(reopened.get_tokens().await.unwrap(), record());
}

/// Validates that a saved storage configuration is rediscovered.
#[tokio::test]
async fn saved_database_config_is_rediscovered() {
    let dir = tempdir().unwrap();
    let settings = StorageSettings::Database {
        connection_string: dir.path().join("tokens.db").display().to_string(),
        db_type: Some("sqlite".into()),
        table_name: Some("retail_tokens".into()),
        app_id: Some("store-9".into()),
        encrypted: false,
        encryption_key: None,
    };

    let config = StorageConfigFile::new(dir.path().join(".lightspeed-storage-config.json"));
    config.save(&settings).await.unwrap();
    create_storage_from_settings(&settings).unwrap().set_tokens(&record()).await.unwrap();

    let options = DiscoveryOptions {
        config_file: config,
        token_file: None,
        encryption_key: None,
        default_paths: Vec::new(),
    };
    let found = discover_storage(&options).await.unwrap();

    assert_eq!(found.source, DiscoverySource::SavedConfig(StorageKind::Database));
    assert_eq!(found.storage.get_tokens().await.unwrap(), record());
}
