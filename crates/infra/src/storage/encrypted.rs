//! Encrypting decorator for document-backed token stores

use async_trait::async_trait;
use lightspeed_core::TokenStorage;
use lightspeed_domain::{Result, RetailError, TokenRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::document::DocumentStore;
use crate::crypto::{EncryptedPayload, EncryptionService};

/// Stored shape of an encrypted record; every field is hex.
#[derive(Debug, Serialize, Deserialize)]
struct EncryptedDocument {
    iv: String,
    tag: String,
    ciphertext: String,
}

/// Wraps another store, persisting the token record as
/// `{iv, tag, ciphertext}` under AES-256-GCM.
///
/// Plaintext records written before encryption was enabled (documents with a
/// top-level `access_token`) are returned unchanged and re-encrypted on the
/// next write. Anything that fails authentication is an error, never a
/// partial record.
#[derive(Debug)]
pub struct EncryptedTokenStorage<S> {
    inner: S,
    service: EncryptionService,
}

impl<S: DocumentStore> EncryptedTokenStorage<S> {
    /// Wrap `inner` using a 64-character hex key.
    ///
    /// # Errors
    /// Returns [`RetailError::Config`] for a malformed key.
    pub fn new(inner: S, hex_key: &str) -> Result<Self> {
        Ok(Self::with_service(inner, EncryptionService::from_hex_key(hex_key)?))
    }

    pub fn with_service(inner: S, service: EncryptionService) -> Self {
        Self { inner, service }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn open(&self, document: Value) -> Result<TokenRecord> {
        let stored: EncryptedDocument = serde_json::from_value(document).map_err(|e| {
            RetailError::Decryption(format!("stored token document is not an encrypted record: {e}"))
        })?;

        let payload = EncryptedPayload {
            iv: decode_hex("iv", &stored.iv)?,
            tag: decode_hex("tag", &stored.tag)?,
            ciphertext: decode_hex("ciphertext", &stored.ciphertext)?,
        };

        let plaintext = self.service.decrypt(&payload)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| RetailError::Decryption(format!("decrypted token record is malformed: {e}")))
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value)
        .map_err(|e| RetailError::Decryption(format!("encrypted field `{field}` is not hex: {e}")))
}

fn is_empty_document(document: &Value) -> bool {
    match document {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[async_trait]
impl<S: DocumentStore> TokenStorage for EncryptedTokenStorage<S> {
    async fn get_tokens(&self) -> Result<TokenRecord> {
        let Some(document) = self.inner.load_document().await? else {
            return Ok(TokenRecord::empty());
        };

        if is_empty_document(&document) {
            return Ok(TokenRecord::empty());
        }

        if document.get("access_token").is_some() {
            debug!("Found plaintext token record; it will be encrypted on the next write");
            return Ok(serde_json::from_value(document)?);
        }

        self.open(document)
    }

    async fn set_tokens(&self, record: &TokenRecord) -> Result<()> {
        let plaintext = serde_json::to_vec(record)?;
        let payload = self.service.encrypt(&plaintext)?;
        let document = EncryptedDocument {
            iv: hex::encode(payload.iv),
            tag: hex::encode(payload.tag),
            ciphertext: hex::encode(payload.ciphertext),
        };
        self.inner.save_document(&serde_json::to_value(document)?).await
    }
}
