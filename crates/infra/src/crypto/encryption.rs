//! AES-256-GCM encryption primitives
//!
//! ```rust
//! use lightspeed_infra::crypto::EncryptionService;
//!
//! let key = EncryptionService::generate_key_hex();
//! let service = EncryptionService::from_hex_key(&key)?;
//!
//! let payload = service.encrypt(b"refresh-token")?;
//! assert_eq!(service.decrypt(&payload)?, b"refresh-token");
//! # Ok::<(), lightspeed_domain::RetailError>(())
//! ```

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use lightspeed_domain::{Result, RetailError};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

const KEY_LEN: usize = 32;
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encrypted blob with its IV and authentication tag kept separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub iv: Vec<u8>,
    pub tag: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

/// AES-256-GCM encryption service keyed by a 256-bit key.
pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService").field("key", &"[REDACTED]").finish()
    }
}

impl EncryptionService {
    /// Create a new encryption service from a raw 32-byte key.
    ///
    /// # Errors
    /// Returns [`RetailError::Config`] for a key of the wrong length.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(RetailError::Config(format!(
                "Encryption key must be exactly {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| {
            RetailError::Config(format!("Failed to create encryption cipher: {e}"))
        })?;

        Ok(Self { cipher })
    }

    /// Create a service from a 64-character hex key.
    ///
    /// # Errors
    /// Returns [`RetailError::Config`] when the key is not valid hex or not
    /// 32 bytes long.
    pub fn from_hex_key(key: &str) -> Result<Self> {
        let bytes = hex::decode(key.trim()).map_err(|e| {
            RetailError::Config(format!("Encryption key must be 64 hex characters: {e}"))
        })?;
        Self::new(&bytes)
    }

    /// Generate a random 32-byte symmetric key.
    #[must_use]
    pub fn generate_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Generate a random key rendered as 64 hex characters.
    #[must_use]
    pub fn generate_key_hex() -> String {
        hex::encode(Self::generate_key())
    }

    /// Encrypt bytes under a fresh random IV.
    ///
    /// # Errors
    /// Returns [`RetailError::Internal`] if the cipher rejects the input.
    pub fn encrypt(&self, data: &[u8]) -> Result<EncryptedPayload> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let mut sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&iv), data)
            .map_err(|e| RetailError::Internal(format!("Encryption failed: {e}")))?;

        let split = sealed.len().saturating_sub(TAG_LEN);
        let tag = sealed.split_off(split);

        Ok(EncryptedPayload { iv: iv.to_vec(), tag, ciphertext: sealed })
    }

    /// Verify and decrypt a payload.
    ///
    /// # Errors
    /// Returns [`RetailError::Decryption`] for malformed payloads or when the
    /// authentication tag does not match.
    pub fn decrypt(&self, payload: &EncryptedPayload) -> Result<Vec<u8>> {
        if payload.iv.len() != IV_LEN {
            return Err(RetailError::Decryption(format!(
                "IV must be {IV_LEN} bytes, got {}",
                payload.iv.len()
            )));
        }
        if payload.tag.len() != TAG_LEN {
            return Err(RetailError::Decryption(format!(
                "authentication tag must be {TAG_LEN} bytes, got {}",
                payload.tag.len()
            )));
        }

        let mut sealed = Vec::with_capacity(payload.ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(&payload.ciphertext);
        sealed.extend_from_slice(&payload.tag);

        self.cipher.decrypt(Nonce::from_slice(&payload.iv), sealed.as_ref()).map_err(|_| {
            RetailError::Decryption("authentication failed; token data is corrupted or the key is wrong".into())
        })
    }
}
