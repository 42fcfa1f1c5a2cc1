//! Process-local token storage

use async_trait::async_trait;
use lightspeed_core::TokenStorage;
use lightspeed_domain::{Result, TokenRecord};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;

use super::document::{record_to_document, DocumentStore};

/// Keeps tokens in memory only.
///
/// The Retail API invalidates a refresh token on every use, so tokens held
/// here are unrecoverable after a restart.
#[derive(Debug)]
pub struct InMemoryTokenStorage {
    document: RwLock<Option<Value>>,
}

impl InMemoryTokenStorage {
    #[must_use]
    pub fn new() -> Self {
        warn!(
            "Using in-memory token storage: tokens are lost on restart and rotated refresh \
             tokens cannot be recovered. Configure file or database storage for production use."
        );
        Self { document: RwLock::new(None) }
    }
}

impl Default for InMemoryTokenStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryTokenStorage {
    async fn load_document(&self) -> Result<Option<Value>> {
        Ok(self.document.read().await.clone())
    }

    async fn save_document(&self, document: &Value) -> Result<()> {
        *self.document.write().await = Some(document.clone());
        Ok(())
    }
}

#[async_trait]
impl TokenStorage for InMemoryTokenStorage {
    async fn get_tokens(&self) -> Result<TokenRecord> {
        match self.load_document().await? {
            Some(document) => Ok(serde_json::from_value(document)?),
            None => Ok(TokenRecord::empty()),
        }
    }

    async fn set_tokens(&self, record: &TokenRecord) -> Result<()> {
        self.save_document(&record_to_document(record)?).await
    }
}
