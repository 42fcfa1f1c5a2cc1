//! Raw JSON document persistence

use async_trait::async_trait;
use lightspeed_domain::{Result, TokenRecord};
use serde_json::Value;

/// A slot holding one JSON document.
///
/// `load_document` returns `None` when nothing has been stored. A slot whose
/// contents cannot be read or parsed is an error, never `None`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load_document(&self) -> Result<Option<Value>>;

    async fn save_document(&self, document: &Value) -> Result<()>;
}

/// Serialize a record into the document stored by plaintext backends.
pub(crate) fn record_to_document(record: &TokenRecord) -> Result<Value> {
    Ok(serde_json::to_value(record)?)
}
