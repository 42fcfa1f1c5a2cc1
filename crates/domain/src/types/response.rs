//! Normalized API responses and envelope helpers
//!
//! Retail responses wrap their data as
//! `{"@attributes": {"next": ..., "previous": ...}, "<Resource>": [...] | {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::ENVELOPE_ATTRIBUTES_KEY;

/// Result of one executed request.
///
/// For GET requests the cursors are lifted out of the envelope; other
/// methods carry the raw payload with no cursors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub payload: Value,
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl ApiResponse {
    /// Wrap a GET payload, extracting the pagination cursors.
    #[must_use]
    pub fn from_envelope(payload: Value) -> Self {
        let attributes = payload.get(ENVELOPE_ATTRIBUTES_KEY);
        let cursor = |name: &str| {
            attributes
                .and_then(|attrs| attrs.get(name))
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
        };
        let next = cursor("next");
        let previous = cursor("previous").or_else(|| cursor("prev"));
        Self { payload, next, previous }
    }

    /// Wrap a non-GET payload as-is.
    #[must_use]
    pub fn raw(payload: Value) -> Self {
        Self { payload, next: None, previous: None }
    }

    /// Name of the single data key that is not `@attributes`.
    #[must_use]
    pub fn data_key(&self) -> Option<&str> {
        self.payload
            .as_object()?
            .keys()
            .find(|key| key.as_str() != ENVELOPE_ATTRIBUTES_KEY)
            .map(String::as_str)
    }

    /// Value stored under [`Self::data_key`].
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.payload.get(self.data_key()?)
    }

    /// Page items: an array is returned element-wise, a single object as one
    /// element, and an absent or empty value as no items.
    #[must_use]
    pub fn items(&self) -> Vec<Value> {
        match self.data() {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Object(map)) if map.is_empty() => Vec::new(),
            Some(Value::Null | Value::String(_)) | None => Vec::new(),
            Some(other) => vec![other.clone()],
        }
    }

    /// Consume the response, returning the single data object (or the whole
    /// payload when there is no envelope).
    #[must_use]
    pub fn into_data(mut self) -> Value {
        let Some(key) = self.data_key().map(str::to_string) else {
            return self.payload;
        };
        match self.payload.as_object_mut().and_then(|map| map.remove(&key)) {
            Some(value) => value,
            None => Value::Null,
        }
    }
}
