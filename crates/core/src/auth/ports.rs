//! Port interfaces for token persistence and refresh
//!
//! These traits define the boundaries between the token lifecycle logic
//! and the storage backends, the OAuth endpoint and alerting channels.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lightspeed_domain::{Result, RetailError, TokenGrant, TokenRecord};
use serde::Serialize;

/// Persistence for the current [`TokenRecord`].
///
/// Absence of data is never an error: `get_tokens` returns an empty record.
/// `set_tokens` replaces the whole record.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Load the stored record (empty when nothing is stored).
    async fn get_tokens(&self) -> Result<TokenRecord>;

    /// Replace the stored record.
    async fn set_tokens(&self, record: &TokenRecord) -> Result<()>;
}

#[async_trait]
impl<T: TokenStorage + ?Sized> TokenStorage for Arc<T> {
    async fn get_tokens(&self) -> Result<TokenRecord> {
        (**self).get_tokens().await
    }

    async fn set_tokens(&self, record: &TokenRecord) -> Result<()> {
        (**self).set_tokens(record).await
    }
}

/// OAuth token endpoint speaking the `refresh_token` grant.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchange `refresh_token` for a new grant.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant>;
}

/// Details of an unrecoverable refresh failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshFailure {
    pub account_id: String,
    pub error: RetailError,
    pub occurred_at: DateTime<Utc>,
}

/// Best-effort side channel invoked when a token refresh fails.
///
/// Errors returned here are logged by the caller and never replace the
/// original refresh error.
#[async_trait]
pub trait RefreshFailureNotifier: Send + Sync {
    async fn notify(&self, failure: &RefreshFailure) -> Result<()>;
}
