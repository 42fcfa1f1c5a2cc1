//! Token manager with automatic refresh
//!
//! Manages the OAuth token lifecycle:
//! - Token retrieval from the configured [`TokenStorage`]
//! - Refresh through the `refresh_token` grant when the access token is
//!   missing, expired, or inside the expiry buffer
//! - Refresh-token rotation: whatever the server returns replaces the stored
//!   refresh token
//! - Best-effort failure notification

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lightspeed_domain::constants::TOKEN_EXPIRY_BUFFER_SECS;
use lightspeed_domain::{impl_status_conversions, Result, RetailError, TokenInfo, TokenRecord};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use super::ports::{RefreshFailure, RefreshFailureNotifier, TokenEndpoint, TokenStorage};

/// Lifecycle state of the managed access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    NoToken,
    Valid,
    NearExpiry,
    Refreshing,
    Failed,
}

impl_status_conversions!(TokenState {
    NoToken => "no_token",
    Valid => "valid",
    NearExpiry => "near_expiry",
    Refreshing => "refreshing",
    Failed => "failed",
});

#[derive(Debug)]
struct Session {
    cached: Option<TokenRecord>,
    state: TokenState,
}

/// Token manager with refresh-on-demand.
///
/// The store is authoritative: every lookup reads it, and the in-memory copy
/// only mirrors the last record seen. Locks are never held across I/O, so
/// concurrent callers that both observe an expiring token may both refresh.
pub struct TokenManager {
    storage: Arc<dyn TokenStorage>,
    endpoint: Arc<dyn TokenEndpoint>,
    notifier: Option<Arc<dyn RefreshFailureNotifier>>,
    account_id: String,
    fallback_refresh_token: Option<String>,
    expiry_buffer: chrono::Duration,
    session: RwLock<Session>,
}

impl TokenManager {
    /// Create a token manager over `storage`, refreshing through `endpoint`.
    #[must_use]
    pub fn new(storage: Arc<dyn TokenStorage>, endpoint: Arc<dyn TokenEndpoint>) -> Self {
        Self {
            storage,
            endpoint,
            notifier: None,
            account_id: String::new(),
            fallback_refresh_token: None,
            expiry_buffer: chrono::Duration::seconds(TOKEN_EXPIRY_BUFFER_SECS),
            session: RwLock::new(Session { cached: None, state: TokenState::NoToken }),
        }
    }

    /// Refresh token used only while the store holds none.
    #[must_use]
    pub fn with_fallback_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.fallback_refresh_token = refresh_token.filter(|t| !t.is_empty());
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn RefreshFailureNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Account reported in failure notifications.
    #[must_use]
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    #[must_use]
    pub fn with_expiry_buffer(mut self, buffer: Duration) -> Self {
        if let Ok(buffer) = chrono::Duration::from_std(buffer) {
            self.expiry_buffer = buffer;
        }
        self
    }

    /// Get a valid access token, refreshing when needed.
    ///
    /// # Errors
    /// - [`RetailError::NoRefreshToken`] when neither the store nor the
    ///   fallback holds a refresh token (no network call is made)
    /// - the token endpoint's error when the refresh grant fails
    /// - storage errors from loading or persisting the record
    pub async fn get_access_token(&self) -> Result<String> {
        let record = self.storage.get_tokens().await?;

        if let Some(token) = record.usable_access_token(Utc::now(), self.expiry_buffer) {
            let token = token.to_string();
            self.remember(Some(record), TokenState::Valid).await;
            return Ok(token);
        }

        let state = if record.access_token().is_some() {
            TokenState::NearExpiry
        } else {
            TokenState::NoToken
        };
        debug!(state = %state, "Access token unusable, refreshing");
        self.set_state(state).await;

        self.refresh_from(&record).await
    }

    /// Drop the cached token and refresh unconditionally.
    ///
    /// Used after the API rejected a token that still looked valid locally.
    ///
    /// # Errors
    /// Same as [`Self::get_access_token`].
    #[instrument(skip(self))]
    pub async fn force_refresh(&self) -> Result<String> {
        self.remember(None, TokenState::NoToken).await;
        info!("Forcing token refresh");

        let record = self.storage.get_tokens().await?;
        self.refresh_from(&record).await
    }

    /// Write an empty record to the store and forget the cached token.
    ///
    /// # Errors
    /// Returns the storage error if the write fails.
    pub async fn reset(&self) -> Result<()> {
        self.storage.set_tokens(&TokenRecord::empty()).await?;
        self.remember(None, TokenState::NoToken).await;
        info!("Stored tokens reset");
        Ok(())
    }

    /// Describe the stored token without touching the network.
    ///
    /// # Errors
    /// Returns the storage error if the record cannot be loaded.
    pub async fn token_info(&self) -> Result<TokenInfo> {
        let record = self.storage.get_tokens().await?;
        Ok(TokenInfo::from_record(&record, Utc::now()))
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> TokenState {
        self.session.read().await.state
    }

    /// Last record this manager loaded or persisted.
    pub async fn cached_record(&self) -> Option<TokenRecord> {
        self.session.read().await.cached.clone()
    }

    async fn refresh_from(&self, record: &TokenRecord) -> Result<String> {
        let Some(refresh_token) = record
            .refresh_token()
            .or(self.fallback_refresh_token.as_deref())
            .map(str::to_string)
        else {
            warn!("No refresh token in storage or credentials");
            self.set_state(TokenState::NoToken).await;
            return Err(RetailError::NoRefreshToken);
        };

        self.set_state(TokenState::Refreshing).await;

        match self.exchange(&refresh_token).await {
            Ok(token) => Ok(token),
            Err(err) => {
                self.set_state(TokenState::Failed).await;
                error!(error = %err, kind = err.label(), "Token refresh failed");
                self.notify_failure(&err).await;
                Err(err)
            }
        }
    }

    async fn exchange(&self, refresh_token: &str) -> Result<String> {
        let grant = self.endpoint.refresh(refresh_token).await?;
        if grant.access_token.is_empty() {
            return Err(RetailError::Auth(
                "token endpoint response did not contain an access_token".to_string(),
            ));
        }

        let rotated = grant.refresh_token.as_deref() != Some(refresh_token);
        let record = TokenRecord::from_grant(grant, Utc::now())?;
        self.storage.set_tokens(&record).await?;

        info!(expires_at = ?record.expires_at, rotated, "Access token refreshed");

        let token = record.access_token.clone().unwrap_or_default();
        self.remember(Some(record), TokenState::Valid).await;
        Ok(token)
    }

    async fn notify_failure(&self, err: &RetailError) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let failure = RefreshFailure {
            account_id: self.account_id.clone(),
            error: err.clone(),
            occurred_at: Utc::now(),
        };
        if let Err(notify_err) = notifier.notify(&failure).await {
            warn!(error = %notify_err, "Refresh failure notification could not be delivered");
        }
    }

    async fn remember(&self, record: Option<TokenRecord>, state: TokenState) {
        let mut session = self.session.write().await;
        session.cached = record;
        session.state = state;
    }

    async fn set_state(&self, state: TokenState) {
        self.session.write().await.state = state;
    }
}
