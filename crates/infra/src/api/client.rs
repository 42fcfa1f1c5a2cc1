//! Lightspeed Retail client facade
//!
//! Wires credentials, configuration and a token store into a
//! [`TokenManager`] and a [`RequestExecutor`], and exposes the two request
//! primitives everything else is built on: [`LightspeedClient::execute`] for
//! single requests and [`LightspeedClient::get_all_data`] for paginated lists.

use std::fmt;
use std::sync::Arc;

use lightspeed_core::{
    collect_all, PageCollection, RefreshFailureNotifier, TokenManager, TokenStorage,
};
use lightspeed_domain::{
    ApiResponse, ClientConfig, Credentials, RequestDescriptor, Result, TokenInfo,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::resources::{Resource, ResourceApi};
use crate::auth::OAuthTokenClient;
use crate::config::LightspeedSettings;
use crate::http::{HttpClient, RequestExecutor, RetryPolicy};
use crate::notify::{TracingNotifier, WebhookNotifier};
use crate::storage::InMemoryTokenStorage;

/// Result of [`LightspeedClient::refresh_tokens`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PingStatus {
    Success,
    Error,
}

/// Result of [`LightspeedClient::ping`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingReport {
    pub status: PingStatus,
    pub message: String,
}

/// Client for one Retail account.
///
/// Concurrent calls on one instance are allowed; they may race on the
/// rate-limit snapshot and may each trigger a token refresh.
pub struct LightspeedClient {
    credentials: Credentials,
    config: ClientConfig,
    executor: Arc<RequestExecutor>,
}

impl LightspeedClient {
    /// Build a client with default configuration.
    ///
    /// # Errors
    /// Returns [`RetailError::Config`](lightspeed_domain::RetailError) when
    /// the credentials are incomplete.
    pub fn new(credentials: Credentials, storage: Arc<dyn TokenStorage>) -> Result<Self> {
        Self::builder(credentials).storage(storage).build()
    }

    pub fn builder(credentials: Credentials) -> LightspeedClientBuilder {
        LightspeedClientBuilder {
            credentials,
            config: ClientConfig::default(),
            storage: None,
            notifier: None,
            http: None,
        }
    }

    /// Build from loaded settings, alerting through the configured webhook
    /// when one is set.
    ///
    /// # Errors
    /// Same as [`LightspeedClientBuilder::build`].
    pub fn from_settings(
        settings: LightspeedSettings,
        storage: Arc<dyn TokenStorage>,
    ) -> Result<Self> {
        let http = HttpClient::new()?;
        let mut builder = Self::builder(settings.credentials)
            .config(settings.client)
            .storage(storage)
            .http_client(http.clone());
        if let Some(url) = settings.alert_webhook {
            builder = builder.notifier(Arc::new(WebhookNotifier::new(http, url)));
        }
        builder.build()
    }

    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.credentials.account_id
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `<base>/<account_id>`
    #[must_use]
    pub fn account_url(&self) -> String {
        self.config.account_url(&self.credentials.account_id)
    }

    #[must_use]
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    #[must_use]
    pub fn token_manager(&self) -> &Arc<TokenManager> {
        self.executor.token_manager()
    }

    #[must_use]
    pub fn resource(&self, resource: Resource) -> ResourceApi<'_> {
        ResourceApi::new(self, resource)
    }

    /// Execute one request. Errors propagate.
    ///
    /// # Errors
    /// See [`RequestExecutor::execute`].
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ApiResponse> {
        self.executor.execute(descriptor).await
    }

    /// Collect every page of a list request. A `limit` query parameter also
    /// caps the total number of items returned.
    pub async fn collect_pages(&self, descriptor: RequestDescriptor) -> PageCollection {
        let limit = descriptor.params.as_ref().and_then(|p| p.limit_value());
        collect_all(self.executor.as_ref(), descriptor, limit).await
    }

    /// [`collect_pages`](Self::collect_pages) reduced to the items; failures
    /// degrade to whatever was collected before them.
    pub async fn get_all_data(&self, descriptor: RequestDescriptor) -> Vec<Value> {
        self.collect_pages(descriptor).await.into_items()
    }

    /// Force a refresh and report the result as a value.
    #[instrument(skip(self), fields(account_id = %self.credentials.account_id))]
    pub async fn refresh_tokens(&self) -> RefreshOutcome {
        match self.token_manager().force_refresh().await {
            Ok(_) => {
                info!("Tokens refreshed on request");
                RefreshOutcome { success: true, message: "Tokens refreshed successfully".into() }
            }
            Err(err) => {
                warn!(error = %err, "Requested token refresh failed");
                RefreshOutcome { success: false, message: err.to_string() }
            }
        }
    }

    /// Stored token state without touching the network.
    ///
    /// # Errors
    /// Propagates token store read errors.
    pub async fn token_info(&self) -> Result<TokenInfo> {
        self.token_manager().token_info().await
    }

    /// Overwrite the stored tokens with an empty record.
    ///
    /// # Errors
    /// Propagates token store write errors.
    pub async fn reset_tokens(&self) -> Result<()> {
        self.token_manager().reset().await
    }

    /// Fetch the account to verify credentials and connectivity.
    #[instrument(skip(self), fields(account_id = %self.credentials.account_id))]
    pub async fn ping(&self) -> PingReport {
        match self.get_account().await {
            Ok(_) => PingReport {
                status: PingStatus::Success,
                message: format!("Connected to account {}", self.credentials.account_id),
            },
            Err(err) => PingReport { status: PingStatus::Error, message: err.to_string() },
        }
    }
}

impl fmt::Debug for LightspeedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LightspeedClient")
            .field("account_id", &self.credentials.account_id)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

/// Builder for [`LightspeedClient`].
pub struct LightspeedClientBuilder {
    credentials: Credentials,
    config: ClientConfig,
    storage: Option<Arc<dyn TokenStorage>>,
    notifier: Option<Arc<dyn RefreshFailureNotifier>>,
    http: Option<HttpClient>,
}

impl LightspeedClientBuilder {
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Token store; defaults to [`InMemoryTokenStorage`].
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Refresh-failure side channel; defaults to [`TracingNotifier`].
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn RefreshFailureNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// # Errors
    /// - [`RetailError::Config`](lightspeed_domain::RetailError) for
    ///   incomplete credentials, before any network call
    /// - Transport construction errors
    pub fn build(self) -> Result<LightspeedClient> {
        self.credentials.validate()?;

        let http = match self.http {
            Some(http) => http,
            None => HttpClient::new()?,
        };
        let storage: Arc<dyn TokenStorage> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(InMemoryTokenStorage::new()),
        };
        let notifier: Arc<dyn RefreshFailureNotifier> = match self.notifier {
            Some(notifier) => notifier,
            None => Arc::new(TracingNotifier),
        };
        let endpoint =
            Arc::new(OAuthTokenClient::new(http.clone(), &self.config.token_url, &self.credentials));

        let tokens = TokenManager::new(storage, endpoint)
            .with_fallback_refresh_token(self.credentials.refresh_token.clone())
            .with_account_id(&self.credentials.account_id)
            .with_expiry_buffer(self.config.expiry_buffer)
            .with_notifier(notifier);

        let executor =
            RequestExecutor::new(http, Arc::new(tokens), RetryPolicy::from(&self.config));

        Ok(LightspeedClient {
            credentials: self.credentials,
            config: self.config,
            executor: Arc::new(executor),
        })
    }
}

#[cfg(test)]
mod tests {
    use lightspeed_domain::RetailError;

    use super::*;

    #[test]
    fn incomplete_credentials_fail_before_any_io() {
        let result = LightspeedClient::builder(Credentials::new("id", "", "")).build();
        assert!(matches!(result, Err(RetailError::Config(_))));
    }

    #[test]
    fn account_url_joins_base_and_account() {
        let client = LightspeedClient::builder(Credentials::new("id", "secret", "777"))
            .config(ClientConfig {
                base_url: "http://localhost:1/API/V3/Account/".into(),
                ..ClientConfig::default()
            })
            .build()
            .unwrap();
        assert_eq!(client.account_url(), "http://localhost:1/API/V3/Account/777");
        assert_eq!(client.account_id(), "777");
        assert!(!format!("{client:?}").contains("secret"));
    }
}
