use async_trait::async_trait;
use lightspeed_core::{RefreshFailure, RefreshFailureNotifier};
use lightspeed_domain::{Result, RetailError};
use reqwest::Method;
use tracing::{debug, instrument};

use crate::http::HttpClient;

/// POSTs each refresh failure as JSON to an alerting endpoint.
///
/// Body: `{"account_id": ..., "error": {"type": ..., "details": ...}, "occurred_at": ...}`.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: HttpClient,
    url: String,
}

impl WebhookNotifier {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RefreshFailureNotifier for WebhookNotifier {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn notify(&self, failure: &RefreshFailure) -> Result<()> {
        let response =
            self.http.send(self.http.request(Method::POST, self.url.as_str()).json(failure)).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetailError::http(status.as_u16(), self.url.clone(), body));
        }

        debug!("Refresh failure delivered to webhook");
        Ok(())
    }
}
