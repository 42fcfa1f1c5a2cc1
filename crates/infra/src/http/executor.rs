//! Request execution against the Retail API
//!
//! One logical call runs this loop:
//! 1. Wait out the rate-limit delay computed from the last response
//! 2. Obtain an access token (failures propagate immediately)
//! 3. Send with `Authorization` and JSON headers; descriptor headers win
//! 4. On 401, force one token refresh and re-send
//! 5. On network errors and 5xx, back off and re-send up to the retry cap
//!
//! Retries re-send the identical descriptor, including POST bodies.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lightspeed_core::{PageSource, RateLimitTracker, TokenManager};
use lightspeed_domain::constants::{BUCKET_LEVEL_HEADER, DRIP_RATE_HEADER};
use lightspeed_domain::{
    ApiResponse, ClientConfig, HttpMethod, RequestDescriptor, Result, RetailError,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Response;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::client::{reqwest_method, HttpClient};
use crate::errors::to_retail;

/// Retry cap and fixed backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self { max_retries: config.max_retries, backoff: config.retry_backoff }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

/// Progress of one logical call through the retry loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Attempt {
    retries: u32,
    auth_retried: bool,
}

impl Attempt {
    fn after_backoff(self) -> Self {
        Self { retries: self.retries + 1, ..self }
    }

    fn after_reauth(self) -> Self {
        Self { auth_retried: true, ..self }
    }
}

/// Executes [`RequestDescriptor`]s with pacing, authentication and retries.
pub struct RequestExecutor {
    http: HttpClient,
    tokens: Arc<TokenManager>,
    rate_limit: RateLimitTracker,
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(http: HttpClient, tokens: Arc<TokenManager>, policy: RetryPolicy) -> Self {
        Self { http, tokens, rate_limit: RateLimitTracker::new(), policy }
    }

    #[must_use]
    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    #[must_use]
    pub fn rate_limit(&self) -> &RateLimitTracker {
        &self.rate_limit
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Execute `descriptor`, returning the envelope for GET and the raw
    /// payload otherwise.
    ///
    /// # Errors
    /// - Token errors from the [`TokenManager`], unchanged
    /// - [`RetailError::Http`] for non-2xx responses once retries are spent
    /// - [`RetailError::Network`] when no response arrived after the last retry
    #[instrument(skip_all, fields(method = %descriptor.method, url = %descriptor.url))]
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ApiResponse> {
        let mut attempt = Attempt::default();

        loop {
            self.pace(descriptor.units()).await;
            let token = self.tokens.get_access_token().await?;

            let err = match self.dispatch(descriptor, &token).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if err.is_unauthorized() && !attempt.auth_retried {
                warn!("Received 401; forcing token refresh and retrying once");
                self.tokens.force_refresh().await?;
                attempt = attempt.after_reauth();
                continue;
            }

            if err.is_retryable() && attempt.retries < self.policy.max_retries {
                warn!(
                    retry = attempt.retries + 1,
                    max_retries = self.policy.max_retries,
                    backoff_ms = u64::try_from(self.policy.backoff.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "Transient failure; retrying"
                );
                tokio::time::sleep(self.policy.backoff).await;
                attempt = attempt.after_backoff();
                continue;
            }

            debug!(error = %err, retries = attempt.retries, "Request failed");
            return Err(err);
        }
    }

    async fn pace(&self, units: u32) {
        match self.rate_limit.compute_wait(units) {
            Ok(wait) if !wait.is_zero() => {
                info!(
                    wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                    units,
                    "Rate limit budget exhausted; waiting"
                );
                tokio::time::sleep(wait).await;
            }
            Ok(_) => {}
            Err(err) => error!(error = %err, "Could not compute rate limit wait; proceeding"),
        }
    }

    async fn dispatch(&self, descriptor: &RequestDescriptor, token: &str) -> Result<ApiResponse> {
        let url = descriptor.full_url();
        let mut builder = self
            .http
            .request(reqwest_method(descriptor.method), url.as_str())
            .headers(build_headers(descriptor, token)?);
        if let Some(data) = &descriptor.data {
            builder = builder.body(serde_json::to_vec(data)?);
        }

        let response = self.http.send(builder).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetailError::http(status.as_u16(), url, body));
        }

        self.rate_limit.record(
            header_str(&response, BUCKET_LEVEL_HEADER),
            header_str(&response, DRIP_RATE_HEADER),
        );

        let bytes = response.bytes().await.map_err(to_retail)?;
        let payload: Value =
            if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };

        Ok(match descriptor.method {
            HttpMethod::Get => ApiResponse::from_envelope(payload),
            _ => ApiResponse::raw(payload),
        })
    }
}

fn header_str<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

fn build_headers(descriptor: &RequestDescriptor, token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    for (name, value) in &descriptor.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| RetailError::InvalidInput(format!("invalid header name {name:?}: {e}")))?;
        headers.insert(name, header_value(value)?);
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| RetailError::InvalidInput(format!("invalid header value: {e}")))
}

#[async_trait]
impl PageSource for RequestExecutor {
    async fn fetch_page(&self, descriptor: &RequestDescriptor) -> Result<ApiResponse> {
        self.execute(descriptor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_transitions_are_independent() {
        let start = Attempt::default();
        let reauthed = start.after_reauth();
        let retried = reauthed.after_backoff().after_backoff();

        assert_eq!(start, Attempt { retries: 0, auth_retried: false });
        assert_eq!(retried, Attempt { retries: 2, auth_retried: true });
    }

    #[test]
    fn descriptor_headers_override_defaults() {
        let descriptor = RequestDescriptor::post("https://x/Image.json", Value::Null)
            .with_header("content-TYPE", "multipart/form-data; boundary=abc");
        let headers = build_headers(&descriptor, "tok").unwrap();

        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "multipart/form-data; boundary=abc");
        assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn invalid_header_is_rejected() {
        let descriptor = RequestDescriptor::get("https://x").with_header("bad header", "v");
        assert!(matches!(build_headers(&descriptor, "tok"), Err(RetailError::InvalidInput(_))));
    }

    #[test]
    fn retry_policy_follows_client_config() {
        let config = ClientConfig {
            max_retries: 5,
            retry_backoff: Duration::from_millis(10),
            ..ClientConfig::default()
        };
        assert_eq!(
            RetryPolicy::from(&config),
            RetryPolicy { max_retries: 5, backoff: Duration::from_millis(10) }
        );
        assert_eq!(RetryPolicy::default().max_retries, 3);
    }
}
