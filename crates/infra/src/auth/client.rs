use std::fmt;

use async_trait::async_trait;
use lightspeed_core::TokenEndpoint;
use lightspeed_domain::constants::REFRESH_GRANT_TYPE;
use lightspeed_domain::{Credentials, Result, RetailError, TokenGrant};
use reqwest::Method;
use serde::Serialize;
use tracing::{info, instrument};

use crate::http::HttpClient;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
}

/// Calls the OAuth token endpoint with the `refresh_token` grant.
#[derive(Clone)]
pub struct OAuthTokenClient {
    http: HttpClient,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl OAuthTokenClient {
    pub fn new(http: HttpClient, token_url: impl Into<String>, credentials: &Credentials) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
        }
    }

    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

impl fmt::Debug for OAuthTokenClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokenClient")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenEndpoint for OAuthTokenClient {
    #[instrument(skip_all, fields(token_url = %self.token_url))]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let body = RefreshRequest {
            grant_type: REFRESH_GRANT_TYPE,
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            refresh_token,
        };

        let response =
            self.http.send(self.http.request(Method::POST, self.token_url.as_str()).json(&body)).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetailError::Auth(format!(
                "token endpoint returned {}: {body}",
                status.as_u16()
            )));
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| RetailError::Auth(format!("malformed token endpoint response: {e}")))?;

        info!(
            expires_in = grant.expires_in,
            rotated = grant.refresh_token.as_deref().is_some_and(|r| r != refresh_token),
            "Access token refreshed"
        );
        Ok(grant)
    }
}
