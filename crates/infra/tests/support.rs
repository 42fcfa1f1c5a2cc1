//! Shared fixtures for infra integration tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lightspeed_core::TokenStorage;
use lightspeed_domain::{ClientConfig, Credentials, TokenRecord};
use lightspeed_infra::{HttpClient, InMemoryTokenStorage, LightspeedClient};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Route client logs to the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const ACCOUNT_ID: &str = "12345";
pub const TOKEN_PATH: &str = "/oauth/token";

/// Client config pointing every endpoint at `server`, with a short backoff.
pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: format!("{}/API/V3/Account", server.uri()),
        token_url: format!("{}{TOKEN_PATH}", server.uri()),
        max_retries: 3,
        retry_backoff: Duration::from_millis(10),
        ..ClientConfig::default()
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("client-id", "client-secret", ACCOUNT_ID)
}

/// URL path of a resource collection for the test account.
pub fn resource_path(resource: &str) -> String {
    format!("/API/V3/Account/{ACCOUNT_ID}/{resource}.json")
}

/// A record whose access token is good for another hour.
pub fn fresh_record(access: &str) -> TokenRecord {
    TokenRecord {
        access_token: Some(access.to_string()),
        refresh_token: Some(format!("{access}-refresh")),
        expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        expires_in: Some(3600),
    }
}

/// A record whose access token expired a minute ago.
pub fn expired_record(refresh: &str) -> TokenRecord {
    TokenRecord {
        access_token: Some("stale-access".to_string()),
        refresh_token: Some(refresh.to_string()),
        expires_at: Some(Utc::now() - chrono::Duration::minutes(1)),
        expires_in: Some(3600),
    }
}

/// In-memory store pre-loaded with `record`.
pub async fn store_with(record: &TokenRecord) -> Arc<InMemoryTokenStorage> {
    let storage = Arc::new(InMemoryTokenStorage::new());
    storage.set_tokens(record).await.expect("seed token store");
    storage
}

/// Token endpoint that always grants `access` and rotates to `refresh`.
pub async fn mount_token_endpoint(server: &MockServer, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access,
            "refresh_token": refresh,
            "expires_in": 3600,
            "token_type": "bearer"
        })))
        .mount(server)
        .await;
}

pub fn client_for(server: &MockServer, storage: Arc<dyn TokenStorage>) -> LightspeedClient {
    init_tracing();
    LightspeedClient::builder(credentials())
        .config(config_for(server))
        .storage(storage)
        .build()
        .expect("client should build")
}

/// Like [`client_for`] with a per-request timeout on the transport.
pub fn client_with_timeout(
    server: &MockServer,
    storage: Arc<dyn TokenStorage>,
    timeout: Duration,
) -> LightspeedClient {
    init_tracing();
    let http = HttpClient::builder().timeout(Some(timeout)).build().expect("http client");
    LightspeedClient::builder(credentials())
        .config(config_for(server))
        .storage(storage)
        .http_client(http)
        .build()
        .expect("client should build")
}

/// Number of requests the server saw on `request_path`.
pub async fn hits(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}
