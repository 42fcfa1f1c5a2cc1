use std::time::Duration;

use lightspeed_domain::{HttpMethod, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::to_retail;

/// Shared transport for the token endpoint, the Retail API and webhooks.
///
/// Sends exactly one attempt per call; retry policy lives in
/// [`RequestExecutor`](super::RequestExecutor).
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// Returns [`RetailError::InvalidInput`](lightspeed_domain::RetailError)
    /// if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send a request. Any response, including 4xx/5xx, is `Ok`; only
    /// transport failures are errors.
    ///
    /// # Errors
    /// [`RetailError::Network`](lightspeed_domain::RetailError) when no
    /// response was received.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build().map_err(to_retail)?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(to_retail(err))
            }
        }
    }
}

/// Map the domain method onto reqwest's.
#[must_use]
pub fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Option<Duration>,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            user_agent: concat!("lightspeed-retail-rs/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientBuilder {
    /// Per-request timeout; `None` leaves it to the transport.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// # Errors
    /// Returns an error if the underlying client cannot be constructed.
    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().user_agent(self.user_agent).no_proxy();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(to_retail)?;
        Ok(HttpClient { client })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use lightspeed_domain::RetailError;
    use reqwest::StatusCode;
    use wiremock::matchers::{header_exists, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn returns_error_statuses_as_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let response = client.send(client.request(Method::GET, server.uri())).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn connection_refused_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = format!("http://{addr}");

        let client = HttpClient::builder().timeout(None).build().unwrap();
        let result = client.send(client.request(Method::GET, &url)).await;

        match result {
            Err(err @ RetailError::Network(_)) => assert!(err.is_retryable()),
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[test]
    fn maps_every_method() {
        assert_eq!(reqwest_method(HttpMethod::Get), Method::GET);
        assert_eq!(reqwest_method(HttpMethod::Post), Method::POST);
        assert_eq!(reqwest_method(HttpMethod::Put), Method::PUT);
        assert_eq!(reqwest_method(HttpMethod::Delete), Method::DELETE);
    }
}
