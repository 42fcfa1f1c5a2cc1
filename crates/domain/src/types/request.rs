//! Request descriptors consumed by the request executor

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::query::{append_query, QueryParams};
use crate::constants::{GET_REQUEST_UNITS, WRITE_REQUEST_UNITS};

/// HTTP methods used against the Retail API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Leaky-bucket units consumed by one request with this method.
    #[must_use]
    pub fn units(self) -> u32 {
        match self {
            Self::Get => GET_REQUEST_UNITS,
            Self::Post | Self::Put | Self::Delete => WRITE_REQUEST_UNITS,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single API call: absolute URL, method, extra headers, query and body.
///
/// Caller headers are merged over the defaults (`Authorization`,
/// `Content-Type`, `Accept`) and win on conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub url: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub params: Option<QueryParams>,
    pub data: Option<Value>,
}

impl RequestDescriptor {
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self { url: url.into(), method, headers: Vec::new(), params: None, data: None }
    }

    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    #[must_use]
    pub fn post(url: impl Into<String>, data: Value) -> Self {
        Self::new(HttpMethod::Post, url).with_data(data)
    }

    #[must_use]
    pub fn put(url: impl Into<String>, data: Value) -> Self {
        Self::new(HttpMethod::Put, url).with_data(data)
    }

    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    #[must_use]
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = (!params.is_empty()).then_some(params);
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Follow-up request for the next page: same method and headers, new
    /// absolute URL, no query parameters.
    #[must_use]
    pub fn follow(&self, next_url: impl Into<String>) -> Self {
        Self {
            url: next_url.into(),
            method: self.method,
            headers: self.headers.clone(),
            params: None,
            data: self.data.clone(),
        }
    }

    /// URL with the rendered query string appended.
    #[must_use]
    pub fn full_url(&self) -> String {
        match &self.params {
            Some(params) => append_query(&self.url, &params.to_query_string()),
            None => self.url.clone(),
        }
    }

    #[must_use]
    pub fn units(&self) -> u32 {
        self.method.units()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_units_per_method() {
        assert_eq!(HttpMethod::Get.units(), 1);
        assert_eq!(HttpMethod::Post.units(), 10);
        assert_eq!(HttpMethod::Put.units(), 10);
        assert_eq!(HttpMethod::Delete.units(), 10);
    }

    #[test]
    fn test_full_url_with_params() {
        let request = RequestDescriptor::get("https://api.test/Account/1/Item.json")
            .with_params(QueryParams::new().limit(100));
        assert_eq!(request.full_url(), "https://api.test/Account/1/Item.json?limit=100");
    }

    #[test]
    fn test_empty_params_are_dropped() {
        let request = RequestDescriptor::get("https://api.test/x").with_params(QueryParams::new());
        assert!(request.params.is_none());
        assert_eq!(request.full_url(), "https://api.test/x");
    }

    #[test]
    fn test_follow_keeps_method_and_headers_but_drops_params() {
        let request = RequestDescriptor::get("https://api.test/x")
            .with_header("X-Trace", "1")
            .with_params(QueryParams::new().limit(2));
        let next = request.follow("https://api.test/x?after=abc");
        assert_eq!(next.method, HttpMethod::Get);
        assert_eq!(next.headers, vec![("X-Trace".to_string(), "1".to_string())]);
        assert!(next.params.is_none());
        assert_eq!(next.full_url(), "https://api.test/x?after=abc");
    }

    #[test]
    fn test_post_carries_body() {
        let request = RequestDescriptor::post("https://api.test/Item.json", json!({"description": "Mug"}));
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.data, Some(json!({"description": "Mug"})));
    }
}
