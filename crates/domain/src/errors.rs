//! Error types used throughout the client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the Lightspeed Retail client
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum RetailError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {url}: {body}")]
    Http { status: u16, url: String, body: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Rate limit error: {0}")]
    RateLimit(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`RetailError`] used by retry and reporting
/// policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Missing or malformed configuration; raised before any network call.
    Configuration,
    /// Refresh grant rejected or repeated 401 after a forced refresh.
    Authentication,
    /// No response at all, or a 5xx; recovered by bounded retry.
    Transient,
    /// 4xx other than 401, or invalid call parameters.
    Client,
    /// Encrypted token data failed authentication or could not be decoded.
    Corruption,
    /// Everything else (storage, serialization, internal invariants).
    Internal,
}

impl RetailError {
    /// Build an HTTP status error.
    pub fn http(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Http { status, url: url.into(), body: body.into() }
    }

    /// HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` for a 401 response from the resource API.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Transient failures: no HTTP response at all, or a 5xx status.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }

    /// Get the error category for this error
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Configuration,
            Self::NoRefreshToken | Self::Auth(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Transient,
            Self::Http { status, .. } => match status {
                401 => ErrorCategory::Authentication,
                500..=599 => ErrorCategory::Transient,
                _ => ErrorCategory::Client,
            },
            Self::InvalidInput(_) | Self::RateLimit(_) => ErrorCategory::Client,
            Self::Decryption(_) => ErrorCategory::Corruption,
            Self::Storage(_) | Self::Serialization(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Stable label suitable for structured logging.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::NoRefreshToken => "no_refresh_token",
            Self::Auth(_) => "auth",
            Self::Network(_) => "network",
            Self::Http { .. } => "http",
            Self::InvalidInput(_) => "invalid_input",
            Self::Storage(_) => "storage",
            Self::Decryption(_) => "decryption",
            Self::RateLimit(_) => "rate_limit",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for RetailError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, RetailError>;
