//! OAuth token records and refresh-grant payloads

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, RetailError};

/// Persisted token state.
///
/// Every field is optional so that "nothing stored yet" round-trips as `{}`.
/// A record is always replaced wholesale; there are no partial updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Absolute expiry of `access_token` (ISO 8601, UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Lifetime reported by the server when the token was issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl TokenRecord {
    /// The empty record, written by an explicit reset.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the record persisted after a successful refresh grant.
    ///
    /// The refresh token is taken from the grant as-is: the previous one is
    /// single-use and must not survive a refresh.
    ///
    /// # Errors
    /// Returns [`RetailError::Auth`] when `expires_in` cannot be represented
    /// as an expiry timestamp.
    pub fn from_grant(grant: TokenGrant, issued_at: DateTime<Utc>) -> Result<Self> {
        let expires_at = Duration::try_seconds(grant.expires_in)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                RetailError::Auth(format!(
                    "token endpoint returned an unusable expires_in: {}",
                    grant.expires_in
                ))
            })?;

        Ok(Self {
            expires_at: Some(expires_at),
            expires_in: Some(grant.expires_in),
            access_token: Some(grant.access_token),
            refresh_token: grant.refresh_token,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.expires_at.is_none()
            && self.expires_in.is_none()
    }

    /// Non-empty access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Non-empty refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Cached access token when it stays valid for more than `buffer` past
    /// `now`.
    #[must_use]
    pub fn usable_access_token(&self, now: DateTime<Utc>, buffer: Duration) -> Option<&str> {
        let token = self.access_token()?;
        let expires_at = self.expires_at?;
        (expires_at - now > buffer).then_some(token)
    }

    /// `true` once `expires_at` is in the past. `None` when no expiry is
    /// recorded.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> Option<bool> {
        self.expires_at.map(|expires_at| expires_at < now)
    }

    /// Check the record invariant: an access token must come with an expiry.
    ///
    /// # Errors
    /// Returns [`RetailError::Storage`] when `access_token` is set without
    /// `expires_at`.
    pub fn validate(&self) -> Result<()> {
        if self.access_token.is_some() && self.expires_at.is_none() {
            return Err(RetailError::Storage(
                "token record has an access_token but no expires_at".to_string(),
            ));
        }
        Ok(())
    }
}

/// Token endpoint response for the `refresh_token` grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Snapshot of the stored token state, computed without network calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_expired: Option<bool>,
}

impl TokenInfo {
    #[must_use]
    pub fn from_record(record: &TokenRecord, now: DateTime<Utc>) -> Self {
        Self {
            has_access_token: record.access_token().is_some(),
            has_refresh_token: record.refresh_token().is_some(),
            expires_at: record.expires_at,
            is_expired: record.is_expired_at(now),
        }
    }
}
