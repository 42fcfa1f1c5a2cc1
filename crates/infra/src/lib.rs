//! # Lightspeed Infrastructure
//!
//! Infrastructure implementations of the `lightspeed-core` ports.
//!
//! This crate contains:
//! - Token stores: in-memory, JSON file, AES-256-GCM encrypted wrapper and
//!   SQLite, plus storage configuration and auto-discovery
//! - The OAuth token endpoint client
//! - The HTTP request executor (rate-limit pacing, 401 re-auth, retries)
//! - Refresh-failure notifiers
//! - Configuration loading
//! - The [`LightspeedClient`] facade and resource endpoints
//!
//! ## Architecture
//! - Implements traits defined in `lightspeed-core`
//! - Depends on `lightspeed-domain` and `lightspeed-core`
//! - Contains all "impure" code (network, filesystem, database)

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod http;
pub mod notify;
pub mod storage;

// Re-export commonly used items
pub use api::{
    LightspeedClient, LightspeedClientBuilder, PingReport, PingStatus, RefreshOutcome, Resource,
    ResourceApi,
};
pub use auth::OAuthTokenClient;
pub use config::LightspeedSettings;
pub use crypto::{EncryptedPayload, EncryptionService};
pub use errors::{to_retail, InfraError};
pub use http::{HttpClient, RequestExecutor, RetryPolicy};
pub use notify::{TracingNotifier, WebhookNotifier};
pub use storage::*;
