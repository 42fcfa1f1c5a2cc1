//! # Lightspeed Core
//!
//! I/O-free services of the Lightspeed Retail client.
//!
//! This crate contains:
//! - Port interfaces (traits) for token storage, the OAuth token endpoint,
//!   refresh-failure notification and page fetching
//! - The token lifecycle manager
//! - The leaky-bucket rate limit tracker
//! - The pagination aggregator
//!
//! ## Architecture Principles
//! - Only depends on `lightspeed-domain`
//! - No database, HTTP, or filesystem code
//! - All external dependencies via traits

pub mod auth;
pub mod pagination;
pub mod rate_limit;

pub use auth::ports::{RefreshFailure, RefreshFailureNotifier, TokenEndpoint, TokenStorage};
pub use auth::{TokenManager, TokenState};
pub use pagination::ports::PageSource;
pub use pagination::{collect_all, PageCollection};
pub use rate_limit::{RateLimitState, RateLimitTracker};
