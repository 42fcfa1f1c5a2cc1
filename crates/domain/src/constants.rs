//! Client constants
//!
//! Centralized location for endpoint URLs, header names and the request
//! pacing/retry defaults.

// Endpoints
pub const BASE_URL: &str = "https://api.lightspeedapp.com/API/V3/Account";
pub const TOKEN_URL: &str = "https://cloud.lightspeedapp.com/auth/oauth/token";
pub const REFRESH_GRANT_TYPE: &str = "refresh_token";

// Token lifecycle
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

// Retry policy
pub const MAX_RETRIES: u32 = 3;
pub const RETRY_BACKOFF_MS: u64 = 2000;

// Rate limiting (leaky bucket accounting)
pub const BUCKET_LEVEL_HEADER: &str = "x-ls-api-bucket-level";
pub const DRIP_RATE_HEADER: &str = "x-ls-api-drip-rate";
pub const GET_REQUEST_UNITS: u32 = 1;
pub const WRITE_REQUEST_UNITS: u32 = 10;

// Response envelope
pub const ENVELOPE_ATTRIBUTES_KEY: &str = "@attributes";

/// Server-side maximum page size for list endpoints.
pub const MAX_PAGE_SIZE: u32 = 100;

// Storage defaults
pub const DEFAULT_TOKEN_FILE: &str = ".lightspeed-tokens.json";
pub const DEFAULT_STORAGE_CONFIG_FILE: &str = ".lightspeed-storage-config.json";
pub const DEFAULT_TOKEN_TABLE: &str = "oauth_tokens";
pub const DEFAULT_APP_ID: &str = "default";
pub const STORAGE_CONFIG_VERSION: &str = "1.0";
