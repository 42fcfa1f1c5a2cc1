//! Port interface for fetching a single page

use async_trait::async_trait;
use lightspeed_domain::{ApiResponse, RequestDescriptor, Result};

/// Executes one list request and returns the parsed envelope.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: &RequestDescriptor) -> Result<ApiResponse>;
}
