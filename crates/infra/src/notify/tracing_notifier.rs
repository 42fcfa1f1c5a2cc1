use async_trait::async_trait;
use lightspeed_core::{RefreshFailure, RefreshFailureNotifier};
use lightspeed_domain::Result;
use tracing::error;

/// Reports refresh failures as structured `error` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl RefreshFailureNotifier for TracingNotifier {
    async fn notify(&self, failure: &RefreshFailure) -> Result<()> {
        error!(
            account_id = %failure.account_id,
            error_kind = failure.error.label(),
            error = %failure.error,
            occurred_at = %failure.occurred_at.to_rfc3339(),
            "Lightspeed token refresh failed; manual re-authorization may be required"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use lightspeed_domain::RetailError;

    use super::*;

    #[tokio::test]
    async fn never_fails() {
        let failure = RefreshFailure {
            account_id: "1".into(),
            error: RetailError::Auth("rejected".into()),
            occurred_at: Utc::now(),
        };
        assert!(TracingNotifier.notify(&failure).await.is_ok());
    }
}
