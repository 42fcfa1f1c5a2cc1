//! Refresh-failure notifiers

pub mod tracing_notifier;
pub mod webhook;

pub use tracing_notifier::TracingNotifier;
pub use webhook::WebhookNotifier;
