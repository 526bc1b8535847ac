//! Outbound alert notifications.

pub mod email;
pub mod templates;

pub use email::SendGridNotifier;
pub use templates::{NotificationTemplates, RenderedMessage};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("notifier not configured: {0}")]
    NotConfigured(&'static str),
    #[error("failed to render message: {0}")]
    Template(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("notifier call timed out")]
    Timeout,
}

/// Delivers a rendered message to a recipient address.
///
/// Failures are reported to the caller, which decides what to do with them; the
/// alert engine records them on the audit event instead of propagating.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifierError>;
}
