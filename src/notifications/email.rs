use async_trait::async_trait;
use sendgrid::SGClient;
use sendgrid::{Destination, Mail};
use std::env;
use tracing::{error, info, warn};

use super::{Notifier, NotifierError};

/// Sends alert emails through SendGrid.
///
/// Missing credentials are not fatal at start-up: every send then fails with
/// [`NotifierError::NotConfigured`], which the engine records on the event.
///
/// The SendGrid client is blocking, so it is created, used and dropped on a
/// blocking thread for each send and never touches the async runtime.
#[derive(Clone, Debug)]
pub struct SendGridNotifier {
    api_key: Option<String>,
    email_from: Option<String>,
    host: Option<String>,
}

impl SendGridNotifier {
    pub fn new(api_key: Option<String>, email_from: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.is_empty());
        let email_from = email_from.filter(|f| !f.is_empty());

        if api_key.is_none() {
            warn!("SENDGRID_API_KEY not set, alert emails will fail and be recorded as unsent");
        }
        if email_from.is_none() {
            warn!("NOTIFICATION_EMAIL_FROM not set, alert emails will fail and be recorded as unsent");
        }

        Self {
            api_key,
            email_from,
            host: None,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            env::var("SENDGRID_API_KEY").ok(),
            env::var("NOTIFICATION_EMAIL_FROM").ok(),
        )
    }

    /// Overrides the SendGrid endpoint, e.g. for a relay or a local sink.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifierError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or(NotifierError::NotConfigured("SENDGRID_API_KEY is not set"))?;
        let email_from = self
            .email_from
            .clone()
            .ok_or(NotifierError::NotConfigured("NOTIFICATION_EMAIL_FROM is not set"))?;

        // Owned copies for the blocking closure
        let host = self.host.clone();
        let to = recipient.to_string();
        let subject = subject.to_string();
        let body = body.to_string();

        let outcome = tokio::task::spawn_blocking(move || {
            let mut client = SGClient::new(api_key);
            if let Some(host) = host {
                client.set_host(host);
            }
            let mail = Mail::new()
                .add_to(Destination {
                    address: &to,
                    name: &to,
                })
                .add_from(&email_from)
                .add_subject(&subject)
                .add_html(&body);

            client.send(mail).map(|_| ())
        })
        .await;

        match outcome {
            Ok(Ok(())) => {
                info!(recipient, "Alert email sent");
                crate::metrics::increment_notifications_sent("email");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(recipient, error = %e, "Failed to send alert email");
                crate::metrics::increment_notifications_failed("email");
                Err(NotifierError::Delivery(format!("SendGrid error: {}", e)))
            }
            Err(e) => {
                error!(recipient, error = %e, "Alert email task failed");
                crate::metrics::increment_notifications_failed("email");
                Err(NotifierError::Delivery(format!("email task failed: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_notifier_fails_every_send() {
        let notifier = SendGridNotifier::new(None, Some("alerts@example.com".into()));
        let err = notifier
            .send("ops@example.com", "subject", "<p>body</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifierError::NotConfigured(_)));

        let notifier = SendGridNotifier::new(Some("key".into()), Some(String::new()));
        let err = notifier
            .send("ops@example.com", "subject", "<p>body</p>")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("NOTIFICATION_EMAIL_FROM"));
    }

    #[tokio::test]
    async fn configured_send_runs_inside_the_runtime() {
        // Nothing listens on the discard port, so the request is refused
        let notifier = SendGridNotifier::new(
            Some("SG.not-a-real-key".into()),
            Some("alerts@example.com".into()),
        )
        .with_host("http://127.0.0.1:9/api/mail.send.json?");

        let err = notifier
            .send("ops@example.com", "subject", "<p>body</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifierError::Delivery(_)));

        // Dropping the notifier inside the runtime is fine too
        drop(notifier);
    }
}
