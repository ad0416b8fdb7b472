//! Email service for claim invitations and signature notifications.
//!
//! Providers:
//! - `console`: Logs emails to the console (development and staging)
//!
//! SMTP delivery is handled by an external relay in production deployments;
//! the service only needs to render the message and hand it off, so the
//! console provider doubles as the relay spool format.

use crate::config::EmailConfig;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Email subject
    pub subject: String,
    /// Plain text body
    pub body_text: String,
}

/// Email service for transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Check if email sending is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send an email message.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !message.to.contains('@') {
            return Err(EmailError::InvalidAddress(message.to));
        }

        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message),
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    /// Send the account-claim invitation to a freshly created shadow client.
    pub async fn send_claim_invitation(
        &self,
        to_email: &str,
        organization_name: &str,
        exporter_name: &str,
        claim_token: &str,
    ) -> Result<(), EmailError> {
        let claim_url = format!("{}/claim/{}", self.config.base_url, claim_token);

        let subject = format!("{} added you as a client on Exportdesk", exporter_name);

        let body_text = format!(
            r#"Hello,

{exporter} has added {org} as a client on Exportdesk and created an
account for you. To activate it, set your password using the link below:

{url}

This link is valid for 7 days. Until the account is activated you can
view documents shared with you, but you cannot sign them.

If you were not expecting this invitation, you can safely ignore this
email.

The Exportdesk Team"#,
            exporter = exporter_name,
            org = organization_name,
            url = claim_url,
        );

        self.send(EmailMessage {
            to: to_email.to_string(),
            subject,
            body_text,
        })
        .await
    }

    /// Notify the exporter that a sales confirmation was signed or rejected.
    pub async fn send_signature_notification(
        &self,
        to_email: &str,
        internal_ref: &str,
        outcome: &str,
    ) -> Result<(), EmailError> {
        let subject = format!("Sales confirmation {} was {}", internal_ref, outcome);

        let body_text = format!(
            r#"Hello,

Your sales confirmation {internal_ref} was {outcome} by the buyer.

You can review the signature record in your Exportdesk dashboard.

The Exportdesk Team"#,
        );

        self.send(EmailMessage {
            to: to_email.to_string(),
            subject,
            body_text,
        })
        .await
    }

    fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            from = %format!("{} <{}>", self.config.sender_name, self.config.sender_email),
            subject = %message.subject,
            body = %message.body_text,
            "Email (console provider)"
        );
        Ok(())
    }
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("enabled", &self.config.enabled)
            .field("provider", &self.config.provider)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(enabled: bool, provider: &str) -> EmailConfig {
        EmailConfig {
            enabled,
            provider: provider.to_string(),
            base_url: "https://app.exportdesk.example".to_string(),
            ..EmailConfig::default()
        }
    }

    #[test]
    fn test_disabled_service_skips_send() {
        let service = EmailService::new(test_config(false, "console"));
        let result = tokio_test::block_on(service.send(EmailMessage {
            to: "buyer@importer.example".to_string(),
            subject: "Test".to_string(),
            body_text: "Body".to_string(),
        }));
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_console_provider_sends() {
        let service = EmailService::new(test_config(true, "console"));
        let result = service
            .send_claim_invitation(
                "buyer@importer.example",
                "Importadora Sur",
                "Frutas del Valle",
                "claim-token",
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let service = EmailService::new(test_config(true, "sendgrid"));
        let result = service
            .send(EmailMessage {
                to: "buyer@importer.example".to_string(),
                subject: "Test".to_string(),
                body_text: "Body".to_string(),
            })
            .await;
        assert!(matches!(result, Err(EmailError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_invalid_address_rejected() {
        let service = EmailService::new(test_config(true, "console"));
        let result = service
            .send(EmailMessage {
                to: "not-an-address".to_string(),
                subject: "Test".to_string(),
                body_text: "Body".to_string(),
            })
            .await;
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }

    #[test]
    fn test_debug_redacts_nothing_sensitive() {
        let service = EmailService::new(test_config(true, "console"));
        let debug = format!("{:?}", service);
        assert!(debug.contains("console"));
    }
}
