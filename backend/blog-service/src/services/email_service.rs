/// Email service for sending password reset emails
use crate::config::EmailConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

/// Outgoing mail
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// Subject and plain text body of the reset email
pub fn password_reset_message(link: &str) -> (String, String) {
    let subject = "Password Reset Request".to_string();
    let body = format!(
        "To reset your password, visit the following link:\n{}\n\n\
         If you did not make this request then simply ignore this email and no changes will be made.\n",
        link
    );
    (subject, body)
}

/// Async SMTP transport wrapper (SMTP or no-op)
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the mailer from configuration
    ///
    /// If SMTP host is empty, operates in no-op mode (logs only).
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; email service will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.to_string(), password.to_string()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    /// Check if SMTP transport is enabled
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let Some(transport) = &self.transport else {
            info!(
                subject,
                recipient, "Email service running in no-op mode; skipping actual send"
            );
            return Ok(());
        };

        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| AppError::Email(format!("Invalid recipient email address: {}", e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        transport.send(email).await?;
        info!(subject, "email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_mode_accepts_mail() {
        let mailer = SmtpMailer::new(&crate::config::Config::default().email).unwrap();
        assert!(!mailer.is_enabled());
        mailer
            .send("someone@example.com", "subject", "body")
            .await
            .unwrap();
    }

    #[test]
    fn test_configured_host_enables_transport() {
        let mut config = crate::config::Config::default().email;
        config.smtp_host = "smtp.example.com".to_string();
        let mailer = SmtpMailer::new(&config).unwrap();
        assert!(mailer.is_enabled());
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let mut config = crate::config::Config::default().email;
        config.smtp_from = "not an address".to_string();
        assert!(SmtpMailer::new(&config).is_err());
    }

    #[test]
    fn test_reset_message_contains_link() {
        let (subject, body) = password_reset_message("http://localhost/resetpassword/abc");
        assert_eq!(subject, "Password Reset Request");
        assert!(body.contains("http://localhost/resetpassword/abc"));
    }
}
