//! SMTP delivery of the digest.
//!
//! Sends one multipart message (plain text + HTML) to every recipient over a
//! STARTTLS relay authenticated as the sender.

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use tracing::{info, instrument};

use super::DigestSink;
use crate::config::SmtpSettings;
use crate::digest::Digest;
use crate::error::DeliveryError;

pub struct SmtpSink {
    sender: Mailbox,
    recipients: Vec<Mailbox>,
    server: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl fmt::Debug for SmtpSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSink")
            .field("sender", &self.sender.to_string())
            .field("recipients", &self.recipients.len())
            .field("server", &self.server)
            .finish()
    }
}

fn mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|source| DeliveryError::Address {
            address: address.to_string(),
            source,
        })
}

impl SmtpSink {
    /// Build a STARTTLS relay transport from the mail settings.
    ///
    /// # Arguments
    ///
    /// * `settings` - Server, port, sender credentials and recipient list
    ///
    /// # Returns
    ///
    /// [`DeliveryError::NotConfigured`] when the sender, password or every
    /// recipient is missing, and [`DeliveryError::Address`] for an address
    /// that does not parse.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let sink = SmtpSink::new(&settings.smtp)?;
    /// sink.deliver(&Digest::new(today, articles)).await?;
    /// ```
    pub fn new(settings: &SmtpSettings) -> Result<Self, DeliveryError> {
        let sender = settings
            .sender
            .as_deref()
            .ok_or_else(|| DeliveryError::NotConfigured("no sender address".to_string()))?;
        let password = settings
            .password
            .as_deref()
            .ok_or_else(|| DeliveryError::NotConfigured("no sender password".to_string()))?;
        let recipients = settings
            .recipients
            .iter()
            .filter(|r| !r.trim().is_empty())
            .map(|r| mailbox(r))
            .collect::<Result<Vec<_>, _>>()?;
        if recipients.is_empty() {
            return Err(DeliveryError::NotConfigured("no recipients".to_string()));
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)?
            .port(settings.port)
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .build();

        Ok(Self {
            sender: mailbox(sender)?,
            recipients,
            server: settings.server.clone(),
            transport,
        })
    }

    fn message(&self, digest: &Digest) -> Result<Message, DeliveryError> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(digest.subject());
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }
        let message = builder.multipart(MultiPart::alternative_plain_html(
            digest.to_text(),
            digest.to_html(),
        ))?;
        Ok(message)
    }
}

impl DigestSink for SmtpSink {
    #[instrument(level = "info", skip_all, fields(server = %self.server))]
    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError> {
        let message = self.message(digest)?;
        self.transport.send(message).await?;
        info!(
            recipients = self.recipients.len(),
            articles = digest.articles.len(),
            "Email sent successfully"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            sender: Some("digest@example.com".to_string()),
            password: Some("secret".to_string()),
            recipients: vec!["a@example.com".to_string(), " b@example.com".to_string()],
            ..SmtpSettings::default()
        }
    }

    #[tokio::test]
    async fn test_message_addresses_every_recipient() {
        let sink = SmtpSink::new(&settings()).unwrap();
        let digest = Digest::new(NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(), vec![]);

        let raw = String::from_utf8(sink.message(&digest).unwrap().formatted()).unwrap();
        assert!(raw.contains("From: digest@example.com"));
        assert!(raw.contains("a@example.com"));
        assert!(raw.contains("b@example.com"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[test]
    fn test_missing_recipients_not_configured() {
        let mut settings = settings();
        settings.recipients.clear();
        assert!(matches!(
            SmtpSink::new(&settings),
            Err(DeliveryError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_missing_password_not_configured() {
        let mut settings = settings();
        settings.password = None;
        assert!(matches!(
            SmtpSink::new(&settings),
            Err(DeliveryError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        let mut settings = settings();
        settings.recipients = vec!["not-an-address".to_string()];
        assert!(matches!(
            SmtpSink::new(&settings),
            Err(DeliveryError::Address { .. })
        ));
    }
}
