//! SMTP delivery with retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use smsrelay_smtp::{Client, Connected, Credentials, Envelope};
use tracing::{debug, info, warn};

use super::compose::compose;
use super::retry::RetryPolicy;
use super::{DeliveryReport, Mailer};
use crate::email::{DeliveryMethod, EmailConfig};
use crate::sms::SmsMessage;
use crate::validation::validate_smtp_settings;

/// How the SMTP connection gets encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// Plain connect, then STARTTLS.
    StartTls,
    /// TLS from the first byte (SMTPS).
    ImplicitTls,
}

impl Security {
    /// Maps the stored `use_tls` flag.
    #[must_use]
    pub const fn from_use_tls(use_tls: bool) -> Self {
        if use_tls { Self::StartTls } else { Self::ImplicitTls }
    }
}

/// Session settings that are not part of the stored configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpOptions {
    /// Limit for connecting and for each command.
    pub timeout: Duration,
    /// Name sent with EHLO.
    pub helo_name: String,
}

impl Default for SmtpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            helo_name: "localhost".to_string(),
        }
    }
}

/// Opens an SMTP session up to the point where it is greeted, identified
/// and encrypted.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to `host:port`.
    async fn open(
        &self,
        host: &str,
        port: u16,
        security: Security,
        options: &SmtpOptions,
    ) -> smsrelay_smtp::Result<Client<Connected>>;
}

/// Connects over TCP with TLS from the bundled web PKI roots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkConnector;

#[async_trait]
impl Connector for NetworkConnector {
    async fn open(
        &self,
        host: &str,
        port: u16,
        security: Security,
        options: &SmtpOptions,
    ) -> smsrelay_smtp::Result<Client<Connected>> {
        use smsrelay_smtp::connection::{connect, connect_tls};

        match security {
            Security::ImplicitTls => {
                let stream = connect_tls(host, port, options.timeout).await?;
                Client::greet(stream).await?.ehlo(&options.helo_name).await
            }
            Security::StartTls => {
                let stream = connect(host, port, options.timeout).await?;
                Client::greet(stream)
                    .await?
                    .ehlo(&options.helo_name)
                    .await?
                    .starttls(host)
                    .await
            }
        }
    }
}

/// [`Mailer`] that submits through the configured SMTP server.
#[derive(Clone)]
pub struct SmtpMailer {
    connector: Arc<dyn Connector>,
    options: SmtpOptions,
    retry: RetryPolicy,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("options", &self.options)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// Creates a mailer that connects over the network.
    #[must_use]
    pub fn new(options: SmtpOptions, retry: RetryPolicy) -> Self {
        Self::with_connector(Arc::new(NetworkConnector), options, retry)
    }

    /// Creates a mailer using a custom connector.
    #[must_use]
    pub fn with_connector(
        connector: Arc<dyn Connector>,
        options: SmtpOptions,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            connector,
            options,
            retry,
        }
    }

    /// One complete SMTP session.
    async fn submit(
        &self,
        config: &EmailConfig,
        envelope: &Envelope,
        message: &[u8],
    ) -> smsrelay_smtp::Result<()> {
        let host = config.smtp_server.as_deref().unwrap_or_default();
        let port = config.smtp_port.unwrap_or_default();
        let client = self
            .connector
            .open(host, port, Security::from_use_tls(config.use_tls), &self.options)
            .await?;

        let password = config.smtp_password.as_deref().unwrap_or_default();
        let result = if password.is_empty() {
            client.send_mail(envelope, message).await?.quit().await
        } else {
            let username = config.smtp_username.as_deref().unwrap_or_default();
            client
                .authenticate(&Credentials::new(username, password))
                .await?
                .send_mail(envelope, message)
                .await?
                .quit()
                .await
        };

        // The message is already accepted once DATA succeeded.
        if let Err(e) = result {
            debug!(error = %e, "QUIT failed after delivery");
        }
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn deliver(&self, config: &EmailConfig, sms: &SmsMessage) -> DeliveryReport {
        if config.email_type != DeliveryMethod::Smtp {
            return DeliveryReport::failed(
                format!("Email type {} not implemented yet", config.email_type),
                0,
            );
        }
        if let Err(errors) = validate_smtp_settings(config) {
            let reason = errors
                .iter()
                .map(|e| e.message())
                .collect::<Vec<_>>()
                .join("; ");
            return DeliveryReport::failed(reason, 0);
        }

        let message = match compose(config, sms) {
            Ok(message) => message,
            Err(e) => return DeliveryReport::failed(e.to_string(), 0),
        };
        let username = config.smtp_username.as_deref().unwrap_or_default();
        let envelope = match Envelope::new(username, [config.recipient_email.as_str()]) {
            Ok(envelope) => envelope,
            Err(e) => return DeliveryReport::failed(e.to_string(), 0),
        };

        let mut attempt = 1;
        loop {
            match self.submit(config, &envelope, message.as_bytes()).await {
                Ok(()) => {
                    info!(sms_id = %sms.id, attempt, "email accepted");
                    return DeliveryReport::sent(attempt);
                }
                Err(e) if e.is_transient() && self.retry.allows_retry_after(attempt) => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        sms_id = %sms.id,
                        attempt,
                        error = %e,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "transient SMTP failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(sms_id = %sms.id, attempt, error = %e, "SMTP delivery failed");
                    return DeliveryReport::failed(e.to_string(), attempt);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_tls_mapping() {
        assert_eq!(Security::from_use_tls(true), Security::StartTls);
        assert_eq!(Security::from_use_tls(false), Security::ImplicitTls);
    }

    #[test]
    fn test_default_options() {
        let options = SmtpOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.helo_name, "localhost");
    }
}
