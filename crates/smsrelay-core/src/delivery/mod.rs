//! Getting a forwarded SMS into someone's mailbox.

mod compose;
mod retry;
mod smtp;

use async_trait::async_trait;

use crate::email::EmailConfig;
use crate::sms::{DeliveryStatus, SmsMessage};

pub use compose::{compose, render_body, subject_for};
pub use retry::RetryPolicy;
pub use smtp::{Connector, NetworkConnector, Security, SmtpMailer, SmtpOptions};

/// Text reported for a successful delivery.
pub const SENT_MESSAGE: &str = "Email sent successfully";

/// Result of one delivery, including all retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// `Sent` or `Failed`.
    pub status: DeliveryStatus,
    /// Success text or failure reason.
    pub message: String,
    /// Attempts made; 0 when nothing was tried.
    pub attempts: u32,
}

impl DeliveryReport {
    /// A successful delivery.
    #[must_use]
    pub fn sent(attempts: u32) -> Self {
        Self {
            status: DeliveryStatus::Sent,
            message: SENT_MESSAGE.to_string(),
            attempts,
        }
    }

    /// A failed delivery.
    pub fn failed(message: impl Into<String>, attempts: u32) -> Self {
        Self {
            status: DeliveryStatus::Failed,
            message: message.into(),
            attempts,
        }
    }

    /// Returns true if the mail server accepted the message.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

/// Delivers one SMS according to an email configuration.
///
/// Failures are part of the report rather than an `Err`: a failed delivery
/// is still an outcome to record.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers `sms` to `config.recipient_email`.
    async fn deliver(&self, config: &EmailConfig, sms: &SmsMessage) -> DeliveryReport;
}
