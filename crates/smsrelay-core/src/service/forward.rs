//! The forwarding pipeline: filter, deliver, record.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::delivery::Mailer;
use crate::filter::{FilterDecision, evaluate};
use crate::sms::{DeliveryStatus, ForwardRequest, SmsMessage};
use crate::validation::validate_recipient;
use crate::{Error, Result, Store};

/// Sender shown on test emails.
pub const TEST_SENDER: &str = "Test Sender";

/// Body of a test email when none is given.
pub const DEFAULT_TEST_MESSAGE: &str = "This is a test email from SMS Mail Forwarder";

/// Reported when no filter let an SMS through.
pub const FILTERED_MESSAGE: &str = "SMS filtered, not forwarded";

/// What happened to a forwarded SMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardOutcome {
    /// Final status of the record.
    pub status: DeliveryStatus,
    /// Human-readable result.
    pub message: String,
    /// Id of the stored record; absent for filtered SMS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_id: Option<String>,
}

/// Result of a test email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    /// `sent` or `failed`.
    pub status: DeliveryStatus,
    /// Human-readable result.
    pub message: String,
}

/// Runs received SMS through filters and delivery, recording each one.
#[derive(Clone)]
pub struct ForwardService {
    store: Store,
    mailer: Arc<dyn Mailer>,
}

impl std::fmt::Debug for ForwardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ForwardService {
    /// Creates the service.
    pub fn new(store: Store, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Processes one received SMS.
    ///
    /// Every SMS is recorded exactly once, after its outcome is known.
    /// Delivery failures are reported in the outcome, not as errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConfigured`] (after recording the SMS as
    /// `no_config`) when no email configuration exists, or a database error.
    #[instrument(skip_all, fields(sender = %request.sender))]
    pub async fn forward(&self, request: ForwardRequest) -> Result<ForwardOutcome> {
        let ForwardRequest {
            sender,
            content,
            timestamp,
        } = request;
        let mut sms = SmsMessage::new(sender, content, timestamp.unwrap_or_else(Utc::now));

        let filters = self.store.filters().list_enabled().await?;
        match evaluate(&filters, &sms.sender, &sms.content) {
            FilterDecision::Filtered => {
                sms.skip(DeliveryStatus::Filtered);
                self.store.messages().insert(&sms).await?;
                info!(sms_id = %sms.id, status = %sms.email_status, "SMS filtered");
                return Ok(ForwardOutcome {
                    status: DeliveryStatus::Filtered,
                    message: FILTERED_MESSAGE.to_string(),
                    sms_id: None,
                });
            }
            FilterDecision::Matched(filter) => {
                info!(sms_id = %sms.id, filter = %filter, "SMS matched filter");
            }
            FilterDecision::NoFilters => {}
        }

        let Some(config) = self.store.email_configs().current().await? else {
            sms.skip(DeliveryStatus::NoConfig);
            self.store.messages().insert(&sms).await?;
            warn!(sms_id = %sms.id, status = %sms.email_status, "no email configuration");
            return Err(Error::NotConfigured);
        };

        let report = self.mailer.deliver(&config, &sms).await;
        sms.record_delivery(&report, Utc::now());
        self.store.messages().insert(&sms).await?;
        info!(
            sms_id = %sms.id,
            status = %sms.email_status,
            attempts = sms.attempts,
            "SMS processed"
        );

        Ok(ForwardOutcome {
            status: report.status,
            message: report.message,
            sms_id: Some(sms.id),
        })
    }

    /// Sends a test email through the current configuration to `recipient`.
    ///
    /// The test SMS is not recorded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a bad recipient,
    /// [`Error::NotConfigured`] when no configuration exists, or a
    /// database error.
    #[instrument(skip_all, fields(recipient = %recipient))]
    pub async fn send_test(&self, recipient: &str, text: Option<&str>) -> Result<TestOutcome> {
        validate_recipient(recipient).map_err(Error::Validation)?;

        let mut config = self
            .store
            .email_configs()
            .current()
            .await?
            .ok_or(Error::NotConfigured)?;
        config.recipient_email = recipient.trim().to_string();

        let sms = SmsMessage::new(
            TEST_SENDER,
            text.unwrap_or(DEFAULT_TEST_MESSAGE),
            Utc::now(),
        );
        let report = self.mailer.deliver(&config, &sms).await;
        info!(status = %report.status, attempts = report.attempts, "test email finished");

        Ok(TestOutcome {
            status: report.status,
            message: report.message,
        })
    }
}
