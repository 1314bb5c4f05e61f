//! SMS log models.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::delivery::DeliveryReport;

/// Where an SMS ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Received, not yet processed.
    #[default]
    Pending,
    /// The mail server accepted the email.
    Sent,
    /// Delivery was attempted and failed.
    Failed,
    /// No enabled filter matched, so nothing was sent.
    Filtered,
    /// No email configuration existed at the time.
    NoConfig,
}

impl DeliveryStatus {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "sent" => Self::Sent,
            "failed" => Self::Failed,
            "filtered" => Self::Filtered,
            "no_config" => Self::NoConfig,
            _ => Self::Pending,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Filtered => "filtered",
            Self::NoConfig => "no_config",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One received SMS and its forwarding outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsMessage {
    /// Unique id.
    pub id: String,
    /// Phone number or name of the sender.
    pub sender: String,
    /// Message text.
    pub content: String,
    /// When the SMS was received.
    pub timestamp: DateTime<Utc>,
    /// True once the email was accepted.
    pub forwarded: bool,
    /// When the email was accepted.
    pub forwarded_at: Option<DateTime<Utc>>,
    /// Delivery status.
    pub email_status: DeliveryStatus,
    /// Failure reason when `email_status` is `failed`.
    pub error_message: Option<String>,
    /// Delivery attempts made.
    #[serde(default)]
    pub attempts: u32,
}

impl SmsMessage {
    /// Creates a pending record with a fresh id.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: sender.into(),
            content: content.into(),
            timestamp,
            forwarded: false,
            forwarded_at: None,
            email_status: DeliveryStatus::Pending,
            error_message: None,
            attempts: 0,
        }
    }

    /// Marks the record as not delivered for a reason other than a failure.
    pub fn skip(&mut self, status: DeliveryStatus) {
        self.email_status = status;
        self.forwarded = false;
        self.forwarded_at = None;
        self.error_message = None;
    }

    /// Applies the result of a delivery attempt.
    pub fn record_delivery(&mut self, report: &DeliveryReport, at: DateTime<Utc>) {
        self.email_status = report.status;
        self.attempts = report.attempts;
        self.forwarded = report.status == DeliveryStatus::Sent;
        self.forwarded_at = self.forwarded.then_some(at);
        self.error_message =
            (report.status == DeliveryStatus::Failed).then(|| report.message.clone());
    }
}

/// Incoming SMS as posted by a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardRequest {
    /// Sender.
    pub sender: String,
    /// Message text.
    pub content: String,
    /// Receive time; defaults to now.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ForwardRequest {
    /// Creates a request stamped on arrival.
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            timestamp: None,
        }
    }
}

/// Parses RFC 3339, or a zone-less date-time taken as UTC.
///
/// Only years 0 through 9999 (in UTC) are accepted; stored timestamps are
/// fixed-width text.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let parsed = DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|naive| naive.and_utc())
        })?;
    (0..=9999).contains(&parsed.year()).then_some(parsed)
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
    }
}

/// Aggregate counters over the SMS log.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SmsStats {
    /// All records.
    pub total_messages: u64,
    /// Records with `forwarded` set.
    pub forwarded_messages: u64,
    /// Records with status `failed`.
    pub failed_messages: u64,
    /// Records received since UTC midnight.
    pub today_messages: u64,
    /// Of those, the forwarded ones.
    pub today_forwarded: u64,
    /// Forwarded share of the total, in percent.
    pub forwarding_rate: f64,
}

impl SmsStats {
    /// Builds stats from raw counts, deriving the rate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_counts(
        total_messages: u64,
        forwarded_messages: u64,
        failed_messages: u64,
        today_messages: u64,
        today_forwarded: u64,
    ) -> Self {
        let forwarding_rate = if total_messages == 0 {
            0.0
        } else {
            forwarded_messages as f64 / total_messages as f64 * 100.0
        };
        Self {
            total_messages,
            forwarded_messages,
            failed_messages,
            today_messages,
            today_forwarded,
            forwarding_rate,
        }
    }
}
