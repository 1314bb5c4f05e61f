//! Turning an SMS into an email.

use smsrelay_mime::{Body, Mailbox, Message, MessageBuilder, TransferEncoding};

use crate::email::EmailConfig;
use crate::sms::SmsMessage;
use crate::{Error, Result};

/// Subject line for a forwarded SMS.
#[must_use]
pub fn subject_for(sms: &SmsMessage) -> String {
    format!("SMS from {}", sms.sender)
}

/// Plain text body for a forwarded SMS.
#[must_use]
pub fn render_body(sms: &SmsMessage) -> String {
    format!(
        "SMS Forwarded Message\n\
         \n\
         From: {sender}\n\
         Received: {received}\n\
         \n\
         Message:\n\
         {content}\n\
         \n\
         ---\n\
         This message was automatically forwarded by SMS Mail Forwarder\n",
        sender = sms.sender,
        received = sms.timestamp.format("%Y-%m-%d %H:%M:%S"),
        content = sms.content,
    )
}

/// Builds the full message sent for `sms` under `config`.
///
/// # Errors
///
/// Returns [`Error::Mime`] when the sender or recipient cannot be written
/// as an address, including a missing `smtp_username`.
pub fn compose(config: &EmailConfig, sms: &SmsMessage) -> Result<Message> {
    let from_address = config.smtp_username.as_deref().unwrap_or_default();
    MessageBuilder::new()
        .from(Mailbox::with_name(config.sender_name.as_str(), from_address))
        .to(Mailbox::new(config.recipient_email.as_str()))
        .subject(subject_for(sms))
        .body(Body::text(render_body(sms)).with_encoding(TransferEncoding::QuotedPrintable))
        .multipart(true)
        .header("X-Mailer", concat!("smsrelay/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(Error::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sms() -> SmsMessage {
        SmsMessage::new(
            "+15551234567",
            "Your code is 1234",
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 9, 10).unwrap(),
        )
    }

    fn config() -> EmailConfig {
        let mut config = EmailConfig::new("me@example.org");
        config.smtp_username = Some("relay@example.com".into());
        config
    }

    #[test]
    fn test_body_template() {
        assert_eq!(
            render_body(&sms()),
            "SMS Forwarded Message\n\nFrom: +15551234567\nReceived: 2024-06-01 08:09:10\n\n\
             Message:\nYour code is 1234\n\n---\n\
             This message was automatically forwarded by SMS Mail Forwarder\n"
        );
    }

    #[test]
    fn test_compose_headers() {
        let message = compose(&config(), &sms()).unwrap();
        let headers = message.headers();
        assert_eq!(headers.get("Subject"), Some("SMS from +15551234567"));
        assert_eq!(headers.get("From"), Some("SMS Forwarder <relay@example.com>"));
        assert_eq!(headers.get("To"), Some("<me@example.org>"));
        assert!(headers.get("Content-Type").unwrap().starts_with("multipart/mixed"));

        let raw = String::from_utf8(message.into_bytes()).unwrap();
        assert!(raw.contains("Content-Type: text/plain; charset=utf-8"));
        assert!(raw.contains("Content-Transfer-Encoding: quoted-printable"));
        assert!(raw.contains("Received: 2024-06-01 08:09:10"));
    }

    #[test]
    fn test_compose_non_ascii() {
        let mut sms = sms();
        sms.sender = "Zoë".into();
        sms.content = "Grüße".into();
        let raw = String::from_utf8(compose(&config(), &sms).unwrap().into_bytes()).unwrap();
        assert!(raw.is_ascii());
        assert!(raw.contains("quoted-printable"));
    }

    #[test]
    fn test_compose_requires_username() {
        let mut config = config();
        config.smtp_username = None;
        assert!(matches!(compose(&config, &sms()), Err(Error::Mime(_))));
    }
}
