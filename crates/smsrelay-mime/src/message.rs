//! Message assembly.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::address::Mailbox;
use crate::content_type::ContentType;
use crate::encoding::{encode_base64_lines, encode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::{Headers, unstructured};

/// Content-Transfer-Encoding of a body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII, lines passed through.
    SevenBit,
    /// Quoted-printable.
    QuotedPrintable,
    /// Base64.
    Base64,
}

impl TransferEncoding {
    /// Returns the header token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::QuotedPrintable => "quoted-printable",
            Self::Base64 => "base64",
        }
    }

    fn apply(self, content: &str) -> String {
        match self {
            Self::SevenBit => content.replace("\r\n", "\n").replace('\n', "\r\n"),
            Self::QuotedPrintable => encode_quoted_printable(content),
            Self::Base64 => encode_base64_lines(content.as_bytes()),
        }
    }
}

/// A single leaf body part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    content_type: ContentType,
    encoding: TransferEncoding,
    content: String,
}

impl Body {
    /// A UTF-8 `text/plain` part. ASCII text goes out as 7bit, anything
    /// else as quoted-printable.
    pub fn text(content: impl Into<String>) -> Self {
        let content = content.into();
        let encoding = if content.is_ascii() && content.lines().all(|l| l.len() <= 998) {
            TransferEncoding::SevenBit
        } else {
            TransferEncoding::QuotedPrintable
        };
        Self {
            content_type: ContentType::text_plain(),
            encoding,
            content,
        }
    }

    /// Overrides the transfer encoding.
    #[must_use]
    pub const fn with_encoding(mut self, encoding: TransferEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Returns the transfer encoding.
    #[must_use]
    pub const fn encoding(&self) -> TransferEncoding {
        self.encoding
    }

    /// Returns the unencoded content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    fn part_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.set("Content-Type", self.content_type.to_string());
        headers.set("Content-Transfer-Encoding", self.encoding.as_str());
        headers
    }

    fn encoded(&self) -> String {
        let mut encoded = self.encoding.apply(&self.content);
        if !encoded.ends_with("\r\n") {
            encoded.push_str("\r\n");
        }
        encoded
    }
}

/// A rendered message ready for SMTP `DATA`.
#[derive(Debug, Clone)]
pub struct Message {
    headers: Headers,
    raw: Vec<u8>,
}

impl Message {
    /// Returns the top-level headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the `Message-ID` header value.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers.get("Message-ID")
    }

    /// Returns the full wire form.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Consumes the message, returning the wire form.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.raw
    }
}

/// Builder for outbound messages.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<Mailbox>,
    to: Vec<Mailbox>,
    subject: Option<String>,
    date: Option<DateTime<Utc>>,
    body: Option<Body>,
    multipart: bool,
    extra: Headers,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the author.
    #[must_use]
    pub fn from(mut self, mailbox: Mailbox) -> Self {
        self.from = Some(mailbox);
        self
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, mailbox: Mailbox) -> Self {
        self.to.push(mailbox);
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the `Date` header. Defaults to the build time.
    #[must_use]
    pub const fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets a plain text body.
    #[must_use]
    pub fn text_body(self, text: impl Into<String>) -> Self {
        self.body(Body::text(text))
    }

    /// Sets the body part.
    #[must_use]
    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Wraps the body in a `multipart/mixed` container.
    #[must_use]
    pub const fn multipart(mut self, multipart: bool) -> Self {
        self.multipart = multipart;
        self
    }

    /// Adds a custom header such as `X-Mailer`.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.add(name, value);
        self
    }

    /// Renders the message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingHeader`] without a sender or recipient,
    /// [`Error::InvalidAddress`] for a malformed mailbox, and
    /// [`Error::InvalidHeader`] for a custom header that cannot be written.
    pub fn build(self) -> Result<Message> {
        let from = self.from.ok_or(Error::MissingHeader("From"))?;
        if self.to.is_empty() {
            return Err(Error::MissingHeader("To"));
        }
        from.validate()?;
        for mailbox in &self.to {
            mailbox.validate()?;
        }

        let domain = from
            .address()
            .rsplit_once('@')
            .map_or("localhost", |(_, domain)| domain);
        let date = self.date.unwrap_or_else(Utc::now);
        let body = self.body.unwrap_or_else(|| Body::text(""));

        let mut headers = Headers::new();
        headers.set("Date", date.to_rfc2822());
        headers.set("From", from.to_string());
        headers.set(
            "To",
            self.to
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        );
        headers.set("Subject", unstructured(self.subject.as_deref().unwrap_or("")));
        headers.set("Message-ID", format!("<{}@{domain}>", Uuid::new_v4().simple()));
        headers.set("MIME-Version", "1.0");
        for (name, value) in self.extra.iter() {
            headers.add(name, value);
        }

        let content = if self.multipart {
            let boundary = format!("=_part_{}", Uuid::new_v4().simple());
            headers.set(
                "Content-Type",
                ContentType::multipart_mixed(boundary.as_str()).to_string(),
            );
            let mut content = String::from("This is a multi-part message in MIME format.\r\n");
            content.push_str(&format!("\r\n--{boundary}\r\n"));
            content.push_str(&body.part_headers().render()?);
            content.push_str("\r\n");
            content.push_str(&body.encoded());
            content.push_str(&format!("--{boundary}--\r\n"));
            content
        } else {
            for (name, value) in body.part_headers().iter() {
                headers.set(name, value);
            }
            body.encoded()
        };

        let mut raw = headers.render()?;
        raw.push_str("\r\n");
        raw.push_str(&content);

        Ok(Message {
            headers,
            raw: raw.into_bytes(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn builder() -> MessageBuilder {
        MessageBuilder::new()
            .from(Mailbox::with_name("SMS Forwarder", "relay@example.com"))
            .to(Mailbox::new("me@example.org"))
            .subject("SMS from +15551234567")
            .date(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
    }

    fn text(message: &Message) -> String {
        String::from_utf8(message.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn single_part_message() {
        let message = builder().text_body("Your code is 1234").build().unwrap();
        let raw = text(&message);

        assert!(raw.starts_with("Date: "));
        assert!(raw.contains("Mar 2024 12:30:00 +0000\r\n"));
        assert!(raw.contains("From: SMS Forwarder <relay@example.com>\r\n"));
        assert!(raw.contains("To: <me@example.org>\r\n"));
        assert!(raw.contains("Subject: SMS from +15551234567\r\n"));
        assert!(raw.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(raw.contains("Content-Transfer-Encoding: 7bit\r\n"));
        assert!(raw.ends_with("\r\n\r\nYour code is 1234\r\n"));
    }

    #[test]
    fn message_id_uses_sender_domain() {
        let message = builder().build().unwrap();
        let id = message.message_id().unwrap();
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@example.com>"));
    }

    #[test]
    fn multipart_wraps_text_part() {
        let message = builder()
            .multipart(true)
            .text_body("Привет")
            .build()
            .unwrap();
        let raw = text(&message);

        let content_type = message.headers().get("Content-Type").unwrap();
        assert!(content_type.starts_with("multipart/mixed; boundary="));
        let boundary = content_type
            .split("boundary=")
            .nth(1)
            .unwrap()
            .trim_matches('"');

        assert!(raw.contains(&format!("\r\n--{boundary}\r\nContent-Type: text/plain; charset=utf-8\r\n")));
        assert!(raw.contains("Content-Transfer-Encoding: quoted-printable\r\n"));
        assert!(raw.contains("=D0=9F"));
        assert!(raw.ends_with(&format!("--{boundary}--\r\n")));
        assert!(message.headers().get("Content-Transfer-Encoding").is_none());
    }

    #[test]
    fn non_ascii_subject_is_encoded() {
        let message = builder().subject("SMS from Zoë").build().unwrap();
        assert_eq!(
            message.headers().get("Subject"),
            Some("=?utf-8?B?U01TIGZyb20gWm/Dqw==?=")
        );
        assert!(message.as_bytes().is_ascii());
    }

    #[test]
    fn long_sender_subject_keeps_lines_short() {
        let subject = format!("SMS from {}", "7".repeat(1500));
        let message = builder().subject(&subject).build().unwrap();
        let raw = String::from_utf8(message.as_bytes().to_vec()).unwrap();
        let (head, _) = raw.split_once("\r\n\r\n").unwrap();
        for line in head.split("\r\n") {
            assert!(line.len() <= 998, "{}", line.len());
        }
        assert!(message.headers().get("Subject").unwrap().starts_with("=?utf-8?B?"));
    }

    #[test]
    fn custom_headers_are_kept() {
        let message = builder().header("X-Mailer", "smsrelay").build().unwrap();
        assert_eq!(message.headers().get("X-Mailer"), Some("smsrelay"));
    }

    #[test]
    fn missing_parts_are_errors() {
        let err = MessageBuilder::new()
            .to(Mailbox::new("me@example.org"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingHeader("From")));

        let err = MessageBuilder::new()
            .from(Mailbox::new("relay@example.com"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingHeader("To")));

        let err = builder().to(Mailbox::new("broken")).build().unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
    }

    #[test]
    fn base64_override() {
        let message = builder()
            .body(Body::text("hello").with_encoding(TransferEncoding::Base64))
            .build()
            .unwrap();
        assert!(text(&message).ends_with("\r\n\r\naGVsbG8=\r\n"));
    }
}
