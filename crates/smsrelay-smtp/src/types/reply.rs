//! Server replies and their parsing.
//!
//! A reply is one or more lines sharing a three-digit code. Every line but
//! the last has a `-` after the code; the last has a space or nothing:
//!
//! ```text
//! 250-mx.example.com greets you
//! 250-SIZE 35882577
//! 250 STARTTLS
//! ```

use crate::error::{Error, Result};

/// Three-digit SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication succeeded
    pub const AUTH_SUCCEEDED: Self = Self(235);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 334 Server challenge
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);
    /// 421 Service not available, closing transmission channel
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// 535 Authentication credentials invalid
    pub const AUTH_FAILED: Self = Self(535);
    /// 550 Mailbox unavailable
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);

    /// Creates a reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// 2xx: the command completed.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// 3xx: the server wants more input.
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// 4xx: temporary failure.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// 5xx: permanent failure.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One parsed line of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyLine {
    /// Reply code on this line.
    pub code: ReplyCode,
    /// False when the line ends with a `-` continuation marker.
    pub last: bool,
    /// Text after the code and separator.
    pub text: String,
}

impl ReplyLine {
    /// Parses a line with its line terminator already stripped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the line does not start with a
    /// three-digit code followed by end of line, space or `-`.
    pub fn parse(line: &str) -> Result<Self> {
        let bytes = line.as_bytes();
        if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
            return Err(Error::Protocol(format!("malformed reply line: {line:?}")));
        }
        let code = line[..3]
            .parse::<u16>()
            .map_err(|_| Error::Protocol(format!("malformed reply code: {line:?}")))?;
        if !(200..600).contains(&code) {
            return Err(Error::Protocol(format!("reply code out of range: {code}")));
        }

        let (last, text) = match bytes.get(3) {
            None => (true, ""),
            Some(b' ') => (true, &line[4..]),
            Some(b'-') => (false, &line[4..]),
            Some(_) => {
                return Err(Error::Protocol(format!("bad separator in reply: {line:?}")));
            }
        };

        Ok(Self {
            code: ReplyCode(code),
            last,
            text: text.to_string(),
        })
    }
}

/// A complete, possibly multi-line, reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code shared by all lines.
    pub code: ReplyCode,
    /// Text of each line, in order.
    pub lines: Vec<String>,
}

impl Reply {
    /// Creates a reply from its parts.
    #[must_use]
    pub const fn new(code: ReplyCode, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// Assembles a reply from parsed lines.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the lines are empty, disagree on the
    /// code, or the final line is still marked as a continuation.
    pub fn from_lines(lines: Vec<ReplyLine>) -> Result<Self> {
        let Some(first) = lines.first() else {
            return Err(Error::Protocol("empty reply".into()));
        };
        let code = first.code;
        if let Some(odd) = lines.iter().find(|l| l.code != code) {
            return Err(Error::Protocol(format!(
                "reply mixes codes {code} and {}",
                odd.code
            )));
        }
        if lines.last().is_some_and(|l| !l.last) {
            return Err(Error::Protocol("reply ended on a continuation line".into()));
        }

        Ok(Self {
            code,
            lines: lines.into_iter().map(|l| l.text).collect(),
        })
    }

    /// Returns true for a 2xx reply.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.code.is_positive()
    }

    /// Returns the reply text, lines joined by a space.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }

    /// Converts a reply with an unexpected code into an error.
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::rejected(self.code.as_u16(), self.text())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<ReplyLine> {
        raw.iter().map(|l| ReplyLine::parse(l).unwrap()).collect()
    }

    #[test]
    fn parses_single_line() {
        let line = ReplyLine::parse("250 2.0.0 OK").unwrap();
        assert_eq!(line.code, ReplyCode::OK);
        assert!(line.last);
        assert_eq!(line.text, "2.0.0 OK");
    }

    #[test]
    fn parses_bare_code() {
        let line = ReplyLine::parse("354").unwrap();
        assert_eq!(line.code, ReplyCode::START_DATA);
        assert!(line.last);
        assert!(line.text.is_empty());
    }

    #[test]
    fn parses_continuation() {
        let line = ReplyLine::parse("250-PIPELINING").unwrap();
        assert!(!line.last);
        assert_eq!(line.text, "PIPELINING");
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "25", "abc hello", "250:x", "999 nope", "099 low"] {
            assert!(ReplyLine::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn assembles_multi_line_reply() {
        let reply = Reply::from_lines(lines(&[
            "250-mx.example.com",
            "250-SIZE 1000",
            "250 STARTTLS",
        ]))
        .unwrap();
        assert_eq!(reply.code, ReplyCode::OK);
        assert_eq!(reply.lines, vec!["mx.example.com", "SIZE 1000", "STARTTLS"]);
        assert_eq!(reply.text(), "mx.example.com SIZE 1000 STARTTLS");
    }

    #[test]
    fn rejects_mixed_codes() {
        assert!(Reply::from_lines(lines(&["250-a", "251 b"])).is_err());
    }

    #[test]
    fn rejects_dangling_continuation() {
        assert!(Reply::from_lines(lines(&["250-a"])).is_err());
        assert!(Reply::from_lines(Vec::new()).is_err());
    }

    #[test]
    fn code_classes() {
        assert!(ReplyCode::SERVICE_READY.is_positive());
        assert!(ReplyCode::AUTH_CONTINUE.is_intermediate());
        assert!(ReplyCode::SERVICE_UNAVAILABLE.is_transient());
        assert!(ReplyCode::AUTH_FAILED.is_permanent());
        assert!(ReplyCode::OK < ReplyCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn into_error_keeps_code_and_text() {
        let reply = Reply::new(
            ReplyCode::MAILBOX_UNAVAILABLE,
            vec!["5.1.1 user unknown".into()],
        );
        let err = reply.into_error();
        assert!(err.is_permanent());
        assert_eq!(err.reply_code(), Some(550));
    }
}
