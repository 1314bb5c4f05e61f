//! Error types for SMTP sessions.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS handshake or configuration error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// The server answered with a non-success reply.
    #[error("server replied {code}: {message}")]
    Rejected {
        /// Reply code (e.g. 550).
        code: u16,
        /// Reply text from the server.
        message: String,
    },

    /// The server sent something that is not a valid SMTP reply.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The peer closed the connection mid-session.
    #[error("connection closed by server")]
    ConnectionClosed,

    /// A read or write did not complete in time.
    #[error("timed out waiting for server")]
    Timeout,

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Envelope without recipients.
    #[error("envelope has no recipients")]
    NoRecipients,

    /// Message exceeds the size the server advertised.
    #[error("message of {size} bytes exceeds server limit of {limit} bytes")]
    MessageTooLarge {
        /// Size of the message.
        size: usize,
        /// Limit from the SIZE extension.
        limit: usize,
    },

    /// The server lacks a required extension or mechanism.
    #[error("server does not support {0}")]
    NotSupported(String),
}

impl Error {
    /// Creates a rejection error from a reply code and text.
    #[must_use]
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// Returns the server reply code, if this error carries one.
    #[must_use]
    pub const fn reply_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the server rejected the request permanently (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code >= 500 && *code < 600)
    }

    /// Returns true if retrying the whole session later may succeed.
    ///
    /// Covers 4xx replies and failures of the connection itself.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Rejected { code, .. } => *code >= 400 && *code < 500,
            Self::Io(_) | Self::ConnectionClosed | Self::Timeout => true,
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn classifies_reply_codes() {
        assert!(Error::rejected(421, "try later").is_transient());
        assert!(!Error::rejected(421, "try later").is_permanent());
        assert!(Error::rejected(550, "no such user").is_permanent());
        assert!(!Error::rejected(550, "no such user").is_transient());
    }

    #[test]
    fn connection_failures_are_transient() {
        assert!(Error::Timeout.is_transient());
        assert!(Error::ConnectionClosed.is_transient());
        let io = Error::from(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert!(io.is_transient());
    }

    #[test]
    fn local_errors_are_neither() {
        let err = Error::NotSupported("AUTH".into());
        assert!(!err.is_transient());
        assert!(!err.is_permanent());
        assert_eq!(err.reply_code(), None);
    }

    #[test]
    fn display_includes_server_text() {
        let err = Error::rejected(535, "5.7.8 bad credentials");
        assert_eq!(err.to_string(), "server replied 535: 5.7.8 bad credentials");
        assert_eq!(err.reply_code(), Some(535));
    }
}
