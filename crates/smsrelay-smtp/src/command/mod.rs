//! SMTP commands and their wire form.

use std::fmt;

use crate::types::{Address, AuthMechanism};

/// A command sent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `EHLO <domain>`
    Ehlo(String),
    /// `HELO <domain>`, fallback for servers without ESMTP.
    Helo(String),
    /// `STARTTLS`
    StartTls,
    /// `AUTH <mechanism> [initial-response]`
    Auth {
        /// SASL mechanism.
        mechanism: AuthMechanism,
        /// Base64 initial response, if sent with the command.
        initial_response: Option<String>,
    },
    /// A bare base64 line answering a 334 challenge.
    AuthResponse(String),
    /// `MAIL FROM:<addr> [params]`
    MailFrom {
        /// Reverse path.
        from: Address,
        /// ESMTP parameters such as `BODY=8BITMIME` or `SIZE=1234`.
        params: Vec<String>,
    },
    /// `RCPT TO:<addr>`
    RcptTo(Address),
    /// `DATA`
    Data,
    /// `RSET`
    Rset,
    /// `NOOP`
    Noop,
    /// `QUIT`
    Quit,
}

impl Command {
    /// Serializes the command, including the trailing CRLF.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{self}\r\n").into_bytes()
    }

    /// Returns a form of the command that is safe to log.
    ///
    /// Authentication payloads are replaced so credentials never reach the
    /// logs.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            Self::Auth {
                mechanism,
                initial_response: Some(_),
            } => format!("AUTH {mechanism} <redacted>"),
            Self::AuthResponse(_) => "<redacted>".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ehlo(domain) => write!(f, "EHLO {domain}"),
            Self::Helo(domain) => write!(f, "HELO {domain}"),
            Self::StartTls => f.write_str("STARTTLS"),
            Self::Auth {
                mechanism,
                initial_response,
            } => match initial_response {
                Some(resp) => write!(f, "AUTH {mechanism} {resp}"),
                None => write!(f, "AUTH {mechanism}"),
            },
            Self::AuthResponse(resp) => f.write_str(resp),
            Self::MailFrom { from, params } => {
                write!(f, "MAIL FROM:<{from}>")?;
                for param in params {
                    write!(f, " {param}")?;
                }
                Ok(())
            }
            Self::RcptTo(to) => write!(f, "RCPT TO:<{to}>"),
            Self::Data => f.write_str("DATA"),
            Self::Rset => f.write_str("RSET"),
            Self::Noop => f.write_str("NOOP"),
            Self::Quit => f.write_str("QUIT"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[test]
    fn greeting_commands() {
        assert_eq!(Command::Ehlo("relay.local".into()).to_bytes(), b"EHLO relay.local\r\n");
        assert_eq!(Command::Helo("relay.local".into()).to_bytes(), b"HELO relay.local\r\n");
        assert_eq!(Command::StartTls.to_bytes(), b"STARTTLS\r\n");
    }

    #[test]
    fn mail_from_with_params() {
        let cmd = Command::MailFrom {
            from: addr("bot@example.com"),
            params: vec!["BODY=8BITMIME".into(), "SIZE=512".into()],
        };
        assert_eq!(
            cmd.to_bytes(),
            b"MAIL FROM:<bot@example.com> BODY=8BITMIME SIZE=512\r\n"
        );
    }

    #[test]
    fn transaction_commands() {
        assert_eq!(
            Command::RcptTo(addr("me@example.org")).to_bytes(),
            b"RCPT TO:<me@example.org>\r\n"
        );
        assert_eq!(Command::Data.to_bytes(), b"DATA\r\n");
        assert_eq!(Command::Rset.to_bytes(), b"RSET\r\n");
        assert_eq!(Command::Noop.to_bytes(), b"NOOP\r\n");
        assert_eq!(Command::Quit.to_bytes(), b"QUIT\r\n");
    }

    #[test]
    fn auth_with_initial_response() {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some("AHVzZXIAcGFzcw==".into()),
        };
        assert_eq!(cmd.to_bytes(), b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n");
        assert_eq!(cmd.redacted(), "AUTH PLAIN <redacted>");
    }

    #[test]
    fn auth_login_rounds_are_redacted() {
        let start = Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        };
        assert_eq!(start.redacted(), "AUTH LOGIN");
        assert_eq!(Command::AuthResponse("dXNlcg==".into()).redacted(), "<redacted>");
        assert_eq!(Command::AuthResponse("dXNlcg==".into()).to_bytes(), b"dXNlcg==\r\n");
    }
}
