//! Type-state SMTP client.

use std::marker::PhantomData;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, trace};

use super::{ServerInfo, SmtpStream};
use crate::command::Command;
use crate::envelope::{Credentials, Envelope};
use crate::error::{Error, Result};
use crate::types::{AuthMechanism, Extension, Reply, ReplyCode, ReplyLine};

/// Greeting received; EHLO/HELO and STARTTLS allowed, mail may be sent
/// unauthenticated if the server permits it.
#[derive(Debug)]
pub struct Connected;

/// AUTH succeeded.
#[derive(Debug)]
pub struct Authenticated;

/// States in which a mail transaction may start.
pub trait Ready {}

impl Ready for Connected {}
impl Ready for Authenticated {}

/// SMTP client session.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

impl Client<Connected> {
    /// Reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting is not a 220 reply.
    pub async fn greet(mut stream: SmtpStream) -> Result<Self> {
        let greeting = read_reply(&mut stream).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(greeting.into_error());
        }

        let hostname = greeting
            .lines
            .first()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or_default()
            .to_string();
        debug!(server = %hostname, "SMTP greeting received");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                ..ServerInfo::default()
            },
            _state: PhantomData,
        })
    }

    /// Identifies the client with EHLO, falling back to HELO when the
    /// server does not speak ESMTP.
    ///
    /// # Errors
    ///
    /// Returns an error if both greetings are rejected.
    pub async fn ehlo(mut self, client_name: &str) -> Result<Self> {
        let reply = self.command(Command::Ehlo(client_name.to_string())).await?;
        if reply.is_positive() {
            self.server_info.extensions = reply
                .lines
                .iter()
                .skip(1)
                .map(|line| Extension::parse(line))
                .collect();
            return Ok(self);
        }
        if !reply.code.is_permanent() {
            return Err(reply.into_error());
        }

        debug!(code = %reply.code, "EHLO rejected, trying HELO");
        let reply = self.command(Command::Helo(client_name.to_string())).await?;
        if !reply.is_positive() {
            return Err(reply.into_error());
        }
        self.server_info.extensions.clear();
        Ok(self)
    }

    /// Upgrades the session to TLS and repeats EHLO.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not advertised, the server refuses
    /// it, or the handshake fails.
    pub async fn starttls(mut self, hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        let reply = self.command(Command::StartTls).await?;
        if reply.code != ReplyCode::SERVICE_READY {
            return Err(reply.into_error());
        }

        let Self {
            stream,
            server_info,
            ..
        } = self;
        let stream = stream.upgrade_to_tls(hostname).await?;
        debug!(server = %server_info.hostname, "TLS established via STARTTLS");

        // Capabilities learned in plaintext are discarded (RFC 3207 §4.2).
        let client = Self {
            stream,
            server_info: ServerInfo {
                hostname: server_info.hostname,
                ..ServerInfo::default()
            },
            _state: PhantomData,
        };
        client.ehlo(hostname).await
    }

    /// Authenticates with the best password mechanism the server offers.
    ///
    /// PLAIN is preferred over LOGIN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if the server advertises no AUTH or
    /// none of PLAIN/LOGIN, or the server's rejection.
    pub async fn authenticate(self, credentials: &Credentials) -> Result<Client<Authenticated>> {
        let offered = self.server_info.auth_mechanisms();
        if offered.is_empty() {
            return Err(Error::NotSupported("AUTH".into()));
        }

        match offered
            .iter()
            .copied()
            .filter(|m| m.is_password_based())
            .min()
        {
            Some(AuthMechanism::Plain) => self.auth_plain(credentials).await,
            Some(AuthMechanism::Login) => self.auth_login(credentials).await,
            _ => Err(Error::NotSupported(format!(
                "any of the offered AUTH mechanisms ({})",
                offered
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            ))),
        }
    }

    /// Authenticates with SASL PLAIN.
    ///
    /// # Errors
    ///
    /// Returns the server's rejection if authentication fails.
    pub async fn auth_plain(mut self, credentials: &Credentials) -> Result<Client<Authenticated>> {
        let token = format!("\0{}\0{}", credentials.username, credentials.password);
        let reply = self
            .command(Command::Auth {
                mechanism: AuthMechanism::Plain,
                initial_response: Some(STANDARD.encode(token)),
            })
            .await?;
        if reply.code != ReplyCode::AUTH_SUCCEEDED {
            return Err(reply.into_error());
        }
        debug!(mechanism = "PLAIN", "authenticated");
        Ok(self.transition())
    }

    /// Authenticates with LOGIN (username and password challenges).
    ///
    /// # Errors
    ///
    /// Returns the server's rejection if any round fails.
    pub async fn auth_login(mut self, credentials: &Credentials) -> Result<Client<Authenticated>> {
        let mut reply = self
            .command(Command::Auth {
                mechanism: AuthMechanism::Login,
                initial_response: None,
            })
            .await?;

        for secret in [&credentials.username, &credentials.password] {
            if reply.code != ReplyCode::AUTH_CONTINUE {
                return Err(reply.into_error());
            }
            reply = self
                .command(Command::AuthResponse(STANDARD.encode(secret)))
                .await?;
        }

        if reply.code != ReplyCode::AUTH_SUCCEEDED {
            return Err(reply.into_error());
        }
        debug!(mechanism = "LOGIN", "authenticated");
        Ok(self.transition())
    }
}

impl<S: Ready> Client<S> {
    /// Runs one complete mail transaction: MAIL, RCPT for every recipient,
    /// DATA and the message.
    ///
    /// The message should be RFC 5322 formatted. Bare LF line endings are
    /// converted to CRLF and lines starting with `.` are dot-stuffed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageTooLarge`] before sending anything if the
    /// server's SIZE limit is exceeded, otherwise the first rejection. A
    /// rejected transaction is reset so the session stays usable.
    pub async fn send_mail(mut self, envelope: &Envelope, message: &[u8]) -> Result<Self> {
        if let Some(limit) = self.server_info.max_message_size()
            && message.len() > limit
        {
            return Err(Error::MessageTooLarge {
                size: message.len(),
                limit,
            });
        }
        if envelope.needs_utf8() && !self.server_info.supports(&Extension::SmtpUtf8) {
            return Err(Error::NotSupported("SMTPUTF8".into()));
        }

        match self.transaction(envelope, message).await {
            Ok(()) => Ok(self),
            Err(err @ Error::Rejected { .. }) => {
                // Best effort; the rejection is what the caller needs.
                if let Err(reset_err) = self.expect(Command::Rset, ReplyCode::OK).await {
                    debug!(error = %reset_err, "RSET after rejected transaction failed");
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn transaction(&mut self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        let mut params = Vec::new();
        if self.server_info.supports(&Extension::EightBitMime) && !message.is_ascii() {
            params.push("BODY=8BITMIME".to_string());
        }
        if self.server_info.max_message_size().is_some() {
            params.push(format!("SIZE={}", message.len()));
        }
        if envelope.needs_utf8() {
            params.push("SMTPUTF8".to_string());
        }

        self.expect(
            Command::MailFrom {
                from: envelope.from().clone(),
                params,
            },
            ReplyCode::OK,
        )
        .await?;

        for rcpt in envelope.to() {
            let reply = self.command(Command::RcptTo(rcpt.clone())).await?;
            // 251 "user not local; will forward" is also acceptance.
            if !reply.is_positive() {
                return Err(reply.into_error());
            }
        }

        self.expect(Command::Data, ReplyCode::START_DATA).await?;
        self.stream.write_all(&dot_stuff(message)).await?;

        let reply = read_reply(&mut self.stream).await?;
        if !reply.is_positive() {
            return Err(reply.into_error());
        }
        debug!(
            recipients = envelope.to().len(),
            bytes = message.len(),
            "message accepted"
        );
        Ok(())
    }
}

impl<S> Client<S> {
    /// Returns what the server advertised.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Returns true once TLS is active.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.stream.is_encrypted()
    }

    /// Sends NOOP to check the session is alive.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer 250.
    pub async fn noop(&mut self) -> Result<()> {
        self.expect(Command::Noop, ReplyCode::OK).await.map(|_| ())
    }

    /// Ends the session with QUIT.
    ///
    /// # Errors
    ///
    /// Returns an error if the server answers with anything but 221/250.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.command(Command::Quit).await?;
        if reply.code != ReplyCode::CLOSING && !reply.is_positive() {
            return Err(reply.into_error());
        }
        Ok(())
    }

    fn transition<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        }
    }

    async fn command(&mut self, cmd: Command) -> Result<Reply> {
        trace!(command = %cmd.redacted(), "C:");
        self.stream.write_all(&cmd.to_bytes()).await?;
        read_reply(&mut self.stream).await
    }

    async fn expect(&mut self, cmd: Command, code: ReplyCode) -> Result<Reply> {
        let reply = self.command(cmd).await?;
        if reply.code == code {
            Ok(reply)
        } else {
            Err(reply.into_error())
        }
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = ReplyLine::parse(&stream.read_line().await?)?;
        trace!(code = %line.code, text = %line.text, "S:");
        let last = line.last;
        lines.push(line);
        if last {
            break;
        }
    }
    Reply::from_lines(lines)
}

/// Normalizes line endings to CRLF, dot-stuffs, and appends the
/// terminating `.` line.
fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 64);
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    let body = body.strip_suffix(b"\r").unwrap_or(body);

    if !body.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }
    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dot_stuff_normalizes_and_terminates() {
        assert_eq!(dot_stuff(b"a\nb"), b"a\r\nb\r\n.\r\n");
        assert_eq!(dot_stuff(b"a\r\nb\r\n"), b"a\r\nb\r\n.\r\n");
    }

    #[test]
    fn dot_stuff_escapes_leading_dots() {
        assert_eq!(dot_stuff(b".\r\n..x\r\nok"), b"..\r\n...x\r\nok\r\n.\r\n");
    }

    #[test]
    fn dot_stuff_empty_message() {
        assert_eq!(dot_stuff(b""), b".\r\n");
    }

    #[test]
    fn dot_stuff_keeps_blank_lines() {
        assert_eq!(dot_stuff(b"h: v\r\n\r\nbody\r\n"), b"h: v\r\n\r\nbody\r\n.\r\n");
    }
}
