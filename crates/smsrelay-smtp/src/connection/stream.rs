//! Byte transport underneath an SMTP session.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

use crate::error::{Error, Result};

/// Longest reply line accepted, per RFC 5321 §4.5.3.1.5 plus slack.
const MAX_LINE_LENGTH: usize = 4096;

/// Any duplex byte stream a session can run over.
pub trait Io: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

/// Buffered, timeout-guarded SMTP stream.
pub struct SmtpStream {
    inner: BufReader<Box<dyn Io>>,
    encrypted: bool,
    timeout: Duration,
}

impl fmt::Debug for SmtpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpStream")
            .field("encrypted", &self.encrypted)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SmtpStream {
    /// Wraps an arbitrary stream that is not (yet) encrypted.
    pub fn new(io: impl Io + 'static, timeout: Duration) -> Self {
        Self {
            inner: BufReader::new(Box::new(io)),
            encrypted: false,
            timeout,
        }
    }

    fn encrypted(io: impl Io + 'static, timeout: Duration) -> Self {
        Self {
            inner: BufReader::new(Box::new(io)),
            encrypted: true,
            timeout,
        }
    }

    /// Returns true once TLS is active.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Reads one line and strips the CRLF.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if nothing arrives in time,
    /// [`Error::ConnectionClosed`] at end of stream, and
    /// [`Error::Protocol`] for over-long or non-UTF-8 lines.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        // Stop one byte past the limit so a server that never sends LF
        // cannot grow the buffer.
        let mut bounded = (&mut self.inner).take(MAX_LINE_LENGTH as u64 + 1);
        let read = tokio::time::timeout(self.timeout, bounded.read_until(b'\n', &mut buf))
            .await
            .map_err(|_| Error::Timeout)??;

        if read == 0 {
            return Err(Error::ConnectionClosed);
        }
        if buf.len() > MAX_LINE_LENGTH {
            return Err(Error::Protocol(format!(
                "reply line of {} bytes exceeds limit",
                buf.len()
            )));
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        String::from_utf8(buf).map_err(|_| Error::Protocol("reply is not valid UTF-8".into()))
    }

    /// Writes all bytes and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] or the underlying I/O error.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let writer = self.inner.get_mut();
        tokio::time::timeout(self.timeout, async {
            writer.write_all(data).await?;
            writer.flush().await
        })
        .await
        .map_err(|_| Error::Timeout)??;
        Ok(())
    }

    /// Performs the TLS handshake on the current stream (after STARTTLS).
    ///
    /// # Errors
    ///
    /// Returns an error if TLS is already active, if the server pipelined
    /// data after its STARTTLS reply, or if the handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        if self.encrypted {
            return Err(Error::Protocol("TLS is already active".into()));
        }
        // Anything buffered now arrived in plaintext and must not be trusted.
        if !self.inner.buffer().is_empty() {
            return Err(Error::Protocol(
                "server sent data before the TLS handshake".into(),
            ));
        }

        let timeout = self.timeout;
        let io = self.inner.into_inner();
        let tls = handshake(io, hostname, timeout).await?;
        Ok(Self::encrypted(tls, timeout))
    }
}

/// Connects over plain TCP (for STARTTLS or trusted relays).
///
/// # Errors
///
/// Returns an error if the connection fails or times out.
pub async fn connect(hostname: &str, port: u16, timeout: Duration) -> Result<SmtpStream> {
    let tcp = tcp_connect(hostname, port, timeout).await?;
    Ok(SmtpStream::new(tcp, timeout))
}

/// Connects with implicit TLS (SMTPS, usually port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails or times out.
pub async fn connect_tls(hostname: &str, port: u16, timeout: Duration) -> Result<SmtpStream> {
    let tcp = tcp_connect(hostname, port, timeout).await?;
    let tls = handshake(tcp, hostname, timeout).await?;
    Ok(SmtpStream::encrypted(tls, timeout))
}

async fn tcp_connect(hostname: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect((hostname, port)))
        .await
        .map_err(|_| Error::Timeout)??;
    stream.set_nodelay(true)?;
    Ok(stream)
}

async fn handshake<S>(
    io: S,
    hostname: &str,
    timeout: Duration,
) -> Result<tokio_rustls::client::TlsStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("invalid TLS server name: {hostname}")))?;

    let tls = tokio::time::timeout(timeout, tls_connector().connect(server_name, io))
        .await
        .map_err(|_| Error::Timeout)??;
    Ok(tls)
}

/// Builds a connector trusting the bundled web PKI roots.
fn tls_connector() -> TlsConnector {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_lines_without_terminators() {
        let (client, mut server) = tokio::io::duplex(256);
        let mut stream = SmtpStream::new(client, Duration::from_secs(5));

        server.write_all(b"220 ready\r\n250 ok\n").await.unwrap();
        assert_eq!(stream.read_line().await.unwrap(), "220 ready");
        assert_eq!(stream.read_line().await.unwrap(), "250 ok");
    }

    #[tokio::test]
    async fn reports_closed_connection() {
        let (client, server) = tokio::io::duplex(64);
        drop(server);
        let mut stream = SmtpStream::new(client, Duration::from_secs(5));
        assert!(matches!(stream.read_line().await, Err(Error::ConnectionClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_on_silent_server() {
        let (client, _server) = tokio::io::duplex(64);
        let mut stream = SmtpStream::new(client, Duration::from_secs(2));
        assert!(matches!(stream.read_line().await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn writes_through() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut stream = SmtpStream::new(client, Duration::from_secs(5));
        stream.write_all(b"NOOP\r\n").await.unwrap();

        let mut buf = [0u8; 6];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"NOOP\r\n");
        assert!(!stream.is_encrypted());
    }

    #[tokio::test]
    async fn refuses_upgrade_with_buffered_plaintext() {
        let (client, mut server) = tokio::io::duplex(256);
        let mut stream = SmtpStream::new(client, Duration::from_secs(5));
        server
            .write_all(b"220 go ahead\r\n250 injected\r\n")
            .await
            .unwrap();
        stream.read_line().await.unwrap();

        let err = stream.upgrade_to_tls("mx.example.com").await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn command_and_reply_against_mock_peer() {
        use tokio_test::io::Builder;

        let mock = Builder::new()
            .write(b"EHLO relay.test\r\n")
            .read(b"250 mx.test\r\n")
            .build();
        let mut stream = SmtpStream::new(mock, Duration::from_secs(5));
        stream.write_all(b"EHLO relay.test\r\n").await.unwrap();
        assert_eq!(stream.read_line().await.unwrap(), "250 mx.test");
    }

    #[tokio::test]
    async fn rejects_overlong_reply_line() {
        use tokio_test::io::Builder;

        let mut long = vec![b'a'; MAX_LINE_LENGTH + 10];
        long.extend_from_slice(b"\r\n");
        let mock = Builder::new().read(&long).build();
        let mut stream = SmtpStream::new(mock, Duration::from_secs(5));
        assert!(matches!(stream.read_line().await, Err(Error::Protocol(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_reading_unterminated_flood() {
        let (client, mut server) = tokio::io::duplex(64 * 1024);
        let mut stream = SmtpStream::new(client, Duration::from_secs(30));

        server.write_all(&[b'x'; 4 * MAX_LINE_LENGTH]).await.unwrap();
        let err = stream.read_line().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)), "{err}");
        drop(server);
    }
}
