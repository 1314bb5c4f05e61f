//! Session tests against a scripted in-memory SMTP server.
//!
//! The server side runs on a `tokio::io::duplex` pipe, answers each command
//! from a script and records everything the client sent.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

use smsrelay_smtp::{Client, Credentials, Envelope, Error, SmtpStream};

/// One scripted exchange: the command prefix the client must send and the
/// raw reply to write back.
struct Step {
    expect: &'static str,
    reply: &'static str,
}

const fn step(expect: &'static str, reply: &'static str) -> Step {
    Step { expect, reply }
}

/// Starts a scripted server. Returns the client stream and a handle that
/// resolves to the transcript of client lines.
fn scripted(greeting: &'static str, steps: Vec<Step>) -> (SmtpStream, JoinHandle<Vec<String>>) {
    let (client, server) = tokio::io::duplex(16 * 1024);
    let handle = tokio::spawn(run_server(server, greeting, steps));
    (SmtpStream::new(client, Duration::from_secs(5)), handle)
}

async fn run_server(server: DuplexStream, greeting: &str, steps: Vec<Step>) -> Vec<String> {
    let (read, mut write) = tokio::io::split(server);
    let mut reader = BufReader::new(read);
    let mut transcript = Vec::new();

    write.write_all(greeting.as_bytes()).await.unwrap();

    let mut in_data = false;
    let mut steps = steps.into_iter();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await.unwrap() == 0 {
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        transcript.push(line.clone());

        if in_data {
            if line != "." {
                continue;
            }
            in_data = false;
        }

        let Some(step) = steps.next() else {
            break;
        };
        assert!(
            line.starts_with(step.expect),
            "expected {:?}, client sent {line:?}",
            step.expect
        );
        if step.expect == "DATA" && step.reply.starts_with("354") {
            in_data = true;
        }
        write.write_all(step.reply.as_bytes()).await.unwrap();
    }
    transcript
}

const GREETING: &str = "220 mx.example.com ESMTP ready\r\n";
const EHLO_REPLY: &str = "250-mx.example.com hello\r\n250-SIZE 10240\r\n250-8BITMIME\r\n250 AUTH LOGIN PLAIN\r\n";

#[tokio::test]
async fn full_submission_with_plain_auth() {
    let (stream, server) = scripted(
        GREETING,
        vec![
            step("EHLO relay.test", EHLO_REPLY),
            step("AUTH PLAIN ", "235 2.7.0 accepted\r\n"),
            step("MAIL FROM:<bot@example.com>", "250 ok\r\n"),
            step("RCPT TO:<me@example.org>", "250 ok\r\n"),
            step("DATA", "354 go ahead\r\n"),
            step(".", "250 2.0.0 queued as 1234\r\n"),
            step("QUIT", "221 bye\r\n"),
        ],
    );

    let client = Client::greet(stream).await.unwrap();
    assert_eq!(client.server_info().hostname, "mx.example.com");

    let client = client.ehlo("relay.test").await.unwrap();
    assert_eq!(client.server_info().max_message_size(), Some(10240));

    let client = client
        .authenticate(&Credentials::new("bot@example.com", "secret"))
        .await
        .unwrap();

    let envelope = Envelope::new("bot@example.com", ["me@example.org"]).unwrap();
    let client = client
        .send_mail(&envelope, b"Subject: hi\r\n\r\n.hidden\r\nbye\r\n")
        .await
        .unwrap();
    client.quit().await.unwrap();

    let transcript = server.await.unwrap();
    // "\0bot@example.com\0secret" in base64.
    assert!(transcript.contains(&"AUTH PLAIN AGJvdEBleGFtcGxlLmNvbQBzZWNyZXQ=".to_string()));
    assert!(transcript.contains(&"MAIL FROM:<bot@example.com> SIZE=29".to_string()));
    assert!(transcript.contains(&"..hidden".to_string()));
}

#[tokio::test]
async fn falls_back_to_login_auth() {
    let (stream, server) = scripted(
        GREETING,
        vec![
            step("EHLO", "250-mx.example.com\r\n250 AUTH LOGIN\r\n"),
            step("AUTH LOGIN", "334 VXNlcm5hbWU6\r\n"),
            step("dXNlcg==", "334 UGFzc3dvcmQ6\r\n"),
            step("cGFzcw==", "235 ok\r\n"),
            step("QUIT", "221 bye\r\n"),
        ],
    );

    let client = Client::greet(stream)
        .await
        .unwrap()
        .ehlo("relay.test")
        .await
        .unwrap()
        .authenticate(&Credentials::new("user", "pass"))
        .await
        .unwrap();
    client.quit().await.unwrap();
    assert_eq!(server.await.unwrap().len(), 5);
}

#[tokio::test]
async fn rejected_credentials_surface_as_permanent() {
    let (stream, _server) = scripted(
        GREETING,
        vec![
            step("EHLO", EHLO_REPLY),
            step("AUTH PLAIN", "535 5.7.8 bad credentials\r\n"),
        ],
    );

    let client = Client::greet(stream).await.unwrap().ehlo("relay.test").await.unwrap();
    let err = client
        .authenticate(&Credentials::new("user", "wrong"))
        .await
        .unwrap_err();
    assert!(err.is_permanent());
    assert_eq!(err.reply_code(), Some(535));
}

#[tokio::test]
async fn missing_auth_extension_is_not_supported() {
    let (stream, _server) = scripted(GREETING, vec![step("EHLO", "250 mx.example.com\r\n")]);

    let client = Client::greet(stream).await.unwrap().ehlo("relay.test").await.unwrap();
    let err = client
        .authenticate(&Credentials::new("user", "pass"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));
}

#[tokio::test]
async fn helo_fallback_for_old_servers() {
    let (stream, _server) = scripted(
        GREETING,
        vec![
            step("EHLO", "502 command not implemented\r\n"),
            step("HELO relay.test", "250 mx.example.com\r\n"),
        ],
    );

    let client = Client::greet(stream).await.unwrap().ehlo("relay.test").await.unwrap();
    assert!(client.server_info().extensions.is_empty());
}

#[tokio::test]
async fn busy_greeting_is_transient() {
    let (stream, _server) = scripted("421 too busy\r\n", vec![]);
    let err = Client::greet(stream).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn rejected_recipient_resets_transaction() {
    let (stream, server) = scripted(
        GREETING,
        vec![
            step("EHLO", "250 mx.example.com\r\n"),
            step("MAIL FROM:<bot@example.com>", "250 ok\r\n"),
            step("RCPT TO:<ghost@example.org>", "550 5.1.1 no such user\r\n"),
            step("RSET", "250 reset\r\n"),
        ],
    );

    let client = Client::greet(stream).await.unwrap().ehlo("relay.test").await.unwrap();
    let envelope = Envelope::new("bot@example.com", ["ghost@example.org"]).unwrap();
    let err = client.send_mail(&envelope, b"hello").await.unwrap_err();
    assert_eq!(err.reply_code(), Some(550));

    let transcript = server.await.unwrap();
    assert_eq!(transcript.last().map(String::as_str), Some("RSET"));
}

#[tokio::test]
async fn oversized_message_rejected_locally() {
    let (stream, server) = scripted(
        GREETING,
        vec![step("EHLO", "250-mx.example.com\r\n250 SIZE 16\r\n")],
    );

    let client = Client::greet(stream).await.unwrap().ehlo("relay.test").await.unwrap();
    let envelope = Envelope::new("bot@example.com", ["me@example.org"]).unwrap();
    let err = client
        .send_mail(&envelope, b"this body is longer than sixteen bytes")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MessageTooLarge { limit: 16, .. }));

    assert_eq!(server.await.unwrap(), vec!["EHLO relay.test".to_string()]);
}

#[tokio::test]
async fn starttls_requires_advertisement() {
    let (stream, _server) = scripted(GREETING, vec![step("EHLO", "250 mx.example.com\r\n")]);

    let client = Client::greet(stream).await.unwrap().ehlo("relay.test").await.unwrap();
    let err = client.starttls("mx.example.com").await.unwrap_err();
    assert!(matches!(err, Error::NotSupported(ref what) if what == "STARTTLS"));
}
