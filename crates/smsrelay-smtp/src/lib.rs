//! # smsrelay-smtp
//!
//! Async SMTP submission client implementing the parts of RFC 5321 a relay
//! needs to hand a message to a mail server.
//!
//! ## Features
//!
//! - **Type-state sessions**: a message can only be sent once the greeting and
//!   EHLO have been processed, and authentication consumes the session
//! - **Transport security**: implicit TLS (port 465) and STARTTLS (port 587)
//! - **Authentication**: PLAIN and LOGIN, chosen from what the server advertises
//! - **Bounded waits**: every read and write runs under a configurable timeout
//! - **Pluggable transport**: any `AsyncRead + AsyncWrite` stream can carry a
//!   session, which is how the tests drive a scripted server
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use smsrelay_smtp::{Client, Credentials, Envelope};
//! use smsrelay_smtp::connection::connect;
//!
//! # async fn run() -> smsrelay_smtp::Result<()> {
//! let stream = connect("smtp.example.com", 587, Duration::from_secs(30)).await?;
//! let client = Client::greet(stream).await?
//!     .ehlo("relay.example.net").await?
//!     .starttls("smtp.example.com").await?;
//!
//! let client = client
//!     .authenticate(&Credentials::new("user@example.com", "secret"))
//!     .await?;
//!
//! let envelope = Envelope::new("user@example.com", ["someone@example.org"])?;
//! let client = client
//!     .send_mail(&envelope, b"Subject: hi\r\n\r\nhello\r\n")
//!     .await?;
//! client.quit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Session States
//!
//! ```text
//! greet() ──→ Connected ── authenticate() ──→ Authenticated
//!                 │                               │
//!                 └──────── send_mail() ──────────┘  (repeatable)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod envelope;
mod error;
pub mod types;

pub use connection::{Authenticated, Client, Connected, ServerInfo, SmtpStream};
pub use envelope::{Credentials, Envelope};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
