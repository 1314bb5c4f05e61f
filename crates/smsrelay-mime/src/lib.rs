//! # smsrelay-mime
//!
//! Generation of RFC 5322 messages with MIME bodies, for handing to an SMTP
//! client.
//!
//! ## Features
//!
//! - **Header encoding**: non-ASCII display names and subjects become
//!   RFC 2047 encoded words, folded to stay under the line limit
//! - **Body encoding**: quoted-printable text bodies (RFC 2045), so 8-bit
//!   content survives 7-bit relays
//! - **Multipart**: optional `multipart/mixed` wrapper around the text part
//! - **Identity headers**: `Date` and `Message-ID` are filled in at build time
//!
//! ## Quick Start
//!
//! ```ignore
//! use smsrelay_mime::{MessageBuilder, Mailbox};
//!
//! let message = MessageBuilder::new()
//!     .from(Mailbox::with_name("SMS Forwarder", "relay@example.com"))
//!     .to(Mailbox::new("me@example.org"))
//!     .subject("SMS from +15551234567")
//!     .text_body("Your code is 123456")
//!     .build()?;
//!
//! let bytes = message.to_bytes();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::Mailbox;
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Body, Message, MessageBuilder, TransferEncoding};
