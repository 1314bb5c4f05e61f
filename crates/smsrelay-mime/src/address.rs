//! Mailboxes as they appear in `From` and `To` headers.

use std::fmt;

use crate::encoding::{encode_words, needs_header_encoding};
use crate::error::{Error, Result};

/// An address with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    name: Option<String>,
    address: String,
}

impl Mailbox {
    /// Creates a bare mailbox.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into().trim().to_string(),
        }
    }

    /// Creates a mailbox with a display name. A blank name is dropped.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Self {
        let name = name.into().trim().to_string();
        Self {
            name: (!name.is_empty()).then_some(name),
            ..Self::new(address)
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the address part.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Checks the address can be written between angle brackets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] for an address without exactly one
    /// `@` or with characters that would break the header.
    pub fn validate(&self) -> Result<()> {
        let invalid = self.address.matches('@').count() != 1
            || self.address.starts_with('@')
            || self.address.ends_with('@')
            || self
                .address
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | ','));
        if invalid {
            return Err(Error::InvalidAddress(self.address.clone()));
        }
        Ok(())
    }
}

/// RFC 5322 `specials` that force a quoted display name.
fn needs_quoting(name: &str) -> bool {
    name.chars().any(|c| {
        matches!(
            c,
            '(' | ')' | '<' | '>' | '[' | ']' | ':' | ';' | '@' | '\\' | ',' | '.' | '"'
        )
    })
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            None => write!(f, "<{}>", self.address),
            Some(name) if needs_header_encoding(name) => {
                write!(f, "{} <{}>", encode_words(name).join(" "), self.address)
            }
            Some(name) if needs_quoting(name) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{escaped}\" <{}>", self.address)
            }
            Some(name) => write!(f, "{name} <{}>", self.address),
        }
    }
}
