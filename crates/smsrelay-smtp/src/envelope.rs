//! Envelope and credentials for a submission.

use std::fmt;

use crate::error::{Error, Result};
use crate::types::Address;

/// Reverse path and forward paths of one mail transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    from: Address,
    to: Vec<Address>,
}

impl Envelope {
    /// Creates an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if any address is invalid or there are no recipients.
    pub fn new<I, S>(from: impl AsRef<str>, to: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let from = Address::new(from)?;
        let to = to
            .into_iter()
            .map(Address::new)
            .collect::<Result<Vec<_>>>()?;
        if to.is_empty() {
            return Err(Error::NoRecipients);
        }
        Ok(Self { from, to })
    }

    /// Returns the reverse path.
    #[must_use]
    pub const fn from(&self) -> &Address {
        &self.from
    }

    /// Returns the recipients.
    #[must_use]
    pub fn to(&self) -> &[Address] {
        &self.to
    }

    /// Returns true if any address needs SMTPUTF8.
    #[must_use]
    pub fn needs_utf8(&self) -> bool {
        !self.from.is_ascii() || self.to.iter().any(|a| !a.is_ascii())
    }
}

/// Username and password for AUTH.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Authentication identity.
    pub username: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
