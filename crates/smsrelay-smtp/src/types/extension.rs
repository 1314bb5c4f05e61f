//! ESMTP extensions advertised in the EHLO reply.

/// An extension keyword from an EHLO reply line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// STARTTLS (RFC 3207).
    StartTls,
    /// AUTH with the advertised mechanisms (RFC 4954).
    Auth(Vec<AuthMechanism>),
    /// SIZE with the optional byte limit (RFC 1870).
    Size(Option<usize>),
    /// 8BITMIME (RFC 6152).
    EightBitMime,
    /// PIPELINING (RFC 2920).
    Pipelining,
    /// SMTPUTF8 (RFC 6531).
    SmtpUtf8,
    /// Anything else, kept verbatim.
    Other(String),
}

impl Extension {
    /// Parses one EHLO reply line (without the reply code).
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(keyword) = words.next() else {
            return Self::Other(String::new());
        };

        if keyword.eq_ignore_ascii_case("STARTTLS") {
            Self::StartTls
        } else if keyword.eq_ignore_ascii_case("AUTH") {
            Self::Auth(words.filter_map(AuthMechanism::parse).collect())
        } else if keyword.eq_ignore_ascii_case("SIZE") {
            // "SIZE 0" means no fixed limit.
            let limit = words
                .next()
                .and_then(|w| w.parse::<usize>().ok())
                .filter(|&n| n > 0);
            Self::Size(limit)
        } else if keyword.eq_ignore_ascii_case("8BITMIME") {
            Self::EightBitMime
        } else if keyword.eq_ignore_ascii_case("PIPELINING") {
            Self::Pipelining
        } else if keyword.eq_ignore_ascii_case("SMTPUTF8") {
            Self::SmtpUtf8
        } else {
            Self::Other(line.trim().to_string())
        }
    }
}

/// SASL mechanisms this client knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuthMechanism {
    /// PLAIN (RFC 4616), credentials in the initial response.
    Plain,
    /// LOGIN, username and password in two challenge rounds.
    Login,
    /// CRAM-MD5; recognised but never selected.
    CramMd5,
    /// `XOAUTH2`; recognised but never selected.
    XOAuth2,
}

impl AuthMechanism {
    /// Parses a mechanism name, case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        [Self::Plain, Self::Login, Self::CramMd5, Self::XOAuth2]
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(name))
    }

    /// Returns the mechanism name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
            Self::CramMd5 => "CRAM-MD5",
            Self::XOAuth2 => "XOAUTH2",
        }
    }

    /// Returns true for mechanisms that can authenticate with a password.
    #[must_use]
    pub const fn is_password_based(self) -> bool {
        matches!(self, Self::Plain | Self::Login)
    }
}

impl std::fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
