//! Error types for message generation.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required header was never set on the builder.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// A header name or value would break the message framing.
    #[error("invalid header {name}: {reason}")]
    InvalidHeader {
        /// Header name.
        name: String,
        /// Why it was refused.
        reason: &'static str,
    },

    /// An address that cannot appear in a header.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
