//! Error types for the core library.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Message could not be composed.
    #[error("Message error: {0}")]
    Mime(#[from] smsrelay_mime::Error),

    /// SMTP session failed.
    #[error("SMTP error: {0}")]
    Smtp(#[from] smsrelay_smtp::Error),

    /// No email configuration has been saved.
    #[error("No email configuration found")]
    NotConfigured,

    /// Filter not found.
    #[error("Filter not found")]
    FilterNotFound(String),

    /// Input failed validation.
    #[error("{}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    /// A stored value could not be read back.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::message)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_lists_every_problem() {
        let err = Error::Validation(vec![
            ValidationError::EmptyRecipient,
            ValidationError::InvalidSmtpPort,
        ]);
        assert_eq!(
            err.to_string(),
            "Recipient email is required; SMTP port must be 1-65535"
        );
    }

    #[test]
    fn not_configured_message() {
        assert_eq!(Error::NotConfigured.to_string(), "No email configuration found");
    }
}
