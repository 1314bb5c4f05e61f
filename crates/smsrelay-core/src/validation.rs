//! Input validation for email configurations and filters.

use crate::email::{DeliveryMethod, EmailConfig};
use crate::filter::{FilterUpdate, SmsFilter};

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Recipient address is empty.
    EmptyRecipient,
    /// Recipient address format is invalid.
    InvalidRecipient,
    /// SMTP host is empty.
    EmptySmtpServer,
    /// SMTP port is missing or zero.
    InvalidSmtpPort,
    /// SMTP username is empty.
    EmptySmtpUsername,
    /// SMTP username is not a usable sender address.
    InvalidSmtpUsername,
    /// Filter name is empty.
    EmptyFilterName,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyRecipient => "Recipient email is required",
            Self::InvalidRecipient => "Invalid recipient email address",
            Self::EmptySmtpServer => "SMTP server is required",
            Self::InvalidSmtpPort => "SMTP port must be 1-65535",
            Self::EmptySmtpUsername => "SMTP username is required",
            Self::InvalidSmtpUsername => "SMTP username must be an email address",
            Self::EmptyFilterName => "Filter name is required",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyRecipient | Self::InvalidRecipient => "recipient_email",
            Self::EmptySmtpServer => "smtp_server",
            Self::InvalidSmtpPort => "smtp_port",
            Self::EmptySmtpUsername | Self::InvalidSmtpUsername => "smtp_username",
            Self::EmptyFilterName => "name",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating input.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate an email configuration before it is saved.
///
/// Only the recipient is required for every delivery method; the server
/// fields are checked when they are about to be used.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_email_config(config: &EmailConfig) -> ValidationResult {
    let mut errors = Vec::new();
    check_recipient(&config.recipient_email, &mut errors);
    if config.smtp_port == Some(0) {
        errors.push(ValidationError::InvalidSmtpPort);
    }
    finish(errors)
}

/// Validate that an SMTP configuration has everything needed to connect.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are missing.
pub fn validate_smtp_settings(config: &EmailConfig) -> ValidationResult {
    let mut errors = Vec::new();
    if config.email_type != DeliveryMethod::Smtp {
        return Ok(());
    }
    if config.smtp_server.as_deref().is_none_or(|s| s.trim().is_empty()) {
        errors.push(ValidationError::EmptySmtpServer);
    }
    if config.smtp_port.is_none_or(|p| p == 0) {
        errors.push(ValidationError::InvalidSmtpPort);
    }
    match config.smtp_username.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::EmptySmtpUsername),
        Some(username) if !is_valid_email(username) => {
            errors.push(ValidationError::InvalidSmtpUsername);
        }
        Some(_) => {}
    }
    finish(errors)
}

/// Validate a recipient address for a test email.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if the address is invalid.
pub fn validate_recipient(recipient: &str) -> ValidationResult {
    let mut errors = Vec::new();
    check_recipient(recipient, &mut errors);
    finish(errors)
}

/// Validate a filter before it is stored.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_filter(filter: &SmsFilter) -> ValidationResult {
    let mut errors = Vec::new();
    if filter.name.trim().is_empty() {
        errors.push(ValidationError::EmptyFilterName);
    }
    finish(errors)
}

/// Validate a partial filter update; only fields being set are checked.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_filter_update(update: &FilterUpdate) -> ValidationResult {
    let mut errors = Vec::new();
    if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        errors.push(ValidationError::EmptyFilterName);
    }
    finish(errors)
}

fn check_recipient(recipient: &str, errors: &mut Vec<ValidationError>) {
    if recipient.trim().is_empty() {
        errors.push(ValidationError::EmptyRecipient);
    } else if !is_valid_email(recipient) {
        errors.push(ValidationError::InvalidRecipient);
    }
}

/// Basic email validation.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    if email.chars().any(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | ',')) {
        return false;
    }

    // Domain must contain at least one dot and no empty labels
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}
