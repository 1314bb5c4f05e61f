//! Email configuration model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder returned instead of a stored password.
pub const MASKED_PASSWORD: &str = "***masked***";

/// Display name used when none is configured.
pub const DEFAULT_SENDER_NAME: &str = "SMS Forwarder";

/// How forwarded SMS leave the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Submit through an SMTP server.
    Smtp,
    /// Hosted delivery service; not available.
    Emergent,
    /// The phone's own mail client; not available.
    Device,
}

impl DeliveryMethod {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "smtp" => Some(Self::Smtp),
            "emergent" => Some(Self::Emergent),
            "device" => Some(Self::Device),
            _ => None,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Smtp => "smtp",
            Self::Emergent => "emergent",
            Self::Device => "device",
        }
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how forwarded SMS are emailed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Unique id.
    #[serde(default = "new_id")]
    pub id: String,
    /// Delivery method.
    pub email_type: DeliveryMethod,
    /// SMTP host.
    #[serde(default)]
    pub smtp_server: Option<String>,
    /// SMTP port.
    #[serde(default)]
    pub smtp_port: Option<u16>,
    /// SMTP login, also used as the sender address.
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// `true` upgrades a plain connection with STARTTLS; `false` speaks
    /// TLS from the first byte.
    #[serde(default = "use_tls_by_default")]
    pub use_tls: bool,
    /// Where forwarded SMS are sent.
    pub recipient_email: String,
    /// Display name on the `From` header.
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    /// Creation time.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Last save time.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

const fn use_tls_by_default() -> bool {
    true
}

fn default_sender_name() -> String {
    DEFAULT_SENDER_NAME.to_string()
}

impl EmailConfig {
    /// Creates an SMTP configuration with only the recipient set.
    #[must_use]
    pub fn new(recipient_email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            email_type: DeliveryMethod::Smtp,
            smtp_server: None,
            smtp_port: None,
            smtp_username: None,
            smtp_password: None,
            use_tls: true,
            recipient_email: recipient_email.into(),
            sender_name: default_sender_name(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy safe to show: a set password becomes
    /// [`MASKED_PASSWORD`], an empty one `None`.
    #[must_use]
    pub fn masked(&self) -> Self {
        Self {
            smtp_password: self
                .smtp_password
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|_| MASKED_PASSWORD.to_string()),
            ..self.clone()
        }
    }

    /// Swaps a password echoed back as [`MASKED_PASSWORD`] for the one
    /// already stored, so a client can resubmit what it was shown.
    pub fn unmask_password(&mut self, stored: Option<&Self>) {
        if self.smtp_password.as_deref() == Some(MASKED_PASSWORD) {
            self.smtp_password = stored.and_then(|s| s.smtp_password.clone());
        }
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("id", &self.id)
            .field("email_type", &self.email_type)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.as_ref().map(|_| "[REDACTED]"))
            .field("use_tls", &self.use_tls)
            .field("recipient_email", &self.recipient_email)
            .field("sender_name", &self.sender_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_defaults() {
        let config: EmailConfig = serde_json::from_str(
            r#"{"email_type":"smtp","recipient_email":"me@example.org"}"#,
        )
        .unwrap();
        assert!(config.use_tls);
        assert_eq!(config.sender_name, "SMS Forwarder");
        assert_eq!(config.smtp_port, None);
        assert!(!config.id.is_empty());
    }

    #[test]
    fn test_unknown_method_rejected() {
        let json = r#"{"email_type":"pigeon","recipient_email":"me@example.org"}"#;
        assert!(serde_json::from_str::<EmailConfig>(json).is_err());
    }

    #[test]
    fn test_masking() {
        let mut config = EmailConfig::new("me@example.org");
        assert_eq!(config.masked().smtp_password, None);

        config.smtp_password = Some(String::new());
        assert_eq!(config.masked().smtp_password, None);

        config.smtp_password = Some("hunter2".into());
        let masked = config.masked();
        assert_eq!(masked.smtp_password.as_deref(), Some(MASKED_PASSWORD));
        assert_eq!(masked.recipient_email, config.recipient_email);
    }

    #[test]
    fn test_unmask_keeps_stored_password() {
        let mut stored = EmailConfig::new("me@example.org");
        stored.smtp_password = Some("hunter2".into());

        let mut resubmitted = stored.masked();
        resubmitted.unmask_password(Some(&stored));
        assert_eq!(resubmitted.smtp_password.as_deref(), Some("hunter2"));

        let mut fresh = stored.masked();
        fresh.unmask_password(None);
        assert_eq!(fresh.smtp_password, None);

        let mut changed = EmailConfig::new("me@example.org");
        changed.smtp_password = Some("new-secret".into());
        changed.unmask_password(Some(&stored));
        assert_eq!(changed.smtp_password.as_deref(), Some("new-secret"));
    }

    #[test]
    fn test_debug_hides_password() {
        let mut config = EmailConfig::new("me@example.org");
        config.smtp_password = Some("hunter2".into());
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn test_method_strings() {
        for method in [DeliveryMethod::Smtp, DeliveryMethod::Emergent, DeliveryMethod::Device] {
            assert_eq!(DeliveryMethod::parse(method.as_str()), Some(method));
        }
    }
}
