//! Filter models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// What a filter looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Matches every SMS.
    All,
    /// Case-insensitive substring of the sender.
    Sender,
    /// Case-insensitive substring of the content.
    Keyword,
}

impl FilterType {
    /// Parse from database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "sender" => Some(Self::Sender),
            "keyword" => Some(Self::Keyword),
            _ => None,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Sender => "sender",
            Self::Keyword => "keyword",
        }
    }
}

/// A forwarding rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsFilter {
    /// Unique id.
    #[serde(default = "new_id")]
    pub id: String,
    /// Label shown to the user.
    pub name: String,
    /// Match kind.
    pub filter_type: FilterType,
    /// Substring to look for; unused by `all`.
    #[serde(default)]
    pub filter_value: Option<String>,
    /// Disabled filters are ignored.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Creation time.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

const fn enabled_by_default() -> bool {
    true
}

impl SmsFilter {
    /// Creates an enabled filter with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, filter_type: FilterType, value: Option<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            filter_type,
            filter_value: value,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    /// Returns the match value when it is present and non-empty.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.filter_value.as_deref().filter(|v| !v.is_empty())
    }

    /// Returns true if this filter lets the SMS through.
    ///
    /// Ignores `enabled`; callers decide which filters participate.
    #[must_use]
    pub fn matches(&self, sender: &str, content: &str) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };
        match self.filter_type {
            FilterType::All => true,
            FilterType::Sender => self.value().is_some_and(|v| contains(sender, v)),
            FilterType::Keyword => self.value().is_some_and(|v| contains(content, v)),
        }
    }
}

/// Partial update of a filter. Absent fields are left alone.
///
/// `filter_value` distinguishes "absent" from an explicit `null`, which
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterUpdate {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New match kind.
    #[serde(default)]
    pub filter_type: Option<FilterType>,
    /// New value; `Some(None)` clears it.
    #[serde(default, deserialize_with = "present")]
    pub filter_value: Option<Option<String>>,
    /// Enable or disable.
    #[serde(default)]
    pub enabled: Option<bool>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl FilterUpdate {
    /// Returns true when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.filter_type.is_none()
            && self.filter_value.is_none()
            && self.enabled.is_none()
    }

    /// Applies the update, returning true if any field changed.
    pub fn apply(&self, filter: &mut SmsFilter) -> bool {
        let mut changed = false;
        if let Some(name) = &self.name
            && *name != filter.name
        {
            filter.name.clone_from(name);
            changed = true;
        }
        if let Some(filter_type) = self.filter_type
            && filter_type != filter.filter_type
        {
            filter.filter_type = filter_type;
            changed = true;
        }
        if let Some(value) = &self.filter_value
            && *value != filter.filter_value
        {
            filter.filter_value.clone_from(value);
            changed = true;
        }
        if let Some(enabled) = self.enabled
            && enabled != filter.enabled
        {
            filter.enabled = enabled;
            changed = true;
        }
        changed
    }
}
