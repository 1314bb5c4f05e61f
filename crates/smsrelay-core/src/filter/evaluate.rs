//! Deciding whether an SMS is forwarded.

use super::model::SmsFilter;

/// Outcome of running an SMS through the filter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// No enabled filters exist, so everything is forwarded.
    NoFilters,
    /// Forwarded because of the named filter.
    Matched(String),
    /// No enabled filter matched.
    Filtered,
}

impl FilterDecision {
    /// Returns true unless the SMS was filtered out.
    #[must_use]
    pub const fn should_forward(&self) -> bool {
        !matches!(self, Self::Filtered)
    }
}

/// Evaluates enabled filters against an SMS. The first match wins.
#[must_use]
pub fn evaluate(filters: &[SmsFilter], sender: &str, content: &str) -> FilterDecision {
    let mut enabled = filters.iter().filter(|f| f.enabled).peekable();
    if enabled.peek().is_none() {
        return FilterDecision::NoFilters;
    }
    enabled
        .find(|f| f.matches(sender, content))
        .map_or(FilterDecision::Filtered, |f| {
            FilterDecision::Matched(f.name.clone())
        })
}
