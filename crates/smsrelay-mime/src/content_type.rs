//! Content-Type header values (RFC 2045 §5).

use std::fmt;

/// A media type with its ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    main_type: String,
    sub_type: String,
    parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a content type without parameters.
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into().to_ascii_lowercase(),
            sub_type: sub_type.into().to_ascii_lowercase(),
            parameters: Vec::new(),
        }
    }

    /// `text/plain; charset=utf-8`.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// `multipart/mixed` with the given boundary.
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_parameter("boundary", boundary)
    }

    /// Adds or replaces a parameter. Names are case-insensitive.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        match self.parameters.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.parameters.push((name, value)),
        }
        self
    }

    /// Returns a parameter value.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `type/subtype`.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Returns true for `multipart/*`.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// Returns the boundary parameter, if any.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }
}

/// RFC 2045 `tspecials` plus whitespace and controls force quoting.
fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value.bytes().any(|b| {
            b <= b' '
                || b >= 0x7f
                || matches!(
                    b,
                    b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"' | b'/'
                        | b'[' | b']' | b'?' | b'='
                )
        })
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        for (name, value) in &self.parameters {
            if needs_quoting(value) {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "; {name}=\"{escaped}\"")?;
            } else {
                write!(f, "; {name}={value}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_plain_declares_utf8() {
        assert_eq!(ContentType::text_plain().to_string(), "text/plain; charset=utf-8");
    }

    #[test]
    fn boundary_is_quoted_when_needed() {
        let ct = ContentType::multipart_mixed("=_part/1");
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("=_part/1"));
        assert_eq!(ct.to_string(), "multipart/mixed; boundary=\"=_part/1\"");
    }

    #[test]
    fn parameters_replace_case_insensitively() {
        let ct = ContentType::new("Text", "Plain")
            .with_parameter("Charset", "us-ascii")
            .with_parameter("charset", "utf-8");
        assert_eq!(ct.essence(), "text/plain");
        assert_eq!(ct.parameter("CHARSET"), Some("utf-8"));
        assert_eq!(ct.to_string(), "text/plain; charset=utf-8");
    }
}
