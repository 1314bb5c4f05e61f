//! Ordered header fields and their wire rendering.

use crate::encoding::{encode_words, needs_header_encoding};
use crate::error::{Error, Result};

/// Preferred line length for folded headers (RFC 5322 §2.1.1).
const FOLD_WIDTH: usize = 78;

/// Hard line length limit, excluding CRLF (RFC 5322 §2.1.1).
const MAX_LINE: usize = 998;

/// Longest unbroken word `unstructured` leaves as plain text.
const MAX_PLAIN_WORD: usize = 75;

/// Header fields in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, keeping any existing ones with the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Replaces every field with this name, or appends one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(index) = self.position(&name) {
            self.fields[index].1 = value;
            let mut seen = 0;
            self.fields.retain(|(n, _)| {
                if n.eq_ignore_ascii_case(&name) {
                    seen += 1;
                    seen == 1
                } else {
                    true
                }
            });
        } else {
            self.fields.push((name, value));
        }
    }

    /// Returns the first value for a name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.fields[i].1.as_str())
    }

    /// Iterates over fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true when no fields are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Renders all fields, each CRLF-terminated and folded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] for a malformed name, or a value
    /// carrying raw line breaks or non-ASCII text.
    pub fn render(&self) -> Result<String> {
        let mut out = String::new();
        for (name, value) in &self.fields {
            check_field(name, value)?;
            out.push_str(name);
            out.push(':');
            fold_into(&mut out, name.len() + 1, value);
            out.push_str("\r\n");
        }
        Ok(out)
    }
}

/// Prepares free text (such as a subject) for a header value, switching
/// to RFC 2047 encoded words when it is not plain ASCII or has a word too
/// long to fold.
#[must_use]
pub fn unstructured(text: &str) -> String {
    if needs_header_encoding(text) || text.split(' ').any(|word| word.len() > MAX_PLAIN_WORD) {
        encode_words(text).join(" ")
    } else {
        text.to_string()
    }
}

fn check_field(name: &str, value: &str) -> Result<()> {
    let invalid = |reason| Error::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
        return Err(invalid("name must be printable ASCII without ':'"));
    }
    if value.contains(['\r', '\n']) {
        return Err(invalid("value contains a line break"));
    }
    if !value.is_ascii() {
        return Err(invalid("value must be ASCII; encode it first"));
    }
    // The first word shares its line with the name.
    let prefix = name.len() + 1;
    if value.split(' ').enumerate().any(|(i, word)| {
        let lead = if i == 0 { prefix } else { 0 };
        lead + 1 + word.len() > MAX_LINE
    }) {
        return Err(invalid("value has a word too long to fold"));
    }
    Ok(())
}

/// Writes ` value`, folding at spaces once a line passes [`FOLD_WIDTH`].
fn fold_into(out: &mut String, mut width: usize, value: &str) {
    for (i, word) in value.split(' ').enumerate() {
        if i > 0 && width + 1 + word.len() > FOLD_WIDTH {
            out.push_str("\r\n");
            width = 0;
        }
        out.push(' ');
        out.push_str(word);
        width += 1 + word.len();
    }
}
