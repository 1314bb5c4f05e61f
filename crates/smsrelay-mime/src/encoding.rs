//! Transfer encodings for bodies (RFC 2045) and headers (RFC 2047).

use std::fmt::Write as _;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Longest encoded body line, excluding CRLF.
pub const MAX_LINE_LENGTH: usize = 76;

/// Longest single RFC 2047 encoded word.
const MAX_ENCODED_WORD: usize = 75;

/// `=?utf-8?B?` plus `?=`.
const ENCODED_WORD_OVERHEAD: usize = 12;

/// Encodes bytes as Base64 without line breaks.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes bytes as Base64 broken into CRLF-terminated lines.
#[must_use]
pub fn encode_base64_lines(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2 + 2);
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(MAX_LINE_LENGTH));
        out.push_str(line);
        out.push_str("\r\n");
        rest = tail;
    }
    out
}

/// Encodes text as Quoted-Printable (RFC 2045 §6.7).
///
/// Input line breaks (LF or CRLF) become CRLF hard breaks. Output lines
/// never exceed [`MAX_LINE_LENGTH`]; longer input lines get soft breaks.
/// Whitespace at the end of a line is escaped so relays cannot strip it.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 11 / 10);
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push_str("\r\n");
        }
        encode_qp_line(line.strip_suffix('\r').unwrap_or(line), &mut out);
    }
    out
}

fn encode_qp_line(line: &str, out: &mut String) {
    let bytes = line.as_bytes();
    let mut width = 0;
    let mut token = String::with_capacity(3);

    for (i, &byte) in bytes.iter().enumerate() {
        token.clear();
        let last = i + 1 == bytes.len();
        match byte {
            b' ' | b'\t' if !last => token.push(char::from(byte)),
            b'!'..=b'<' | b'>'..=b'~' => token.push(char::from(byte)),
            _ => {
                let _ = write!(token, "={byte:02X}");
            }
        }

        // Leave room for the soft-break `=`.
        if width + token.len() > MAX_LINE_LENGTH - 1 {
            out.push_str("=\r\n");
            width = 0;
        }
        out.push_str(&token);
        width += token.len();
    }
}

/// Returns true if a header value must be carried in encoded words.
#[must_use]
pub fn needs_header_encoding(text: &str) -> bool {
    text.contains("=?") || text.chars().any(|c| !c.is_ascii() || c.is_ascii_control())
}

/// Encodes text as a sequence of RFC 2047 `B` encoded words.
///
/// Each word stays within 75 characters and never splits a character.
#[must_use]
pub fn encode_words(text: &str) -> Vec<String> {
    // Base64 payload is a multiple of 4 chars; 3 raw bytes per 4 chars.
    let payload = (MAX_ENCODED_WORD - ENCODED_WORD_OVERHEAD) / 4 * 4;
    let max_bytes = payload / 4 * 3;

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in text.chars() {
        if chunk.len() + c.len_utf8() > max_bytes {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() || words.is_empty() {
        words.push(encoded_word(&chunk));
    }
    words
}

fn encoded_word(chunk: &str) -> String {
    format!("=?utf-8?B?{}?=", encode_base64(chunk.as_bytes()))
}
