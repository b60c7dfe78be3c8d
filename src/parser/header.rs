//! Header access shared by the top-level message and every MIME part.
//!
//! Folding, RFC 2047 encoded words and RFC 2231 parameters are handled by
//! `mailparse`; this module only adapts it to the lookups the walker needs.

use std::collections::BTreeMap;

use mailparse::{MailHeader, MailHeaderMap, MailParseError};
use thiserror::Error;

/// Case-insensitive header lookup, implemented by anything carrying headers.
pub trait HeaderLookup {
    /// First value of the named header, unfolded and decoded.
    fn header(&self, name: &str) -> Option<String>;

    /// Raw `Content-Type` value, parameters included.
    fn content_type(&self) -> Option<String> {
        self.header("Content-Type")
    }

    fn content_disposition(&self) -> Option<String> {
        self.header("Content-Disposition")
    }

    /// `Content-Transfer-Encoding`, trimmed and lowercased. Empty if absent.
    fn transfer_encoding(&self) -> String {
        self.header("Content-Transfer-Encoding")
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_default()
    }

    fn content_id(&self) -> Option<String> {
        self.header("Content-ID")
    }
}

impl HeaderLookup for [MailHeader<'_>] {
    fn header(&self, name: &str) -> Option<String> {
        self.get_first_value(name)
    }
}

impl HeaderLookup for Vec<MailHeader<'_>> {
    fn header(&self, name: &str) -> Option<String> {
        self.as_slice().header(name)
    }
}

/// A parsed media type: lowercased `type/subtype` plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub essence: String,
    pub params: BTreeMap<String, String>,
}

impl MediaType {
    /// Parse a `Content-Type` value. Returns `None` when there is nothing
    /// that looks like `type/subtype`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let parsed = mailparse::parse_content_type(value);
        if !parsed.mimetype.contains('/') {
            return None;
        }
        Some(Self {
            essence: parsed.mimetype.to_ascii_lowercase(),
            params: parsed.params,
        })
    }

    pub fn is_multipart(&self) -> bool {
        self.essence.starts_with("multipart/")
    }

    pub fn boundary(&self) -> Option<&str> {
        self.params
            .get("boundary")
            .map(String::as_str)
            .filter(|b| !b.is_empty())
    }
}

/// Whether a raw `Content-Type` value starts with `prefix`, ignoring ASCII case
/// and leading whitespace.
pub fn has_media_prefix(content_type: &str, prefix: &str) -> bool {
    let ct = content_type.trim_start().as_bytes();
    ct.len() >= prefix.len() && ct[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Split a header block from the body that follows it.
///
/// Returns `(header_bytes, body)`. The header bytes include the terminating
/// blank line so the header parser sees a complete block. Without a blank
/// line the whole input is headers and the body is empty.
pub fn split_header_block(data: &[u8]) -> (&[u8], &[u8]) {
    if data.starts_with(b"\r\n") {
        return (&data[..0], &data[2..]);
    }
    if data.starts_with(b"\n") {
        return (&data[..0], &data[1..]);
    }
    match find_header_end(data) {
        Some((_, body_start)) => (&data[..body_start], &data[body_start..]),
        None => (data, &data[data.len()..]),
    }
}

/// Why a header block was rejected.
#[derive(Error, Debug)]
pub enum HeaderBlockError {
    /// A line that is neither `name: value` nor a continuation.
    #[error("malformed header line {line}: {text:?}")]
    MalformedLine { line: usize, text: String },

    /// The block opens with folded whitespace.
    #[error("header block starts with a continuation line")]
    LeadingContinuation,

    #[error(transparent)]
    Parse(#[from] MailParseError),
}

/// Parse a header block (as returned by [`split_header_block`]).
///
/// Every line must be `name: value` with a printable, space-free name, or a
/// continuation of the previous one. `mailparse` alone accepts almost any
/// bytes; the block is checked before it reaches the parser.
pub fn parse_header_block(block: &[u8]) -> Result<Vec<MailHeader<'_>>, HeaderBlockError> {
    if block.is_empty() {
        return Ok(Vec::new());
    }
    validate_header_block(block)?;
    Ok(mailparse::parse_headers(block).map(|(headers, _)| headers)?)
}

fn validate_header_block(block: &[u8]) -> Result<(), HeaderBlockError> {
    for (i, line) in block.split(|&b| b == b'\n').enumerate() {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let Some(&first) = line.first() else {
            continue;
        };
        if first == b' ' || first == b'\t' {
            if i == 0 {
                return Err(HeaderBlockError::LeadingContinuation);
            }
            continue;
        }
        let valid = match line.iter().position(|&b| b == b':') {
            Some(colon) => colon > 0 && line[..colon].iter().all(|&b| is_field_name_byte(b)),
            None => false,
        };
        if !valid {
            return Err(HeaderBlockError::MalformedLine {
                line: i + 1,
                text: String::from_utf8_lossy(line).chars().take(40).collect(),
            });
        }
    }
    Ok(())
}

/// RFC 5322 field-name characters: printable ASCII except `:`.
fn is_field_name_byte(b: u8) -> bool {
    b.is_ascii_graphic() && b != b':'
}

/// Find the first blank line. Returns `(header_end, body_start)`.
fn find_header_end(data: &[u8]) -> Option<(usize, usize)> {
    // Look for \n\n or \n\r\n
    for i in 0..data.len().saturating_sub(1) {
        if data[i] != b'\n' {
            continue;
        }
        if data[i + 1] == b'\n' {
            return Some((i + 1, i + 2));
        }
        if i + 2 < data.len() && data[i + 1] == b'\r' && data[i + 2] == b'\n' {
            return Some((i + 1, i + 3));
        }
    }
    None
}
