//! Message Entry Point: top-level headers, then hand-off to the walker.

use mailparse::MailHeader;
use tracing::debug;

use super::header::{parse_header_block, split_header_block, HeaderLookup};
use super::multipart::Walker;
use super::ExtractOptions;
use crate::error::{ExtractError, Result};
use crate::model::{Envelope, Extraction};

/// A parsed message: top-level headers plus the raw body.
#[derive(Debug)]
pub struct Message<'a> {
    headers: Vec<MailHeader<'a>>,
    body: &'a [u8],
}

impl<'a> Message<'a> {
    /// Parse the top-level header block.
    ///
    /// A leading byte-order mark and an MBOX `From ` separator line are
    /// skipped. Fails with [`ExtractError::MalformedMessage`] on empty input
    /// or an unparsable header block.
    pub fn parse(raw: &'a [u8]) -> Result<Self> {
        let data = skip_from_line(raw);
        if data.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ExtractError::MalformedMessage("empty message".into()));
        }
        let (block, body) = split_header_block(data);
        let headers = parse_header_block(block)
            .map_err(|e| ExtractError::MalformedMessage(e.to_string()))?;
        Ok(Self { headers, body })
    }

    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    pub fn envelope(&self) -> Envelope {
        Envelope::from_headers(&self.headers)
    }
}

impl HeaderLookup for Message<'_> {
    fn header(&self, name: &str) -> Option<String> {
        self.headers.header(name)
    }
}

/// Extract bodies, attachments and inline resources with default limits.
pub fn extract(raw: &[u8]) -> Result<Extraction> {
    extract_with(raw, &ExtractOptions::default())
}

/// Extract with explicit limits.
///
/// Results come back in document order (pre-order over the MIME tree).
/// Only a malformed top-level header block is an error; everything else is
/// recorded in [`Extraction::warnings`].
pub fn extract_with(raw: &[u8], options: &ExtractOptions) -> Result<Extraction> {
    let message = Message::parse(raw)?;
    let envelope = message.envelope();
    debug!(
        from = %envelope.from,
        subject = %envelope.subject,
        content_type = %message.content_type().unwrap_or_default(),
        "Parsed message headers"
    );

    let mut walker = Walker::new(options);
    walker.entity(&message, message.body(), 0);
    let (results, warnings) = walker.finish();

    Ok(Extraction {
        envelope,
        results,
        warnings,
    })
}

/// Skip a UTF-8 BOM and the `From ` separator line of MBOX-exported messages.
fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);

    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}
