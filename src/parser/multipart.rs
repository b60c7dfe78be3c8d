//! Multipart Walker: boundary framing and recursive descent over the MIME tree.
//!
//! Nested containers are never materialized. Each container gets its own
//! [`MultipartReader`] over the byte range of its enclosing part, so an inner
//! context is always exhausted before the outer one moves on.

use mailparse::MailHeader;
use tracing::{debug, warn};

use super::classify::{bare_content_id, classify, Classification};
use super::decode::{self, DrainStatus};
use super::header::{parse_header_block, split_header_block, HeaderLookup, MediaType};
use super::name::resolve_name;
use super::ExtractOptions;
use crate::error::MimeWarning;
use crate::model::{ExtractionResult, Role};

/// One section of a multipart body: its headers and the bytes up to the
/// next delimiter.
#[derive(Debug)]
pub struct Part<'a> {
    headers: Vec<MailHeader<'a>>,
    body: &'a [u8],
}

impl<'a> Part<'a> {
    /// Split raw part bytes into headers and body.
    pub fn parse(raw: &'a [u8]) -> Result<Self, String> {
        let (block, body) = split_header_block(raw);
        let headers =
            parse_header_block(block).map_err(|e| format!("invalid part headers: {e}"))?;
        Ok(Self { headers, body })
    }

    pub fn body(&self) -> &'a [u8] {
        self.body
    }
}

impl HeaderLookup for Part<'_> {
    fn header(&self, name: &str) -> Option<String> {
        self.headers.header(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    /// Positioned before the next part.
    Reading,
    /// Closing delimiter consumed or no delimiter found at all.
    Done,
    /// Framing broke; nothing more is read from this container.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    /// `--boundary`
    Open,
    /// `--boundary--`
    Close,
}

/// Boundary-tokenizing reader yielding successive parts of one container.
pub struct MultipartReader<'a> {
    data: &'a [u8],
    /// `--` followed by the boundary.
    dash_boundary: Vec<u8>,
    pos: usize,
    started: bool,
    state: ReaderState,
}

impl<'a> MultipartReader<'a> {
    pub fn new(data: &'a [u8], boundary: &str) -> Self {
        let mut dash_boundary = Vec::with_capacity(boundary.len() + 2);
        dash_boundary.extend_from_slice(b"--");
        dash_boundary.extend_from_slice(boundary.as_bytes());
        Self {
            data,
            dash_boundary,
            pos: 0,
            started: false,
            state: ReaderState::Reading,
        }
    }

    /// Read the next part.
    ///
    /// `Ok(None)` once the closing delimiter (or end of a stream without any
    /// delimiter) is reached. `Err` on broken framing; the reader then stays
    /// finished.
    pub fn next_part(&mut self) -> Result<Option<Part<'a>>, String> {
        if self.state != ReaderState::Reading {
            return Ok(None);
        }

        if !self.started {
            self.started = true;
            if !self.skip_preamble() {
                self.state = ReaderState::Done;
                return Ok(None);
            }
        }

        let start = self.pos;
        let mut search = start;
        loop {
            let Some(idx) = find(&self.data[search..], &self.dash_boundary).map(|i| i + search)
            else {
                self.state = ReaderState::Error;
                return Err("stream ended before the closing delimiter".to_string());
            };

            if idx == start || self.data[idx - 1] == b'\n' {
                let end = self.line_end(idx);
                if let Some(kind) = self.delimiter_at(idx, end) {
                    let raw = &self.data[start..body_end(self.data, start, idx)];
                    self.pos = next_line(self.data, end);
                    if kind == Delimiter::Close {
                        self.state = ReaderState::Done;
                    }
                    return match Part::parse(raw) {
                        Ok(part) => Ok(Some(part)),
                        Err(reason) => {
                            self.state = ReaderState::Error;
                            Err(reason)
                        }
                    };
                }
            }
            search = idx + 1;
        }
    }

    /// Move past the preamble to the first part. Returns `false` when there is
    /// no part to read.
    fn skip_preamble(&mut self) -> bool {
        let mut pos = 0;
        while pos < self.data.len() {
            let end = self.line_end(pos);
            if let Some(kind) = self.delimiter_at(pos, end) {
                self.pos = next_line(self.data, end);
                return kind == Delimiter::Open;
            }
            pos = next_line(self.data, end);
        }
        false
    }

    fn line_end(&self, from: usize) -> usize {
        self.data[from..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.data.len(), |i| from + i)
    }

    /// Classify the line `data[start..end]` as a delimiter, if it is one.
    /// Trailing whitespace (transport padding) is allowed.
    fn delimiter_at(&self, start: usize, end: usize) -> Option<Delimiter> {
        let line = &self.data[start..end];
        let rest = line.strip_prefix(self.dash_boundary.as_slice())?;
        let (kind, rest) = match rest.strip_prefix(b"--") {
            Some(rest) => (Delimiter::Close, rest),
            None => (Delimiter::Open, rest),
        };
        rest.iter()
            .all(|b| b.is_ascii_whitespace())
            .then_some(kind)
    }
}

/// The line break before a delimiter belongs to the delimiter.
fn body_end(data: &[u8], start: usize, delimiter: usize) -> usize {
    let mut end = delimiter;
    if end > start && data[end - 1] == b'\n' {
        end -= 1;
        if end > start && data[end - 1] == b'\r' {
            end -= 1;
        }
    }
    end
}

fn next_line(data: &[u8], line_end: usize) -> usize {
    (line_end + 1).min(data.len())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Walks one message, collecting results in document order.
pub(crate) struct Walker<'o> {
    options: &'o ExtractOptions,
    results: Vec<ExtractionResult>,
    warnings: Vec<MimeWarning>,
}

impl<'o> Walker<'o> {
    pub(crate) fn new(options: &'o ExtractOptions) -> Self {
        Self {
            options,
            results: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> (Vec<ExtractionResult>, Vec<MimeWarning>) {
        (self.results, self.warnings)
    }

    /// Process one entity (the message itself or a part) found `depth`
    /// containers deep.
    pub(crate) fn entity<H: HeaderLookup + ?Sized>(
        &mut self,
        headers: &H,
        body: &[u8],
        depth: usize,
    ) {
        let content_type = headers.content_type();
        let disposition = headers.content_disposition();
        let content_id = headers.content_id();
        let resolved = resolve_name(headers);

        match classify(
            content_type.as_deref(),
            disposition.as_deref(),
            content_id.as_deref(),
            &resolved,
        ) {
            Classification::Container => {
                self.container(content_type.as_deref().unwrap_or_default(), body, depth)
            }
            Classification::Leaf { role, .. } if !role.is_emitted() => {
                let content_type = content_type.unwrap_or_default();
                debug!(
                    content_type = %content_type,
                    depth,
                    "Dropping part with no extraction rule"
                );
                self.warnings.push(MimeWarning::Dropped { content_type });
            }
            Classification::Leaf { role, name } => {
                let leaf = Leaf {
                    role,
                    name,
                    content_type: content_type.unwrap_or_default(),
                    content_id,
                    encoding: headers.transfer_encoding(),
                };
                self.leaf(leaf, body);
            }
        }
    }

    fn container(&mut self, content_type: &str, body: &[u8], depth: usize) {
        let media = MediaType::parse(content_type);
        match media.as_ref().and_then(MediaType::boundary) {
            Some(boundary) => self.walk(body, boundary, depth),
            None => {
                warn!(content_type, depth, "Multipart container without boundary, skipping");
                self.warnings.push(MimeWarning::MissingBoundary { depth });
            }
        }
    }

    /// Iterate the parts of a container, descending into nested ones.
    fn walk(&mut self, body: &[u8], boundary: &str, depth: usize) {
        if depth >= self.options.max_depth {
            warn!(depth, "Multipart nesting too deep, skipping branch");
            self.warnings.push(MimeWarning::DepthExceeded { depth });
            return;
        }

        let mut reader = MultipartReader::new(body, boundary);
        loop {
            match reader.next_part() {
                Ok(Some(part)) => self.entity(&part, part.body(), depth + 1),
                Ok(None) => break,
                Err(reason) => {
                    warn!(depth, reason = %reason, "Stopped reading multipart container");
                    self.warnings.push(MimeWarning::PartRead { depth, reason });
                    break;
                }
            }
        }
    }

    fn leaf(&mut self, leaf: Leaf, body: &[u8]) {
        let drained = decode::drain(
            decode::decode(&leaf.encoding, body),
            self.options.max_part_size,
        );

        match drained.status {
            DrainStatus::Complete => {}
            DrainStatus::TooLarge => {
                warn!(
                    name = %leaf.name,
                    limit = self.options.max_part_size,
                    "Part exceeds decoded size limit, dropping"
                );
                self.warnings.push(MimeWarning::PartTooLarge {
                    limit: self.options.max_part_size,
                });
                return;
            }
            DrainStatus::Truncated => {
                warn!(
                    name = %leaf.name,
                    encoding = %leaf.encoding,
                    decoded = drained.data.len(),
                    "Malformed transfer encoding, keeping decoded prefix"
                );
                self.warnings.push(MimeWarning::DecodeTruncation {
                    encoding: leaf.encoding.clone(),
                    decoded: drained.data.len(),
                });
            }
        }

        debug!(
            role = %leaf.role,
            name = %leaf.name,
            content_type = %leaf.content_type,
            size = drained.data.len(),
            "Extracted part"
        );

        self.results.push(ExtractionResult {
            name: leaf.name,
            content_type: leaf.content_type,
            data: drained.data,
            role: leaf.role,
            transfer_encoding: leaf.encoding,
            content_id: leaf
                .content_id
                .as_deref()
                .map(bare_content_id)
                .filter(|id| !id.is_empty())
                .map(String::from),
        });
    }
}

/// A classified leaf waiting for its body to be decoded.
struct Leaf {
    role: Role,
    name: String,
    content_type: String,
    content_id: Option<String>,
    encoding: String,
}
