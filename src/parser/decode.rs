//! Transfer-Decoder: wraps a part body so that reads yield decoded bytes.
//!
//! Decoding is best effort. A decoder never fails when it is built; malformed
//! input surfaces as an `InvalidData` read error after every byte decoded so
//! far has been handed out, and [`drain`] turns that into a truncation.

use std::io::{self, BufRead, BufReader, Read};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use quoted_printable::ParseMode;

/// Chunk size used when pulling raw bytes from the wrapped reader.
const READ_CHUNK: usize = 8 * 1024;

/// Standard alphabet, padding optional, trailing bits ignored.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// A recognised `Content-Transfer-Encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    Base64,
    QuotedPrintable,
    /// `7bit`, `8bit`, `binary`, absent, or anything unrecognised.
    Identity,
}

impl TransferEncoding {
    /// Map a header value (compared case-insensitively after trimming).
    pub fn from_header(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("base64") {
            Self::Base64
        } else if value.eq_ignore_ascii_case("quoted-printable") {
            Self::QuotedPrintable
        } else {
            Self::Identity
        }
    }
}

/// A reader yielding decoded bytes.
pub enum Decoder<R: Read> {
    Identity(R),
    Base64(Base64Decoder<R>),
    QuotedPrintable(QuotedPrintableDecoder<BufReader<R>>),
}

/// Wrap `raw` according to the declared transfer encoding.
pub fn decode<R: Read>(encoding: &str, raw: R) -> Decoder<R> {
    match TransferEncoding::from_header(encoding) {
        TransferEncoding::Base64 => Decoder::Base64(Base64Decoder::new(raw)),
        TransferEncoding::QuotedPrintable => {
            Decoder::QuotedPrintable(QuotedPrintableDecoder::new(BufReader::new(raw)))
        }
        TransferEncoding::Identity => Decoder::Identity(raw),
    }
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Decoder::Identity(r) => r.read(buf),
            Decoder::Base64(r) => r.read(buf),
            Decoder::QuotedPrintable(r) => r.read(buf),
        }
    }
}

/// Decoded output buffer shared by the two decoders.
#[derive(Default)]
struct Pending {
    buf: Vec<u8>,
    pos: usize,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn copy_to(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.buf.len() - self.pos);
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        n
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.pos = 0;
    }
}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

/// Streaming base64 decoder.
///
/// Line breaks and other ASCII whitespace are skipped. Input is decoded in
/// 4-character quanta so a bad quantum only loses the data from that point on.
pub struct Base64Decoder<R> {
    inner: R,
    /// Base64 characters not yet decoded.
    quanta: Vec<u8>,
    out: Pending,
    eof: bool,
    failed: bool,
}

impl<R: Read> Base64Decoder<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            quanta: Vec::with_capacity(READ_CHUNK),
            out: Pending::default(),
            eof: false,
            failed: false,
        }
    }

    /// Decode complete quanta from `self.quanta` (all of them at end of input).
    fn decode_quanta(&mut self, at_eof: bool) {
        let usable = if at_eof {
            self.quanta.len()
        } else {
            self.quanta.len() - self.quanta.len() % 4
        };
        if usable == 0 {
            return;
        }
        match LENIENT_BASE64.decode(&self.quanta[..usable]) {
            Ok(bytes) => self.out.buf.extend_from_slice(&bytes),
            Err(_) => {
                // Salvage quantum by quantum up to the first bad one
                for group in self.quanta[..usable].chunks(4) {
                    match LENIENT_BASE64.decode(group) {
                        Ok(bytes) => self.out.buf.extend_from_slice(&bytes),
                        Err(_) => {
                            self.failed = true;
                            break;
                        }
                    }
                }
            }
        }
        self.quanta.drain(..usable);
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = match self.inner.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(()),
            Err(e) => return Err(e),
        };
        if n == 0 {
            self.eof = true;
            self.decode_quanta(true);
            return Ok(());
        }
        self.quanta
            .extend(chunk[..n].iter().copied().filter(|b| !b.is_ascii_whitespace()));
        self.decode_quanta(false);
        Ok(())
    }
}

impl<R: Read> Read for Base64Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if !self.out.is_empty() {
                return Ok(self.out.copy_to(buf));
            }
            self.out.reset();
            if self.failed {
                return Err(invalid_data("malformed base64 data"));
            }
            if self.eof {
                return Ok(0);
            }
            self.fill()?;
        }
    }
}

/// Streaming quoted-printable decoder (RFC 2045), one line at a time.
///
/// Soft line breaks (`=` at end of line) are removed; hard line breaks keep
/// the ending they had in the source (CRLF or bare LF).
pub struct QuotedPrintableDecoder<R> {
    inner: R,
    line: Vec<u8>,
    out: Pending,
    eof: bool,
}

impl<R: BufRead> QuotedPrintableDecoder<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: Vec::new(),
            out: Pending::default(),
            eof: false,
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        self.line.clear();
        if self.inner.read_until(b'\n', &mut self.line)? == 0 {
            self.eof = true;
            return Ok(());
        }
        let lf_only = self.line.ends_with(b"\n") && !self.line.ends_with(b"\r\n");
        let mut decoded = quoted_printable::decode(&self.line, ParseMode::Robust)
            .map_err(|e| invalid_data(&e.to_string()))?;
        // The decoder normalizes hard breaks to CRLF.
        if lf_only && decoded.ends_with(b"\r\n") {
            decoded.remove(decoded.len() - 2);
        }
        self.out.buf = decoded;
        self.out.pos = 0;
        Ok(())
    }
}

impl<R: BufRead> Read for QuotedPrintableDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if !self.out.is_empty() {
                return Ok(self.out.copy_to(buf));
            }
            if self.eof {
                return Ok(0);
            }
            self.fill()?;
        }
    }
}

/// How a drained stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    Complete,
    /// A read error stopped decoding; the prefix is kept.
    Truncated,
    /// More than the limit was produced; reading stopped.
    TooLarge,
}

/// The fully buffered output of a decoder.
#[derive(Debug)]
pub struct Drained {
    pub data: Vec<u8>,
    pub status: DrainStatus,
}

/// Read `reader` to the end, keeping at most `limit` bytes.
///
/// Read errors are never propagated: they end the stream and mark it
/// [`DrainStatus::Truncated`].
pub fn drain<R: Read>(mut reader: R, limit: usize) -> Drained {
    let mut data = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                if data.len() + n > limit {
                    return Drained {
                        data,
                        status: DrainStatus::TooLarge,
                    };
                }
                data.extend_from_slice(&chunk[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => {
                return Drained {
                    data,
                    status: DrainStatus::Truncated,
                }
            }
        }
    }
    Drained {
        data,
        status: DrainStatus::Complete,
    }
}
