//! `emlsift`: pull bodies, attachments and inline resources out of raw
//! RFC 5322 / MIME messages.
//!
//! The core is [`parser::extract`]: raw message bytes in, an ordered list of
//! classified [`model::ExtractionResult`]s out. Writing them to disk lives in
//! [`export`]; the optional `ffi` feature exposes the same call over a C ABI.

pub mod config;
pub mod error;
pub mod export;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod model;
pub mod parser;

pub use error::{ExtractError, MimeWarning, Result};
pub use model::{Envelope, Extraction, ExtractionResult, Role};
pub use parser::{extract, extract_with, ExtractOptions};
