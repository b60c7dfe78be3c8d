//! Centralized error types for emlsift.
//!
//! Two families live here: [`ExtractError`] for conditions that abort an
//! operation, and [`MimeWarning`] for the recoverable conditions the MIME
//! walker records while it keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an extraction or an export.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The top-level header block could not be parsed (or the input was empty).
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("Message file not found: {0}")]
    FileNotFound(PathBuf),

    /// Writing an extracted item failed.
    #[error("Failed to write '{path}': {source}")]
    WriteFailure {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, ExtractError>`.
pub type Result<T> = std::result::Result<T, ExtractError>;

impl ExtractError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Recoverable conditions met while walking a message.
///
/// None of these stop the extraction as a whole: the affected part or
/// container is skipped and whatever was already emitted is kept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MimeWarning {
    /// A `multipart/*` content type without a `boundary` parameter.
    #[error("multipart container at depth {depth} has no boundary parameter")]
    MissingBoundary { depth: usize },

    /// Malformed framing while iterating a multipart body.
    #[error("malformed multipart framing at depth {depth}: {reason}")]
    PartRead { depth: usize, reason: String },

    /// The transfer decoder hit malformed data; `decoded` bytes were kept.
    #[error("{encoding} body truncated after {decoded} decoded bytes")]
    DecodeTruncation { encoding: String, decoded: usize },

    /// A leaf part decoded to more than the configured limit and was dropped.
    #[error("part exceeds the {limit}-byte decoded size limit")]
    PartTooLarge { limit: usize },

    /// Nested multipart containers went deeper than the configured limit.
    #[error("multipart nesting deeper than {depth} levels skipped")]
    DepthExceeded { depth: usize },

    /// A leaf part matched no extraction rule.
    #[error("part of type '{content_type}' matched no extraction rule")]
    Dropped { content_type: String },
}
