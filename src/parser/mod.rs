//! MIME decomposition: header access, transfer decoding, name resolution,
//! classification and the recursive multipart walker.

pub mod classify;
pub mod decode;
pub mod header;
pub mod message;
pub mod multipart;
pub mod name;

pub use message::{extract, extract_with, Message};

/// Default decoded-size limit for a single leaf part (64 MiB).
pub const DEFAULT_MAX_PART_SIZE: usize = 64 * 1024 * 1024;

/// Default limit on nested multipart containers.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Limits applied while walking untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Leaf parts decoding to more bytes than this are dropped.
    pub max_part_size: usize,
    /// Containers nested deeper than this are skipped.
    pub max_depth: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_part_size: DEFAULT_MAX_PART_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
