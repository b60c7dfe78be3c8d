//! Core data model: envelope metadata, roles and extraction results.

pub mod envelope;
pub mod extraction;

pub use envelope::Envelope;
pub use extraction::{Extraction, ExtractionResult, Role};
