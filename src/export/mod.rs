//! Host-side output: writing results to disk and listing them.

pub mod files;
pub mod manifest;
