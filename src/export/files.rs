//! Write an extraction to a directory.
//!
//! Attachments and inline resources are written under their sanitized leaf
//! name, the primary bodies under fixed names from [`OutputConfig`]. A failed
//! write is recorded and logged; the remaining items are still written.

use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::error::{ExtractError, Result};
use crate::model::{Extraction, ExtractionResult, Role};

/// Name used when nothing usable is left after sanitizing.
const FALLBACK_NAME: &str = "attachment";

/// Longest filename produced, in characters.
const MAX_NAME_LEN: usize = 200;

/// One file written to disk.
#[derive(Debug, Clone)]
pub struct WrittenItem {
    pub path: PathBuf,
    pub role: Role,
    pub content_type: String,
    pub size: usize,
}

/// Outcome of [`write_extraction`].
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<WrittenItem>,
    /// One [`ExtractError::WriteFailure`] per item that could not be written.
    pub failures: Vec<ExtractError>,
}

/// Reduce a header-supplied name to a bare filename.
///
/// Only the final component survives (`/` and `\` both separate), `.` and
/// `..` are rejected, and characters invalid on common filesystems become `_`.
pub fn sanitize_leaf_name(name: &str) -> String {
    let leaf = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if leaf.is_empty() || leaf == "." || leaf == ".." {
        return FALLBACK_NAME.to_string();
    }

    leaf.chars()
        .map(|c| {
            if c.is_control() || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .take(MAX_NAME_LEN)
        .collect()
}

/// The filename a result is written under, or `None` for results that are
/// never written.
pub fn target_name(result: &ExtractionResult, output: &OutputConfig) -> Option<String> {
    match result.role {
        Role::Attachment | Role::InlineResource => Some(sanitize_leaf_name(&result.name)),
        Role::PrimaryBodyHtml => Some(sanitize_leaf_name(&output.html_body_name)),
        Role::PrimaryBodyText => Some(sanitize_leaf_name(&output.text_body_name)),
        Role::None => None,
    }
}

/// Write every result of `extraction` into `output_dir`.
///
/// Fails only if the directory itself cannot be created.
pub fn write_extraction(
    extraction: &Extraction,
    output_dir: &Path,
    output: &OutputConfig,
) -> Result<ExportReport> {
    std::fs::create_dir_all(output_dir).map_err(|e| ExtractError::io(output_dir, e))?;

    let mut report = ExportReport::default();
    for result in &extraction.results {
        let Some(name) = target_name(result, output) else {
            continue;
        };
        let path = output_dir.join(name);
        let path = if output.overwrite {
            path
        } else {
            unique_path(&path)
        };

        match std::fs::write(&path, &result.data) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), role = %result.role, "Wrote item");
                report.written.push(WrittenItem {
                    path,
                    role: result.role,
                    content_type: result.content_type.clone(),
                    size: result.data.len(),
                });
            }
            Err(source) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "Failed to write extracted item"
                );
                report
                    .failures
                    .push(ExtractError::WriteFailure { path, source });
            }
        }
    }

    Ok(report)
}

/// If `path` already exists, append a counter to make it unique.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    for i in 1..1000 {
        let candidate = if ext.is_empty() {
            parent.join(format!("{stem}_{i}"))
        } else {
            parent.join(format!("{stem}_{i}.{ext}"))
        };
        if !candidate.exists() {
            return candidate;
        }
    }

    parent.join(format!("{stem}_dup.{ext}"))
}
