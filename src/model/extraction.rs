//! Extraction output: one record per extracted MIME leaf part.

use serde::{Deserialize, Serialize};

use super::envelope::Envelope;
use crate::error::MimeWarning;

/// What an extracted part is to the reader of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A part carrying its own filename.
    Attachment,
    /// An unnamed `text/html` part.
    PrimaryBodyHtml,
    /// An unnamed `text/plain` part.
    PrimaryBodyText,
    /// An unnamed part referenced by disposition or Content-ID (e.g. an
    /// embedded image). Its name is synthesized.
    InlineResource,
    /// No extraction rule applies. Never emitted to callers.
    None,
}

impl Role {
    /// Whether results with this role are handed to the caller.
    pub fn is_emitted(self) -> bool {
        self != Role::None
    }

    /// Short label used in listings and logs.
    pub fn label(self) -> &'static str {
        match self {
            Role::Attachment => "attachment",
            Role::PrimaryBodyHtml => "body-html",
            Role::PrimaryBodyText => "body-text",
            Role::InlineResource => "inline",
            Role::None => "none",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One extracted part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Resolved or synthesized name. Empty only for the primary body roles.
    ///
    /// This is the raw value from the headers; sanitize it before using it
    /// as a filename.
    pub name: String,

    /// Declared `Content-Type` header value, parameters included.
    pub content_type: String,

    /// Transfer-decoded bytes.
    pub data: Vec<u8>,

    pub role: Role,

    /// Declared `Content-Transfer-Encoding`, lowercased (empty if absent).
    pub transfer_encoding: String,

    /// `Content-ID` without angle brackets, if any.
    pub content_id: Option<String>,
}

/// Everything extracted from one message, in document order.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub envelope: Envelope,

    /// Emitted results (never `Role::None`), pre-order over the MIME tree.
    pub results: Vec<ExtractionResult>,

    /// Recoverable conditions met along the way.
    pub warnings: Vec<MimeWarning>,
}

impl Extraction {
    /// Results that are attachments or inline resources.
    pub fn files(&self) -> impl Iterator<Item = &ExtractionResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.role, Role::Attachment | Role::InlineResource))
    }
}
