//! Top-level addressing metadata shown alongside an extraction.

use mailparse::{MailHeader, MailHeaderMap};

/// The `From`, `To` and `Subject` of a message.
///
/// Values are passed through from the header parser (RFC 2047 encoded
/// words already decoded). A missing header is an empty string, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Envelope {
    pub from: String,
    pub to: String,
    pub subject: String,
}

impl Envelope {
    /// Build an envelope from parsed top-level headers.
    pub fn from_headers(headers: &[MailHeader<'_>]) -> Self {
        Self {
            from: headers.get_first_value("From").unwrap_or_default(),
            to: headers.get_first_value("To").unwrap_or_default(),
            subject: headers.get_first_value("Subject").unwrap_or_default(),
        }
    }
}
