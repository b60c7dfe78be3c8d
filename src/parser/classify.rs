//! Part Classifier: decides what a part is to the reader of the message.

use super::header::has_media_prefix;
use crate::model::Role;

/// Content type assumed for a part that declares none (RFC 2045).
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Base name for an inline resource without a usable Content-ID.
const INLINE_FALLBACK: &str = "inline";

/// Outcome of classifying a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A `multipart/*` container; the walker descends instead.
    Container,
    /// A leaf with its role and effective name (resolved or synthesized).
    Leaf { role: Role, name: String },
}

/// Classify a part. First matching rule wins:
///
/// 1. `multipart/*` is a container.
/// 2. A resolved name makes it an attachment.
/// 3. `text/html` is the HTML body, 4. `text/plain` the text body.
/// 5. Any disposition or Content-ID makes it an inline resource with a
///    name synthesized from the Content-ID and content type.
/// 6. Anything else is [`Role::None`].
pub fn classify(
    content_type: Option<&str>,
    disposition: Option<&str>,
    content_id: Option<&str>,
    resolved_name: &str,
) -> Classification {
    let ct = content_type.unwrap_or(DEFAULT_CONTENT_TYPE);

    if has_media_prefix(ct, "multipart/") {
        return Classification::Container;
    }

    let (role, name) = if !resolved_name.is_empty() {
        (Role::Attachment, resolved_name.to_string())
    } else if has_media_prefix(ct, "text/html") {
        (Role::PrimaryBodyHtml, String::new())
    } else if has_media_prefix(ct, "text/plain") {
        (Role::PrimaryBodyText, String::new())
    } else if disposition.is_some() || content_id.is_some() {
        (Role::InlineResource, inline_name(ct, content_id))
    } else {
        (Role::None, String::new())
    };

    Classification::Leaf { role, name }
}

/// Strip surrounding angle brackets (and whitespace) from a Content-ID.
pub fn bare_content_id(content_id: &str) -> &str {
    content_id.trim().trim_matches(|c| c == '<' || c == '>')
}

/// `<content-id><extension>`, with `inline` standing in for a missing id.
fn inline_name(content_type: &str, content_id: Option<&str>) -> String {
    let base = content_id.map(bare_content_id).unwrap_or_default();
    let base = if base.is_empty() { INLINE_FALLBACK } else { base };
    format!("{base}{}", inline_extension(content_type))
}

/// Extension inferred from the content type: `.txt`, `.<image subtype>` or `.bin`.
fn inline_extension(content_type: &str) -> String {
    if has_media_prefix(content_type, "text/plain") {
        return ".txt".to_string();
    }
    if has_media_prefix(content_type, "image/") {
        // Text before the first parameter delimiter, minus "image/"
        let essence = content_type.split(';').next().unwrap_or("").trim();
        let subtype = essence.get("image/".len()..).unwrap_or("");
        return format!(".{subtype}");
    }
    ".bin".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(role: Role, name: &str) -> Classification {
        Classification::Leaf {
            role,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_multipart_is_container() {
        let c = classify(Some("multipart/alternative; boundary=x"), None, None, "named.txt");
        assert_eq!(c, Classification::Container);
    }

    #[test]
    fn test_named_html_is_attachment() {
        let c = classify(
            Some("text/html"),
            Some("attachment; filename=page.html"),
            None,
            "page.html",
        );
        assert_eq!(c, leaf(Role::Attachment, "page.html"));
    }

    #[test]
    fn test_body_roles() {
        assert_eq!(
            classify(Some("text/html; charset=utf-8"), None, None, ""),
            leaf(Role::PrimaryBodyHtml, "")
        );
        assert_eq!(
            classify(Some("TEXT/PLAIN"), Some("inline"), None, ""),
            leaf(Role::PrimaryBodyText, "")
        );
    }

    #[test]
    fn test_missing_content_type_is_text() {
        assert_eq!(classify(None, None, None, ""), leaf(Role::PrimaryBodyText, ""));
    }

    #[test]
    fn test_inline_from_content_id() {
        let c = classify(Some("image/png"), None, Some("<abc123>"), "");
        assert_eq!(c, leaf(Role::InlineResource, "abc123.png"));
    }

    #[test]
    fn test_inline_subtype_stops_at_parameters() {
        let c = classify(Some("image/jpeg; x-unnamed=1"), Some("inline"), Some("<img1@host>"), "");
        assert_eq!(c, leaf(Role::InlineResource, "img1@host.jpeg"));
    }

    #[test]
    fn test_inline_fallback_name_and_bin_extension() {
        let c = classify(Some("application/octet-stream"), Some("inline"), None, "");
        assert_eq!(c, leaf(Role::InlineResource, "inline.bin"));

        let c = classify(Some("image/gif"), None, Some("<>"), "");
        assert_eq!(c, leaf(Role::InlineResource, "inline.gif"));
    }

    #[test]
    fn test_unmatched_part_is_none() {
        let c = classify(Some("application/pdf"), None, None, "");
        assert_eq!(c, leaf(Role::None, ""));
    }

    #[test]
    fn test_inline_extension() {
        assert_eq!(inline_extension("text/plain; charset=us-ascii"), ".txt");
        assert_eq!(inline_extension("image/svg+xml"), ".svg+xml");
        assert_eq!(inline_extension("audio/ogg"), ".bin");
    }
}
