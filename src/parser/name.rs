//! Name Resolver: the best available filename for a part.
//!
//! The returned value is raw header text. Turning it into a safe leaf
//! filename is the writer's job (see `export::files::sanitize_leaf_name`).

use super::header::{HeaderLookup, MediaType};

/// Resolve a part's filename, or an empty string when it has none.
///
/// Tried in order, each only when the previous yielded nothing:
/// 1. the structured `Content-Disposition` `filename` (RFC 2231 aware),
/// 2. a lenient re-scan of `Content-Disposition` for `filename=`,
/// 3. the legacy `Content-Type` `name` parameter.
pub fn resolve_name<H: HeaderLookup + ?Sized>(part: &H) -> String {
    let disposition = part.content_disposition().unwrap_or_default();

    if let Some(name) = disposition_filename(&disposition) {
        return name;
    }
    if let Some(name) = scan_param(&disposition, "filename") {
        return name;
    }
    part.content_type()
        .and_then(|ct| MediaType::parse(&ct))
        .and_then(|mt| mt.params.get("name").cloned())
        .filter(|n| !n.is_empty())
        .unwrap_or_default()
}

fn disposition_filename(disposition: &str) -> Option<String> {
    if disposition.trim().is_empty() {
        return None;
    }
    mailparse::parse_content_disposition(disposition)
        .params
        .get("filename")
        .filter(|n| !n.is_empty())
        .cloned()
}

/// Find `key=value` in a `;`-separated parameter list without a full parse.
///
/// Covers values the structured parser rejects, e.g. a disposition with no
/// leading type token or an unbalanced quote.
fn scan_param(value: &str, key: &str) -> Option<String> {
    value.split(';').find_map(|segment| {
        let (k, v) = segment.split_once('=')?;
        if !k.trim().eq_ignore_ascii_case(key) {
            return None;
        }
        let v = v.trim().trim_matches('"').trim();
        (!v.is_empty()).then(|| v.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::header::{parse_header_block, split_header_block};

    fn name_of(raw: &[u8]) -> String {
        let (block, _) = split_header_block(raw);
        let headers = parse_header_block(block).unwrap();
        resolve_name(&headers)
    }

    #[test]
    fn test_disposition_filename() {
        let raw = b"Content-Disposition: attachment; filename=\"report.pdf\"\r\n\r\n";
        assert_eq!(name_of(raw), "report.pdf");
    }

    #[test]
    fn test_disposition_wins_over_content_type_name() {
        let raw = b"Content-Type: application/pdf; name=\"legacy.pdf\"\r\n\
Content-Disposition: attachment; filename=\"preferred.pdf\"\r\n\r\n";
        assert_eq!(name_of(raw), "preferred.pdf");
    }

    #[test]
    fn test_content_type_name_fallback() {
        let raw = b"Content-Type: image/jpeg; name=photo.jpg\r\n\r\n";
        assert_eq!(name_of(raw), "photo.jpg");
    }

    #[test]
    fn test_no_name() {
        let raw = b"Content-Type: text/plain\r\nContent-Disposition: inline\r\n\r\n";
        assert_eq!(name_of(raw), "");
    }

    #[test]
    fn test_raw_name_is_not_sanitized() {
        let raw = b"Content-Disposition: attachment; filename=\"../../etc/passwd\"\r\n\r\n";
        assert_eq!(name_of(raw), "../../etc/passwd");
    }

    #[test]
    fn test_scan_param() {
        assert_eq!(
            scan_param("filename=\"a b.txt\"; size=3", "filename").as_deref(),
            Some("a b.txt")
        );
        assert_eq!(scan_param("attachment", "filename"), None);
        assert_eq!(scan_param("attachment; FILENAME=x.bin", "filename").as_deref(), Some("x.bin"));
    }
}
