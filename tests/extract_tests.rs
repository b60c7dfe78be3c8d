//! Integration tests for the extraction engine.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use emlsift::{extract, extract_with, ExtractError, ExtractOptions, MimeWarning, Role};

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Build a multipart body from `(headers, body)` pairs.
fn multipart(boundary: &str, parts: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (headers, body) in parts {
        out.push_str(&format!("--{boundary}\r\n{headers}\r\n\r\n{body}\r\n"));
    }
    out.push_str(&format!("--{boundary}--\r\n"));
    out
}

fn message(content_type: &str, body: &str) -> Vec<u8> {
    format!(
        "From: a@example.com\r\nTo: b@example.com\r\nSubject: test\r\nContent-Type: {content_type}\r\n\r\n{body}"
    )
    .into_bytes()
}

// ─── Non-multipart messages ─────────────────────────────────────────

#[test]
fn test_single_part_text() {
    let ex = extract(&message("text/plain; charset=us-ascii", "Hello\r\n")).unwrap();
    assert_eq!(ex.results.len(), 1);
    assert_eq!(ex.results[0].role, Role::PrimaryBodyText);
    assert_eq!(ex.results[0].data, b"Hello\r\n");
    assert_eq!(ex.envelope.subject, "test");
}

#[test]
fn test_single_part_html() {
    let ex = extract(&message("text/html", "<b>x</b>")).unwrap();
    assert_eq!(ex.results.len(), 1);
    assert_eq!(ex.results[0].role, Role::PrimaryBodyHtml);
    assert!(ex.results[0].name.is_empty());
}

#[test]
fn test_single_part_attachment() {
    let raw = b"Subject: file\r\n\
Content-Type: application/pdf\r\n\
Content-Disposition: attachment; filename=\"doc.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0xLjQK\r\n";
    let ex = extract(raw).unwrap();
    assert_eq!(ex.results.len(), 1);
    assert_eq!(ex.results[0].role, Role::Attachment);
    assert_eq!(ex.results[0].name, "doc.pdf");
    assert_eq!(ex.results[0].data, b"%PDF-1.4\n");
}

#[test]
fn test_message_without_content_type_is_text_body() {
    let ex = extract(b"Subject: plain\r\n\r\nJust text").unwrap();
    assert_eq!(ex.results.len(), 1);
    assert_eq!(ex.results[0].role, Role::PrimaryBodyText);
    assert_eq!(ex.results[0].data, b"Just text");
}

#[test]
fn test_empty_input_is_malformed() {
    assert!(matches!(extract(b""), Err(ExtractError::MalformedMessage(_))));
}

#[test]
fn test_garbage_headers_are_malformed() {
    assert!(matches!(
        extract(b"this is not a header\r\n\r\nbody"),
        Err(ExtractError::MalformedMessage(_))
    ));
    assert!(matches!(
        extract(b"\x00\x01\x02\xff\xfe"),
        Err(ExtractError::MalformedMessage(_))
    ));
}

// ─── Ordering ───────────────────────────────────────────────────────

#[test]
fn test_preorder_ordering() {
    let nested = multipart(
        "inner",
        &[
            ("Content-Type: text/plain", "C"),
            ("Content-Type: text/html", "D"),
        ],
    );
    let body = multipart(
        "outer",
        &[
            ("Content-Disposition: attachment; filename=a.txt", "A"),
            ("Content-Type: multipart/alternative; boundary=inner", &nested),
            ("Content-Disposition: attachment; filename=e.txt", "E"),
        ],
    );
    let ex = extract(&message("multipart/mixed; boundary=outer", &body)).unwrap();
    let data: Vec<&[u8]> = ex.results.iter().map(|r| r.data.as_slice()).collect();
    assert_eq!(data, [&b"A"[..], b"C", b"D", b"E"]);
    let roles: Vec<Role> = ex.results.iter().map(|r| r.role).collect();
    assert_eq!(
        roles,
        [
            Role::Attachment,
            Role::PrimaryBodyText,
            Role::PrimaryBodyHtml,
            Role::Attachment
        ]
    );
    assert!(ex.warnings.is_empty());
}

// ─── Decoding ───────────────────────────────────────────────────────

#[test]
fn test_unknown_encoding_is_identity() {
    let raw_body = "line one =3D kept\r\nline two";
    let body = multipart(
        "b",
        &[(
            "Content-Type: text/plain\r\nContent-Transfer-Encoding: x-custom",
            raw_body,
        )],
    );
    let ex = extract(&message("multipart/mixed; boundary=b", &body)).unwrap();
    assert_eq!(ex.results[0].data, raw_body.as_bytes());
}

#[test]
fn test_base64_roundtrip() {
    let payload: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 256) as u8).collect();
    let encoded = STANDARD.encode(&payload);
    let wrapped = encoded
        .as_bytes()
        .chunks(76)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect::<Vec<_>>()
        .join("\r\n");
    let body = multipart(
        "b",
        &[(
            "Content-Type: application/octet-stream; name=blob.bin\r\nContent-Transfer-Encoding: base64",
            &wrapped,
        )],
    );
    let ex = extract(&message("multipart/mixed; boundary=b", &body)).unwrap();
    assert_eq!(ex.results.len(), 1);
    assert_eq!(ex.results[0].name, "blob.bin");
    assert_eq!(ex.results[0].data, payload);
}

#[test]
fn test_bad_base64_keeps_prefix() {
    let body = multipart(
        "b",
        &[(
            "Content-Disposition: attachment; filename=x.txt\r\nContent-Transfer-Encoding: base64",
            "SGVsbG8h\r\n@@@@",
        )],
    );
    let ex = extract(&message("multipart/mixed; boundary=b", &body)).unwrap();
    assert_eq!(ex.results.len(), 1);
    assert_eq!(ex.results[0].data, b"Hello!");
    assert!(ex
        .warnings
        .iter()
        .any(|w| matches!(w, MimeWarning::DecodeTruncation { decoded: 6, .. })));
}

// ─── Naming and classification ──────────────────────────────────────

#[test]
fn test_disposition_filename_beats_content_type_name() {
    let body = multipart(
        "b",
        &[(
            "Content-Type: application/zip; name=\"ct-name.zip\"\r\nContent-Disposition: attachment; filename=\"cd-name.zip\"",
            "zip",
        )],
    );
    let ex = extract(&message("multipart/mixed; boundary=b", &body)).unwrap();
    assert_eq!(ex.results[0].name, "cd-name.zip");
}

#[test]
fn test_named_html_is_attachment_not_body() {
    let body = multipart(
        "b",
        &[(
            "Content-Type: text/html\r\nContent-Disposition: attachment; filename=\"page.html\"",
            "<html></html>",
        )],
    );
    let ex = extract(&message("multipart/mixed; boundary=b", &body)).unwrap();
    assert_eq!(ex.results[0].role, Role::Attachment);
    assert_eq!(ex.results[0].name, "page.html");
}

#[test]
fn test_inline_name_from_content_id() {
    let body = multipart(
        "b",
        &[(
            "Content-Type: image/png\r\nContent-ID: <abc123>",
            "PNGDATA",
        )],
    );
    let ex = extract(&message("multipart/related; boundary=b", &body)).unwrap();
    assert_eq!(ex.results[0].role, Role::InlineResource);
    assert_eq!(ex.results[0].name, "abc123.png");
    assert_eq!(ex.results[0].content_id.as_deref(), Some("abc123"));
}

#[test]
fn test_unmatched_part_dropped_with_warning() {
    let body = multipart(
        "b",
        &[
            ("Content-Type: application/pkcs7-signature", "sig"),
            ("Content-Type: text/plain", "kept"),
        ],
    );
    let ex = extract(&message("multipart/signed; boundary=b", &body)).unwrap();
    assert_eq!(ex.results.len(), 1);
    assert_eq!(ex.results[0].data, b"kept");
    assert_eq!(
        ex.warnings,
        vec![MimeWarning::Dropped {
            content_type: "application/pkcs7-signature".to_string()
        }]
    );
}

// ─── Malformed structure ────────────────────────────────────────────

#[test]
fn test_top_level_missing_boundary_yields_nothing() {
    let ex = extract(&message("multipart/mixed", "--x\r\n\r\nbody\r\n--x--\r\n")).unwrap();
    assert!(ex.results.is_empty());
    assert_eq!(ex.warnings, vec![MimeWarning::MissingBoundary { depth: 0 }]);
}

#[test]
fn test_nested_missing_boundary_skips_branch_only() {
    let body = multipart(
        "b",
        &[
            ("Content-Type: multipart/alternative", "whatever"),
            ("Content-Type: text/plain", "sibling"),
        ],
    );
    let ex = extract(&message("multipart/mixed; boundary=b", &body)).unwrap();
    assert_eq!(ex.results.len(), 1);
    assert_eq!(ex.results[0].data, b"sibling");
    assert_eq!(ex.warnings, vec![MimeWarning::MissingBoundary { depth: 1 }]);
}

#[test]
fn test_malformed_part_headers_stop_the_container() {
    let body = "--b\r\nContent-Type: text/plain\r\n\r\nfirst\r\n\
--b\r\nhello world\r\n\
--b\r\nContent-Disposition: attachment; filename=later.txt\r\n\r\nlater\r\n\
--b--\r\n";
    let ex = extract(&message("multipart/mixed; boundary=b", body)).unwrap();
    assert_eq!(ex.results.len(), 1);
    assert_eq!(ex.results[0].data, b"first");
    assert!(matches!(
        ex.warnings.as_slice(),
        [MimeWarning::PartRead { depth: 0, .. }]
    ));
}

#[test]
fn test_truncated_fixture_keeps_complete_parts() {
    let raw = std::fs::read(fixture("truncated.eml")).unwrap();
    let ex = extract(&raw).unwrap();
    assert_eq!(ex.results.len(), 1);
    assert_eq!(ex.results[0].data, b"first part");
    assert!(matches!(
        ex.warnings.as_slice(),
        [MimeWarning::PartRead { depth: 0, .. }]
    ));
}

#[test]
fn test_part_size_limit() {
    let body = multipart(
        "b",
        &[
            ("Content-Disposition: attachment; filename=big.bin", &"x".repeat(100)),
            ("Content-Disposition: attachment; filename=small.bin", "tiny"),
        ],
    );
    let options = ExtractOptions {
        max_part_size: 50,
        ..Default::default()
    };
    let ex = extract_with(&message("multipart/mixed; boundary=b", &body), &options).unwrap();
    assert_eq!(ex.results.len(), 1);
    assert_eq!(ex.results[0].name, "small.bin");
    assert_eq!(ex.warnings, vec![MimeWarning::PartTooLarge { limit: 50 }]);
}

// ─── Full fixture ───────────────────────────────────────────────────

#[test]
fn test_newsletter_fixture() {
    let raw = std::fs::read(fixture("newsletter.eml")).unwrap();
    let ex = extract(&raw).unwrap();

    assert_eq!(ex.envelope.from, "Newsletter <news@example.com>");
    assert_eq!(ex.envelope.subject, "Monthly report");

    let summary: Vec<(Role, &str)> = ex
        .results
        .iter()
        .map(|r| (r.role, r.name.as_str()))
        .collect();
    assert_eq!(
        summary,
        [
            (Role::PrimaryBodyText, ""),
            (Role::PrimaryBodyHtml, ""),
            (Role::InlineResource, "logo123.png"),
            (Role::Attachment, "report.pdf"),
        ]
    );

    assert_eq!(ex.results[0].data, "Café report attached.".as_bytes());
    assert_eq!(
        ex.results[1].data,
        "<p>Café report attached.</p><img src=\"cid:logo123\">".as_bytes()
    );
    assert_eq!(
        ex.results[2].data,
        [0x89u8, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a]
    );
    assert_eq!(ex.results[3].data, b"%PDF-1.4\n");
    assert_eq!(ex.results[3].transfer_encoding, "base64");
    assert!(ex.warnings.is_empty());
}
