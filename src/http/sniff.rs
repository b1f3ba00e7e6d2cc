//! Body sniffing
//!
//! Upstream proxies sometimes answer with an HTML error page and a 200 status.
//! Such a response is recognised by a `text/html` content type, or by the
//! body's leading tag, the same way browsers sniff `text/html`.

/// Tag prefixes that mark a body as HTML; compared case-insensitively
const HTML_SIGNATURES: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Check if a `Content-Type` value names HTML, ignoring parameters and case
pub fn is_html_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("text/html"))
}

/// Only the start of the body is inspected
const SNIFF_LEN: usize = 512;

/// Check if a body starts like an HTML document.
///
/// Leading whitespace is skipped. A signature must be followed by a space or
/// `>` so that `<bold>` is not mistaken for `<b>`.
pub fn looks_like_html(body: &[u8]) -> bool {
    let head = &body[..body.len().min(SNIFF_LEN)];
    let start = head
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))
        .unwrap_or(head.len());
    let data = &head[start..];

    HTML_SIGNATURES.iter().any(|sig| {
        data.len() > sig.len()
            && data[..sig.len()].eq_ignore_ascii_case(sig)
            && matches!(data[sig.len()], b' ' | b'>')
    })
}
