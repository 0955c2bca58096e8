//! Encoding helpers: RFC 2047 encoded words, quoted strings, IDNA domains

use data_encoding::BASE64;

/// Characters that force a display name into a quoted string.
const QUOTE_SPECIALS: &[char] = &[
    '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '.', '[', ']',
];

#[must_use]
pub(crate) fn is_pure_ascii(text: &str) -> bool {
    text.is_ascii()
}

/// Encode `text` as RFC 2047 B-encoded words if it contains non-ASCII
/// characters; ASCII input is returned unchanged. Long input is split into
/// multiple space-separated encoded words so each stays under
/// `max_line_len`.
#[must_use]
pub(crate) fn encode_word(text: &str, max_line_len: usize) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    let overhead = "=?utf-8?b??=".len();
    // base64 expands 3 raw bytes to 4 characters
    let max_raw = (max_line_len.saturating_sub(overhead) / 4 * 3).max(3);

    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in text.chars() {
        if !chunk.is_empty() && chunk.len() + ch.len_utf8() > max_raw {
            words.push(format!("=?utf-8?b?{}?=", BASE64.encode(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(format!("=?utf-8?b?{}?=", BASE64.encode(chunk.as_bytes())));
    }

    words.join(" ")
}

/// Wrap `text` in a quoted string, escaping backslashes and double quotes,
/// but only when it contains syntax-significant characters and is not
/// already quoted.
#[must_use]
pub(crate) fn smart_quote(text: &str) -> String {
    if is_quoted(text) || !text.contains(QUOTE_SPECIALS) {
        return text.to_string();
    }
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Strip surrounding quotes and unescape the content. Unquoted input is
/// returned unchanged.
#[must_use]
pub(crate) fn smart_unquote(text: &str) -> String {
    if !is_quoted(text) {
        return text.to_string();
    }
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

fn is_quoted(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
}

/// Lower-cased ASCII-compatible (punycode) form of a domain. Domain
/// literals pass through unchanged; `None` means the domain has no IDNA
/// representation.
#[must_use]
pub(crate) fn domain_to_ace(domain: &str) -> Option<String> {
    if domain.starts_with('[') && domain.ends_with(']') {
        return Some(domain.to_string());
    }
    idna::domain_to_ascii(&domain.to_lowercase()).ok()
}
