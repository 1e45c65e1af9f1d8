//! Charset sniffing shared by the converter and the parser path
//!
//! These helpers find the encoding a document declares for itself: a byte
//! order mark, an HTML `<meta>` charset, or the `encoding` pseudo-attribute
//! of an XML declaration.

use std::borrow::Cow;

use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;

/// How many leading bytes the HTML `<meta>` prescan looks at
const META_PRESCAN_LIMIT: usize = 1024;

static META_CHARSET_RE: Lazy<BytesRegex> = Lazy::new(|| {
    BytesRegex::new(r#"(?i)<meta\s[^>]*?charset\s*=\s*["']?\s*([a-z0-9_.:-]+)"#).unwrap()
});
static XML_DECLARATION_ENCODING_RE: Lazy<BytesRegex> = Lazy::new(|| {
    BytesRegex::new(r#"^\s*<\?xml\s[^>]*?encoding\s*=\s*["']([A-Za-z0-9_.:-]+)["']"#).unwrap()
});
static XML_DECLARATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\u{FEFF}?\s*<\?xml\s[^>]*?\?>"#).unwrap());
/// Prolog comments and processing instructions, then a document type
/// declaration with an optional internal subset
static DOCTYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^((?:\s*(?:<!--(?s:.*?)-->|<\?(?s:.*?)\?>))*\s*)<!DOCTYPE\s[^\[>]*(?:\[(?s:.*?)\]\s*)?>"#,
    )
    .unwrap()
});
static CHARSET_PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i);\s*charset\s*=\s*["']?([^"';\s]+)"#).unwrap());

/// Encoding announced by a byte order mark, if any
pub fn bom_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    Encoding::for_bom(bytes).map(|(encoding, _)| encoding)
}

/// Charset declared by an HTML `<meta charset>` or `http-equiv` element
/// within the first kilobyte of the document
pub fn html_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_PRESCAN_LIMIT)];
    let caps = META_CHARSET_RE.captures(head)?;
    let encoding = Encoding::for_label(caps.get(1)?.as_bytes())?;

    // An ASCII-compatible prescan cannot have read UTF-16 bytes
    if encoding == encoding_rs::UTF_16LE || encoding == encoding_rs::UTF_16BE {
        return Some(encoding_rs::UTF_8);
    }
    if encoding == encoding_rs::X_USER_DEFINED {
        return Some(encoding_rs::WINDOWS_1252);
    }
    Some(encoding)
}

/// Charset named by the `encoding` pseudo-attribute of an XML declaration
pub fn xml_declared_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let caps = XML_DECLARATION_ENCODING_RE.captures(bytes)?;
    Encoding::for_label(caps.get(1)?.as_bytes())
}

/// Charset parameter of a `Content-Type` header value
pub fn content_type_charset(content_type: &str) -> Option<&'static Encoding> {
    let caps = CHARSET_PARAM_RE.captures(content_type)?;
    Encoding::for_label(caps.get(1)?.as_str().as_bytes())
}

/// Remove a leading XML declaration from already decoded text
///
/// Once the text is a Rust string its original `encoding` declaration no
/// longer describes it, so the declaration is dropped before parsing.
pub fn strip_xml_declaration(text: &str) -> &str {
    match XML_DECLARATION_RE.find(text) {
        Some(m) => &text[m.end()..],
        None => text.strip_prefix('\u{FEFF}').unwrap_or(text),
    }
}

/// Remove the document type declaration from the prolog of decoded XML
///
/// The XML tree store has no DTD support, so the declaration and its
/// internal subset are dropped. Comments and processing instructions in
/// front of it are kept.
pub fn strip_doctype(text: &str) -> Cow<'_, str> {
    match DOCTYPE_RE.captures(text) {
        Some(caps) => {
            let prolog = caps.get(1).map_or("", |m| m.as_str());
            let rest = caps.get(0).map_or(0, |m| m.end());
            Cow::Owned(format!("{}{}", prolog, &text[rest..]))
        }
        None => Cow::Borrowed(text),
    }
}

/// Decode `bytes` with `encoding`, letting a byte order mark take precedence
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (decoded, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::debug!(
            "malformed {} sequences replaced while decoding",
            actual.name()
        );
    }
    decoded.into_owned()
}
