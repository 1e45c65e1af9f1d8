//! Charset detection and transcoding
//!
//! The converter consults an [`EncodingConverter`] before parsing. The
//! bundled [`CharsetConverter`] resolves the source charset from the
//! `Content-Type` header, a byte order mark, the document's own declaration,
//! and finally a statistical guess, then transcodes to UTF-8.

pub mod sniff;

use std::collections::HashMap;

use encoding_rs::{Encoding, UTF_8};

/// Header consulted for a `charset=` parameter
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Result of a successful transcoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    content: String,
    source_encoding: String,
    target_encoding: String,
}

impl ConversionResult {
    pub fn new(
        content: String,
        source_encoding: impl Into<String>,
        target_encoding: impl Into<String>,
    ) -> Self {
        ConversionResult {
            content,
            source_encoding: source_encoding.into(),
            target_encoding: target_encoding.into(),
        }
    }

    /// The transcoded content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Encoding the input was decoded from
    pub fn source_encoding(&self) -> &str {
        &self.source_encoding
    }

    /// Encoding of [`content`](Self::content)
    pub fn target_encoding(&self) -> &str {
        &self.target_encoding
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

/// Transcodes raw document bytes given the headers they arrived with
pub trait EncodingConverter: Send + Sync {
    /// Convert `content`; `None` means the content was left unchanged
    fn convert(&self, headers: &HashMap<String, String>, content: &[u8]) -> Option<ConversionResult>;

    /// Name of the encoding this converter produces
    fn target_encoding(&self) -> &str;
}

/// Detects the source charset and transcodes to UTF-8
#[derive(Debug, Clone, Default)]
pub struct CharsetConverter {
    tld: Option<Vec<u8>>,
}

impl CharsetConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level domain the document came from, used as a hint when the
    /// charset has to be guessed
    ///
    /// A host name is reduced to its rightmost label. Labels that are not
    /// ASCII (unconverted IDNs) are ignored.
    pub fn with_tld_hint(mut self, host: impl AsRef<str>) -> Self {
        let label = host
            .as_ref()
            .trim_end_matches('.')
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        self.tld = (!label.is_empty() && label.is_ascii()).then(|| label.into_bytes());
        self
    }

    /// Resolve the source encoding of `content`
    pub fn detect(&self, headers: &HashMap<String, String>, content: &[u8]) -> &'static Encoding {
        let content_type = header(headers, CONTENT_TYPE_HEADER).unwrap_or_default();

        if let Some(encoding) = sniff::content_type_charset(content_type) {
            log::debug!("charset {} from Content-Type header", encoding.name());
            return encoding;
        }
        if let Some(encoding) = sniff::bom_encoding(content) {
            log::debug!("charset {} from byte order mark", encoding.name());
            return encoding;
        }

        let declared = if is_xml_content_type(content_type) {
            sniff::xml_declared_charset(content)
        } else {
            sniff::html_meta_charset(content)
        };
        if let Some(encoding) = declared {
            log::debug!("charset {} declared in document", encoding.name());
            return encoding;
        }

        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(content, true);
        let encoding = detector.guess(self.tld.as_deref(), true);
        log::debug!("charset {} guessed from content", encoding.name());
        encoding
    }
}

impl EncodingConverter for CharsetConverter {
    fn convert(&self, headers: &HashMap<String, String>, content: &[u8]) -> Option<ConversionResult> {
        if content.is_empty() {
            return None;
        }

        let source = self.detect(headers, content);
        let decoded = sniff::decode(content, source);
        Some(ConversionResult::new(
            decoded,
            source.name().to_lowercase(),
            self.target_encoding(),
        ))
    }

    fn target_encoding(&self) -> &str {
        "utf-8"
    }
}

/// Case-insensitive header lookup
fn header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn is_xml_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.ends_with("/xml") || mime.ends_with("+xml")
}

/// Encoding used when nothing is declared and nothing is converted
pub(crate) fn fallback_encoding() -> &'static Encoding {
    UTF_8
}
