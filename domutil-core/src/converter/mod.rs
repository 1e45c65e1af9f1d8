//! Document conversion pipeline
//!
//! bytes -> (optional) transcoding -> (optional) repair -> parse
//!
//! HTML is parsed with html5ever and built into an XPath store; XML is
//! parsed strictly by the store itself.

pub mod config;

pub use config::ConverterConfig;

use std::collections::HashMap;
use std::str::FromStr;

use encoding_rs::Encoding;
use html5ever::tendril::TendrilSink;
use html5ever::ParseOpts;
use markup5ever_rcdom::RcDom;
use strum::VariantNames;
use strum_macros::{Display, EnumString, VariantNames};
use xee_xpath::Documents;

use crate::document::Document;
use crate::encoding::{self, sniff, CharsetConverter, EncodingConverter, CONTENT_TYPE_HEADER};
use crate::error::DomError;
use crate::html_builder::build_html_document;
use crate::tidy::TidyWrapper;

/// The kind of document a converter produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, VariantNames)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum DocumentKind {
    Html,
    Xml,
}

impl DocumentKind {
    /// Parse a kind name such as `"HTML"` or `"xml"`
    pub fn parse(name: &str) -> Result<Self, DomError> {
        DocumentKind::from_str(name).map_err(|_| DomError::InvalidConfiguration {
            value: name.to_string(),
            allowed: DocumentKind::VARIANTS.join(", "),
        })
    }

    /// Content type announced to the encoding converter
    pub fn content_type(self) -> &'static str {
        match self {
            DocumentKind::Html => "text/html",
            DocumentKind::Xml => "application/xml",
        }
    }

    pub fn is_xml(self) -> bool {
        self == DocumentKind::Xml
    }
}

/// Anything that turns raw input into a queryable [`Document`]
pub trait DocumentConverter {
    fn convert(&self, input: &[u8]) -> Result<Document, DomError>;
}

/// Converts raw HTML or XML into a [`Document`]
///
/// ```ignore
/// let converter = DomConverter::new(DocumentKind::Html)
///     .with_encoding_converter(CharsetConverter::new())
///     .with_repairer(TidyWrapper::default());
/// let mut doc = converter.convert(bytes)?;
/// ```
pub struct DomConverter {
    kind: DocumentKind,
    encoding_converter: Option<Box<dyn EncodingConverter>>,
    repairer: Option<TidyWrapper>,
}

impl DomConverter {
    pub fn new(kind: DocumentKind) -> Self {
        DomConverter {
            kind,
            encoding_converter: None,
            repairer: None,
        }
    }

    /// Create a converter from a kind name, failing for unknown kinds
    pub fn from_kind_name(name: &str) -> Result<Self, DomError> {
        Ok(DomConverter::new(DocumentKind::parse(name)?))
    }

    /// Create a converter with the collaborators a config asks for
    pub fn from_config(config: &ConverterConfig) -> Result<Self, DomError> {
        let mut converter = DomConverter::from_kind_name(&config.kind)?;
        if config.detect_encoding {
            converter = converter.with_encoding_converter(CharsetConverter::new());
        }
        if config.repair {
            converter = converter.with_repairer(
                TidyWrapper::default().with_internal_encoding(config.internal_encoding.clone()),
            );
        }
        Ok(converter)
    }

    pub fn with_encoding_converter(mut self, converter: impl EncodingConverter + 'static) -> Self {
        self.encoding_converter = Some(Box::new(converter));
        self
    }

    pub fn with_repairer(mut self, repairer: TidyWrapper) -> Self {
        self.repairer = Some(repairer);
        self
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Convert raw input into a document of the configured kind
    pub fn convert(&self, input: &[u8]) -> Result<Document, DomError> {
        let decoded = self.decode(input);
        log::debug!(
            "decoded {} bytes as {} (recorded encoding: {:?})",
            input.len(),
            self.kind,
            decoded.recorded
        );

        let text = match &self.repairer {
            Some(repairer) => {
                repairer.repair(&decoded.text, decoded.recorded.as_deref(), self.kind.is_xml())?
            }
            None => decoded.text,
        };

        let encoding = decoded.recorded.or(decoded.inferred);
        match self.kind {
            DocumentKind::Html => parse_html(&text, encoding),
            DocumentKind::Xml => parse_xml(&text, encoding),
        }
    }

    /// Turn the input into text, through the encoding converter if one is set
    fn decode(&self, input: &[u8]) -> Decoded {
        if let Some(converter) = &self.encoding_converter {
            let mut headers = HashMap::new();
            headers.insert(
                CONTENT_TYPE_HEADER.to_string(),
                self.kind.content_type().to_string(),
            );
            if let Some(result) = converter.convert(&headers, input) {
                log::debug!(
                    "converted {} to {}",
                    result.source_encoding(),
                    result.target_encoding()
                );
                return Decoded {
                    recorded: Some(result.target_encoding().to_string()),
                    inferred: None,
                    text: result.into_content(),
                };
            }
        }

        let declared = self.declared_encoding(input);
        let text = sniff::decode(input, declared.unwrap_or_else(encoding::fallback_encoding));
        Decoded {
            text,
            recorded: None,
            inferred: declared.map(|e| e.name().to_lowercase()),
        }
    }

    /// Encoding the input announces for itself, the way a parser would find it
    fn declared_encoding(&self, input: &[u8]) -> Option<&'static Encoding> {
        sniff::bom_encoding(input).or_else(|| match self.kind {
            DocumentKind::Html => sniff::html_meta_charset(input),
            DocumentKind::Xml => sniff::xml_declared_charset(input),
        })
    }
}

impl DocumentConverter for DomConverter {
    fn convert(&self, input: &[u8]) -> Result<Document, DomError> {
        DomConverter::convert(self, input)
    }
}

impl std::fmt::Debug for DomConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomConverter")
            .field("kind", &self.kind)
            .field("encoding_converter", &self.encoding_converter.is_some())
            .field("repairer", &self.repairer)
            .finish()
    }
}

struct Decoded {
    text: String,
    /// Encoding reported by the encoding converter
    recorded: Option<String>,
    /// Encoding the input declared for itself
    inferred: Option<String>,
}

fn parse_html(text: &str, encoding: Option<String>) -> Result<Document, DomError> {
    if text.is_empty() {
        return Err(DomError::conversion(DocumentKind::Html, "empty input"));
    }

    let dom = html5ever::parse_document(RcDom::default(), ParseOpts::default()).one(text);
    for error in &dom.errors {
        log::debug!("suppressed HTML parse error: {}", error);
    }

    let (documents, handle) = build_html_document(&dom)?;
    Ok(Document::new(documents, handle, DocumentKind::Html, encoding))
}

fn parse_xml(text: &str, encoding: Option<String>) -> Result<Document, DomError> {
    let body = sniff::strip_doctype(sniff::strip_xml_declaration(text));

    let mut documents = Documents::new();
    let handle = documents
        .add_string("file:///document".try_into().unwrap(), &body)
        .map_err(|e| DomError::conversion(DocumentKind::Xml, e.to_string()))?;
    Ok(Document::new(documents, handle, DocumentKind::Xml, encoding))
}
