//! domutil-core: HTML/XML normalization and XPath helpers
//!
//! This library provides:
//! - Conversion of raw bytes into XPath-queryable documents (HTML or XML)
//! - Optional charset detection and transcoding before parsing
//! - Optional markup repair for malformed input
//! - XPath 3.1 query helpers (existence, inner/outer markup, text, namespaces)

pub mod converter;
pub mod document;
pub mod dom_util;
pub mod encoding;
pub mod error;
mod html_builder;
pub mod markup;
pub mod tidy;
pub mod xpath;

pub use converter::{ConverterConfig, DocumentConverter, DocumentKind, DomConverter};
pub use document::Document;
pub use encoding::{CharsetConverter, ConversionResult, EncodingConverter};
pub use error::DomError;
pub use markup::ToMarkup;
pub use tidy::{to_tidy_encoding, OptionValue, RepairEngine, RepairOptions, TidyWrapper, TreeBuilderEngine};
pub use xpath::{NodeList, XPath, XPathError};
pub use xot::Node;
