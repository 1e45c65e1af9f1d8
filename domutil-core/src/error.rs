//! Error type shared by the converter, the repairer and the query helpers

use thiserror::Error;

use crate::converter::DocumentKind;
use crate::xpath::XPathError;

/// Errors surfaced by domutil
#[derive(Error, Debug)]
pub enum DomError {
    #[error("domType '{value}' is unknown. Possible values: {allowed}")]
    InvalidConfiguration { value: String, allowed: String },

    #[error("Unable to transform given string into an {kind} Document: {reason}")]
    DocumentConversion { kind: DocumentKind, reason: String },

    #[error("Could not find a matching node for xpath '{query}'")]
    ElementNotFound { query: String },

    #[error("Encoding '{encoding}' is unknown. Allowed values are: {known}")]
    UnknownEncoding { encoding: String, known: String },

    #[error("Markup repair failed")]
    Repair(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    XPath(#[from] XPathError),

    #[error("XML tree error: {0}")]
    Xot(#[from] xot::Error),

    #[error("Document is no longer registered with its XPath store")]
    MissingDocument,
}

impl DomError {
    pub(crate) fn conversion(kind: DocumentKind, reason: impl Into<String>) -> Self {
        DomError::DocumentConversion {
            kind,
            reason: reason.into(),
        }
    }
}
