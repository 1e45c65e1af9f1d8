//! Parsed documents returned by the converter

use xee_xpath::{DocumentHandle, Documents};
use xot::{Node, Xot};

use crate::converter::DocumentKind;
use crate::error::DomError;
use crate::markup::{to_markup, ToMarkup};
use crate::xpath::XPath;

/// A converted HTML or XML document
///
/// Each document owns its own XPath store, so documents are independent of
/// each other and of the converter that produced them.
pub struct Document {
    documents: Documents,
    handle: DocumentHandle,
    kind: DocumentKind,
    encoding: Option<String>,
}

impl Document {
    pub(crate) fn new(
        documents: Documents,
        handle: DocumentHandle,
        kind: DocumentKind,
        encoding: Option<String>,
    ) -> Self {
        Document {
            documents,
            handle,
            kind,
            encoding,
        }
    }

    /// The kind this document was parsed as
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Authoritative encoding of the document, if one was resolved
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// The underlying xot tree
    pub fn xot(&self) -> &Xot {
        self.documents.xot()
    }

    /// The document (root) node
    pub fn document_node(&self) -> Result<Node, DomError> {
        self.documents
            .document_node(self.handle)
            .ok_or(DomError::MissingDocument)
    }

    /// The top-level element of the document
    pub fn document_element(&self) -> Result<Node, DomError> {
        let doc = self.document_node()?;
        Ok(self.xot().document_element(doc)?)
    }

    /// Create an XPath context for querying this document
    pub fn xpath(&mut self) -> XPath<'_> {
        XPath::new(self)
    }

    /// Serialize a node or node list of this document
    pub fn to_markup<T: ToMarkup + ?Sized>(&self, target: &T) -> Result<String, DomError> {
        to_markup(self.xot(), target)
    }

    /// Serialize the whole document as XML
    pub fn to_xml_string(&self) -> Result<String, DomError> {
        let doc = self.document_node()?;
        self.to_markup(&doc)
    }

    pub(crate) fn handle(&self) -> DocumentHandle {
        self.handle
    }

    pub(crate) fn documents_mut(&mut self) -> &mut Documents {
        &mut self.documents
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("kind", &self.kind)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}
