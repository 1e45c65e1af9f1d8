//! XPath 3.1 query context implementation

use super::{NodeList, XPathError};
use crate::document::Document;
use crate::error::DomError;
use xee_xpath::{query::SequenceQuery, Item, Queries, Query};
use xot::Node;

/// XPath query context bound to a single document
///
/// Evaluation needs mutable access to the document's XPath store, so the
/// context borrows the document mutably. Queries never change the content
/// of the document.
pub struct XPath<'a> {
    document: &'a mut Document,
}

impl<'a> XPath<'a> {
    /// Create a new XPath context for `document`
    pub fn new(document: &'a mut Document) -> Self {
        XPath { document }
    }

    /// The document this context queries
    pub fn document(&self) -> &Document {
        self.document
    }

    /// Evaluate `expression` and return the nodes it selects
    ///
    /// Without a context node the expression is evaluated against the
    /// document node. Atomic results are skipped.
    pub fn query(&mut self, expression: &str, context: Option<Node>) -> Result<NodeList, DomError> {
        let items = self.execute(expression, context)?;

        let mut nodes = Vec::new();
        for item in items {
            if let Item::Node(node) = item {
                nodes.push(node);
            }
        }
        Ok(NodeList::new(nodes))
    }

    /// Evaluate `expression` and return the string value of every item
    ///
    /// Nodes contribute their string value, atomics their canonical lexical
    /// form. Useful for expressions such as `count(//a)`.
    pub fn evaluate_strings(
        &mut self,
        expression: &str,
        context: Option<Node>,
    ) -> Result<Vec<String>, DomError> {
        let items = self.execute(expression, context)?;

        let xot = self.document.xot();
        let mut values = Vec::new();
        for item in items {
            if let Item::Function(_) = item {
                continue;
            }
            let value = item.string_value(xot).map_err(|e| XPathError::Execute {
                expression: expression.to_string(),
                message: e.to_string(),
            })?;
            values.push(value);
        }
        Ok(values)
    }

    fn execute(&mut self, expression: &str, context: Option<Node>) -> Result<Vec<Item>, DomError> {
        let query = compile(expression)?;
        let handle = self.document.handle();
        let documents = self.document.documents_mut();

        let results = match context {
            Some(node) => query.execute(documents, node),
            None => query.execute(documents, handle),
        };
        let results = results.map_err(|e: xee_xpath::error::Error| XPathError::Execute {
            expression: expression.to_string(),
            message: e.to_string(),
        })?;
        Ok(results.iter().collect())
    }
}

fn compile(expression: &str) -> Result<SequenceQuery, XPathError> {
    let queries = Queries::default();
    queries.sequence(expression).map_err(|e| XPathError::Compile {
        expression: expression.to_string(),
        message: e.to_string(),
    })
}
