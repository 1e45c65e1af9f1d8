//! XPath convenience helpers
//!
//! None of these functions change the document. The query helpers take
//! `&mut XPath` only because evaluation needs mutable access to the XPath
//! store.

use xot::Node;

use crate::document::Document;
use crate::error::DomError;
use crate::markup::{to_markup, ToMarkup};
use crate::xpath::XPath;

/// Namespace implicitly in scope on every element
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespaces in scope on the document element
///
/// The implicit XML namespace comes first, followed by the namespaces
/// declared on the document element, most recently declared first.
/// Duplicates are kept.
pub fn all_namespaces(document: &Document) -> Result<Vec<String>, DomError> {
    let root = document.document_element()?;
    let xot = document.xot();

    let declared: Vec<String> = xot
        .namespaces(root)
        .iter()
        .map(|(_, namespace)| xot.namespace_str(namespace.clone()).to_string())
        .collect();

    let mut namespaces = Vec::with_capacity(declared.len() + 1);
    namespaces.push(XML_NAMESPACE.to_string());
    namespaces.extend(declared.into_iter().rev());
    Ok(namespaces)
}

/// Whether `expression` selects at least one node
pub fn element_exists(
    xpath: &mut XPath,
    expression: &str,
    context: Option<Node>,
) -> Result<bool, DomError> {
    Ok(!xpath.query(expression, context)?.is_empty())
}

/// Markup of a node, or the concatenated markup of a node list
pub fn to_string<T: ToMarkup + ?Sized>(document: &Document, target: &T) -> Result<String, DomError> {
    document.to_markup(target)
}

/// Markup of the children of the first node `query` selects
pub fn inner_html(xpath: &mut XPath, query: &str, context: Option<Node>) -> Result<String, DomError> {
    let node = first_match(xpath, query, context)?;
    let xot = xpath.document().xot();
    let children: Vec<Node> = xot.children(node).collect();
    to_markup(xot, &children)
}

/// Markup of the first node `query` selects
pub fn outer_html(xpath: &mut XPath, query: &str, context: Option<Node>) -> Result<String, DomError> {
    let node = first_match(xpath, query, context)?;
    to_markup(xpath.document().xot(), &node)
}

/// Text content of the first node `query` selects
pub fn text_content(xpath: &mut XPath, query: &str, context: Option<Node>) -> Result<String, DomError> {
    let node = first_match(xpath, query, context)?;
    Ok(xpath.document().xot().string_value(node))
}

fn first_match(xpath: &mut XPath, query: &str, context: Option<Node>) -> Result<Node, DomError> {
    xpath
        .query(query, context)?
        .first()
        .ok_or_else(|| DomError::ElementNotFound {
            query: query.to_string(),
        })
}

/// Predicate matching when the space separated token list in `element`
/// contains the token `search`
///
/// Meant for `class` attributes, where `contains()` alone would also match
/// `test` when looking for `te`.
pub fn contains_xpath_expression(element: &str, search: &str) -> String {
    let ends_with = ends_with_xpath_expression(element, &format!(" {}", search));
    format!(
        "{el}='{search}' or contains(./{el},' {search} ') or starts-with(./{el},'{search} ') or {ends_with}",
        el = element,
        search = search,
        ends_with = ends_with
    )
}

/// Predicate matching when the string value of `element` ends with `search`
pub fn ends_with_xpath_expression(element: &str, search: &str) -> String {
    format!(
        "substring({el}, string-length({el}) - string-length('{search}')+1) = '{search}'",
        el = element,
        search = search
    )
}
