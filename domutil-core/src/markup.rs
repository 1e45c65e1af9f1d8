//! Markup serialization of xot nodes
//!
//! Elements and documents go through xot's own serializer so namespace
//! declarations stay correct. The remaining node types are written here.

use xot::{NameId, Node, Value, Xot};

use crate::error::DomError;
use crate::xpath::NodeList;

/// Something that can be written out as markup
pub trait ToMarkup {
    /// Append the markup of `self` to `output`
    fn write_markup(&self, xot: &Xot, output: &mut String) -> Result<(), DomError>;
}

impl ToMarkup for Node {
    fn write_markup(&self, xot: &Xot, output: &mut String) -> Result<(), DomError> {
        write_node(xot, *self, output)
    }
}

impl ToMarkup for [Node] {
    fn write_markup(&self, xot: &Xot, output: &mut String) -> Result<(), DomError> {
        for node in self {
            write_node(xot, *node, output)?;
        }
        Ok(())
    }
}

impl ToMarkup for Vec<Node> {
    fn write_markup(&self, xot: &Xot, output: &mut String) -> Result<(), DomError> {
        self.as_slice().write_markup(xot, output)
    }
}

impl ToMarkup for NodeList {
    fn write_markup(&self, xot: &Xot, output: &mut String) -> Result<(), DomError> {
        self.as_slice().write_markup(xot, output)
    }
}

/// Serialize anything markup-capable into a fresh string
pub fn to_markup<T: ToMarkup + ?Sized>(xot: &Xot, target: &T) -> Result<String, DomError> {
    let mut output = String::new();
    target.write_markup(xot, &mut output)?;
    Ok(output)
}

fn write_node(xot: &Xot, node: Node, output: &mut String) -> Result<(), DomError> {
    match xot.value(node) {
        Value::Document | Value::Element(_) => {
            output.push_str(&xot.to_string(node)?);
        }
        Value::Text(text) => {
            output.push_str(&escape_text(text.get()));
        }
        Value::Comment(comment) => {
            output.push_str("<!--");
            output.push_str(comment.get());
            output.push_str("-->");
        }
        Value::ProcessingInstruction(pi) => {
            output.push_str("<?");
            output.push_str(xot.local_name_str(pi.target()));
            if let Some(data) = pi.data() {
                output.push(' ');
                output.push_str(data);
            }
            output.push_str("?>");
        }
        Value::Attribute(attribute) => {
            output.push(' ');
            output.push_str(&attribute_name(xot, node, attribute.name()));
            output.push_str("=\"");
            output.push_str(&escape_attribute(attribute.value()));
            output.push('"');
        }
        _ => {
            // Namespace nodes have no markup of their own
        }
    }
    Ok(())
}

/// Qualified name of an attribute, prefixed as declared in scope
fn attribute_name(xot: &Xot, node: Node, name: NameId) -> String {
    let local = xot.local_name_str(name);
    let namespace = xot.namespace_for_name(name);
    if namespace == xot.no_namespace() {
        return local.to_string();
    }

    let prefix = xot
        .parent(node)
        .and_then(|element| xot.prefix_for_namespace(element, namespace))
        .map(|prefix| xot.prefix_str(prefix))
        .filter(|prefix| !prefix.is_empty());
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

/// Escape character data for use between tags
pub(crate) fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value for use inside double quotes
pub(crate) fn escape_attribute(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
