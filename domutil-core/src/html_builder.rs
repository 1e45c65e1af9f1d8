//! Build xot documents from html5ever parse trees
//!
//! The HTML tree is built straight into the XPath store, so no
//! serialize-and-reparse round trip is needed:
//! 1. register a shell `<html/>` document with `Documents`
//! 2. take mutable access to the store's `Xot`
//! 3. copy the parsed `<html>` element onto the shell root and build its
//!    children underneath
//!
//! Elements and attributes are created without a namespace, so queries such
//! as `//div[@id='foo']` match without namespace prefixes.

use std::collections::HashMap;

use markup5ever_rcdom::{Handle, NodeData, RcDom};
use once_cell::sync::Lazy;
use regex::Regex;
use xee_xpath::{DocumentHandle, Documents};
use xot::{NameId, Node as XotNode, Xot};

use crate::converter::DocumentKind;
use crate::error::DomError;

/// XML `Name` production without the colon, since names are created
/// outside any namespace
static XML_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    let start = r"A-Za-z_\x{C0}-\x{D6}\x{D8}-\x{F6}\x{F8}-\x{2FF}\x{370}-\x{37D}\x{37F}-\x{1FFF}\x{200C}-\x{200D}\x{2070}-\x{218F}\x{2C00}-\x{2FEF}\x{3001}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFFD}\x{10000}-\x{EFFFF}";
    let rest = r"\-.0-9\x{B7}\x{300}-\x{36F}\x{203F}-\x{2040}";
    Regex::new(&format!("^[{start}][{start}{rest}]*$")).unwrap()
});

/// Whether `name` can be used as an element or attribute name
fn is_xml_name(name: &str) -> bool {
    XML_NAME_RE.is_match(name)
}

/// Build a parsed HTML tree into a fresh XPath store
pub(crate) fn build_html_document(dom: &RcDom) -> Result<(Documents, DocumentHandle), DomError> {
    let mut documents = Documents::new();
    let handle = documents
        .add_string("file:///document".try_into().unwrap(), "<html/>")
        .map_err(|e| DomError::conversion(DocumentKind::Html, e.to_string()))?;
    let doc_node = documents
        .document_node(handle)
        .ok_or(DomError::MissingDocument)?;

    let mut builder = HtmlBuilder::new(documents.xot_mut());
    builder.build_document(&dom.document, doc_node)?;

    Ok((documents, handle))
}

/// Copies an html5ever tree into an existing xot document
pub(crate) struct HtmlBuilder<'a> {
    xot: &'a mut Xot,
    /// Cache of name strings to NameIds
    name_cache: HashMap<String, NameId>,
}

impl<'a> HtmlBuilder<'a> {
    pub(crate) fn new(xot: &'a mut Xot) -> Self {
        HtmlBuilder {
            xot,
            name_cache: HashMap::new(),
        }
    }

    /// Get or create a NameId for the given name
    fn get_name(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.name_cache.get(name) {
            id
        } else {
            let id = self.xot.add_name(name);
            self.name_cache.insert(name.to_string(), id);
            id
        }
    }

    /// Build the children of the html5ever document node into `doc_node`,
    /// whose document element is the shell root
    pub(crate) fn build_document(&mut self, document: &Handle, doc_node: XotNode) -> Result<(), xot::Error> {
        let root = self.xot.document_element(doc_node)?;
        let mut seen_root = false;

        for child in document.children.borrow().iter() {
            match &child.data {
                NodeData::Element { attrs, .. } if !seen_root => {
                    seen_root = true;
                    for attr in attrs.borrow().iter() {
                        self.add_attribute(root, &attr.name.local, &attr.value);
                    }
                    self.build_children(child, root)?;
                }
                NodeData::Element { .. } => {
                    self.build_node(child, root)?;
                }
                NodeData::Comment { contents } => {
                    let comment = self.xot.new_comment(contents);
                    if seen_root {
                        self.xot.append(doc_node, comment)?;
                    } else {
                        self.xot.insert_before(root, comment)?;
                    }
                }
                _ => {
                    // Doctype has no xot counterpart
                }
            }
        }
        Ok(())
    }

    fn build_children(&mut self, handle: &Handle, parent: XotNode) -> Result<(), xot::Error> {
        for child in handle.children.borrow().iter() {
            self.build_node(child, parent)?;
        }
        Ok(())
    }

    fn build_node(&mut self, handle: &Handle, parent: XotNode) -> Result<(), xot::Error> {
        match &handle.data {
            NodeData::Element {
                name,
                attrs,
                template_contents,
                ..
            } => {
                let local: &str = &name.local;
                if !is_xml_name(local) {
                    // Keep the content, drop the element itself
                    log::debug!("flattening element with invalid name '{}'", local);
                    return self.build_children(handle, parent);
                }

                let elem_name = self.get_name(local);
                let element = self.xot.new_element(elem_name);
                for attr in attrs.borrow().iter() {
                    self.add_attribute(element, &attr.name.local, &attr.value);
                }
                self.xot.append(parent, element)?;

                if let Some(contents) = template_contents.borrow().as_ref() {
                    self.build_children(contents, element)?;
                }
                self.build_children(handle, element)?;
            }
            NodeData::Text { contents } => {
                let text = self.xot.new_text(&contents.borrow());
                self.xot.append(parent, text)?;
            }
            NodeData::Comment { contents } => {
                let comment = self.xot.new_comment(contents);
                self.xot.append(parent, comment)?;
            }
            NodeData::ProcessingInstruction { target, contents } => {
                if is_xml_name(target) {
                    let target = self.get_name(target);
                    let data = if contents.is_empty() {
                        None
                    } else {
                        Some(&contents[..])
                    };
                    let pi = self.xot.new_processing_instruction(target, data);
                    self.xot.append(parent, pi)?;
                }
            }
            NodeData::Document | NodeData::Doctype { .. } => {}
        }
        Ok(())
    }

    fn add_attribute(&mut self, element: XotNode, name: &str, value: &str) {
        if name == "xmlns" || !is_xml_name(name) {
            log::debug!("dropping attribute with unusable name '{}'", name);
            return;
        }
        let attr_name = self.get_name(name);
        self.xot
            .attributes_mut(element)
            .insert(attr_name, value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use html5ever::tendril::TendrilSink;
    use pretty_assertions::assert_eq;

    fn build(html: &str) -> (Documents, DocumentHandle) {
        let dom = html5ever::parse_document(RcDom::default(), Default::default()).one(html);
        build_html_document(&dom).unwrap()
    }

    fn serialize(documents: &Documents, handle: DocumentHandle) -> String {
        let doc = documents.document_node(handle).unwrap();
        documents.xot().to_string(doc).unwrap()
    }

    #[test]
    fn test_is_xml_name() {
        assert!(is_xml_name("div"));
        assert!(is_xml_name("data-value"));
        assert!(is_xml_name("_x.y"));
        assert!(!is_xml_name("1abc"));
        assert!(!is_xml_name("xlink:href"));
        assert!(!is_xml_name("\"quoted\""));
        assert!(!is_xml_name(""));
        assert!(is_xml_name("data-ü"));
        assert!(is_xml_name("été"));
        assert!(is_xml_name("名前"));
        assert!(!is_xml_name("-x"));
        assert!(!is_xml_name("a b"));
    }

    #[test]
    fn test_non_ascii_names_are_kept() {
        let (documents, handle) = build("<p data-ü='1' id='é'>x</p>");
        let xml = serialize(&documents, handle);
        assert!(xml.contains(r#"<p data-ü="1" id="é">x</p>"#), "got {}", xml);
    }

    #[test]
    fn test_build_simple_document() {
        let (documents, handle) = build("<p class='a'>Hello <b>world</b></p>");
        assert_eq!(
            serialize(&documents, handle),
            r#"<html><head/><body><p class="a">Hello <b>world</b></p></body></html>"#
        );
    }

    #[test]
    fn test_root_attributes_are_copied() {
        let (documents, handle) = build("<html lang='de'><body></body></html>");
        assert!(serialize(&documents, handle).starts_with(r#"<html lang="de">"#));
    }

    #[test]
    fn test_doctype_is_skipped_and_comments_kept() {
        let (documents, handle) = build("<!DOCTYPE html><!-- top --><html><body><!-- in --></body></html>");
        assert_eq!(
            serialize(&documents, handle),
            "<!-- top --><html><head/><body><!-- in --></body></html>"
        );
    }

    #[test]
    fn test_invalid_attribute_names_are_dropped() {
        let (documents, handle) = build(r#"<div "broken"="1" xmlns="http://example.com" id="ok">x</div>"#);
        let xml = serialize(&documents, handle);
        assert!(xml.contains(r#"<div id="ok">x</div>"#), "got {}", xml);
    }

    #[test]
    fn test_template_contents_are_included() {
        let (documents, handle) = build("<template><span>inside</span></template>");
        let xml = serialize(&documents, handle);
        assert!(xml.contains("<template><span>inside</span></template>"), "got {}", xml);
    }
}
