//! Repair by round-tripping through a tolerant tree builder
//!
//! HTML goes through html5ever, XML through xml5ever. Both recover from
//! unclosed and misnested elements, so serializing the resulting tree
//! yields well-formed markup.

use html5ever::serialize::{SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use once_cell::sync::Lazy;
use regex::Regex;
use xml5ever::driver::XmlParseOpts;

use super::{RepairEngine, RepairOptions};
use crate::markup::{escape_attribute, escape_text};

type EngineResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Options that only matter to libtidy's own tag tables
const TAG_TABLE_OPTIONS: &[&str] = &["new-blocklevel-tags", "new-inline-tags", "new-empty-tags"];

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Declarations, comments and processing instructions ahead of the root
static PROLOG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\u{FEFF}?(?:\s*(?:<\?(?s:.*?)\?>|<!--(?s:.*?)-->|<!DOCTYPE\s[^\[>]*(?:\[(?s:.*?)\]\s*)?>))*\s*"#)
        .unwrap()
});
static ROOT_START_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^<[^\s/>!?]+(?:\s+[^\s=/>]+\s*=\s*(?:"[^"]*"|'[^']*'))*\s*/?>"#).unwrap()
});
static XMLNS_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\sxmlns(?::([^\s=]+))?\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// A namespace binding: optional prefix and URI
type Binding = (Option<String>, String);

/// Default [`RepairEngine`] built on html5ever and xml5ever
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeBuilderEngine;

impl TreeBuilderEngine {
    pub fn new() -> Self {
        TreeBuilderEngine
    }
}

impl RepairEngine for TreeBuilderEngine {
    fn repair_string(
        &self,
        content: &str,
        options: &RepairOptions,
        encoding: &str,
    ) -> EngineResult<String> {
        for name in TAG_TABLE_OPTIONS {
            if let Some(value) = options.get(name) {
                log::trace!("ignoring {}={}, tree builder knows HTML5 elements", name, value);
            }
        }
        log::trace!("tree builder repair, declared encoding {}", encoding);

        let output = if options.is_enabled("input-xml") {
            let dom = parse_xml(content);
            serialize_xml(&dom, &root_declarations(content))
        } else {
            let dom = parse_html(content);
            if options.is_enabled("output-xml") {
                serialize_xml(&dom, &[])
            } else {
                serialize_html(dom)?
            }
        };

        if options.is_enabled("numeric-entities") {
            Ok(numeric_entities(&output))
        } else {
            Ok(output)
        }
    }
}

fn parse_html(content: &str) -> RcDom {
    let dom = html5ever::parse_document(RcDom::default(), ParseOpts::default()).one(content);
    if !dom.errors.is_empty() {
        log::debug!("html5ever recovered from {} parse errors", dom.errors.len());
    }
    dom
}

fn parse_xml(content: &str) -> RcDom {
    let dom = xml5ever::driver::parse_document(RcDom::default(), XmlParseOpts::default()).one(content);
    if !dom.errors.is_empty() {
        log::debug!("xml5ever recovered from {} parse errors", dom.errors.len());
    }
    dom
}

fn serialize_html(dom: RcDom) -> EngineResult<String> {
    let document: SerializableHandle = dom.document.into();
    let mut bytes = Vec::new();
    html5ever::serialize(
        &mut bytes,
        &document,
        SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        },
    )?;
    Ok(String::from_utf8(bytes)?)
}

/// Namespace declarations written on the root start tag of `content`
///
/// xml5ever keeps only the bindings its names use, so declarations that
/// are unused, or used deeper in the tree, are read back from the source.
fn root_declarations(content: &str) -> Vec<Binding> {
    let body = match PROLOG_RE.find(content) {
        Some(prolog) => &content[prolog.end()..],
        None => content,
    };
    let Some(tag) = ROOT_START_TAG_RE.find(body) else {
        return Vec::new();
    };

    XMLNS_ATTR_RE
        .captures_iter(tag.as_str())
        .map(|caps| {
            let prefix = caps.get(1).map(|m| m.as_str().to_string());
            let uri = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            (prefix, uri.to_string())
        })
        .collect()
}

/// Write an xml5ever or html5ever tree as XML
///
/// `root` bindings are declared on the document element. Any other
/// namespace is declared on the first element whose name or attribute
/// names need it.
fn serialize_xml(dom: &RcDom, root: &[Binding]) -> String {
    let mut writer = XmlWriter {
        output: String::new(),
        scopes: Vec::new(),
    };
    writer.write_children(&dom.document, Some(root));
    writer.output
}

struct XmlWriter {
    output: String,
    scopes: Vec<Vec<Binding>>,
}

impl XmlWriter {
    /// Whether `prefix` is bound to `uri` by an enclosing element
    fn in_scope(&self, prefix: &Option<String>, uri: &str) -> bool {
        if prefix.as_deref() == Some("xml") {
            return true;
        }
        for scope in self.scopes.iter().rev() {
            if let Some((_, bound)) = scope.iter().find(|(p, _)| p == prefix) {
                return bound == uri;
            }
        }
        prefix.is_none() && uri.is_empty()
    }

    fn write_children(&mut self, handle: &Handle, mut root: Option<&[Binding]>) {
        for child in handle.children.borrow().iter() {
            if let NodeData::Element { .. } = child.data {
                self.write_node(child, root.take().unwrap_or(&[]));
            } else {
                self.write_node(child, &[]);
            }
        }
    }

    fn write_node(&mut self, handle: &Handle, declarations: &[Binding]) {
        match &handle.data {
            NodeData::Element {
                name,
                attrs,
                template_contents,
                ..
            } => {
                let mut scope: Vec<Binding> = declarations.to_vec();
                let attrs = attrs.borrow();
                let attrs: Vec<_> = attrs.iter().filter(|attr| !is_declaration(&attr.name)).collect();

                let element_binding = (name.prefix.as_ref().map(|p| p.to_string()), name.ns.to_string());
                let mut needed = vec![element_binding];
                for attr in attrs.iter() {
                    if let Some(prefix) = &attr.name.prefix {
                        needed.push((Some(prefix.to_string()), attr.name.ns.to_string()));
                    }
                }
                let mut declared = Vec::new();
                for (prefix, uri) in needed {
                    let bound_here = scope.iter().any(|(p, u)| *p == prefix && *u == uri);
                    if !bound_here && !self.in_scope(&prefix, &uri) && uri != XML_NAMESPACE {
                        declared.push((prefix.clone(), escape_attribute(&uri)));
                        scope.push((prefix, uri));
                    }
                }

                let qname = qualified(&name.prefix, &name.local);
                self.output.push('<');
                self.output.push_str(&qname);
                for (prefix, uri) in declarations.iter().chain(declared.iter()) {
                    match prefix {
                        Some(prefix) => self.output.push_str(&format!(" xmlns:{}=\"{}\"", prefix, uri)),
                        None => self.output.push_str(&format!(" xmlns=\"{}\"", uri)),
                    }
                }
                for attr in attrs.iter() {
                    self.output.push_str(&format!(
                        " {}=\"{}\"",
                        qualified(&attr.name.prefix, &attr.name.local),
                        escape_attribute(&attr.value)
                    ));
                }

                let template = template_contents.borrow();
                if handle.children.borrow().is_empty() && template.is_none() {
                    self.output.push_str("/>");
                    return;
                }
                self.output.push('>');

                self.scopes.push(scope);
                if let Some(contents) = template.as_ref() {
                    self.write_children(contents, None);
                }
                self.write_children(handle, None);
                self.scopes.pop();

                self.output.push_str("</");
                self.output.push_str(&qname);
                self.output.push('>');
            }
            NodeData::Text { contents } => {
                self.output.push_str(&escape_text(&contents.borrow()));
            }
            NodeData::Comment { contents } => {
                self.output.push_str("<!--");
                self.output.push_str(contents);
                self.output.push_str("-->");
            }
            NodeData::ProcessingInstruction { target, contents } => {
                self.output.push_str("<?");
                self.output.push_str(target);
                if !contents.is_empty() {
                    self.output.push(' ');
                    self.output.push_str(contents);
                }
                self.output.push_str("?>");
            }
            NodeData::Doctype { name, .. } => {
                self.output.push_str("<!DOCTYPE ");
                self.output.push_str(name);
                self.output.push('>');
            }
            NodeData::Document => self.write_children(handle, Some(declarations)),
        }
    }
}

/// html5ever keeps `xmlns` attributes as plain attributes
fn is_declaration(name: &html5ever::QualName) -> bool {
    name.prefix.as_ref().is_some_and(|p| &**p == "xmlns") || (name.prefix.is_none() && &*name.local == "xmlns")
}

fn qualified<P: AsRef<str>>(prefix: &Option<P>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix.as_ref(), local),
        None => local.to_string(),
    }
}

/// Replace every non-ASCII character with a decimal character reference
fn numeric_entities(markup: &str) -> String {
    let mut output = String::with_capacity(markup.len());
    for c in markup.chars() {
        if c.is_ascii() {
            output.push(c);
        } else {
            output.push_str(&format!("&#{};", c as u32));
        }
    }
    output
}
