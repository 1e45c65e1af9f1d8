//! Output formatters for the different output modes

use anyhow::{bail, Result};
use domutil_core::{dom_util, Document, Node};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markup of matched nodes
    Outer,
    /// Markup of the children of matched nodes
    Inner,
    /// Text content of matched nodes
    Text,
    /// String value of every result item, atomics included
    Value,
    /// `true` or `false`; exit code 1 when nothing matched
    Exists,
    /// Number of matched nodes
    Count,
    /// JSON array with markup and text of every match
    Json,
    /// JSON array of the root element's namespaces
    Namespaces,
    /// The whole converted document
    Document,
}

impl OutputFormat {
    /// Parse format from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "outer" => Some(OutputFormat::Outer),
            "inner" => Some(OutputFormat::Inner),
            "text" => Some(OutputFormat::Text),
            "value" => Some(OutputFormat::Value),
            "exists" => Some(OutputFormat::Exists),
            "count" => Some(OutputFormat::Count),
            "json" => Some(OutputFormat::Json),
            "namespaces" => Some(OutputFormat::Namespaces),
            "document" => Some(OutputFormat::Document),
            _ => None,
        }
    }

    /// Get list of all valid format names
    pub fn valid_formats() -> &'static [&'static str] {
        &[
            "outer",
            "inner",
            "text",
            "value",
            "exists",
            "count",
            "json",
            "namespaces",
            "document",
        ]
    }

    /// Whether the format works on the result of an XPath query
    pub fn needs_xpath(self) -> bool {
        !matches!(self, OutputFormat::Namespaces | OutputFormat::Document)
    }
}

/// Formatted output and whether the query matched anything
#[derive(Debug)]
pub struct Rendered {
    pub text: String,
    pub matched: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct JsonMatch {
    markup: String,
    text: String,
}

/// Format `document` (or the result of `xpath` on it) in `format`
pub fn render(
    document: &mut Document,
    format: OutputFormat,
    xpath: Option<&str>,
    limit: Option<usize>,
) -> Result<Rendered> {
    let expression = match (format.needs_xpath(), xpath) {
        (false, _) => "",
        (true, Some(expression)) => expression,
        (true, None) if format == OutputFormat::Outer => {
            return render(document, OutputFormat::Document, None, limit);
        }
        (true, None) => bail!("output format requires an XPath expression (-x)"),
    };
    let limit = limit.unwrap_or(usize::MAX);

    let text = match format {
        OutputFormat::Document => document.to_xml_string()?,
        OutputFormat::Namespaces => {
            serde_json::to_string_pretty(&dom_util::all_namespaces(document)?)?
        }
        OutputFormat::Exists => {
            let exists = dom_util::element_exists(&mut document.xpath(), expression, None)?;
            return Ok(Rendered {
                text: exists.to_string(),
                matched: exists,
            });
        }
        OutputFormat::Count => {
            let count = document.xpath().query(expression, None)?.len();
            return Ok(Rendered {
                text: count.to_string(),
                matched: count > 0,
            });
        }
        OutputFormat::Value => {
            let values = document.xpath().evaluate_strings(expression, None)?;
            return Ok(Rendered {
                matched: !values.is_empty(),
                text: join_lines(values.into_iter().take(limit)),
            });
        }
        OutputFormat::Outer | OutputFormat::Inner | OutputFormat::Text | OutputFormat::Json => {
            let nodes: Vec<Node> = document
                .xpath()
                .query(expression, None)?
                .into_iter()
                .take(limit)
                .collect();
            return Ok(Rendered {
                matched: !nodes.is_empty(),
                text: render_nodes(document, format, &nodes)?,
            });
        }
    };

    Ok(Rendered {
        text,
        matched: true,
    })
}

fn render_nodes(document: &Document, format: OutputFormat, nodes: &[Node]) -> Result<String> {
    let xot = document.xot();
    match format {
        OutputFormat::Json => {
            let mut matches = Vec::with_capacity(nodes.len());
            for node in nodes {
                matches.push(JsonMatch {
                    markup: dom_util::to_string(document, node)?,
                    text: xot.string_value(*node),
                });
            }
            Ok(serde_json::to_string_pretty(&matches)?)
        }
        OutputFormat::Inner => {
            let mut lines = Vec::with_capacity(nodes.len());
            for node in nodes {
                let children: Vec<Node> = xot.children(*node).collect();
                lines.push(dom_util::to_string(document, &children)?);
            }
            Ok(join_lines(lines))
        }
        OutputFormat::Text => Ok(join_lines(nodes.iter().map(|node| xot.string_value(*node)))),
        _ => {
            let mut lines = Vec::with_capacity(nodes.len());
            for node in nodes {
                lines.push(dom_util::to_string(document, node)?);
            }
            Ok(join_lines(lines))
        }
    }
}

fn join_lines(lines: impl IntoIterator<Item = String>) -> String {
    lines.into_iter().collect::<Vec<_>>().join("\n")
}
