//! CLI argument parsing using clap

use std::path::PathBuf;

use clap::Parser;

/// Convert HTML/XML documents and query them with XPath 3.1
#[derive(Parser, Debug)]
#[command(name = "domutil")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Outer markup of every link
    domutil page.html -x "//a"

    # Text of the element with id "title"
    domutil page.html -x "//*[@id='title']" -o text

    # Detect the charset and repair broken markup first
    curl -s https://example.com | domutil --detect-encoding --repair -x "//title" -o text

    # Count items in a feed
    domutil feed.rss -x "count(//item)" -o value

    # CI: fail if the document has no canonical link
    domutil page.html -x "//link[@rel='canonical']" -o exists

    # Namespaces declared on the root element
    domutil schema.xsd -o namespaces
"#)]
pub struct Args {
    /// File to read (reads stdin when omitted)
    #[arg()]
    pub file: Option<PathBuf>,

    /// Document kind: html or xml (default: from the file extension)
    #[arg(short = 'k', long = "kind")]
    pub kind: Option<String>,

    /// Detect the source charset and transcode to UTF-8 before parsing
    #[arg(long = "detect-encoding")]
    pub detect_encoding: bool,

    /// Repair malformed markup before parsing
    #[arg(long = "repair")]
    pub repair: bool,

    /// Encoding the repairer assumes when none was detected
    #[arg(long = "internal-encoding")]
    pub internal_encoding: Option<String>,

    /// XPath 3.1 query expression
    #[arg(short = 'x', long = "xpath")]
    pub xpath: Option<String>,

    /// Output format: outer (default), inner, text, value, exists, count, json, namespaces, document
    #[arg(short = 'o', long = "output", default_value = "outer")]
    pub output: String,

    /// Limit output to first N matches
    #[arg(short = 'n', long = "limit")]
    pub limit: Option<usize>,

    /// TOML file with converter settings (flags take precedence)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
