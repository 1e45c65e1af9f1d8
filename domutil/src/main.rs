//! domutil - convert HTML/XML documents and query them with XPath 3.1
//!
//! This is the main CLI entry point that orchestrates conversion and querying.

mod cli;
mod output;

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use domutil_core::{ConverterConfig, DocumentKind, DomConverter};

use cli::Args;
use output::OutputFormat;

/// Extensions read as XML when no kind is given
const XML_EXTENSIONS: &[&str] = &["xml", "xsd", "rss", "atom", "svg"];

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the CLI; `Ok(false)` means the `exists` check found nothing
fn run(args: &Args) -> Result<bool> {
    let format = OutputFormat::from_str(&args.output).ok_or_else(|| {
        anyhow!(
            "invalid format '{}'. Valid formats: {}",
            args.output,
            OutputFormat::valid_formats().join(", ")
        )
    })?;

    let config = build_config(args)?;
    if args.verbose {
        eprintln!(
            "kind: {}, detect-encoding: {}, repair: {}, internal-encoding: {}",
            config.kind, config.detect_encoding, config.repair, config.internal_encoding
        );
    }
    let converter = DomConverter::from_config(&config)?;

    let input = read_input(args.file.as_deref())?;
    let source = args
        .file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string());

    let mut document = converter
        .convert(&input)
        .with_context(|| format!("failed to convert {}", source))?;
    if args.verbose {
        eprintln!(
            "converted {} ({} bytes, encoding: {})",
            source,
            input.len(),
            document.encoding().unwrap_or("unknown")
        );
    }

    let rendered = output::render(&mut document, format, args.xpath.as_deref(), args.limit)?;
    if args.verbose && !rendered.matched {
        eprintln!("no matches");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if !rendered.text.is_empty() {
        writeln!(out, "{}", rendered.text)?;
    }

    Ok(format != OutputFormat::Exists || rendered.matched)
}

/// Converter settings from `--config`, overlaid with explicit flags
fn build_config(args: &Args) -> Result<ConverterConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ConverterConfig {
            kind: kind_for_path(args.file.as_deref()).to_string(),
            ..ConverterConfig::default()
        },
    };

    if let Some(kind) = &args.kind {
        config.kind = kind.clone();
    }
    config.detect_encoding |= args.detect_encoding;
    config.repair |= args.repair;
    if let Some(encoding) = &args.internal_encoding {
        config.internal_encoding = encoding.clone();
    }
    Ok(config)
}

fn load_config(path: &Path) -> Result<ConverterConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// Document kind implied by a file extension
fn kind_for_path(path: Option<&Path>) -> DocumentKind {
    let ext = path
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext {
        Some(ext) if XML_EXTENSIONS.contains(&ext.as_str()) => DocumentKind::Xml,
        _ => DocumentKind::Html,
    }
}

fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => fs::read(path).with_context(|| format!("failed to read {}", path.display())),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut input = Vec::new();
            io::stdin().read_to_end(&mut input)?;
            Ok(input)
        }
        None => {
            eprintln!("Usage: domutil <file> [OPTIONS]");
            eprintln!("   or: cat page.html | domutil -x \"//title\" -o text");
            eprintln!("\nUse --help for more information.");
            Err(anyhow!("no input"))
        }
    }
}
