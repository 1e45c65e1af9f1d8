//! Markup repair
//!
//! [`TidyWrapper`] picks the option set for HTML or XML input, resolves the
//! encoding name into the tidy vocabulary and hands the markup to a
//! [`RepairEngine`]. The default engine is [`TreeBuilderEngine`].

mod engine;

pub use engine::TreeBuilderEngine;

use std::fmt;

use crate::error::DomError;

/// Encoding used when the caller does not pass one
pub const DEFAULT_INTERNAL_ENCODING: &str = "utf-8";

/// Canonical encoding names and their tidy counterparts
const TIDY_ENCODINGS: &[(&str, &str)] = &[
    ("ascii", "ascii"),
    ("iso-8859-9", "latin0"),
    ("iso-8859-1", "latin1"),
    ("utf-8", "utf8"),
    ("iso-2022", "iso2022"),
    ("cp-1252", "win1252"),
    ("utf-16", "utf16"),
    ("utf-16be", "utf16be"),
    ("utf-16le", "utf16le"),
    ("big-5", "big5"),
    ("sjis", "shiftjis"),
];

/// Map an encoding name to the name tidy understands
///
/// Lookup is case-insensitive. Names that already are tidy names are
/// returned as they are.
pub fn to_tidy_encoding(encoding: &str) -> Result<&'static str, DomError> {
    let lower = encoding.to_lowercase();

    if let Some((_, tidy)) = TIDY_ENCODINGS.iter().find(|(name, _)| *name == lower) {
        return Ok(tidy);
    }
    if let Some((_, tidy)) = TIDY_ENCODINGS.iter().find(|(_, tidy)| *tidy == lower) {
        return Ok(tidy);
    }

    let known: Vec<&str> = TIDY_ENCODINGS
        .iter()
        .map(|(name, _)| *name)
        .chain(TIDY_ENCODINGS.iter().map(|(_, tidy)| *tidy))
        .collect();
    Err(DomError::UnknownEncoding {
        encoding: lower,
        known: known.join(", "),
    })
}

/// Value of a single repair option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Str(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Ordered set of tidy options passed to a [`RepairEngine`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairOptions {
    entries: Vec<(String, OptionValue)>,
}

impl RepairOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for XML input
    pub fn xml() -> Self {
        RepairOptions::new()
            .with("output-xml", OptionValue::Bool(true))
            .with("input-xml", OptionValue::Bool(true))
    }

    /// Options for HTML input, teaching tidy the HTML5 elements
    pub fn html5() -> Self {
        RepairOptions::new()
            .with("numeric-entities", OptionValue::Bool(false))
            .with(
                "new-blocklevel-tags",
                OptionValue::Str("article,header,footer,section,nav".to_string()),
            )
            .with(
                "new-inline-tags",
                OptionValue::Str("video,audio,canvas,ruby,rt,rp".to_string()),
            )
            .with("new-empty-tags", OptionValue::Str("source".to_string()))
    }

    /// Set `name`, replacing an earlier value in place
    pub fn with(mut self, name: &str, value: OptionValue) -> Self {
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// `true` only when the option is present and set to `Bool(true)`
    pub fn is_enabled(&self, name: &str) -> bool {
        matches!(self.get(name), Some(OptionValue::Bool(true)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Engine that performs the actual repair
pub trait RepairEngine: Send + Sync {
    /// Repair `content` and return the cleaned markup
    ///
    /// `encoding` is a tidy encoding name as returned by
    /// [`to_tidy_encoding`].
    fn repair_string(
        &self,
        content: &str,
        options: &RepairOptions,
        encoding: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repairs malformed HTML and XML before parsing
pub struct TidyWrapper {
    engine: Box<dyn RepairEngine>,
    internal_encoding: String,
}

impl TidyWrapper {
    pub fn new(engine: impl RepairEngine + 'static) -> Self {
        TidyWrapper {
            engine: Box::new(engine),
            internal_encoding: DEFAULT_INTERNAL_ENCODING.to_string(),
        }
    }

    /// Encoding assumed when [`repair`](Self::repair) gets none
    pub fn with_internal_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.internal_encoding = encoding.into();
        self
    }

    pub fn internal_encoding(&self) -> &str {
        &self.internal_encoding
    }

    /// Repair `input` as XML or HTML
    pub fn repair(&self, input: &str, encoding: Option<&str>, is_xml: bool) -> Result<String, DomError> {
        let options = if is_xml {
            RepairOptions::xml()
        } else {
            RepairOptions::html5()
        };
        let encoding = encoding.unwrap_or(&self.internal_encoding);
        let tidy_encoding = to_tidy_encoding(encoding)?;

        log::debug!(
            "repairing {} markup ({} bytes, encoding {})",
            if is_xml { "XML" } else { "HTML" },
            input.len(),
            tidy_encoding
        );
        self.engine
            .repair_string(input, &options, tidy_encoding)
            .map_err(DomError::Repair)
    }
}

impl Default for TidyWrapper {
    fn default() -> Self {
        TidyWrapper::new(TreeBuilderEngine::new())
    }
}

impl fmt::Debug for TidyWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TidyWrapper")
            .field("internal_encoding", &self.internal_encoding)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    /// Records what the wrapper passes to the engine
    #[derive(Default, Clone)]
    struct RecordingEngine {
        calls: Arc<Mutex<Vec<(RepairOptions, String)>>>,
    }

    impl RepairEngine for RecordingEngine {
        fn repair_string(
            &self,
            content: &str,
            options: &RepairOptions,
            encoding: &str,
        ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            self.calls
                .lock()
                .unwrap()
                .push((options.clone(), encoding.to_string()));
            Ok(format!("repaired:{}", content))
        }
    }

    struct FailingEngine;

    impl RepairEngine for FailingEngine {
        fn repair_string(
            &self,
            _content: &str,
            _options: &RepairOptions,
            _encoding: &str,
        ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            Err("engine exploded".into())
        }
    }

    #[test]
    fn test_to_tidy_encoding() {
        assert_eq!(to_tidy_encoding("utf-8").unwrap(), "utf8");
        assert_eq!(to_tidy_encoding("UTF-8").unwrap(), "utf8");
        assert_eq!(to_tidy_encoding("ISO-8859-1").unwrap(), "latin1");
        assert_eq!(to_tidy_encoding("sjis").unwrap(), "shiftjis");
        assert_eq!(to_tidy_encoding("win1252").unwrap(), "win1252");
        assert_eq!(to_tidy_encoding("Latin1").unwrap(), "latin1");
    }

    #[test]
    fn test_unknown_encoding_lists_all_names() {
        let err = to_tidy_encoding("KOI8-R").unwrap_err();
        match err {
            DomError::UnknownEncoding { encoding, known } => {
                assert_eq!(encoding, "koi8-r");
                assert!(known.starts_with("ascii, iso-8859-9, iso-8859-1, utf-8"));
                assert!(known.ends_with("utf16le, big5, shiftjis"));
                assert_eq!(known.split(", ").count(), 22);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_option_sets() {
        let xml = RepairOptions::xml();
        assert!(xml.is_enabled("output-xml"));
        assert!(xml.is_enabled("input-xml"));
        assert_eq!(xml.len(), 2);

        let html = RepairOptions::html5();
        let names: Vec<&str> = html.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["numeric-entities", "new-blocklevel-tags", "new-inline-tags", "new-empty-tags"]
        );
        assert!(!html.is_enabled("numeric-entities"));
        assert_eq!(
            html.get("new-empty-tags"),
            Some(&OptionValue::Str("source".to_string()))
        );
    }

    #[test]
    fn test_with_replaces_existing_option() {
        let options = RepairOptions::xml().with("output-xml", OptionValue::Bool(false));
        assert_eq!(options.len(), 2);
        assert!(!options.is_enabled("output-xml"));
    }

    #[test]
    fn test_repair_uses_internal_encoding_when_unset() {
        let engine = RecordingEngine::default();
        let wrapper = TidyWrapper::new(engine.clone());

        let output = wrapper.repair("<p>x", None, false).unwrap();
        assert_eq!(output, "repaired:<p>x");

        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls[0].0, RepairOptions::html5());
        assert_eq!(calls[0].1, "utf8");
    }

    #[test]
    fn test_repair_xml_with_explicit_encoding() {
        let engine = RecordingEngine::default();
        let wrapper = TidyWrapper::new(engine.clone()).with_internal_encoding("ascii");

        wrapper.repair("<a>", Some("ISO-8859-1"), true).unwrap();
        wrapper.repair("<a>", None, true).unwrap();

        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls[0].0, RepairOptions::xml());
        assert_eq!(calls[0].1, "latin1");
        assert_eq!(calls[1].1, "ascii");
    }

    #[test]
    fn test_repair_rejects_unknown_encoding() {
        let wrapper = TidyWrapper::new(RecordingEngine::default());
        let err = wrapper.repair("<p>", Some("ebcdic"), false).unwrap_err();
        assert!(matches!(err, DomError::UnknownEncoding { .. }));
    }

    #[test]
    fn test_engine_failure_is_repair_error() {
        let wrapper = TidyWrapper::new(FailingEngine);
        let err = wrapper.repair("<p>", None, false).unwrap_err();

        assert!(matches!(err, DomError::Repair(_)));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "engine exploded");
    }
}
