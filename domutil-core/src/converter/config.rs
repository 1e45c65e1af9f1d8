//! Serializable converter settings

use serde::{Deserialize, Serialize};

use crate::tidy::DEFAULT_INTERNAL_ENCODING;

/// Settings for building a [`DomConverter`](super::DomConverter)
///
/// Loaded from configuration files, so the kind is kept as a name and only
/// validated when the converter is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConverterConfig {
    /// Document kind name, `HTML` or `XML`
    pub kind: String,
    /// Transcode the input with the charset converter
    pub detect_encoding: bool,
    /// Repair markup before parsing
    pub repair: bool,
    /// Encoding the repairer assumes when none was resolved
    pub internal_encoding: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            kind: "HTML".to_string(),
            detect_encoding: false,
            repair: false,
            internal_encoding: DEFAULT_INTERNAL_ENCODING.to_string(),
        }
    }
}
