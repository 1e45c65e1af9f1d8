//! XPath 3.1 evaluation over converted documents
//!
//! Queries run through xee-xpath against the document's own store.

mod engine;
mod node_list;

pub use engine::XPath;
pub use node_list::NodeList;

use thiserror::Error;

/// Errors raised while compiling or running an expression
#[derive(Error, Debug)]
pub enum XPathError {
    #[error("Failed to compile XPath '{expression}': {message}")]
    Compile { expression: String, message: String },
    #[error("Failed to execute XPath '{expression}': {message}")]
    Execute { expression: String, message: String },
}
