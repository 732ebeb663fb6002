//! Core error types. All errors use `thiserror` for derive-based `Display`
//! and `Error` implementations.

use thiserror::Error;

/// Error during exclusive canonicalization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// The input could not be parsed as XML.
    #[error("xml parse error: {0}")]
    Parse(String),

    /// The subtree is structurally unfit for canonicalization.
    #[error("malformed subtree: {0}")]
    Malformed(String),

    /// A namespace prefix is used without an in-scope binding.
    #[error("no in-scope binding for namespace prefix \"{0}\"")]
    MissingBinding(String),
}

/// Error during typed XML construction or serialization.
#[derive(Error, Debug)]
pub enum XmlError {
    /// The input could not be parsed as XML.
    #[error("xml parse error: {0}")]
    Parse(String),

    /// An element or attribute uses a prefix with no known binding.
    #[error("unknown namespace prefix: {0}")]
    UnknownPrefix(String),

    /// The same prefix is bound to two different URIs within one document.
    #[error("conflicting bindings for namespace prefix \"{0}\"")]
    PrefixConflict(String),
}
