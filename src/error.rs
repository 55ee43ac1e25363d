//! Error types for document loading and request processing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while registering a document.
#[derive(Debug, Error)]
pub enum SpecLoadError {
    /// Documents are keyed by absolute path only.
    #[error("The path {0} is not absolute.")]
    NotAbsolute(PathBuf),

    /// The file could not be read or canonicalized.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid YAML/JSON OpenAPI document.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A `$ref` points outside the document or at nothing.
    #[error("Unresolved reference {reference} in {path}")]
    UnresolvedRef { path: PathBuf, reference: String },
}

/// Errors raised while answering a single intercepted request.
///
/// Every variant ends up as a 500 response whose body is the display text.
#[derive(Debug, Error)]
pub enum MockError {
    /// The intercepted request could not be turned into an absolute URL.
    #[error("The request has no valid URL: {0}")]
    InvalidRequest(String),

    /// No registered document resolves the request, or more than one
    /// operation of a document would.
    #[error("The request could not get matched: {method} {url}")]
    NoMatch { method: String, url: String },

    /// The response schema cannot be turned into a value.
    #[error("Failed to synthesize response body: {0}")]
    Synthesis(String),

    /// A template replacement failed to render.
    #[error("Failed to render response template: {0}")]
    Template(String),
}

/// Result type for request processing.
pub type Result<T> = std::result::Result<T, MockError>;
