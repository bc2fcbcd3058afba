//! Error types for conversion and format operations

use thiserror::Error;

/// Errors that can occur during format operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// Format not found in registry
    #[error("Format '{0}' not found")]
    FormatNotFound(String),
    /// Error during parsing
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Error during serialization
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// Format does not support the requested direction
    #[error("Operation not supported: {0}")]
    NotSupported(String),
}

/// Errors raised inside the conversion pipeline.
///
/// These never escape an [`EditSession`](crate::session::EditSession): the session
/// catches them per top-level call and degrades to a trivial fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    /// A base64 payload on a rich-document node could not be decoded
    #[error("invalid base64 payload in '{attribute}': {message}")]
    Payload { attribute: String, message: String },
    /// A JSON attribute map on a rich-document node could not be decoded
    #[error("invalid attribute map on shortcode '{name}': {message}")]
    Attributes { name: String, message: String },
    /// A rich-document HTML element is missing a required data attribute
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },
    /// HTML serialization of the rich document failed
    #[error("HTML serialization failed: {0}")]
    Html(String),
}

impl From<ConvertError> for FormatError {
    fn from(err: ConvertError) -> Self {
        FormatError::ParseError(err.to_string())
    }
}
