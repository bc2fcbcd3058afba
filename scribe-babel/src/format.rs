//! Format trait definition
//!
//! This module defines the Format trait every format implements. The trait gives
//! a uniform interface for loading text into a rich [`Document`] and writing one
//! back out.

use crate::error::FormatError;
use crate::richdoc::Document;
use std::collections::HashMap;

/// Trait for document formats
///
/// Implementors convert between a text representation and the rich document.
/// Formats can support parsing, serialization, or both.
///
/// # Examples
///
/// ```ignore
/// struct MyFormat;
///
/// impl Format for MyFormat {
///     fn name(&self) -> &str {
///         "my-format"
///     }
///
///     fn supports_serialization(&self) -> bool {
///         true
///     }
///
///     fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
///         Ok(format!("{} blocks", doc.blocks.len()))
///     }
/// }
/// ```
pub trait Format: Send + Sync {
    /// The name of this format (e.g., "markdown", "html")
    fn name(&self) -> &str;

    /// Optional description of this format
    fn description(&self) -> &str {
        ""
    }

    /// File extensions associated with this format (e.g., ["md", "markdown"])
    ///
    /// Returns a slice of file extensions without the leading dot.
    /// Used for automatic format detection from filenames.
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    /// Whether this format supports parsing (source → Document)
    fn supports_parsing(&self) -> bool {
        false
    }

    /// Whether this format supports serialization (Document → source)
    fn supports_serialization(&self) -> bool {
        false
    }

    /// Parse source text into a Document
    ///
    /// Default implementation returns NotSupported error.
    fn parse(&self, _source: &str) -> Result<Document, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support parsing",
            self.name()
        )))
    }

    /// Serialize a Document into source text
    ///
    /// Default implementation returns NotSupported error.
    fn serialize(&self, _doc: &Document) -> Result<String, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support serialization",
            self.name()
        )))
    }

    /// Serialize a Document, optionally using extra parameters.
    ///
    /// The default implementation delegates to [`Format::serialize`] and rejects
    /// parameters it does not know.
    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &HashMap<String, String>,
    ) -> Result<String, FormatError> {
        if options.is_empty() {
            self.serialize(doc)
        } else {
            Err(FormatError::NotSupported(format!(
                "Format '{}' does not support extra parameters",
                self.name()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountFormat;

    impl Format for CountFormat {
        fn name(&self) -> &str {
            "count"
        }

        fn supports_serialization(&self) -> bool {
            true
        }

        fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
            Ok(doc.blocks.len().to_string())
        }
    }

    #[test]
    fn test_defaults() {
        let doc = Document::default();
        assert!(!CountFormat.supports_parsing());
        assert!(matches!(CountFormat.parse(""), Err(FormatError::NotSupported(_))));
        assert_eq!(CountFormat.serialize_with_options(&doc, &HashMap::new()).unwrap(), "0");

        let mut options = HashMap::new();
        options.insert("x".to_string(), "y".to_string());
        assert!(CountFormat.serialize_with_options(&doc, &options).is_err());
    }
}
