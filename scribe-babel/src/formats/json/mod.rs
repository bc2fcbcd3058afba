//! JSON format: the typed rich-document tree as serde JSON
//!
//! This is the tree an editor loads with `setTree(json)`. Unlike the HTML form it
//! carries the placeholder store and path map, so a document written as JSON and
//! read back saves to the same markdown.

use crate::error::FormatError;
use crate::format::Format;
use crate::richdoc::Document;

/// Format implementation for the JSON rich-document tree
#[derive(Debug, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Rich-document tree as JSON, including the placeholder store"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, FormatError> {
        serde_json::from_str(source).map_err(|e| FormatError::ParseError(format!("invalid document JSON: {e}")))
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        serde_json::to_string_pretty(doc)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| FormatError::SerializationError(format!("JSON serialization failed: {e}")))
    }
}
