//! Format registry for format discovery and selection
//!
//! This module provides a centralized registry for all available formats.
//! Formats can be registered and retrieved by name.

use crate::error::FormatError;
use crate::format::Format;
use crate::formats::{HtmlFormat, JsonFormat, MarkdownFormat, TreevizFormat};
use crate::options::ConvertOptions;
use crate::richdoc::Document;
use crate::shortcodes::ShortcodeRegistry;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of document formats
///
/// # Examples
///
/// ```ignore
/// let registry = FormatRegistry::with_defaults(Arc::new(shortcodes), ConvertOptions::default());
///
/// let doc = registry.parse(source, "markdown")?;
/// let html = registry.serialize(&doc, "html")?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Register a format
    ///
    /// If a format with the same name already exists, it will be replaced.
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    /// Get a format by name
    pub fn get(&self, name: &str) -> Result<&dyn Format, FormatError> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::FormatNotFound(name.to_string()))
    }

    /// Check if a format exists
    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// Detect format from filename based on file extension
    ///
    /// Returns the format name if a matching extension is found, or None otherwise.
    pub fn detect_format_from_filename(&self, filename: &str) -> Option<String> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())?;

        let mut names = self.list_formats();
        names.retain(|name| {
            self.formats
                .get(name)
                .is_some_and(|format| format.file_extensions().contains(&extension))
        });
        names.into_iter().next()
    }

    /// Parse source text using the specified format
    pub fn parse(&self, source: &str, format: &str) -> Result<Document, FormatError> {
        let fmt = self.get(format)?;
        if !fmt.supports_parsing() {
            return Err(FormatError::NotSupported(format!(
                "Format '{format}' does not support parsing"
            )));
        }
        fmt.parse(source)
    }

    /// Serialize a document using the specified format
    pub fn serialize(&self, doc: &Document, format: &str) -> Result<String, FormatError> {
        self.serialize_with_options(doc, format, &HashMap::new())
    }

    /// Serialize a document using the specified format and options
    pub fn serialize_with_options(
        &self,
        doc: &Document,
        format: &str,
        options: &HashMap<String, String>,
    ) -> Result<String, FormatError> {
        let fmt = self.get(format)?;
        if !fmt.supports_serialization() {
            return Err(FormatError::NotSupported(format!(
                "Format '{format}' does not support serialization"
            )));
        }
        fmt.serialize_with_options(doc, options)
    }

    /// Create a registry with the built-in formats, sharing one shortcode registry
    pub fn with_defaults(shortcodes: Arc<ShortcodeRegistry>, options: ConvertOptions) -> Self {
        let mut registry = Self::new();

        registry.register(MarkdownFormat::new(shortcodes.clone(), options));
        registry.register(HtmlFormat::new(shortcodes));
        registry.register(JsonFormat);
        registry.register(TreevizFormat);

        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults(Arc::new(ShortcodeRegistry::new()), ConvertOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richdoc::Block;

    // Test format
    struct TestFormat;
    impl Format for TestFormat {
        fn name(&self) -> &str {
            "test"
        }
        fn description(&self) -> &str {
            "Test format"
        }
        fn supports_parsing(&self) -> bool {
            true
        }
        fn supports_serialization(&self) -> bool {
            true
        }
        fn parse(&self, source: &str) -> Result<Document, FormatError> {
            Ok(Document::new(vec![Block::paragraph(source)], Default::default()))
        }
        fn serialize(&self, _doc: &Document) -> Result<String, FormatError> {
            Ok("test output".to_string())
        }
    }

    #[test]
    fn test_registry_register_and_get() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormat);
        registry.register(TestFormat);

        assert!(registry.has("test"));
        assert!(!registry.has("nonexistent"));
        assert_eq!(registry.list_formats(), vec!["test"]);
        assert_eq!(registry.get("test").unwrap().name(), "test");
    }

    #[test]
    fn test_registry_parse_and_serialize() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormat);

        let doc = registry.parse("input", "test").unwrap();
        assert_eq!(doc.blocks, vec![Block::paragraph("input")]);
        assert_eq!(registry.serialize(&doc, "test").unwrap(), "test output");
    }

    #[test]
    fn test_registry_not_found() {
        let registry = FormatRegistry::new();
        match registry.parse("input", "nonexistent").unwrap_err() {
            FormatError::FormatNotFound(name) => assert_eq!(name, "nonexistent"),
            other => panic!("Expected FormatNotFound error, got {other:?}"),
        }
        assert!(registry.serialize(&Document::default(), "nonexistent").is_err());
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = FormatRegistry::default();
        assert_eq!(
            registry.list_formats(),
            vec!["html", "json", "markdown", "treeviz"]
        );
    }

    #[test]
    fn test_serialize_only_formats_reject_parsing() {
        let registry = FormatRegistry::default();
        assert!(matches!(
            registry.parse("x", "treeviz"),
            Err(FormatError::NotSupported(_))
        ));
    }

    #[test]
    fn test_detect_format_from_filename() {
        let registry = FormatRegistry::default();

        assert_eq!(
            registry.detect_format_from_filename("page.md"),
            Some("markdown".to_string())
        );
        assert_eq!(
            registry.detect_format_from_filename("/path/to/page.markdown"),
            Some("markdown".to_string())
        );
        assert_eq!(
            registry.detect_format_from_filename("page.html"),
            Some("html".to_string())
        );
        assert_eq!(
            registry.detect_format_from_filename("page.json"),
            Some("json".to_string())
        );
        assert_eq!(registry.detect_format_from_filename("page.unknown"), None);
        assert_eq!(registry.detect_format_from_filename("page"), None);
    }

    #[test]
    fn test_markdown_to_html_through_the_registry() {
        let registry = FormatRegistry::default();
        let doc = registry.parse("Hello **there**\n", "markdown").unwrap();
        assert_eq!(
            registry.serialize(&doc, "html").unwrap(),
            "<p>Hello <strong>there</strong></p>\n"
        );
        assert_eq!(registry.serialize(&doc, "markdown").unwrap(), "Hello **there**\n");
    }
}
