//! Markdown format implementation
//!
//! Markdown here is CommonMark plus the constructs of a flat-file CMS page:
//! shortcodes (`[name attr="v"]content[/name]`, `[name /]`, `[name="v"]`), raw
//! HTML, Twig-like template fragments, GitHub alerts, transform images and a
//! summary delimiter line.
//!
//! # Library Choice
//!
//! `comrak` parses the tokenized markdown into an AST. Writing goes through
//! [`serializer::MarkdownWriter`] instead of comrak's formatter because saved
//! output has to keep placeholder tokens in place, use four-space list indentation
//! and emit the exact bytes of untouched regions.
//!
//! # Element Mapping Table
//!
//! | Markdown                      | Rich document                          | Notes                                   |
//! |-------------------------------|----------------------------------------|-----------------------------------------|
//! | `# Heading`                   | heading                                | levels 1-6                              |
//! | paragraph                     | paragraph                              | soft breaks kept as newlines            |
//! | `- item` / `1. item`          | bullet / ordered list                  | written with 4 spaces per level         |
//! | `> quote`                     | blockquote                             |                                         |
//! | `> [!NOTE]` ...               | github alert                           | exact bytes when unedited               |
//! | fenced code                   | code block with block id               | exact bytes when unedited               |
//! | table                         | table                                  | empty cells get a filler while editing  |
//! | `---`                         | horizontal rule                        |                                         |
//! | `===` line                    | summary delimiter                      | configurable                            |
//! | block shortcode               | shortcode block                        | children rendered recursively           |
//! | inline shortcode              | inline shortcode                       |                                         |
//! | code shortcode                | shortcode block with raw code          | never parsed as markdown                |
//! | raw HTML / template fragment  | raw block                              |                                         |
//! | `[raw]`, transform image      | preserved node                         | opaque                                  |
//! | `**b**` `_i_` `~~s~~` `` `c` `` | marks / inline code                  | emphasis written with `_`               |
//!
//! # Lossy Conversions
//!
//! Untouched regions come back byte for byte. Plain prose is written in a
//! canonical form, so these are normalized on the first save:
//! - `*emphasis*` → `_emphasis_`, `__strong__` → `**strong**`
//! - `*` / `+` bullets → `-`, loose lists → tight lists
//! - indented code blocks → fenced code blocks
//! - `***` / `___` rules → `---`
//! - runs of blank lines → one blank line

pub mod parser;
pub mod serializer;

pub use parser::parse_markdown;
pub use serializer::serialize_markdown;

use crate::error::FormatError;
use crate::format::Format;
use crate::options::ConvertOptions;
use crate::resolve::{NoopResolver, PathResolver};
use crate::richdoc::Document;
use crate::shortcodes::ShortcodeRegistry;
use std::sync::Arc;

/// Format implementation for Markdown with shortcodes
pub struct MarkdownFormat {
    registry: Arc<ShortcodeRegistry>,
    options: ConvertOptions,
    resolver: Arc<dyn PathResolver>,
}

impl MarkdownFormat {
    pub fn new(registry: Arc<ShortcodeRegistry>, options: ConvertOptions) -> Self {
        MarkdownFormat {
            registry,
            options,
            resolver: Arc::new(NoopResolver),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.resolver = resolver;
        self
    }
}

impl Default for MarkdownFormat {
    fn default() -> Self {
        Self::new(Arc::new(ShortcodeRegistry::new()), ConvertOptions::default())
    }
}

impl Format for MarkdownFormat {
    fn name(&self) -> &str {
        "markdown"
    }

    fn description(&self) -> &str {
        "CommonMark Markdown with shortcodes, raw HTML and template fragments"
    }

    fn file_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, FormatError> {
        Ok(parser::parse_markdown(
            source,
            &self.registry,
            &self.options,
            self.resolver.as_ref(),
        ))
    }

    /// Writes a copy of the document; records rebuilt while writing are not kept.
    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        let mut doc = doc.clone();
        Ok(serializer::serialize_markdown(&mut doc, &self.registry, &self.options).text)
    }
}
