//! Rich-document HTML format
//!
//! The HTML an editor loads and hands back. Standard prose maps to plain elements;
//! custom nodes are `div`/`span` elements tagged with `data-type` and carry their
//! fields as `data-*` attributes.
//!
//! # Element Mapping Table
//!
//! | Node              | HTML                                                        |
//! |-------------------|-------------------------------------------------------------|
//! | paragraph         | `<p>`                                                       |
//! | heading           | `<h1>`..`<h6>`                                              |
//! | bullet / ordered  | `<ul>` / `<ol start>` with `<li>`                           |
//! | blockquote        | `<blockquote>`                                              |
//! | code block        | `<pre data-block-id data-language><code class="language-x">` |
//! | table             | `<table>` `<thead>` `<tbody>`, alignment in `data-align`     |
//! | shortcode block   | `<div data-type="shortcode-block" data-name ...>`           |
//! | shortcode inline  | `<span data-type="shortcode-inline" data-name ...>`         |
//! | raw block         | `<div data-type="raw-block" data-content=base64>`           |
//! | preserved         | `<div>`/`<span data-type="preserved-*" data-block-data=base64>` |
//! | github alert      | `<div data-type="github-alert" data-alert-type>`            |
//! | summary delimiter | `<hr data-type="summary-delimiter" data-delimiter>`         |
//! | inline html       | `<span data-type="html-inline" data-html=base64>`           |
//!
//! `style` and `data-preview` on shortcode nodes are output only.
//!
//! The HTML carries no placeholder store. Nodes rebuild their source from their
//! own attributes when the store that produced them is gone.

pub mod parser;
pub mod serializer;

pub use parser::parse_html;
pub use serializer::serialize_html;

use crate::error::FormatError;
use crate::format::Format;
use crate::richdoc::Document;
use crate::shortcodes::ShortcodeRegistry;
use std::collections::HashMap;
use std::sync::Arc;

/// `data-*` attribute names
pub mod attr {
    pub const TYPE: &str = "data-type";
    pub const NAME: &str = "data-name";
    pub const PARAMS: &str = "data-params";
    pub const ATTRIBUTES: &str = "data-attributes";
    pub const PLACEHOLDER_ID: &str = "data-placeholder-id";
    pub const CONTENT_TYPE: &str = "data-content-type";
    pub const FORM: &str = "data-form";
    pub const RAW_CODE: &str = "data-raw-code";
    pub const BLOCK_ID: &str = "data-block-id";
    pub const BLOCK_TYPE: &str = "data-block-type";
    pub const BLOCK_DATA: &str = "data-block-data";
    pub const LANGUAGE: &str = "data-language";
    pub const CONTENT: &str = "data-content";
    pub const ALERT_TYPE: &str = "data-alert-type";
    pub const DELIMITER: &str = "data-delimiter";
    pub const HTML: &str = "data-html";
    pub const ALIGN: &str = "data-align";
    pub const PREVIEW: &str = "data-preview";
}

/// `data-type` values of custom nodes
pub mod node_type {
    pub const SHORTCODE_BLOCK: &str = "shortcode-block";
    pub const SHORTCODE_INLINE: &str = "shortcode-inline";
    pub const RAW_BLOCK: &str = "raw-block";
    pub const PRESERVED_BLOCK: &str = "preserved-block";
    pub const PRESERVED_INLINE: &str = "preserved-inline";
    pub const GITHUB_ALERT: &str = "github-alert";
    pub const SUMMARY_DELIMITER: &str = "summary-delimiter";
    pub const HTML_INLINE: &str = "html-inline";
}

/// Format implementation for rich-document HTML
pub struct HtmlFormat {
    registry: Arc<ShortcodeRegistry>,
}

impl HtmlFormat {
    pub fn new(registry: Arc<ShortcodeRegistry>) -> Self {
        HtmlFormat { registry }
    }
}

impl Default for HtmlFormat {
    fn default() -> Self {
        Self::new(Arc::new(ShortcodeRegistry::new()))
    }
}

impl Format for HtmlFormat {
    fn name(&self) -> &str {
        "html"
    }

    fn description(&self) -> &str {
        "Rich-document HTML with data attributes for custom nodes"
    }

    fn file_extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, FormatError> {
        Ok(parser::parse_html(source)?)
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        serializer::serialize_html(doc, &self.registry)
    }

    /// `standalone=true` wraps the fragment in a complete page with preview styles.
    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &HashMap<String, String>,
    ) -> Result<String, FormatError> {
        let fragment = self.serialize(doc)?;
        match options.get("standalone").map(String::as_str) {
            Some("true") | Some("1") | Some("yes") => Ok(wrap_in_page(&fragment)),
            _ => Ok(fragment),
        }
    }
}

/// Preview stylesheet for the custom nodes of the editor HTML
pub fn editor_css() -> &'static str {
    include_str!("../../../css/editor.css")
}

/// Wrap a fragment in a complete HTML page with the editor preview stylesheet
fn wrap_in_page(body_html: &str) -> String {
    let css = editor_css();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <meta name="generator" content="scribe-babel">
  <style>
{css}
  </style>
</head>
<body>
{body_html}</body>
</html>
"#
    )
}
