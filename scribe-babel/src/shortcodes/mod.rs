//! Shortcode model: descriptors, the registry, attribute parsing and tag scanning
//!
//! Shortcodes are bracketed, attribute-bearing constructs:
//!
//! ```text
//!     [name attr="v"]content[/name]     paired
//!     [name attr="v" /]                 self-closing
//!     [name="v"]                        BBCode positional value (content-less only)
//! ```
//!
//! The registry is consulted by both directions of the conversion. Shortcodes it
//! does not know are still accepted; their structure is inferred from the source.

mod css;
mod descriptor;
mod params;
mod registry;
pub mod scanner;
mod validate;

pub use css::interpolate_css;
pub use descriptor::{AttributeSpec, AttributeType, ShortcodeDescriptor};
pub use params::{build_params, normalize_shortcode_params, parse_attributes, Attributes};
pub use registry::{RegistryError, ShortcodeRegistry, ShortcodeRenderer};
pub use validate::AttributeError;

use serde::{Deserialize, Serialize};

/// Whether a shortcode sits in document flow as a block or inside text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortcodeType {
    Block,
    Inline,
}

/// What a shortcode's body holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Nested markdown, possibly containing further shortcodes
    #[default]
    Blocks,
    /// Opaque source code, never interpreted as markdown
    Code,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Blocks => "blocks",
            ContentType::Code => "code",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("code") {
            ContentType::Code
        } else {
            ContentType::Blocks
        }
    }
}

/// Known inline shortcodes, used when the registry has no entry.
pub const INLINE_FALLBACK: &[&str] = &[
    "abbr", "b", "badge", "color", "fa", "font", "highlight", "i", "icon", "kbd", "lang", "mark",
    "s", "safe-email", "size", "span", "strike", "sub", "sup", "tooltip", "u",
];

/// Known block shortcodes, used at decode time when the registry has no entry.
pub const BLOCK_FALLBACK: &[&str] = &[
    "center", "columns", "details", "div", "figure", "left", "notice", "raw", "right", "section",
    "tab", "tabs",
];

/// Block-or-inline decision for a shortcode found during extraction.
///
/// Registry entry first, then the inline fallback list, then a line-based
/// heuristic: empty content or a single-line match is inline; a match spanning
/// more than two lines with the opening and closing tags on different lines is a
/// block; anything else is inline. The heuristic is best effort and kept exactly
/// as is because saved documents depend on it.
pub fn classify_extracted(
    registry: &ShortcodeRegistry,
    name: &str,
    content: &str,
    matched: &str,
) -> bool {
    if let Some(kind) = registry.shortcode_type(name) {
        return kind == ShortcodeType::Block;
    }
    if INLINE_FALLBACK.contains(&name) {
        return false;
    }
    if content.trim().is_empty() {
        return false;
    }
    // tags cannot span lines, so a multi-line match has its opening and closing
    // tags on different lines
    matched.lines().count() > 2
}

/// Block-or-inline decision when writing a shortcode node back to markdown.
pub fn classify_for_output(registry: &ShortcodeRegistry, name: &str, node_is_block: bool) -> bool {
    if let Some(kind) = registry.shortcode_type(name) {
        return kind == ShortcodeType::Block;
    }
    if INLINE_FALLBACK.contains(&name) {
        return false;
    }
    if BLOCK_FALLBACK.contains(&name) {
        return true;
    }
    node_is_block
}
