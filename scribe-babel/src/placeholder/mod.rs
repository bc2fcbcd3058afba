//! Placeholder tokens and the records they stand for
//!
//! The extractor replaces every opaque region of the source (code, raw HTML,
//! template fragments, shortcodes, ...) with a token of the form `{{KIND_ID}}`
//! and records the original text in a [`PlaceholderStore`]. The token grammar is
//! the wire format between the extractor passes, the two bridges and the
//! restorer:
//!
//! ```text
//!     {{KIND_ID}}
//!     KIND ∈ CODE_INLINE | CODE_BLOCK | SHORTCODE_PLACEHOLDER | RAW_BLOCK
//!          | PRESERVED_BLOCK | GITHUB_ALERT | INLINE_SHORTCODE_PLACEHOLDER
//!     ID   = [\w_]+
//! ```
//!
//! IDs are unique within one store. They are not stable across re-encodes of the
//! same document: a full re-parse allocates fresh IDs.

mod edits;
mod store;

pub use edits::EditList;
pub use store::PlaceholderStore;

use crate::shortcodes::{Attributes, ContentType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Matches any placeholder token. Group 1 is the kind, group 2 the id.
pub static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\{\{(CODE_INLINE|CODE_BLOCK|INLINE_SHORTCODE_PLACEHOLDER|SHORTCODE_PLACEHOLDER|RAW_BLOCK|PRESERVED_BLOCK|GITHUB_ALERT)_(\w+)\}\}",
    )
    .expect("token pattern is valid")
});

/// The `KIND` part of a placeholder token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    CodeInline,
    CodeBlock,
    Shortcode,
    InlineShortcode,
    RawBlock,
    PreservedBlock,
    GithubAlert,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::CodeInline => "CODE_INLINE",
            TokenKind::CodeBlock => "CODE_BLOCK",
            TokenKind::Shortcode => "SHORTCODE_PLACEHOLDER",
            TokenKind::InlineShortcode => "INLINE_SHORTCODE_PLACEHOLDER",
            TokenKind::RawBlock => "RAW_BLOCK",
            TokenKind::PreservedBlock => "PRESERVED_BLOCK",
            TokenKind::GithubAlert => "GITHUB_ALERT",
        }
    }

    pub fn parse(kind: &str) -> Option<Self> {
        Some(match kind {
            "CODE_INLINE" => TokenKind::CodeInline,
            "CODE_BLOCK" => TokenKind::CodeBlock,
            "SHORTCODE_PLACEHOLDER" => TokenKind::Shortcode,
            "INLINE_SHORTCODE_PLACEHOLDER" => TokenKind::InlineShortcode,
            "RAW_BLOCK" => TokenKind::RawBlock,
            "PRESERVED_BLOCK" => TokenKind::PreservedBlock,
            "GITHUB_ALERT" => TokenKind::GithubAlert,
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub id: String,
    pub range: Range<usize>,
}

/// Render the token text for a record.
pub fn format_token(kind: TokenKind, id: &str) -> String {
    format!("{{{{{kind}_{id}}}}}")
}

/// Parse a string that consists of exactly one token.
pub fn parse_token(text: &str) -> Option<Token> {
    let caps = TOKEN_RE.captures(text)?;
    let whole = caps.get(0)?;
    if whole.start() != 0 || whole.end() != text.len() {
        return None;
    }
    Some(Token {
        kind: TokenKind::parse(&caps[1])?,
        id: caps[2].to_string(),
        range: 0..text.len(),
    })
}

/// Find every token in `text`, in order.
pub fn find_tokens(text: &str) -> Vec<Token> {
    TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Token {
                kind: TokenKind::parse(&caps[1])?,
                id: caps[2].to_string(),
                range: whole.range(),
            })
        })
        .collect()
}

/// Variant tag of a preserved region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    InlineCode,
    FencedCode,
    RawShortcode,
    CodeShortcode,
    Shortcode,
    Html,
    TemplateFragment,
    GithubAlert,
    GravImage,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::InlineCode => "inline_code",
            BlockKind::FencedCode => "fenced_code",
            BlockKind::RawShortcode => "raw_shortcode",
            BlockKind::CodeShortcode => "code_shortcode",
            BlockKind::Shortcode => "shortcode",
            BlockKind::Html => "html",
            BlockKind::TemplateFragment => "template_fragment",
            BlockKind::GithubAlert => "github_alert",
            BlockKind::GravImage => "grav_image",
        }
    }

    pub fn parse(kind: &str) -> Option<Self> {
        Some(match kind {
            "inline_code" => BlockKind::InlineCode,
            "fenced_code" => BlockKind::FencedCode,
            "raw_shortcode" => BlockKind::RawShortcode,
            "code_shortcode" => BlockKind::CodeShortcode,
            "shortcode" => BlockKind::Shortcode,
            "html" => BlockKind::Html,
            "template_fragment" => BlockKind::TemplateFragment,
            "github_alert" => BlockKind::GithubAlert,
            "grav_image" => BlockKind::GravImage,
            _ => return None,
        })
    }
}

/// How a shortcode tag was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagForm {
    /// `[name]content[/name]`
    #[default]
    Paired,
    /// `[name /]`
    SelfClosing,
    /// `[name=value]` with no closing tag (content-less shortcodes only)
    Standalone,
}

impl TagForm {
    pub fn as_str(self) -> &'static str {
        match self {
            TagForm::Paired => "paired",
            TagForm::SelfClosing => "self_closing",
            TagForm::Standalone => "standalone",
        }
    }

    /// Unknown values read as paired.
    pub fn parse(value: &str) -> Self {
        match value {
            "self_closing" => TagForm::SelfClosing,
            "standalone" => TagForm::Standalone,
            _ => TagForm::Paired,
        }
    }
}

/// Structural fields of an extracted shortcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcodeData {
    pub tag_name: String,
    /// Normalized attribute string, as written between the name and `]`
    pub params: String,
    pub attributes: Attributes,
    /// Nested markdown (may contain further tokens), or raw code for code shortcodes
    pub content: String,
    pub form: TagForm,
    pub content_type: ContentType,
    /// Content-less shortcode that never shows an editable area
    pub is_injection: bool,
}

impl ShortcodeData {
    pub fn is_self_closing(&self) -> bool {
        self.form != TagForm::Paired
    }
}

/// Kind-specific payload of a [`PreservedBlock`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockData {
    InlineCode {
        code: String,
    },
    FencedCode {
        language: Option<String>,
        code: String,
    },
    RawShortcode,
    Shortcode(ShortcodeData),
    Html,
    TemplateFragment,
    GithubAlert {
        alert_type: String,
        body: String,
    },
    GravImage {
        src: String,
        alt: String,
        title: Option<String>,
    },
}

/// The value stored per placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreservedBlock {
    pub id: String,
    /// Exact source text, restored verbatim when no structural edit occurred
    pub original: String,
    /// Participates in document flow as a block
    pub is_block: bool,
    /// The span started at a line start and ended at a line end
    pub own_line: bool,
    pub data: BlockData,
}

impl PreservedBlock {
    pub fn kind(&self) -> BlockKind {
        match &self.data {
            BlockData::InlineCode { .. } => BlockKind::InlineCode,
            BlockData::FencedCode { .. } => BlockKind::FencedCode,
            BlockData::RawShortcode => BlockKind::RawShortcode,
            BlockData::Shortcode(data) if data.content_type == ContentType::Code => {
                BlockKind::CodeShortcode
            }
            BlockData::Shortcode(_) => BlockKind::Shortcode,
            BlockData::Html => BlockKind::Html,
            BlockData::TemplateFragment => BlockKind::TemplateFragment,
            BlockData::GithubAlert { .. } => BlockKind::GithubAlert,
            BlockData::GravImage { .. } => BlockKind::GravImage,
        }
    }

    pub fn token_kind(&self) -> TokenKind {
        match self.kind() {
            BlockKind::InlineCode => TokenKind::CodeInline,
            BlockKind::FencedCode => TokenKind::CodeBlock,
            BlockKind::RawShortcode | BlockKind::GravImage => TokenKind::PreservedBlock,
            BlockKind::CodeShortcode | BlockKind::Shortcode if self.is_block => {
                TokenKind::Shortcode
            }
            BlockKind::CodeShortcode | BlockKind::Shortcode => TokenKind::InlineShortcode,
            BlockKind::Html | BlockKind::TemplateFragment => TokenKind::RawBlock,
            BlockKind::GithubAlert => TokenKind::GithubAlert,
        }
    }

    pub fn token(&self) -> String {
        format_token(self.token_kind(), &self.id)
    }

    /// Whether the restorer should keep a blank line after this record
    pub fn needs_block_spacing(&self) -> bool {
        self.is_block && self.own_line
    }

    pub fn shortcode(&self) -> Option<&ShortcodeData> {
        match &self.data {
            BlockData::Shortcode(data) => Some(data),
            _ => None,
        }
    }
}

/// True when `range` starts at a line start and ends at a line end
/// (ignoring horizontal whitespace on either side).
pub fn spans_own_line(text: &str, range: &Range<usize>) -> bool {
    let before = &text[..range.start];
    let line_prefix = match before.rfind('\n') {
        Some(pos) => &before[pos + 1..],
        None => before,
    };
    let after = &text[range.end..];
    let line_suffix = match after.find('\n') {
        Some(pos) => &after[..pos],
        None => after,
    };
    line_prefix.trim().is_empty() && line_suffix.trim().is_empty()
}
