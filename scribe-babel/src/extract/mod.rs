//! The extractor: markdown to tokenized markdown
//!
//! A fixed pipeline of passes, each replacing one category of opaque region with
//! placeholder tokens and recording the original in the shared store. The order
//! is the precedence: a region claimed by an earlier pass is a token by the time
//! later passes run, and no pass ever matches token syntax as new structure.
//!
//! ```text
//!     inline code → [raw] → code shortcodes → fenced code → HTML
//!         → template fragments → shortcodes → transform images → alerts
//! ```

mod code;
mod html;
mod media;
mod raw;
mod shortcodes;
mod template;

use crate::options::ConvertOptions;
use crate::placeholder::{PlaceholderStore, TOKEN_RE};
use crate::restore::restore_verbatim;
use crate::shortcodes::ShortcodeRegistry;
use std::fmt;
use std::ops::Range;

/// Extractor output.
#[derive(Debug, Clone)]
pub struct Tokenized {
    pub text: String,
    pub store: PlaceholderStore,
}

/// One extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    InlineCode,
    RawShortcode,
    CodeShortcode,
    FencedCode,
    Html,
    Template,
    Shortcode,
    TransformImage,
    GithubAlert,
}

impl Pass {
    pub const ORDER: [Pass; 9] = [
        Pass::InlineCode,
        Pass::RawShortcode,
        Pass::CodeShortcode,
        Pass::FencedCode,
        Pass::Html,
        Pass::Template,
        Pass::Shortcode,
        Pass::TransformImage,
        Pass::GithubAlert,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pass::InlineCode => "inline-code",
            Pass::RawShortcode => "raw-shortcode",
            Pass::CodeShortcode => "code-shortcode",
            Pass::FencedCode => "fenced-code",
            Pass::Html => "html",
            Pass::Template => "template",
            Pass::Shortcode => "shortcode",
            Pass::TransformImage => "transform-image",
            Pass::GithubAlert => "github-alert",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct Extractor<'a> {
    registry: &'a ShortcodeRegistry,
    options: &'a ConvertOptions,
}

impl<'a> Extractor<'a> {
    pub fn new(registry: &'a ShortcodeRegistry, options: &'a ConvertOptions) -> Self {
        Extractor { registry, options }
    }

    /// Tokenize `source` into a fresh store.
    pub fn extract(&self, source: &str) -> Tokenized {
        let mut store = PlaceholderStore::new();
        let text = self.extract_into(source, &mut store);
        Tokenized { text, store }
    }

    /// Tokenize `source`, recording into an existing store.
    pub fn extract_into(&self, source: &str, store: &mut PlaceholderStore) -> String {
        let mut text = source.to_string();
        for pass in Pass::ORDER {
            let before = store.len();
            text = self.run_pass(pass, &text, store);
            tracing::debug!(
                pass = pass.name(),
                created = store.len().saturating_sub(before),
                "extractor pass"
            );
        }
        text
    }

    /// Run a single pass.
    pub fn run_pass(&self, pass: Pass, text: &str, store: &mut PlaceholderStore) -> String {
        match pass {
            Pass::InlineCode => code::extract_inline_code(text, store),
            Pass::RawShortcode => raw::extract_raw(text, store, self.options),
            Pass::CodeShortcode => shortcodes::extract_code_shortcodes(self, text, store),
            Pass::FencedCode => code::extract_fenced_code(text, store, self.options),
            Pass::Html => html::extract_html(text, store),
            Pass::Template => template::extract_templates(text, store),
            Pass::Shortcode => shortcodes::extract_shortcodes(self, text, store, 0),
            Pass::TransformImage => media::extract_transform_images(text, store, self.options),
            Pass::GithubAlert => media::extract_alerts(text, store),
        }
    }

    fn restore(&self, text: &str, store: &PlaceholderStore) -> String {
        restore_verbatim(text, store, self.options.max_restore_passes)
    }
}

/// Byte ranges of every placeholder token in `text`.
pub(crate) fn token_ranges(text: &str) -> Vec<Range<usize>> {
    TOKEN_RE.find_iter(text).map(|m| m.range()).collect()
}

pub(crate) fn inside_any(pos: usize, ranges: &[Range<usize>]) -> bool {
    ranges.iter().any(|range| range.contains(&pos))
}

/// Start offset of every line, plus the line text without its terminator.
pub(crate) fn lines_with_offsets(text: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        let body = line.strip_suffix('\n').unwrap_or(line);
        let body = body.strip_suffix('\r').unwrap_or(body);
        lines.push((start, body));
        start += line.len();
    }
    lines
}

/// Opening fence on `line`: (indent, fence char, fence length, info string).
pub(crate) fn fence_open(line: &str) -> Option<(usize, char, usize, &str)> {
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();
    let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let length = trimmed.chars().take_while(|c| *c == fence_char).count();
    if length < 3 {
        return None;
    }
    let info = &trimmed[length..];
    if fence_char == '`' && info.contains('`') {
        return None;
    }
    Some((indent, fence_char, length, info.trim()))
}

pub(crate) fn fence_closes(line: &str, fence_char: char, length: usize) -> bool {
    let trimmed = line.trim();
    let run = trimmed.chars().take_while(|c| *c == fence_char).count();
    run >= length && run == trimmed.chars().count()
}
