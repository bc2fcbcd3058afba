//! Stack-based shortcode tag scanner
//!
//! Finds `[name ...]`, `[name .../]` and `[/name]` tags and pairs them with
//! depth tracking per name. Tags never span lines.

use super::ShortcodeRegistry;
use crate::placeholder::TagForm;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    SelfClosing,
    Close,
}

/// One tag as written in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    /// Raw text between the name and `]` (or `/]`), trimmed
    pub params: String,
    pub kind: TagKind,
    pub range: Range<usize>,
}

/// A complete shortcode occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcodeMatch {
    pub name: String,
    pub params: String,
    pub form: TagForm,
    /// Whole match, opening tag through closing tag
    pub range: Range<usize>,
    /// Body between the tags; empty for self-closing and standalone tags
    pub content: Range<usize>,
}

impl ShortcodeMatch {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range.clone()]
    }

    pub fn content_text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.content.clone()]
    }
}

/// Read the tag starting at `pos` (which must hold `[`).
pub fn scan_tag_at(text: &str, pos: usize) -> Option<Tag> {
    let bytes = text.as_bytes();
    if bytes.get(pos) != Some(&b'[') {
        return None;
    }
    if pos > 0 && matches!(bytes[pos - 1], b'\\' | b'!') {
        return None;
    }

    let mut cursor = pos + 1;
    let closing = bytes.get(cursor) == Some(&b'/');
    if closing {
        cursor += 1;
    }

    let name_start = cursor;
    if !bytes.get(cursor).is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }
    while bytes
        .get(cursor)
        .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-'))
    {
        cursor += 1;
    }
    let name = &text[name_start..cursor];

    if closing {
        return (bytes.get(cursor) == Some(&b']')).then(|| Tag {
            name: name.to_string(),
            params: String::new(),
            kind: TagKind::Close,
            range: pos..cursor + 1,
        });
    }

    match bytes.get(cursor) {
        Some(b']' | b'=' | b'/' | b' ' | b'\t') => {}
        _ => return None,
    }

    let params_start = cursor;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    while let Some(&b) = bytes.get(cursor) {
        if b == b'\n' {
            return None;
        }
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b']' => break,
                b'[' => return None,
                _ => {}
            },
        }
        cursor += 1;
    }
    if bytes.get(cursor) != Some(&b']') {
        return None;
    }

    let raw_params = text[params_start..cursor].trim();
    let end = cursor + 1;

    // `[text](url)` is a link unless the brackets carry attributes
    if bytes.get(end) == Some(&b'(') && !raw_params.contains('=') {
        return None;
    }

    let (params, kind) = match raw_params.strip_suffix('/') {
        Some(stripped) => (stripped.trim_end(), TagKind::SelfClosing),
        None => (raw_params, TagKind::Open),
    };

    Some(Tag {
        name: name.to_string(),
        params: params.to_string(),
        kind,
        range: pos..end,
    })
}

/// Find the `[/name]` closing an opening tag that ends at `from`, skipping
/// nested pairs of the same name.
pub fn find_close(text: &str, name: &str, from: usize) -> Option<Tag> {
    let mut depth = 0usize;
    let mut pos = from;
    while let Some(offset) = text[pos..].find('[') {
        let at = pos + offset;
        match scan_tag_at(text, at) {
            Some(tag) if tag.name == name => match tag.kind {
                TagKind::Open => {
                    depth += 1;
                    pos = tag.range.end;
                }
                TagKind::Close if depth == 0 => return Some(tag),
                TagKind::Close => {
                    depth -= 1;
                    pos = tag.range.end;
                }
                TagKind::SelfClosing => pos = tag.range.end,
            },
            Some(tag) => pos = tag.range.end,
            None => pos = at + 1,
        }
    }
    None
}

/// Outermost shortcodes in `text`, left to right and non-overlapping.
pub fn find_shortcodes(text: &str, registry: &ShortcodeRegistry) -> Vec<ShortcodeMatch> {
    find_matching(text, registry, |_| true)
}

/// Like [`find_shortcodes`] but only for names accepted by `wanted`; other tags
/// are looked through, so a wanted tag nested in another shortcode is found.
pub fn find_matching(
    text: &str,
    registry: &ShortcodeRegistry,
    wanted: impl Fn(&str) -> bool,
) -> Vec<ShortcodeMatch> {
    let mut matches = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('[') {
        let at = pos + offset;
        let Some(tag) = scan_tag_at(text, at) else {
            pos = at + 1;
            continue;
        };
        if !wanted(&tag.name) {
            pos = at + 1;
            continue;
        }
        match complete(text, tag, registry) {
            Some(found) => {
                pos = found.range.end;
                matches.push(found);
            }
            None => pos = at + 1,
        }
    }
    matches
}

fn complete(text: &str, tag: Tag, registry: &ShortcodeRegistry) -> Option<ShortcodeMatch> {
    match tag.kind {
        TagKind::Close => None,
        TagKind::SelfClosing => Some(ShortcodeMatch {
            name: tag.name,
            params: tag.params,
            form: TagForm::SelfClosing,
            content: tag.range.end..tag.range.end,
            range: tag.range,
        }),
        TagKind::Open if registry.is_content_less(&tag.name) => Some(ShortcodeMatch {
            name: tag.name,
            params: tag.params,
            form: TagForm::Standalone,
            content: tag.range.end..tag.range.end,
            range: tag.range,
        }),
        TagKind::Open => {
            let close = find_close(text, &tag.name, tag.range.end)?;
            Some(ShortcodeMatch {
                content: tag.range.end..close.range.start,
                range: tag.range.start..close.range.end,
                name: tag.name,
                params: tag.params,
                form: TagForm::Paired,
            })
        }
    }
}
