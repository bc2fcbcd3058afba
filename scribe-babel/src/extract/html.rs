//! HTML block pass
//!
//! Only elements on a block-level allow-list are extracted. Inline elements stay
//! in the text so they remain editable as marks. Matching closing tags are found
//! with a depth stack per tag name, so self-nesting like `<div><div></div></div>`
//! resolves to the outer pair.

use super::{inside_any, token_ranges};
use crate::placeholder::{spans_own_line, BlockData, EditList, PlaceholderStore};
use once_cell::sync::Lazy;
use regex::Regex;

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "canvas", "center", "dd", "details",
    "dialog", "div", "dl", "dt", "embed", "fieldset", "figcaption", "figure", "footer", "form",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "iframe", "li", "main", "nav",
    "noscript", "object", "ol", "p", "picture", "pre", "script", "section", "style", "summary",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul", "video",
];

/// Inline elements that are never extracted.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "del", "dfn", "em", "i", "img",
    "input", "ins", "kbd", "label", "mark", "q", "s", "samp", "small", "span", "strong", "sub",
    "sup", "time", "u", "var", "wbr",
];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

static OPEN_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<([A-Za-z][A-Za-z0-9-]*)(?:\s(?:[^<>"']|"[^"]*"|'[^']*')*)?/?>"#)
        .expect("open tag pattern is valid")
});

static ANY_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(/?)([A-Za-z][A-Za-z0-9-]*)(?:\s(?:[^<>"']|"[^"]*"|'[^']*')*)?/?>"#)
        .expect("tag pattern is valid")
});

pub(super) fn extract_html(text: &str, store: &mut PlaceholderStore) -> String {
    let tokens = token_ranges(text);
    let mut edits = EditList::new();
    let mut pos = 0;

    while let Some(open) = OPEN_TAG_RE.find_at(text, pos) {
        let start = open.start();
        pos = open.end();
        if inside_any(start, &tokens) {
            continue;
        }
        let name = text[start + 1..]
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if INLINE_TAGS.contains(&name.as_str()) || !BLOCK_TAGS.contains(&name.as_str()) {
            continue;
        }

        let self_closing = open.as_str().ends_with("/>") || VOID_TAGS.contains(&name.as_str());
        let end = if self_closing {
            open.end()
        } else {
            match find_matching_close(text, &name, open.end()) {
                Some(end) => end,
                None => continue,
            }
        };

        let range = start..end;
        let own_line = spans_own_line(text, &range);
        let token = store.insert_token(&text[range.clone()], own_line, own_line, BlockData::Html);
        if edits.push(range, token) {
            pos = end;
        }
    }
    edits.apply(text)
}

/// End offset of the closing tag that balances an opening `name` tag ending at `from`.
fn find_matching_close(text: &str, name: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for caps in ANY_TAG_RE.captures_iter(&text[from..]) {
        let whole = caps.get(0)?;
        if !caps[2].eq_ignore_ascii_case(name) {
            continue;
        }
        if caps[1].is_empty() {
            if !whole.as_str().ends_with("/>") {
                depth += 1;
            }
        } else {
            depth -= 1;
            if depth == 0 {
                return Some(from + whole.end());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> (String, PlaceholderStore) {
        let mut store = PlaceholderStore::with_prefix("t");
        let text = extract_html(source, &mut store);
        (text, store)
    }

    #[test]
    fn balances_nested_same_name_tags() {
        let source = "<div class=\"a\">\n<div>inner</div>\n</div>\nafter";
        let (text, store) = extract(source);
        assert_eq!(text, "{{RAW_BLOCK_t_1}}\nafter");
        let block = store.get("t_1").unwrap();
        assert_eq!(block.original, "<div class=\"a\">\n<div>inner</div>\n</div>");
        assert!(block.is_block && block.own_line);
    }

    #[test]
    fn inline_elements_stay_editable() {
        let source = "some <strong>bold</strong> and <span>x</span>";
        let (text, store) = extract(source);
        assert_eq!(text, source);
        assert!(store.is_empty());
    }

    #[test]
    fn void_and_self_closing_tags() {
        let (text, store) = extract("a\n\n<hr>\n\n<section/>");
        assert_eq!(text, "a\n\n{{RAW_BLOCK_t_1}}\n\n{{RAW_BLOCK_t_2}}");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn unclosed_tags_are_left_alone() {
        let (text, store) = extract("<div>never closed");
        assert_eq!(text, "<div>never closed");
        assert!(store.is_empty());
    }

    #[test]
    fn mid_line_block_tag_is_inline() {
        let (text, store) = extract("text <div>x</div> more");
        assert_eq!(text, "text {{RAW_BLOCK_t_1}} more");
        assert!(!store.get("t_1").unwrap().is_block);
    }

    #[test]
    fn case_insensitive_closing() {
        let (_, store) = extract("<DIV>x</div>");
        assert_eq!(store.get("t_1").unwrap().original, "<DIV>x</div>");
    }
}
