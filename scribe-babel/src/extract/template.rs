//! Template fragment pass
//!
//! Twig-like syntax is treated as opaque spans, not parsed. Block-pairing tags
//! are balanced with a stack and extracted as one span per outermost pair; the
//! remaining single tags, comments and `{{ }}` expressions are extracted one by
//! one. Placeholder tokens share the `{{ }}` shape and are skipped.

use super::{inside_any, token_ranges};
use crate::placeholder::{spans_own_line, BlockData, EditList, PlaceholderStore};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

const PAIRED_TAGS: &[&str] = &[
    "apply", "autoescape", "block", "cache", "embed", "filter", "for", "if", "macro", "sandbox",
    "set", "spaceless", "verbatim", "with",
];

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{%-?\s*(\w+)(.*?)-?%\}").expect("template tag pattern is valid")
});

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{#.*?#\}").expect("template comment pattern is valid"));

// Single line, no nested `{`: an unclosed `{{` must not run into a later token.
static EXPRESSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{[^{\n]*?\}\}").expect("template expression pattern is valid"));

struct TemplateTag {
    name: String,
    range: Range<usize>,
    opens_block: bool,
}

pub(super) fn extract_templates(text: &str, store: &mut PlaceholderStore) -> String {
    let tokens = token_ranges(text);
    let tags: Vec<TemplateTag> = TAG_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if inside_any(whole.start(), &tokens) {
                return None;
            }
            let name = caps[1].to_string();
            // `{% set x = 1 %}` is a single tag, `{% set x %}...{% endset %}` a pair
            let opens_block =
                PAIRED_TAGS.contains(&name.as_str()) && !(name == "set" && caps[2].contains('='));
            Some(TemplateTag {
                name,
                range: whole.range(),
                opens_block,
            })
        })
        .collect();

    let mut spans: Vec<Range<usize>> = balanced_pairs(&tags);
    let paired = spans.clone();
    let outside_pairs = |range: &Range<usize>| {
        !paired
            .iter()
            .any(|p| p.start <= range.start && range.end <= p.end)
    };

    spans.extend(
        tags.iter()
            .map(|tag| tag.range.clone())
            .filter(|range| outside_pairs(range)),
    );
    spans.extend(
        COMMENT_RE
            .find_iter(text)
            .map(|m| m.range())
            .filter(|range| !inside_any(range.start, &tokens) && outside_pairs(range)),
    );
    spans.extend(
        EXPRESSION_RE
            .find_iter(text)
            .map(|m| m.range())
            .filter(|range| !tokens.iter().any(|t| t.start == range.start))
            .filter(|range| !inside_any(range.start, &tokens) && outside_pairs(range)),
    );

    spans.sort_by_key(|range| range.start);
    let mut edits = EditList::new();
    for range in spans {
        if edits.overlaps(&range) {
            continue;
        }
        let own_line = spans_own_line(text, &range);
        let token = store.insert_token(
            &text[range.clone()],
            own_line,
            own_line,
            BlockData::TemplateFragment,
        );
        edits.push(range, token);
    }
    edits.apply(text)
}

/// Spans of outermost balanced `{% tag %}...{% endtag %}` pairs.
fn balanced_pairs(tags: &[TemplateTag]) -> Vec<Range<usize>> {
    let mut stack: Vec<&TemplateTag> = Vec::new();
    let mut pairs = Vec::new();
    for tag in tags {
        if tag.opens_block {
            stack.push(tag);
            continue;
        }
        let Some(closed) = tag.name.strip_prefix("end") else {
            continue;
        };
        let Some(depth) = stack.iter().rposition(|open| open.name == closed) else {
            continue;
        };
        let open = stack[depth];
        stack.truncate(depth);
        if stack.is_empty() {
            pairs.push(open.range.start..tag.range.end);
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> (String, PlaceholderStore) {
        let mut store = PlaceholderStore::with_prefix("t");
        let text = extract_templates(source, &mut store);
        (text, store)
    }

    #[test]
    fn pairs_are_extracted_as_one_span() {
        let source = "{% for p in pages %}\n{% if p.visible %}{{ p.title }}{% endif %}\n{% endfor %}";
        let (text, store) = extract(source);
        assert_eq!(text, "{{RAW_BLOCK_t_1}}");
        assert_eq!(store.get("t_1").unwrap().original, source);
    }

    #[test]
    fn singles_comments_and_expressions() {
        let (text, store) = extract("Hi {{ user.name }} {# note #} {% include 'x.twig' %}");
        assert_eq!(
            text,
            "Hi {{RAW_BLOCK_t_1}} {{RAW_BLOCK_t_2}} {{RAW_BLOCK_t_3}}"
        );
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn set_with_assignment_is_single() {
        let (text, _) = extract("{% set a = 1 %} text {% set b %}x{% endset %}");
        assert_eq!(text, "{{RAW_BLOCK_t_1}} text {{RAW_BLOCK_t_2}}");
    }

    #[test]
    fn placeholder_tokens_are_not_expressions() {
        let source = "a {{CODE_INLINE_x_1}} b";
        let (text, store) = extract(source);
        assert_eq!(text, source);
        assert!(store.is_empty());
    }

    #[test]
    fn unclosed_expression_stays_text() {
        let source = "Open {{ but never closed\n\n# Heading\n\n{{CODE_BLOCK_x_1}}\n\nend {{ a }}";
        let (text, store) = extract(source);
        assert_eq!(
            text,
            "Open {{ but never closed\n\n# Heading\n\n{{CODE_BLOCK_x_1}}\n\nend {{RAW_BLOCK_t_1}}"
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unbalanced_end_tags_are_singles() {
        let (text, store) = extract("{% endif %}");
        assert_eq!(text, "{{RAW_BLOCK_t_1}}");
        assert_eq!(store.len(), 1);
    }
}
