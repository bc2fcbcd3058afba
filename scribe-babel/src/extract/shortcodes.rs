//! Shortcode passes
//!
//! Code-type shortcodes run early so their bodies are claimed before fenced code
//! and HTML detection. General shortcodes run outermost first; non-code bodies
//! are tokenized recursively, up to the configured depth.

use super::Extractor;
use crate::placeholder::{spans_own_line, BlockData, EditList, PlaceholderStore, ShortcodeData};
use crate::shortcodes::scanner::{find_matching, find_shortcodes, ShortcodeMatch};
use crate::shortcodes::{
    classify_extracted, normalize_shortcode_params, parse_attributes, ContentType,
};

/// Extract shortcodes whose descriptor declares code content.
///
/// Occurrences right after a backtick, and occurrences inside a container that
/// lists the name as an allowed child, are left for the general pass.
pub(super) fn extract_code_shortcodes(
    extractor: &Extractor<'_>,
    text: &str,
    store: &mut PlaceholderStore,
) -> String {
    let registry = extractor.registry;
    let containers = find_matching(text, registry, |name| registry.can_have_children(name));
    let candidates = find_matching(text, registry, |name| registry.is_code(name));

    let mut edits = EditList::new();
    for found in candidates {
        if text[..found.range.start].ends_with('`') {
            continue;
        }
        let nested_in_container = containers.iter().any(|container| {
            container.range.start < found.range.start
                && found.range.end <= container.range.end
                && registry
                    .get(&container.name)
                    .is_some_and(|d| d.allowed_children.contains(&found.name))
        });
        if nested_in_container {
            continue;
        }
        let token = record_shortcode(extractor, text, &found, store, 0);
        edits.push(found.range.clone(), token);
    }
    edits.apply(text)
}

/// Extract every remaining shortcode, repeating until nothing new matches.
pub(super) fn extract_shortcodes(
    extractor: &Extractor<'_>,
    text: &str,
    store: &mut PlaceholderStore,
    depth: usize,
) -> String {
    let mut current = text.to_string();
    for round in 0..extractor.options.max_extract_passes {
        let found = find_shortcodes(&current, extractor.registry);
        if found.is_empty() {
            break;
        }
        let mut edits = EditList::new();
        for shortcode in &found {
            let token = record_shortcode(extractor, &current, shortcode, store, depth);
            edits.push(shortcode.range.clone(), token);
        }
        tracing::trace!(round, depth, matched = found.len(), "shortcode round");
        current = edits.apply(&current);
    }
    current
}

fn record_shortcode(
    extractor: &Extractor<'_>,
    text: &str,
    found: &ShortcodeMatch,
    store: &mut PlaceholderStore,
    depth: usize,
) -> String {
    let registry = extractor.registry;
    let name = found.name.as_str();
    let matched = found.text(text);
    let body = found.content_text(text);
    let content_type = registry.content_type(name);

    let (original, content) = if content_type == ContentType::Code {
        (extractor.restore(matched, store), extractor.restore(body, store))
    } else if depth + 1 > extractor.options.max_shortcode_depth {
        tracing::warn!(name, depth, "shortcode nesting limit reached, content kept as-is");
        (matched.to_string(), body.to_string())
    } else {
        // nested shortcodes stay tokens in the original too, so a child edited in
        // place is picked up when the parent is restored unchanged
        let content = extract_shortcodes(extractor, body, store, depth + 1);
        let opening = &text[found.range.start..found.content.start];
        let closing = &text[found.content.end..found.range.end];
        (format!("{opening}{content}{closing}"), content)
    };

    let positional = registry
        .positional_attribute(name)
        .unwrap_or_else(|| name.to_string());
    let data = ShortcodeData {
        tag_name: name.to_string(),
        params: normalize_shortcode_params(&found.params),
        attributes: parse_attributes(&found.params, &positional),
        content,
        form: found.form,
        content_type,
        is_injection: registry.is_content_less(name),
    };
    let is_block = classify_extracted(registry, name, body, matched);
    let own_line = spans_own_line(text, &found.range);
    store.insert_token(original, is_block, own_line, BlockData::Shortcode(data))
}
