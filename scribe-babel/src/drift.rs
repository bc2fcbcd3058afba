//! Shortcode drift detection
//!
//! A round trip through the editor should leave the inline shortcodes of a
//! document alone. [`check`] counts inline shortcode openings per name in two
//! texts and reports every name whose count changed. The result is diagnostic
//! only; callers log it and carry on.

use crate::shortcodes::scanner::{scan_tag_at, TagKind};
use crate::shortcodes::{ShortcodeRegistry, ShortcodeType, INLINE_FALLBACK};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A shortcode name whose inline occurrence count differs between two texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drift {
    pub name: String,
    pub before: usize,
    pub after: usize,
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {} -> {}", self.name, self.before, self.after)
    }
}

/// Compare inline shortcode counts of `before` and `after`.
pub fn check(before: &str, after: &str, registry: &ShortcodeRegistry) -> Vec<Drift> {
    let before_counts = count_inline_openings(before, registry);
    let after_counts = count_inline_openings(after, registry);

    let mut names: Vec<&String> = before_counts.keys().chain(after_counts.keys()).collect();
    names.sort();
    names.dedup();

    names
        .into_iter()
        .filter_map(|name| {
            let before = before_counts.get(name).copied().unwrap_or(0);
            let after = after_counts.get(name).copied().unwrap_or(0);
            (before != after).then(|| Drift {
                name: name.clone(),
                before,
                after,
            })
        })
        .collect()
}

/// Opening and self-closing tags of inline shortcodes, counted by name.
pub fn count_inline_openings(text: &str, registry: &ShortcodeRegistry) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for (pos, _) in text.match_indices('[') {
        let Some(tag) = scan_tag_at(text, pos) else {
            continue;
        };
        if tag.kind == TagKind::Close || !is_inline(registry, &tag.name) {
            continue;
        }
        *counts.entry(tag.name).or_insert(0) += 1;
    }
    counts
}

fn is_inline(registry: &ShortcodeRegistry, name: &str) -> bool {
    match registry.shortcode_type(name) {
        Some(kind) => kind == ShortcodeType::Inline,
        None => INLINE_FALLBACK.contains(&name),
    }
}
