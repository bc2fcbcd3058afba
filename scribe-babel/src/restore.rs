//! The restorer: placeholder tokens back to source text
//!
//! Restoring one record can surface further tokens (nested shortcodes keep their
//! children as tokens), so substitution repeats until no known token is left or
//! the pass limit is reached. Unknown tokens stay in the text.

use crate::placeholder::{PlaceholderStore, TOKEN_RE};
use std::collections::BTreeSet;

/// Result of a restoration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Restored {
    pub text: String,
    /// Ids that were substituted
    pub used: BTreeSet<String>,
    /// Tokens left in place because the store has no record for them
    pub unresolved: Vec<String>,
}

/// Replace tokens with their records' original text, adding block spacing after
/// own-line block records written directly in `text`. Tokens surfacing from a
/// record's original are restored verbatim.
pub fn restore(text: &str, store: &PlaceholderStore, max_passes: usize) -> Restored {
    run(text, store, max_passes, true)
}

/// Replace tokens with their records' original text and nothing else.
pub fn restore_verbatim(text: &str, store: &PlaceholderStore, max_passes: usize) -> String {
    run(text, store, max_passes, false).text
}

fn run(text: &str, store: &PlaceholderStore, max_passes: usize, spacing: bool) -> Restored {
    let mut current = text.to_string();
    let mut used = BTreeSet::new();

    for pass in 0..max_passes {
        let mut replaced = false;
        let mut out = String::with_capacity(current.len());
        let mut last = 0;
        for caps in TOKEN_RE.captures_iter(&current) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(block) = store.get(&caps[2]) else {
                continue;
            };
            out.push_str(&current[last..whole.start()]);
            out.push_str(&block.original);
            last = whole.end();
            if spacing && pass == 0 && block.needs_block_spacing() {
                last = push_block_spacing(&mut out, &current, last);
            }
            used.insert(block.id.clone());
            replaced = true;
        }
        if !replaced {
            break;
        }
        out.push_str(&current[last..]);
        tracing::trace!(pass, "restore pass substituted tokens");
        current = out;
        if pass + 1 == max_passes && TOKEN_RE.is_match(&current) {
            tracing::warn!(max_passes, "placeholder restoration hit its pass limit");
        }
    }

    let unresolved: Vec<String> = TOKEN_RE
        .find_iter(&current)
        .map(|m| m.as_str().to_string())
        .collect();
    for token in &unresolved {
        tracing::warn!(token = %token, "placeholder left unresolved in output");
    }

    Restored {
        text: current,
        used,
        unresolved,
    }
}

/// Ensure a blank line follows a restored block unless one is already there or
/// the text ends. Returns the position in `source` to continue copying from.
fn push_block_spacing(out: &mut String, source: &str, after: usize) -> usize {
    let rest = &source[after..];
    if rest.is_empty() || rest.starts_with("\n\n") || rest.trim().is_empty() {
        return after;
    }
    while out.ends_with(' ') {
        out.pop();
    }
    if rest.starts_with('\n') {
        out.push('\n');
    } else {
        out.push_str("\n\n");
    }
    after
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::BlockData;

    #[test]
    fn restores_nested_tokens_to_fixpoint() {
        let mut store = PlaceholderStore::with_prefix("t");
        let inner = store.insert_token("`code`", false, false, BlockData::InlineCode { code: "code".into() });
        let outer = store.insert_token(format!("<b>{inner}</b>"), false, false, BlockData::Html);
        let restored = restore(&format!("a {outer} b"), &store, 50);
        assert_eq!(restored.text, "a <b>`code`</b> b");
        assert_eq!(restored.used.len(), 2);
        assert!(restored.unresolved.is_empty());
    }

    #[test]
    fn unknown_tokens_stay_in_place() {
        let store = PlaceholderStore::with_prefix("t");
        let restored = restore("x {{RAW_BLOCK_t_404}} y", &store, 50);
        assert_eq!(restored.text, "x {{RAW_BLOCK_t_404}} y");
        assert_eq!(restored.unresolved, vec!["{{RAW_BLOCK_t_404}}".to_string()]);
    }

    #[test]
    fn own_line_blocks_get_a_following_blank_line() {
        let mut store = PlaceholderStore::with_prefix("t");
        let token = store.insert_token("<div>x</div>", true, true, BlockData::Html);
        let restored = restore(&format!("{token}\nnext"), &store, 50);
        assert_eq!(restored.text, "<div>x</div>\n\nnext");

        let restored = restore(&format!("{token}\n\nnext"), &store, 50);
        assert_eq!(restored.text, "<div>x</div>\n\nnext");

        let restored = restore(&format!("{token}\n"), &store, 50);
        assert_eq!(restored.text, "<div>x</div>\n");
    }

    #[test]
    fn nested_block_tokens_are_not_spaced() {
        let mut store = PlaceholderStore::with_prefix("t");
        let inner = store.insert_token("[notice]\ninner\n[/notice]", true, true, BlockData::Html);
        let outer = store.insert_token(format!("[section]\n{inner}\n[/section]"), true, true, BlockData::Html);
        let restored = restore(&format!("{outer}\n"), &store, 50);
        assert_eq!(restored.text, "[section]\n[notice]\ninner\n[/notice]\n[/section]\n");
    }

    #[test]
    fn verbatim_restore_adds_no_spacing() {
        let mut store = PlaceholderStore::with_prefix("t");
        let token = store.insert_token("<div>x</div>", true, true, BlockData::Html);
        assert_eq!(
            restore_verbatim(&format!("{token}\nnext"), &store, 50),
            "<div>x</div>\nnext"
        );
    }

    #[test]
    fn pass_limit_bounds_self_reference() {
        let mut store = PlaceholderStore::with_prefix("t");
        let id = store.insert("", false, false, BlockData::Html);
        let token = store.token_for(&id).unwrap();
        store.get_mut(&id).unwrap().original = format!("[{token}]");
        let restored = restore(&token, &store, 5);
        assert_eq!(restored.text, format!("[[[[[{token}]]]]]"));
    }
}
