//! `[raw]...[/raw]` pass
//!
//! Raw means raw: the record's original text has inline-code tokens from the
//! first pass re-inlined.

use crate::options::ConvertOptions;
use crate::placeholder::{spans_own_line, BlockData, EditList, PlaceholderStore};
use crate::restore::restore_verbatim;
use once_cell::sync::Lazy;
use regex::Regex;

static RAW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[raw\].*?\[/raw\]").expect("raw pattern is valid"));

pub(super) fn extract_raw(
    text: &str,
    store: &mut PlaceholderStore,
    options: &ConvertOptions,
) -> String {
    let mut edits = EditList::new();
    for found in RAW_RE.find_iter(text) {
        let range = found.range();
        let own_line = spans_own_line(text, &range);
        let original = restore_verbatim(found.as_str(), store, options.max_restore_passes);
        let token = store.insert_token(original, own_line, own_line, BlockData::RawShortcode);
        edits.push(range, token);
    }
    edits.apply(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::{BlockKind, TokenKind};

    #[test]
    fn raw_content_is_restored_verbatim() {
        let mut store = PlaceholderStore::with_prefix("t");
        let code = store.insert_token("`x`", false, false, BlockData::InlineCode { code: "x".into() });
        let text = format!("a [raw][b]{code}[/b][/raw] c");
        let out = extract_raw(&text, &mut store, &ConvertOptions::default());
        assert_eq!(out, "a {{PRESERVED_BLOCK_t_2}} c");
        let block = store.get("t_2").unwrap();
        assert_eq!(block.kind(), BlockKind::RawShortcode);
        assert_eq!(block.token_kind(), TokenKind::PreservedBlock);
        assert_eq!(block.original, "[raw][b]`x`[/b][/raw]");
        assert!(!block.is_block);
    }

    #[test]
    fn own_line_raw_is_a_block() {
        let mut store = PlaceholderStore::with_prefix("t");
        let out = extract_raw("[raw]\n<b>\n[/raw]\n", &mut store, &ConvertOptions::default());
        assert_eq!(out, "{{PRESERVED_BLOCK_t_1}}\n");
        assert!(store.get("t_1").unwrap().is_block);
    }
}
