//! Inline code and fenced code passes

use super::{fence_closes, fence_open, lines_with_offsets};
use crate::options::ConvertOptions;
use crate::placeholder::{BlockData, EditList, PlaceholderStore};
use crate::restore::restore_verbatim;

/// Replace single-line code spans of one or two backticks. Lines inside fenced
/// blocks and runs of three or more backticks are left alone.
pub(super) fn extract_inline_code(text: &str, store: &mut PlaceholderStore) -> String {
    let mut edits = EditList::new();
    let mut fence: Option<(char, usize)> = None;

    for (line_start, line) in lines_with_offsets(text) {
        if let Some((fence_char, length)) = fence {
            if fence_closes(line, fence_char, length) {
                fence = None;
            }
            continue;
        }
        if let Some((_, fence_char, length, _)) = fence_open(line) {
            fence = Some((fence_char, length));
            continue;
        }

        for span in code_spans(line) {
            let original = &line[span.clone()];
            let ticks = original.chars().take_while(|c| *c == '`').count();
            let code = &original[ticks..original.len() - ticks];
            let token = store.insert_token(
                original,
                false,
                false,
                BlockData::InlineCode {
                    code: code.to_string(),
                },
            );
            edits.push(line_start + span.start..line_start + span.end, token);
        }
    }
    edits.apply(text)
}

/// Code spans on a single line: an unescaped run of one or two backticks closed by
/// a run of the same length.
fn code_spans(line: &str) -> Vec<std::ops::Range<usize>> {
    let bytes = line.as_bytes();
    let mut spans = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] != b'`' {
            pos += 1;
            continue;
        }
        let run_start = pos;
        while pos < bytes.len() && bytes[pos] == b'`' {
            pos += 1;
        }
        let run = pos - run_start;
        if run >= 3 || is_escaped(bytes, run_start) {
            continue;
        }
        if let Some(close) = find_run(bytes, pos, run) {
            if close > pos {
                spans.push(run_start..close + run);
                pos = close + run;
            }
        }
    }
    spans
}

fn is_escaped(bytes: &[u8], pos: usize) -> bool {
    let backslashes = bytes[..pos].iter().rev().take_while(|b| **b == b'\\').count();
    backslashes % 2 == 1
}

/// Start of the next backtick run of exactly `length` at or after `from`.
fn find_run(bytes: &[u8], from: usize, length: usize) -> Option<usize> {
    let mut pos = from;
    while pos < bytes.len() {
        if bytes[pos] != b'`' {
            pos += 1;
            continue;
        }
        let start = pos;
        while pos < bytes.len() && bytes[pos] == b'`' {
            pos += 1;
        }
        if pos - start == length {
            return Some(start);
        }
    }
    None
}

/// Replace fenced code blocks. An unclosed fence runs to the end of the text.
pub(super) fn extract_fenced_code(
    text: &str,
    store: &mut PlaceholderStore,
    options: &ConvertOptions,
) -> String {
    let lines = lines_with_offsets(text);
    let mut edits = EditList::new();
    let mut index = 0;

    while index < lines.len() {
        let (start, line) = lines[index];
        let Some((indent, fence_char, length, info)) = fence_open(line) else {
            index += 1;
            continue;
        };

        let mut body = Vec::new();
        let mut close = None;
        for (offset, (_, candidate)) in lines.iter().enumerate().skip(index + 1) {
            if fence_closes(candidate, fence_char, length) {
                close = Some(offset);
                break;
            }
            body.push(strip_indent(candidate, indent));
        }
        let last = close.unwrap_or(lines.len() - 1);
        let (last_start, last_line) = lines[last];
        let end = last_start + last_line.len();

        let span = start + indent..end;
        let original = restore_verbatim(&text[span.clone()], store, options.max_restore_passes);
        let code = restore_verbatim(&body.join("\n"), store, options.max_restore_passes);
        let language = info
            .split_whitespace()
            .next()
            .map(str::to_string);
        let token = store.insert_token(original, true, true, BlockData::FencedCode { language, code });
        edits.push(span, token);
        index = last + 1;
    }
    edits.apply(text)
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let removable = line
        .bytes()
        .take(indent)
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count();
    &line[removable..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::{find_tokens, BlockKind};

    fn store() -> PlaceholderStore {
        PlaceholderStore::with_prefix("t")
    }

    #[test]
    fn extracts_single_and_double_backtick_spans() {
        let mut store = store();
        let text = extract_inline_code("a `b` c ``d ` e`` f", &mut store);
        assert_eq!(
            text,
            "a {{CODE_INLINE_t_1}} c {{CODE_INLINE_t_2}} f"
        );
        assert_eq!(store.get("t_2").unwrap().original, "``d ` e``");
        assert!(matches!(
            &store.get("t_2").unwrap().data,
            BlockData::InlineCode { code } if code == "d ` e"
        ));
    }

    #[test]
    fn skips_escaped_and_unclosed_runs() {
        let mut store = store();
        let source = r"a \`b and `unclosed";
        let text = extract_inline_code(source, &mut store);
        assert_eq!(text, source);
        assert!(store.is_empty());
    }

    #[test]
    fn skips_lines_inside_fences() {
        let mut store = store();
        let source = "```\n`x`\n```\n`y`";
        let text = extract_inline_code(source, &mut store);
        assert_eq!(text, "```\n`x`\n```\n{{CODE_INLINE_t_1}}");
    }

    #[test]
    fn extracts_fenced_code_with_language() {
        let mut store = store();
        let source = "before\n\n```rust\nfn main() {}\n```\n\nafter";
        let text = extract_fenced_code(source, &mut store, &ConvertOptions::default());
        assert_eq!(text, "before\n\n{{CODE_BLOCK_t_1}}\n\nafter");
        let block = store.get("t_1").unwrap();
        assert_eq!(block.kind(), BlockKind::FencedCode);
        assert_eq!(block.original, "```rust\nfn main() {}\n```");
        assert!(matches!(
            &block.data,
            BlockData::FencedCode { language: Some(lang), code } if lang == "rust" && code == "fn main() {}"
        ));
    }

    #[test]
    fn indented_fences_keep_their_indent_outside_the_token() {
        let mut store = store();
        let source = "- item\n\n    ```\n    a\n      b\n    ```";
        let text = extract_fenced_code(source, &mut store, &ConvertOptions::default());
        assert_eq!(text, "- item\n\n    {{CODE_BLOCK_t_1}}");
        assert!(matches!(
            &store.get("t_1").unwrap().data,
            BlockData::FencedCode { code, .. } if code == "a\n  b"
        ));
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        let mut store = store();
        let text = extract_fenced_code("```\nopen\nstill", &mut store, &ConvertOptions::default());
        assert_eq!(find_tokens(&text).len(), 1);
        assert_eq!(store.get("t_1").unwrap().original, "```\nopen\nstill");
    }
}
