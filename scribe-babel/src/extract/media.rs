//! Transform-image and GitHub alert passes

use super::lines_with_offsets;
use crate::options::ConvertOptions;
use crate::placeholder::{spans_own_line, BlockData, EditList, PlaceholderStore};
use once_cell::sync::Lazy;
use regex::Regex;

static IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"!\[([^\]]*)\]\(([^)\s]+)(?:\s+"([^"]*)")?\)"#).expect("image pattern is valid")
});

static ALERT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\s*)>\s*\[!(NOTE|TIP|IMPORTANT|WARNING|CAUTION)\]\s*$")
        .expect("alert pattern is valid")
});

/// Extract images whose query string carries a recognised transform key.
/// Plain images stay in the text as ordinary rich-text images.
pub(super) fn extract_transform_images(
    text: &str,
    store: &mut PlaceholderStore,
    options: &ConvertOptions,
) -> String {
    let mut edits = EditList::new();
    for caps in IMAGE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let src = &caps[2];
        let Some((_, query)) = src.split_once('?') else {
            continue;
        };
        let has_transform = query
            .split('&')
            .map(|pair| pair.split_once('=').map_or(pair, |(key, _)| key))
            .any(|key| options.is_image_transform_key(key));
        if !has_transform {
            continue;
        }
        let data = BlockData::GravImage {
            src: src.to_string(),
            alt: caps[1].to_string(),
            title: caps.get(3).map(|m| m.as_str().to_string()),
        };
        let own_line = spans_own_line(text, &whole.range());
        let token = store.insert_token(whole.as_str(), false, own_line, data);
        edits.push(whole.range(), token);
    }
    edits.apply(text)
}

/// Extract `> [!TYPE]` blockquotes together with their following quoted lines.
pub(super) fn extract_alerts(text: &str, store: &mut PlaceholderStore) -> String {
    let lines = lines_with_offsets(text);
    let mut edits = EditList::new();
    let mut index = 0;

    while index < lines.len() {
        let (start, line) = lines[index];
        let Some(caps) = ALERT_RE.captures(line) else {
            index += 1;
            continue;
        };
        let indent = caps[1].len();
        let alert_type = caps[2].to_ascii_lowercase();

        let mut body = Vec::new();
        let mut last = index;
        for (offset, (_, next)) in lines.iter().enumerate().skip(index + 1) {
            let Some(quoted) = next.get(indent..).and_then(|rest| rest.strip_prefix('>')) else {
                break;
            };
            if !next[..indent].trim().is_empty() {
                break;
            }
            body.push(quoted.strip_prefix(' ').unwrap_or(quoted));
            last = offset;
        }

        let (last_start, last_line) = lines[last];
        let span = start + indent..last_start + last_line.len();
        let data = BlockData::GithubAlert {
            alert_type,
            body: body.join("\n"),
        };
        let token = store.insert_token(&text[span.clone()], true, true, data);
        edits.push(span, token);
        index = last + 1;
    }
    edits.apply(text)
}
