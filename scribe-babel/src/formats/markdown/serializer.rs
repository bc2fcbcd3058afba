//! Markdown serialization (rich document → markdown)
//!
//! Pipeline: rich document → mark normalization → markdown with placeholder
//! tokens → restorer → markdown.
//!
//! Nodes backed by an unchanged store record are written as that record's token
//! so the restorer puts the exact source bytes back. Edited nodes are rebuilt from
//! their current attributes and written back into the store before their token is
//! emitted, which keeps the store consistent for the next save.

use super::parser::RichDocBuilder;
use crate::options::ConvertOptions;
use crate::placeholder::{BlockData, PlaceholderStore, PreservedBlock, ShortcodeData, TagForm};
use crate::resolve::{NoopResolver, PathMap};
use crate::restore::{restore, restore_verbatim, Restored};
use crate::richdoc::{
    normalize_marks, Alignment, Block, Document, Inline, ListItem, PreservedNode, RawLanguage,
    ShortcodeAttrs, Table, TableCell, CELL_FILLER,
};
use crate::shortcodes::scanner::scan_tag_at;
use crate::shortcodes::{build_params, classify_for_output, ShortcodeRegistry};
use once_cell::sync::Lazy;
use regex::Regex;

const LIST_INDENT: &str = "    ";

static ALERT_LEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\[!(NOTE|TIP|IMPORTANT|WARNING|CAUTION)\][ \t]*\n?")
        .expect("alert lead pattern is valid")
});

static ORDERED_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,9})([.)])").expect("ordered marker pattern is valid"));

/// Write a rich document back to markdown, updating its store with any rebuilt
/// records.
pub fn serialize_markdown(
    doc: &mut Document,
    registry: &ShortcodeRegistry,
    options: &ConvertOptions,
) -> Restored {
    let Document {
        blocks,
        store,
        paths,
        trailing_newline,
    } = doc;
    let tokenized = MarkdownWriter::new(registry, options, store, paths).write(blocks);
    let mut restored = restore(&tokenized, store, options.max_restore_passes);
    let trimmed_len = restored.text.trim_end_matches('\n').len();
    restored.text.truncate(trimmed_len);
    if *trailing_newline && !restored.text.is_empty() {
        restored.text.push('\n');
    }
    restored
}

/// Writes rich-document blocks as markdown with placeholder tokens.
pub struct MarkdownWriter<'a> {
    registry: &'a ShortcodeRegistry,
    options: &'a ConvertOptions,
    store: &'a mut PlaceholderStore,
    paths: &'a PathMap,
}

impl<'a> MarkdownWriter<'a> {
    pub fn new(
        registry: &'a ShortcodeRegistry,
        options: &'a ConvertOptions,
        store: &'a mut PlaceholderStore,
        paths: &'a PathMap,
    ) -> Self {
        MarkdownWriter {
            registry,
            options,
            store,
            paths,
        }
    }

    pub fn write(&mut self, blocks: &[Block]) -> String {
        self.blocks(blocks, "\n\n")
    }

    fn blocks(&mut self, blocks: &[Block], separator: &str) -> String {
        let mut parts = Vec::with_capacity(blocks.len());
        for block in blocks {
            let written = self.block(block);
            if !written.is_empty() {
                parts.push(written);
            }
        }
        parts.join(separator)
    }

    fn block(&mut self, block: &Block) -> String {
        match block {
            Block::Paragraph { content } => self.inlines(content),
            Block::Heading { level, content } => {
                let level = (*level).clamp(1, 6) as usize;
                format!("{} {}", "#".repeat(level), self.inlines(content).replace('\n', " "))
            }
            Block::BulletList { items } => self.list(items, None),
            Block::OrderedList { start, items } => self.list(items, Some(*start)),
            Block::Blockquote { children } => self.blockquote(children),
            Block::GithubAlert {
                alert_type,
                block_id,
                children,
            } => self.alert(alert_type, block_id.as_deref(), children),
            Block::CodeBlock {
                language,
                code,
                block_id,
            } => self.code_block(language.as_deref(), code, block_id.as_deref()),
            Block::Table(table) => self.table(table),
            Block::HorizontalRule => "---".to_string(),
            Block::ShortcodeBlock {
                shortcode,
                children,
            } => {
                let content = if shortcode.is_code() {
                    shortcode.raw_code.clone().unwrap_or_default()
                } else {
                    self.blocks(children, "\n\n")
                };
                let unchanged = !shortcode.is_code() && self.same_block_children(shortcode, children);
                self.shortcode(shortcode, content, true, unchanged)
            }
            Block::RawBlock {
                language,
                content,
                block_id,
            } => self.raw_block(*language, content, block_id.as_deref()),
            Block::Preserved(node) => self.preserved(node),
            Block::SummaryDelimiter { delimiter } => {
                if delimiter.is_empty() {
                    self.options.summary_delimiter.clone()
                } else {
                    delimiter.clone()
                }
            }
        }
    }

    fn list(&mut self, items: &[ListItem], start: Option<u64>) -> String {
        let mut lines = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let marker = match start {
                Some(start) => format!("{}.", start + index as u64),
                None => "-".to_string(),
            };
            let body = self.blocks(&item.children, "\n");
            if body.is_empty() {
                lines.push(marker);
                continue;
            }
            let mut item_lines = body.split('\n');
            let first = item_lines.next().unwrap_or_default();
            let mut written = format!("{marker} {first}");
            for line in item_lines {
                written.push('\n');
                if !line.is_empty() {
                    written.push_str(LIST_INDENT);
                    written.push_str(line);
                }
            }
            lines.push(written);
        }
        lines.join("\n")
    }

    fn blockquote(&mut self, children: &[Block]) -> String {
        let body = self.blocks(children, "\n\n");
        // an admonition typed into a plain quote still saves as alert syntax
        if let Some(caps) = ALERT_LEAD_RE.captures(&body) {
            let end = caps.get(0).map_or(0, |m| m.end());
            let lead = format!("[!{}]", caps[1].to_uppercase());
            return quote_lines(&format!("{lead}\n{}", &body[end..]).trim_end_matches('\n'));
        }
        quote_lines(&body)
    }

    fn alert(&mut self, alert_type: &str, block_id: Option<&str>, children: &[Block]) -> String {
        let body = self.blocks(children, "\n\n");
        if let Some(record) = block_id.and_then(|id| self.store.get(id)) {
            if let BlockData::GithubAlert {
                alert_type: stored_type,
                body: stored_body,
            } = &record.data
            {
                if stored_type.eq_ignore_ascii_case(alert_type)
                    && self.verbatim(stored_body).trim() == self.verbatim(&body).trim()
                {
                    return record.token();
                }
            }
        }
        let lead = format!("[!{}]", alert_type.to_uppercase());
        if body.is_empty() {
            quote_lines(&lead)
        } else {
            quote_lines(&format!("{lead}\n{body}"))
        }
    }

    fn code_block(&mut self, language: Option<&str>, code: &str, block_id: Option<&str>) -> String {
        if let Some(record) = block_id.and_then(|id| self.store.get(id)) {
            if let BlockData::FencedCode {
                language: stored_language,
                code: stored_code,
            } = &record.data
            {
                let same_code = stored_code == code || stored_code == code.trim_end_matches('\n');
                if same_code && stored_language.as_deref() == language {
                    return record.token();
                }
            }
        }
        let code = code.strip_suffix('\n').unwrap_or(code);
        let fence = "`".repeat((longest_run(code, '`') + 1).max(3));
        format!("{fence}{}\n{code}\n{fence}", language.unwrap_or_default())
    }

    fn table(&mut self, table: &Table) -> String {
        let columns = table
            .header
            .len()
            .max(table.rows.iter().map(Vec::len).max().unwrap_or(0));
        let mut lines = Vec::with_capacity(table.rows.len() + 2);
        lines.push(self.table_row(&table.header, columns));
        let separator: Vec<&str> = (0..columns)
            .map(|column| match table.alignments.get(column) {
                Some(Alignment::Left) => ":---",
                Some(Alignment::Center) => ":---:",
                Some(Alignment::Right) => "---:",
                _ => "---",
            })
            .collect();
        lines.push(format!("| {} |", separator.join(" | ")));
        for row in &table.rows {
            lines.push(self.table_row(row, columns));
        }
        lines.join("\n")
    }

    fn table_row(&mut self, cells: &[TableCell], columns: usize) -> String {
        let mut written = Vec::with_capacity(columns);
        for column in 0..columns {
            let text = match cells.get(column) {
                Some(cell) => self.table_cell(&cell.content),
                None => String::new(),
            };
            written.push(text);
        }
        format!("| {} |", written.join(" | "))
    }

    fn table_cell(&mut self, content: &[Inline]) -> String {
        let mut out = String::new();
        for inline in normalize_marks(content) {
            match inline {
                Inline::HardBreak => out.push_str("<br>"),
                other => out.push_str(&self.inline(&other, false)),
            }
        }
        out.replace(CELL_FILLER, "")
            .replace('\n', "<br>")
            .replace('|', "\\|")
            .trim()
            .to_string()
    }

    fn raw_block(&mut self, language: RawLanguage, content: &str, block_id: Option<&str>) -> String {
        let content = content.trim_end_matches('\n');
        if let Some(id) = block_id {
            let current = self.store.get(id).map(|record| self.verbatim(&record.original));
            if let Some(current) = current {
                if current != content {
                    tracing::debug!(id, "raw block edited, record updated");
                    if let Some(record) = self.store.get_mut(id) {
                        record.original = content.to_string();
                    }
                }
                return self.store.token_for(id).unwrap_or_default();
            }
        }
        let data = match language {
            RawLanguage::Html => BlockData::Html,
            RawLanguage::Twig => BlockData::TemplateFragment,
        };
        self.store.insert_token(content, true, true, data)
    }

    fn preserved(&mut self, node: &PreservedNode) -> String {
        if self.store.contains(&node.block_id) {
            return self.store.token_for(&node.block_id).unwrap_or_default();
        }
        match &node.snapshot {
            Some(snapshot) => {
                tracing::debug!(id = %node.block_id, "record restored from node snapshot");
                let token = snapshot.token();
                self.store.restore_record(snapshot.clone());
                token
            }
            None => {
                tracing::warn!(id = %node.block_id, "preserved node has no record, dropped");
                String::new()
            }
        }
    }

    /// Write a shortcode node: its record's token when nothing changed, else a
    /// rebuilt tag written back into the store.
    fn shortcode(
        &mut self,
        attrs: &ShortcodeAttrs,
        content: String,
        node_is_block: bool,
        children_unchanged: bool,
    ) -> String {
        let record = attrs
            .placeholder_id
            .as_deref()
            .and_then(|id| self.store.get(id))
            .cloned();

        if let Some(record) = &record {
            if let Some(data) = record.shortcode() {
                if self.is_unedited(attrs, data, &content, children_unchanged) {
                    return record.token();
                }
            }
        }

        let is_block = classify_for_output(self.registry, &attrs.name, node_is_block);
        let rebuilt = self.rebuild(attrs, &content, is_block);
        tracing::debug!(name = %attrs.name, "shortcode rebuilt from node attributes");

        let data = ShortcodeData {
            tag_name: attrs.name.clone(),
            params: rebuilt.params,
            attributes: attrs.attributes.clone(),
            content,
            form: rebuilt.form,
            content_type: attrs.content_type,
            is_injection: self.registry.is_content_less(&attrs.name),
        };
        match record {
            Some(record) => {
                let updated = PreservedBlock {
                    id: record.id,
                    original: rebuilt.text,
                    is_block,
                    own_line: is_block || record.own_line,
                    data: BlockData::Shortcode(data),
                };
                let token = updated.token();
                self.store.restore_record(updated);
                token
            }
            None => self
                .store
                .insert_token(rebuilt.text, is_block, is_block, BlockData::Shortcode(data)),
        }
    }

    fn is_unedited(
        &self,
        attrs: &ShortcodeAttrs,
        data: &ShortcodeData,
        content: &str,
        children_unchanged: bool,
    ) -> bool {
        if data.tag_name != attrs.name || data.attributes != attrs.attributes {
            return false;
        }
        if attrs.is_code() {
            return data.content == content;
        }
        children_unchanged || self.verbatim(&data.content).trim() == self.verbatim(content).trim()
    }

    /// Whether the node's children are what its record's content renders to.
    fn same_block_children(&self, attrs: &ShortcodeAttrs, children: &[Block]) -> bool {
        let Some(data) = self.record_data(attrs) else {
            return false;
        };
        let mut scratch = PathMap::default();
        let rendered = RichDocBuilder::new(self.options, &NoopResolver, &*self.store, &mut scratch)
            .block_content(&data.content, 1);
        rendered == children
    }

    fn same_inline_content(&self, attrs: &ShortcodeAttrs, content: &[Inline]) -> bool {
        let Some(data) = self.record_data(attrs) else {
            return false;
        };
        let mut scratch = PathMap::default();
        let rendered = RichDocBuilder::new(self.options, &NoopResolver, &*self.store, &mut scratch)
            .inline_content(&data.content, 1);
        normalize_marks(&rendered) == normalize_marks(content)
    }

    fn record_data(&self, attrs: &ShortcodeAttrs) -> Option<ShortcodeData> {
        let id = attrs.placeholder_id.as_deref()?;
        self.store.get(id)?.shortcode().cloned()
    }

    fn rebuild(&self, attrs: &ShortcodeAttrs, content: &str, is_block: bool) -> Rebuilt {
        let name = attrs.name.as_str();
        let positional = self
            .registry
            .get(name)
            .and_then(|descriptor| descriptor.bbcode_attribute.clone())
            .or_else(|| (attrs.form == TagForm::Standalone).then(|| name.to_string()));
        let params = build_params(&attrs.attributes, positional.as_deref());
        let opening = if params.is_empty() {
            name.to_string()
        } else if params.starts_with('=') {
            format!("{name}{params}")
        } else {
            format!("{name} {params}")
        };

        let content_less = self.registry.is_content_less(name);
        if content_less || (attrs.form != TagForm::Paired && content.trim().is_empty()) {
            let form = if params.starts_with('=') {
                TagForm::Standalone
            } else {
                TagForm::SelfClosing
            };
            let text = match form {
                TagForm::Standalone => format!("[{opening}]"),
                _ => format!("[{opening} /]"),
            };
            return Rebuilt { text, params, form };
        }

        let text = if attrs.is_code() {
            let code = content.trim_matches('\n');
            if is_block {
                format!("[{opening}]\n{code}\n[/{name}]")
            } else {
                format!("[{opening}]{code}[/{name}]")
            }
        } else if !is_block {
            format!("[{opening}]{content}[/{name}]")
        } else if content.trim().is_empty() {
            format!("[{opening}][/{name}]")
        } else {
            format!("[{opening}]\n{}\n[/{name}]", content.trim_matches('\n'))
        };
        Rebuilt {
            text,
            params,
            form: TagForm::Paired,
        }
    }

    fn inlines(&mut self, content: &[Inline]) -> String {
        let normalized = normalize_marks(content);
        let mut out = String::new();
        for inline in &normalized {
            let at_line_start = out.is_empty() || out.ends_with('\n');
            out.push_str(&self.inline(inline, at_line_start));
        }
        out
    }

    fn inline(&mut self, inline: &Inline, at_line_start: bool) -> String {
        match inline {
            Inline::Text { text } => escape_text(text, at_line_start),
            Inline::Strong { content } => self.wrap_mark("**", content),
            Inline::Emphasis { content } => self.wrap_mark("_", content),
            Inline::Strike { content } => self.wrap_mark("~~", content),
            Inline::Code { code, block_id } => self.inline_code(code, block_id.as_deref()),
            Inline::Link {
                href,
                title,
                content,
            } => {
                let text = self.inlines(content);
                let href = self.paths.original(href).to_string();
                format!("[{text}]({}{})", destination(&href), title_suffix(title.as_deref()))
            }
            Inline::Image { src, alt, title } => {
                let src = self.paths.original(src).to_string();
                format!(
                    "![{}]({}{})",
                    escape_text(alt, false),
                    destination(&src),
                    title_suffix(title.as_deref())
                )
            }
            Inline::HardBreak => "\\\n".to_string(),
            Inline::HtmlInline { html } => html.clone(),
            Inline::Shortcode(node) => {
                let content = if node.shortcode.is_code() {
                    node.shortcode.raw_code.clone().unwrap_or_default()
                } else {
                    self.inlines(&node.content)
                };
                let unchanged =
                    !node.shortcode.is_code() && self.same_inline_content(&node.shortcode, &node.content);
                self.shortcode(&node.shortcode, content, false, unchanged)
            }
            Inline::Preserved(node) => self.preserved(node),
        }
    }

    fn wrap_mark(&mut self, marker: &str, content: &[Inline]) -> String {
        let inner = self.inlines(content);
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            return inner;
        }
        let leading = &inner[..inner.len() - inner.trim_start().len()];
        let trailing = &inner[inner.trim_end().len()..];
        format!("{leading}{marker}{trimmed}{marker}{trailing}")
    }

    fn inline_code(&mut self, code: &str, block_id: Option<&str>) -> String {
        if let Some(record) = block_id.and_then(|id| self.store.get(id)) {
            if matches!(&record.data, BlockData::InlineCode { code: stored } if stored == code) {
                return record.token();
            }
        }
        let ticks = "`".repeat(longest_run(code, '`') + 1);
        let padded = code.starts_with('`') || code.ends_with('`');
        if padded {
            format!("{ticks} {code} {ticks}")
        } else {
            format!("{ticks}{code}{ticks}")
        }
    }

    fn verbatim(&self, text: &str) -> String {
        restore_verbatim(text, &*self.store, self.options.max_restore_passes)
    }
}

struct Rebuilt {
    text: String,
    params: String,
    form: TagForm,
}

fn quote_lines(body: &str) -> String {
    body.split('\n')
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn longest_run(text: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn destination(url: &str) -> String {
    if url.contains(' ') || url.contains('(') || url.contains(')') {
        format!("<{url}>")
    } else {
        url.to_string()
    }
}

fn title_suffix(title: Option<&str>) -> String {
    match title {
        Some(title) if !title.is_empty() => format!(" \"{}\"", title.replace('"', "\\\"")),
        _ => String::new(),
    }
}

/// Escape text so it reads back as the same text.
///
/// `*` and backticks always, `_` at word boundaries, a `[` that would open a
/// shortcode tag, a backslash before punctuation, and block markers at line start.
fn escape_text(text: &str, at_line_start: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&escape_line(line, at_line_start || index > 0));
    }
    out
}

fn escape_line(line: &str, at_line_start: bool) -> String {
    let mut out = String::with_capacity(line.len() + 4);
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    for (position, &(offset, ch)) in chars.iter().enumerate() {
        let previous = position.checked_sub(1).map(|p| chars[p].1);
        let next = chars.get(position + 1).map(|&(_, c)| c);
        let escape = match ch {
            '*' | '`' => true,
            '_' => {
                !previous.is_some_and(char::is_alphanumeric) || !next.is_some_and(char::is_alphanumeric)
            }
            '\\' => next.is_some_and(|c| c.is_ascii_punctuation()),
            '[' => scan_tag_at(line, offset).is_some(),
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(ch);
    }
    if at_line_start {
        escape_line_start(&mut out);
    }
    out
}

fn escape_line_start(line: &mut String) {
    let indent = line.len() - line.trim_start().len();
    let rest = &line[indent..];
    let needs = match rest.chars().next() {
        Some('#') => rest.trim_start_matches('#').is_empty() || rest.trim_start_matches('#').starts_with(' '),
        Some('>') => true,
        Some('-') | Some('+') => rest.len() == 1 || rest[1..].starts_with(' ') || is_rule(rest),
        Some('=') => rest.trim_end().chars().all(|c| c == '='),
        Some(c) if c.is_ascii_digit() => {
            if let Some(caps) = ORDERED_MARKER_RE.captures(rest) {
                let end = caps.get(0).map_or(0, |m| m.end());
                let after = &rest[end..];
                if after.is_empty() || after.starts_with(' ') {
                    // escape the delimiter, not the digits
                    let digits = caps.get(1).map_or(0, |m| m.len());
                    line.insert(indent + digits, '\\');
                }
            }
            false
        }
        _ => false,
    };
    if needs {
        line.insert(indent, '\\');
    }
}

fn is_rule(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3 && compact.chars().all(|c| c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::markdown::parser::parse_markdown;
    use crate::shortcodes::{ContentType, ShortcodeDescriptor, ShortcodeType};

    fn registry() -> ShortcodeRegistry {
        let mut registry = ShortcodeRegistry::new();
        registry
            .register(ShortcodeDescriptor::new("notice", "Notice", ShortcodeType::Block))
            .unwrap();
        registry
            .register(ShortcodeDescriptor::new("mark", "Mark", ShortcodeType::Inline))
            .unwrap();
        registry
            .register(
                ShortcodeDescriptor::new("prism", "Code", ShortcodeType::Block)
                    .with_content_type(ContentType::Code),
            )
            .unwrap();
        registry
            .register(
                ShortcodeDescriptor::new("icon", "Icon", ShortcodeType::Inline)
                    .without_content()
                    .with_bbcode_attribute("icon"),
            )
            .unwrap();
        registry
    }

    fn roundtrip(source: &str) -> String {
        let registry = registry();
        let options = ConvertOptions::default();
        let mut doc = parse_markdown(source, &registry, &options, &NoopResolver);
        serialize_markdown(&mut doc, &registry, &options).text
    }

    fn write(blocks: Vec<Block>) -> String {
        let registry = registry();
        let options = ConvertOptions::default();
        let mut doc = Document::new(blocks, PlaceholderStore::with_prefix("w"));
        serialize_markdown(&mut doc, &registry, &options).text
    }

    #[test]
    fn unedited_documents_round_trip() {
        let sources = [
            "# Title\n\nSome **bold** and _italic_ text.\n",
            "Intro\n\n[notice type=\"info\"]\nHello **world**\n[/notice]\n\nOutro\n",
            "Press [mark]here[/mark] now.\n",
            "[outer][inner]text[/inner][/outer]\n",
            "Star [icon=\"star\"] rating\n",
            "```html\n<div>[foo]</div>\n```\n",
            "> [!WARNING]\n> Be careful\n",
            "<div>[notashortcode]</div>\n",
            "[prism]\n  fn main() {\n\n      x\n  }\n[/prism]\n",
            "Before\n\n===\n\nAfter\n",
            "{% if user %}\nHi {{ user.name }}\n{% endif %}\n",
        ];
        for source in sources {
            assert_eq!(roundtrip(source), source, "source: {source:?}");
        }
    }

    #[test]
    fn nested_lists_use_four_space_indent() {
        let source = "- one\n    - two\n        - three\n- four\n\n1. first\n2. second\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn empty_table_cell_round_trips_without_filler() {
        let source = "| a | b |\n| --- | :---: |\n| 1 |  |\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn missing_trailing_newline_is_kept_missing() {
        assert_eq!(roundtrip("Just text"), "Just text");
    }

    #[test]
    fn edited_shortcode_attributes_rebuild_the_tag() {
        let registry = registry();
        let options = ConvertOptions::default();
        let mut doc = parse_markdown(
            "[notice type=\"info\"]\nHello\n[/notice]\n",
            &registry,
            &options,
            &NoopResolver,
        );
        let Block::ShortcodeBlock { shortcode, .. } = &mut doc.blocks[0] else {
            panic!("expected shortcode block");
        };
        shortcode.attributes.insert("type", "warning");
        let id = shortcode.placeholder_id.clone().unwrap();

        let saved = serialize_markdown(&mut doc, &registry, &options);
        assert_eq!(saved.text, "[notice type=\"warning\"]\nHello\n[/notice]\n");
        assert_eq!(
            doc.store.get(&id).unwrap().original,
            "[notice type=\"warning\"]\nHello\n[/notice]"
        );
    }

    #[test]
    fn edited_children_rebuild_the_parent() {
        let registry = registry();
        let options = ConvertOptions::default();
        let mut doc = parse_markdown("[notice]\nHello\n[/notice]\n", &registry, &options, &NoopResolver);
        let Block::ShortcodeBlock { children, .. } = &mut doc.blocks[0] else {
            panic!("expected shortcode block");
        };
        children.push(Block::paragraph("More"));
        let saved = serialize_markdown(&mut doc, &registry, &options);
        assert_eq!(saved.text, "[notice]\nHello\n\nMore\n[/notice]\n");
    }

    #[test]
    fn new_shortcode_nodes_are_written_from_attributes() {
        let mut inline = ShortcodeAttrs::new("mark");
        inline.attributes.insert("color", "red");
        let mut icon = ShortcodeAttrs::new("icon");
        icon.attributes.insert("icon", "star");
        let blocks = vec![
            Block::Paragraph {
                content: vec![
                    Inline::text("a "),
                    Inline::Shortcode(crate::richdoc::ShortcodeInline {
                        shortcode: inline,
                        content: vec![Inline::text("b")],
                    }),
                    Inline::text(" "),
                    Inline::Shortcode(crate::richdoc::ShortcodeInline {
                        shortcode: icon,
                        content: Vec::new(),
                    }),
                ],
            },
            Block::ShortcodeBlock {
                shortcode: ShortcodeAttrs::new("notice"),
                children: Vec::new(),
            },
        ];
        assert_eq!(
            write(blocks),
            "a [mark color=\"red\"]b[/mark] [icon=\"star\"]\n\n[notice][/notice]\n"
        );
    }

    #[test]
    fn code_shortcode_content_bypasses_prose_escaping() {
        let mut attrs = ShortcodeAttrs::new("prism");
        attrs.content_type = ContentType::Code;
        attrs.raw_code = Some("\n*not emphasis*\n    indented\n".into());
        let out = write(vec![Block::ShortcodeBlock {
            shortcode: attrs,
            children: Vec::new(),
        }]);
        assert_eq!(out, "[prism]\n*not emphasis*\n    indented\n[/prism]\n");
    }

    #[test]
    fn edited_code_block_gets_a_longer_fence_when_needed() {
        let out = write(vec![Block::CodeBlock {
            language: Some("md".into()),
            code: "```\ninner\n```\n".into(),
            block_id: None,
        }]);
        assert_eq!(out, "````md\n```\ninner\n```\n````\n");
    }

    #[test]
    fn raw_block_edits_update_the_record() {
        let registry = registry();
        let options = ConvertOptions::default();
        let mut doc = parse_markdown("<div>old</div>\n", &registry, &options, &NoopResolver);
        let Block::RawBlock { content, .. } = &mut doc.blocks[0] else {
            panic!("expected raw block");
        };
        *content = "<div>new</div>".into();
        assert_eq!(serialize_markdown(&mut doc, &registry, &options).text, "<div>new</div>\n");
    }

    #[test]
    fn lost_records_come_back_from_snapshots() {
        let registry = registry();
        let options = ConvertOptions::default();
        let mut doc = parse_markdown(
            "![a](cat.jpg?cropResize=300,300)\n",
            &registry,
            &options,
            &NoopResolver,
        );
        doc.store.clear();
        assert_eq!(
            serialize_markdown(&mut doc, &registry, &options).text,
            "![a](cat.jpg?cropResize=300,300)\n"
        );
    }

    #[test]
    fn alert_typed_into_a_quote_saves_as_alert_syntax() {
        let out = write(vec![Block::Blockquote {
            children: vec![Block::paragraph("[!note] Remember this")],
        }]);
        assert_eq!(out, "> [!NOTE]\n> Remember this\n");
    }

    #[test]
    fn split_marks_are_merged_before_writing() {
        let out = write(vec![Block::Paragraph {
            content: vec![
                Inline::Emphasis {
                    content: vec![Inline::text("A")],
                },
                Inline::Strong {
                    content: vec![Inline::Emphasis {
                        content: vec![Inline::text("B")],
                    }],
                },
                Inline::Emphasis {
                    content: vec![Inline::text("C")],
                },
            ],
        }]);
        assert_eq!(out, "_A**B**C_\n");
    }

    #[test]
    fn text_escaping() {
        assert_eq!(escape_text("2 * 3 = `x`", true), "2 \\* 3 = \\`x\\`");
        assert_eq!(escape_text("snake_case and _lead", false), "snake_case and \\_lead");
        assert_eq!(escape_text("# not a heading", true), "\\# not a heading");
        assert_eq!(escape_text("1. not a list", true), "1\\. not a list");
        assert_eq!(escape_text("- item\n> quote", true), "\\- item\n\\> quote");
        assert_eq!(escape_text("see [note] here", false), "see \\[note] here");
        assert_eq!(escape_text("[Link Text] alone", false), "\\[Link Text] alone");
        assert_eq!(escape_text("#hashtag", true), "#hashtag");
    }

    #[test]
    fn hard_breaks_and_cells() {
        let out = write(vec![Block::Table(Table {
            alignments: vec![Alignment::None],
            header: vec![TableCell {
                content: vec![Inline::text("h")],
            }],
            rows: vec![vec![TableCell {
                content: vec![Inline::text("a|b"), Inline::HardBreak, Inline::text("c")],
            }]],
        })]);
        assert_eq!(out, "| h |\n| --- |\n| a\\|b<br>c |\n");
    }
}
