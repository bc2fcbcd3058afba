//! Markdown parsing (markdown → rich document)
//!
//! Pipeline: markdown → extractor passes → tokenized markdown → placeholder
//! protection → comrak AST → typed rich-document tree → structural fixups.
//!
//! Own-line block placeholders are turned into `<!--scribe:ID-->` comments before
//! comrak sees the text, so they become HTML blocks and are never wrapped in a
//! paragraph. Inline placeholders stay bare and flow inside paragraphs; they are
//! split out of text nodes during the walk.

use crate::extract::Extractor;
use crate::options::ConvertOptions;
use crate::placeholder::{find_tokens, parse_token, BlockData, PlaceholderStore, PreservedBlock};
use crate::resolve::{resolve_path, PathMap, PathResolver};
use crate::restore::restore_verbatim;
use crate::richdoc::{
    Alignment, Block, Document, Inline, ListItem, PreservedNode, RawLanguage, ShortcodeAttrs,
    ShortcodeInline, Table, TableCell, CELL_FILLER,
};
use crate::shortcodes::ShortcodeRegistry;
use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use comrak::{parse_document, Arena, ComrakOptions};
use once_cell::sync::Lazy;
use regex::Regex;

const MARKER_PREFIX: &str = "<!--scribe:";
const MARKER_SUFFIX: &str = "-->";
const SUMMARY_MARKER: &str = "summary";

static LIST_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*+]|\d{1,9}[.)])(?:\s|$)").expect("list marker pattern is valid"));

/// Load markdown into a rich document.
pub fn parse_markdown(
    source: &str,
    registry: &ShortcodeRegistry,
    options: &ConvertOptions,
    resolver: &dyn PathResolver,
) -> Document {
    let tokenized = Extractor::new(registry, options).extract(source);
    let mut paths = PathMap::default();
    let blocks =
        RichDocBuilder::new(options, resolver, &tokenized.store, &mut paths).build(&tokenized.text);
    Document {
        blocks,
        store: tokenized.store,
        paths,
        trailing_newline: source.is_empty() || source.ends_with('\n'),
    }
}

pub(crate) fn comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options
}

/// Builds rich-document blocks from tokenized markdown.
pub struct RichDocBuilder<'a> {
    options: &'a ConvertOptions,
    resolver: &'a dyn PathResolver,
    store: &'a PlaceholderStore,
    paths: &'a mut PathMap,
}

impl<'a> RichDocBuilder<'a> {
    pub fn new(
        options: &'a ConvertOptions,
        resolver: &'a dyn PathResolver,
        store: &'a PlaceholderStore,
        paths: &'a mut PathMap,
    ) -> Self {
        RichDocBuilder {
            options,
            resolver,
            store,
            paths,
        }
    }

    pub fn build(&mut self, tokenized: &str) -> Vec<Block> {
        self.render(tokenized, 0)
    }

    fn render(&mut self, text: &str, depth: usize) -> Vec<Block> {
        tracing::debug!(depth, bytes = text.len(), "rendering markdown to rich document");
        let protected = self.protect(text);
        let arena = Arena::new();
        let options = comrak_options();
        let root = parse_document(&arena, &protected, &options);
        let blocks = self.blocks_from(root, depth);
        hoist_delimiters(blocks)
    }

    /// Turn own-line block tokens and summary delimiter lines into comment markers
    /// padded with blank lines.
    fn protect(&self, text: &str) -> String {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut out: Vec<String> = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            let indent = &line[..line.len() - line.trim_start().len()];

            let marker = if !self.options.summary_delimiter.is_empty()
                && trimmed == self.options.summary_delimiter
            {
                Some(SUMMARY_MARKER.to_string())
            } else {
                parse_token(trimmed)
                    .filter(|token| self.store.get(&token.id).is_some_and(|b| b.is_block))
                    .map(|token| token.id)
            };

            if let Some(marker) = marker {
                let prefix = if in_list_context(&lines, index) { indent } else { "" };
                if out.last().is_some_and(|previous| !previous.trim().is_empty()) {
                    out.push(String::new());
                }
                out.push(format!("{prefix}{MARKER_PREFIX}{marker}{MARKER_SUFFIX}"));
                if lines.get(index + 1).is_some_and(|next| !next.trim().is_empty()) {
                    out.push(String::new());
                }
                continue;
            }

            if let Some(quoted) = self.quoted_delimiter(line) {
                out.push(quoted);
                continue;
            }
            out.push(line.to_string());
        }
        out.join("\n")
    }

    /// `> ===` inside a blockquote: keep the quote prefix, mark the delimiter.
    fn quoted_delimiter(&self, line: &str) -> Option<String> {
        let delimiter = self.options.summary_delimiter.as_str();
        if delimiter.is_empty() {
            return None;
        }
        let rest = line.trim_start().strip_prefix('>')?;
        let inner = rest.trim_start_matches(|c: char| c == '>' || c.is_whitespace());
        if inner.trim_end() != delimiter {
            return None;
        }
        let prefix_len = line.len() - inner.len();
        Some(format!(
            "{}{MARKER_PREFIX}{SUMMARY_MARKER}{MARKER_SUFFIX}",
            &line[..prefix_len]
        ))
    }

    fn blocks_from<'n>(&mut self, node: &'n AstNode<'n>, depth: usize) -> Vec<Block> {
        let mut blocks = Vec::new();
        for child in node.children() {
            if let Some(block) = self.block_from(child, depth) {
                blocks.push(block);
            }
        }
        blocks
    }

    fn block_from<'n>(&mut self, node: &'n AstNode<'n>, depth: usize) -> Option<Block> {
        let value = node.data.borrow().value.clone();
        match value {
            NodeValue::Paragraph => {
                if let Some(block) = self.lone_block_token(node, depth) {
                    return Some(block);
                }
                Some(Block::Paragraph {
                    content: self.inlines(node, depth),
                })
            }
            NodeValue::Heading(heading) => Some(Block::Heading {
                level: heading.level,
                content: self.inlines(node, depth),
            }),
            NodeValue::List(list) => {
                let items = node
                    .children()
                    .map(|item| ListItem {
                        children: self.blocks_from(item, depth),
                    })
                    .collect();
                Some(match list.list_type {
                    ListType::Bullet => Block::BulletList { items },
                    ListType::Ordered => Block::OrderedList {
                        start: list.start as u64,
                        items,
                    },
                })
            }
            NodeValue::BlockQuote => Some(Block::Blockquote {
                children: self.blocks_from(node, depth),
            }),
            NodeValue::CodeBlock(code) => Some(Block::CodeBlock {
                language: code.info.split_whitespace().next().map(str::to_string),
                code: code.literal,
                block_id: None,
            }),
            NodeValue::HtmlBlock(html) => Some(self.html_block(&html.literal, depth)),
            NodeValue::ThematicBreak => Some(Block::HorizontalRule),
            NodeValue::Table(table) => Some(self.table(node, &table.alignments, depth)),
            other => {
                tracing::debug!(node = ?other, "unsupported markdown block skipped");
                None
            }
        }
    }

    fn html_block(&mut self, literal: &str, depth: usize) -> Block {
        let trimmed = literal.trim();
        let marker = trimmed
            .strip_prefix(MARKER_PREFIX)
            .and_then(|rest| rest.strip_suffix(MARKER_SUFFIX));
        match marker {
            Some(SUMMARY_MARKER) => Block::SummaryDelimiter {
                delimiter: self.options.summary_delimiter.clone(),
            },
            Some(id) => match self.store.get(id) {
                Some(record) => self.block_for_record(record, depth),
                None => Block::paragraph(format!("{MARKER_PREFIX}{id}{MARKER_SUFFIX}")),
            },
            None => Block::RawBlock {
                language: RawLanguage::Html,
                content: literal.trim_end_matches('\n').to_string(),
                block_id: None,
            },
        }
    }

    /// A paragraph holding nothing but one block-level token is that block.
    fn lone_block_token<'n>(&mut self, node: &'n AstNode<'n>, depth: usize) -> Option<Block> {
        let mut text = String::new();
        for child in node.children() {
            match &child.data.borrow().value {
                NodeValue::Text(t) => text.push_str(t),
                NodeValue::SoftBreak => text.push('\n'),
                _ => return None,
            }
        }
        let token = parse_token(text.trim())?;
        let record = self.store.get(&token.id).filter(|b| b.is_block)?;
        Some(self.block_for_record(record, depth))
    }

    fn table<'n>(&mut self, node: &'n AstNode<'n>, alignments: &[TableAlignment], depth: usize) -> Block {
        let mut header = Vec::new();
        let mut rows = Vec::new();
        for row in node.children() {
            let is_header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
            let cells: Vec<TableCell> = row
                .children()
                .map(|cell| {
                    let mut content = self.inlines(cell, depth);
                    if content.is_empty() {
                        content.push(Inline::text(CELL_FILLER));
                    }
                    TableCell { content }
                })
                .collect();
            if is_header {
                header = cells;
            } else {
                rows.push(cells);
            }
        }
        Block::Table(Table {
            alignments: alignments
                .iter()
                .map(|alignment| match alignment {
                    TableAlignment::Left => Alignment::Left,
                    TableAlignment::Center => Alignment::Center,
                    TableAlignment::Right => Alignment::Right,
                    TableAlignment::None => Alignment::None,
                })
                .collect(),
            header,
            rows,
        })
    }

    fn inlines<'n>(&mut self, node: &'n AstNode<'n>, depth: usize) -> Vec<Inline> {
        let mut out = Vec::new();
        let mut pending = String::new();
        for child in node.children() {
            let value = child.data.borrow().value.clone();
            match value {
                NodeValue::Text(text) => pending.push_str(&text),
                NodeValue::SoftBreak => pending.push('\n'),
                value => {
                    self.flush_text(&mut pending, &mut out, depth);
                    out.push(self.inline_from(child, value, depth));
                }
            }
        }
        self.flush_text(&mut pending, &mut out, depth);
        out
    }

    /// Split merged text on placeholder tokens.
    fn flush_text(&mut self, pending: &mut String, out: &mut Vec<Inline>, depth: usize) {
        if pending.is_empty() {
            return;
        }
        let text = std::mem::take(pending);
        let mut last = 0;
        for token in find_tokens(&text) {
            let Some(record) = self.store.get(&token.id) else {
                continue;
            };
            if token.range.start > last {
                out.push(Inline::text(&text[last..token.range.start]));
            }
            out.push(self.inline_for_record(record, depth));
            last = token.range.end;
        }
        if last < text.len() {
            out.push(Inline::text(&text[last..]));
        }
    }

    fn inline_from<'n>(&mut self, node: &'n AstNode<'n>, value: NodeValue, depth: usize) -> Inline {
        match value {
            NodeValue::Code(code) => Inline::Code {
                code: code.literal,
                block_id: None,
            },
            NodeValue::Strong => Inline::Strong {
                content: self.inlines(node, depth),
            },
            NodeValue::Emph => Inline::Emphasis {
                content: self.inlines(node, depth),
            },
            NodeValue::Strikethrough => Inline::Strike {
                content: self.inlines(node, depth),
            },
            NodeValue::Link(link) => Inline::Link {
                href: resolve_path(self.resolver, self.paths, &link.url),
                title: non_empty(link.title),
                content: self.inlines(node, depth),
            },
            NodeValue::Image(link) => Inline::Image {
                src: resolve_path(self.resolver, self.paths, &link.url),
                alt: plain_text(node),
                title: non_empty(link.title),
            },
            NodeValue::LineBreak => Inline::HardBreak,
            NodeValue::HtmlInline(html) => Inline::HtmlInline { html },
            _ => Inline::text(plain_text(node)),
        }
    }

    fn inline_for_record(&mut self, record: &PreservedBlock, depth: usize) -> Inline {
        match &record.data {
            BlockData::InlineCode { code } => Inline::Code {
                code: code.clone(),
                block_id: Some(record.id.clone()),
            },
            BlockData::Shortcode(data) => {
                let shortcode = shortcode_attrs(record);
                let content = if shortcode.is_code() {
                    Vec::new()
                } else {
                    self.inline_content(&data.content, depth + 1)
                };
                Inline::Shortcode(ShortcodeInline { shortcode, content })
            }
            _ => Inline::Preserved(PreservedNode::from_record(record)),
        }
    }

    fn block_for_record(&mut self, record: &PreservedBlock, depth: usize) -> Block {
        let block_id = Some(record.id.clone());
        match &record.data {
            BlockData::FencedCode { language, code } => Block::CodeBlock {
                language: language.clone(),
                code: code.clone(),
                block_id,
            },
            BlockData::Html => Block::RawBlock {
                language: RawLanguage::Html,
                content: self.restored(&record.original),
                block_id,
            },
            BlockData::TemplateFragment => Block::RawBlock {
                language: RawLanguage::Twig,
                content: self.restored(&record.original),
                block_id,
            },
            BlockData::Shortcode(data) => {
                let shortcode = shortcode_attrs(record);
                let children = if shortcode.is_code() {
                    Vec::new()
                } else {
                    self.block_content(&data.content, depth + 1)
                };
                Block::ShortcodeBlock {
                    shortcode,
                    children,
                }
            }
            BlockData::GithubAlert { alert_type, body } => Block::GithubAlert {
                alert_type: alert_type.clone(),
                block_id,
                children: self.block_content(body, depth + 1),
            },
            BlockData::InlineCode { .. } | BlockData::RawShortcode | BlockData::GravImage { .. } => {
                Block::Preserved(PreservedNode::from_record(record))
            }
        }
    }

    /// Render shortcode body markdown as the children of a node at `depth`.
    pub(crate) fn block_content(&mut self, content: &str, depth: usize) -> Vec<Block> {
        let content = content.trim_matches('\n');
        if content.trim().is_empty() {
            return Vec::new();
        }
        if depth > self.options.max_shortcode_depth {
            tracing::warn!(depth, "shortcode nesting limit reached, content kept as text");
            return vec![Block::paragraph(self.restored(content))];
        }
        self.render(content, depth)
    }

    pub(crate) fn inline_content(&mut self, content: &str, depth: usize) -> Vec<Inline> {
        if content.trim().is_empty() {
            return Vec::new();
        }
        if depth > self.options.max_shortcode_depth {
            tracing::warn!(depth, "shortcode nesting limit reached, content kept as text");
            return vec![Inline::text(self.restored(content))];
        }
        let mut out = Vec::new();
        for block in self.render(content, depth) {
            if !out.is_empty() {
                out.push(Inline::HardBreak);
            }
            match block {
                Block::Paragraph { content } | Block::Heading { content, .. } => out.extend(content),
                Block::ShortcodeBlock { shortcode, children } => {
                    let content = children
                        .into_iter()
                        .flat_map(|child| match child {
                            Block::Paragraph { content } => content,
                            _ => Vec::new(),
                        })
                        .collect();
                    out.push(Inline::Shortcode(ShortcodeInline { shortcode, content }));
                }
                Block::Preserved(node) => out.push(Inline::Preserved(node)),
                other => out.push(Inline::text(block_plain_text(&other))),
            }
        }
        out
    }

    fn restored(&self, text: &str) -> String {
        restore_verbatim(text, self.store, self.options.max_restore_passes)
    }
}

/// Shortcode node attributes from a record.
pub(crate) fn shortcode_attrs(record: &PreservedBlock) -> ShortcodeAttrs {
    let mut attrs = ShortcodeAttrs::new("");
    if let BlockData::Shortcode(data) = &record.data {
        attrs.name = data.tag_name.clone();
        attrs.params = data.params.clone();
        attrs.attributes = data.attributes.clone();
        attrs.content_type = data.content_type;
        attrs.form = data.form;
        if attrs.is_code() {
            attrs.raw_code = Some(data.content.clone());
        }
    }
    attrs.placeholder_id = Some(record.id.clone());
    attrs
}

/// Whether line `index` sits inside a list item, so its indentation matters.
fn in_list_context(lines: &[&str], index: usize) -> bool {
    let current = lines[index];
    if current.len() == current.trim_start().len() {
        return false;
    }
    for previous in lines[..index].iter().rev() {
        if previous.trim().is_empty() {
            continue;
        }
        if LIST_MARKER_RE.is_match(previous) {
            return true;
        }
        if previous.len() == previous.trim_start().len() {
            return false;
        }
    }
    false
}

/// Move summary delimiters that ended up inside blockquotes out of them, dropping
/// blockquotes left empty.
fn hoist_delimiters(blocks: Vec<Block>) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Block::Blockquote { children } = block else {
            out.push(block);
            continue;
        };
        let mut segment = Vec::new();
        for child in hoist_delimiters(children) {
            if matches!(child, Block::SummaryDelimiter { .. }) {
                if !segment.is_empty() {
                    out.push(Block::Blockquote {
                        children: std::mem::take(&mut segment),
                    });
                }
                out.push(child);
            } else {
                segment.push(child);
            }
        }
        if !segment.is_empty() {
            out.push(Block::Blockquote { children: segment });
        }
    }
    out
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn plain_text<'n>(node: &'n AstNode<'n>) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text<'n>(node: &'n AstNode<'n>, out: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(text) => out.push_str(text),
        NodeValue::Code(code) => out.push_str(&code.literal),
        NodeValue::SoftBreak | NodeValue::LineBreak => out.push('\n'),
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

fn block_plain_text(block: &Block) -> String {
    match block {
        Block::Paragraph { content } | Block::Heading { content, .. } => {
            content.iter().map(Inline::plain_text).collect()
        }
        Block::CodeBlock { code, .. } => code.clone(),
        Block::RawBlock { content, .. } => content.clone(),
        _ => String::new(),
    }
}
