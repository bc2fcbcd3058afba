//! Treeviz formatter for rich documents
//!
//! A visual, line based representation of the rich-document tree, used to inspect
//! what the bridge produced from a markdown page.
//!
//! The format is:
//! <prefix><connector> <icon> <label> (labels truncated to 30 characters)
//!
//! Example:
//!
//! ⧉ Document (3 blocks, 2 records)
//! ├─ § h1 Title
//! ├─ ⟦ notice type="info" [k3x_2]
//! │ └─ ¶ Hello world
//! └─ ✂ ===
//!
//! With the `inlines` parameter set to `true`, paragraph-like nodes list their
//! inline children as well.

use super::icons::get_icon;
use crate::error::FormatError;
use crate::format::Format;
use crate::richdoc::{Block, Document, Inline};
use std::collections::HashMap;

const LABEL_WIDTH: usize = 30;

struct Entry {
    icon: &'static str,
    label: String,
    children: Vec<Entry>,
}

impl Entry {
    fn new(node_type: &str, label: impl Into<String>) -> Self {
        Entry {
            icon: get_icon(node_type),
            label: label.into(),
            children: Vec::new(),
        }
    }

    fn with_children(mut self, children: Vec<Entry>) -> Self {
        self.children = children;
        self
    }
}

fn truncate(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= LABEL_WIDTH {
        flat
    } else {
        let cut: String = flat.chars().take(LABEL_WIDTH - 1).collect();
        format!("{cut}…")
    }
}

fn id_suffix(id: Option<&str>) -> String {
    id.map(|id| format!(" [{id}]")).unwrap_or_default()
}

fn inline_text(content: &[Inline]) -> String {
    content.iter().map(Inline::plain_text).collect()
}

fn block_entry(block: &Block, inlines: bool) -> Entry {
    let with_inlines = |entry: Entry, content: &[Inline]| {
        if inlines {
            entry.with_children(content.iter().map(inline_entry).collect())
        } else {
            entry
        }
    };
    let blocks = |children: &[Block]| -> Vec<Entry> {
        children.iter().map(|b| block_entry(b, inlines)).collect()
    };

    match block {
        Block::Paragraph { content } => {
            with_inlines(Entry::new("paragraph", truncate(&inline_text(content))), content)
        }
        Block::Heading { level, content } => with_inlines(
            Entry::new("heading", format!("h{level} {}", truncate(&inline_text(content)))),
            content,
        ),
        Block::BulletList { items } | Block::OrderedList { items, .. } => {
            Entry::new(block.type_name(), format!("{} items", items.len())).with_children(
                items
                    .iter()
                    .map(|item| {
                        let label = item
                            .children
                            .first()
                            .map(|first| block_entry(first, false).label)
                            .unwrap_or_default();
                        Entry::new("listItem", label).with_children(blocks(&item.children))
                    })
                    .collect(),
            )
        }
        Block::Blockquote { children } => Entry::new("blockquote", "quote").with_children(blocks(children)),
        Block::GithubAlert {
            alert_type,
            block_id,
            children,
        } => Entry::new(
            "githubAlert",
            format!("{alert_type}{}", id_suffix(block_id.as_deref())),
        )
        .with_children(blocks(children)),
        Block::CodeBlock {
            language,
            code,
            block_id,
        } => Entry::new(
            "codeBlock",
            format!(
                "{} ({} lines){}",
                language.as_deref().unwrap_or("text"),
                code.lines().count(),
                id_suffix(block_id.as_deref())
            ),
        ),
        Block::Table(table) => Entry::new(
            "table",
            format!("{} rows x {} columns", table.rows.len(), table.header.len()),
        ),
        Block::HorizontalRule => Entry::new("horizontalRule", "rule"),
        Block::ShortcodeBlock {
            shortcode,
            children,
        } => {
            let label = if shortcode.params.is_empty() {
                shortcode.name.clone()
            } else {
                format!("{} {}", shortcode.name, shortcode.params)
            };
            let label = format!(
                "{}{}",
                truncate(&label),
                id_suffix(shortcode.placeholder_id.as_deref())
            );
            let entry = Entry::new("shortcodeBlock", label);
            match &shortcode.raw_code {
                Some(code) => entry.with_children(vec![Entry::new(
                    "codeBlock",
                    format!("raw code ({} lines)", code.trim_matches('\n').lines().count()),
                )]),
                None => entry.with_children(blocks(children)),
            }
        }
        Block::RawBlock {
            language,
            content,
            block_id,
        } => Entry::new(
            "rawBlock",
            format!(
                "{} {}{}",
                language.as_str(),
                truncate(content),
                id_suffix(block_id.as_deref())
            ),
        ),
        Block::Preserved(node) => Entry::new(
            "preservedBlock",
            format!("{} [{}]", node.block_type.as_str(), node.block_id),
        ),
        Block::SummaryDelimiter { delimiter } => Entry::new("summaryDelimiter", delimiter.clone()),
    }
}

fn inline_entry(inline: &Inline) -> Entry {
    let marks = |content: &[Inline]| -> Vec<Entry> { content.iter().map(inline_entry).collect() };
    match inline {
        Inline::Text { text } => Entry::new("text", truncate(text)),
        Inline::Strong { content } => {
            Entry::new("strong", truncate(&inline_text(content))).with_children(marks(content))
        }
        Inline::Emphasis { content } => {
            Entry::new("emphasis", truncate(&inline_text(content))).with_children(marks(content))
        }
        Inline::Strike { content } => {
            Entry::new("strike", truncate(&inline_text(content))).with_children(marks(content))
        }
        Inline::Code { code, block_id } => Entry::new(
            "code",
            format!("{}{}", truncate(code), id_suffix(block_id.as_deref())),
        ),
        Inline::Link { href, content, .. } => Entry::new(
            "link",
            format!("{} -> {}", truncate(&inline_text(content)), href),
        ),
        Inline::Image { src, .. } => Entry::new("image", src.clone()),
        Inline::HardBreak => Entry::new("hardBreak", "break"),
        Inline::HtmlInline { html } => Entry::new("htmlInline", truncate(html)),
        Inline::Shortcode(node) => Entry::new(
            "shortcode",
            format!(
                "{}{}",
                node.shortcode.name,
                id_suffix(node.shortcode.placeholder_id.as_deref())
            ),
        )
        .with_children(marks(&node.content)),
        Inline::Preserved(node) => Entry::new(
            "preserved",
            format!("{} [{}]", node.block_type.as_str(), node.block_id),
        ),
    }
}

fn write_entries(entries: &[Entry], prefix: &str, output: &mut String) {
    for (index, entry) in entries.iter().enumerate() {
        let is_last = index == entries.len() - 1;
        let connector = if is_last { "└─" } else { "├─" };
        output.push_str(&format!("{prefix}{connector} {} {}\n", entry.icon, entry.label));
        let child_prefix = format!("{prefix}{}", if is_last { "  " } else { "│ " });
        write_entries(&entry.children, &child_prefix, output);
    }
}

pub fn to_treeviz_str(doc: &Document) -> String {
    to_treeviz_str_with_params(doc, &HashMap::new())
}

/// Convert a document to a treeviz string
///
/// # Parameters
///
/// - `"inlines"`: when `"true"`, paragraphs and headings list their inline nodes
pub fn to_treeviz_str_with_params(doc: &Document, params: &HashMap<String, String>) -> String {
    let inlines = params
        .get("inlines")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let mut output = format!(
        "{} Document ({} blocks, {} records)\n",
        get_icon("document"),
        doc.blocks.len(),
        doc.store.len()
    );
    let entries: Vec<Entry> = doc.blocks.iter().map(|b| block_entry(b, inlines)).collect();
    write_entries(&entries, "", &mut output);
    output
}

/// Format implementation for treeviz format
pub struct TreevizFormat;

impl Format for TreevizFormat {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn description(&self) -> &str {
        "Visual tree representation with indentation and Unicode icons"
    }

    fn file_extensions(&self) -> &[&str] {
        &["tree", "treeviz"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        Ok(to_treeviz_str(doc))
    }

    fn serialize_with_options(
        &self,
        doc: &Document,
        options: &HashMap<String, String>,
    ) -> Result<String, FormatError> {
        Ok(to_treeviz_str_with_params(doc, options))
    }
}
