use crate::placeholder::{BlockKind, PlaceholderStore, PreservedBlock, TagForm};
use crate::resolve::PathMap;
use crate::shortcodes::{Attributes, ContentType};
use serde::{Deserialize, Serialize};

/// Filler put in empty table cells, which the editor cannot hold empty.
pub const CELL_FILLER: &str = "\u{200B}";

/// A loaded document: the tree plus the records its custom nodes point at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub store: PlaceholderStore,
    #[serde(default)]
    pub paths: PathMap,
    #[serde(default = "default_true")]
    pub trailing_newline: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Document {
    fn default() -> Self {
        Document::new(Vec::new(), PlaceholderStore::default())
    }
}

impl Document {
    pub fn new(blocks: Vec<Block>, store: PlaceholderStore) -> Self {
        Document {
            blocks,
            store,
            paths: PathMap::default(),
            trailing_newline: true,
        }
    }

    /// Placeholder ids referenced anywhere in the tree.
    pub fn referenced_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for block in &self.blocks {
            block.collect_ids(&mut ids);
        }
        ids
    }

    /// Visit every inline node, depth first.
    pub fn for_each_inline(&self, f: &mut dyn FnMut(&Inline)) {
        for block in &self.blocks {
            block.for_each_inline(f);
        }
    }

    /// Visit every inline node mutably, depth first, including inlines nested in marks,
    /// links and inline shortcodes.
    pub fn for_each_inline_mut(&mut self, f: &mut dyn FnMut(&mut Inline)) {
        for block in &mut self.blocks {
            block.for_each_inline_mut(f);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph {
        content: Vec<Inline>,
    },
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    BulletList {
        items: Vec<ListItem>,
    },
    OrderedList {
        start: u64,
        items: Vec<ListItem>,
    },
    Blockquote {
        children: Vec<Block>,
    },
    #[serde(rename_all = "camelCase")]
    GithubAlert {
        alert_type: String,
        block_id: Option<String>,
        children: Vec<Block>,
    },
    #[serde(rename_all = "camelCase")]
    CodeBlock {
        language: Option<String>,
        code: String,
        block_id: Option<String>,
    },
    Table(Table),
    HorizontalRule,
    ShortcodeBlock {
        shortcode: ShortcodeAttrs,
        children: Vec<Block>,
    },
    #[serde(rename_all = "camelCase")]
    RawBlock {
        language: RawLanguage,
        content: String,
        block_id: Option<String>,
    },
    Preserved(PreservedNode),
    SummaryDelimiter {
        delimiter: String,
    },
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            content: vec![Inline::text(text)],
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Block::Paragraph { .. } => "paragraph",
            Block::Heading { .. } => "heading",
            Block::BulletList { .. } => "bulletList",
            Block::OrderedList { .. } => "orderedList",
            Block::Blockquote { .. } => "blockquote",
            Block::GithubAlert { .. } => "githubAlert",
            Block::CodeBlock { .. } => "codeBlock",
            Block::Table(_) => "table",
            Block::HorizontalRule => "horizontalRule",
            Block::ShortcodeBlock { .. } => "shortcodeBlock",
            Block::RawBlock { .. } => "rawBlock",
            Block::Preserved(_) => "preservedBlock",
            Block::SummaryDelimiter { .. } => "summaryDelimiter",
        }
    }

    fn for_each_inline(&self, f: &mut dyn FnMut(&Inline)) {
        match self {
            Block::Paragraph { content } | Block::Heading { content, .. } => visit_inlines(content, f),
            Block::BulletList { items } | Block::OrderedList { items, .. } => {
                for child in items.iter().flat_map(|item| item.children.iter()) {
                    child.for_each_inline(f);
                }
            }
            Block::Blockquote { children }
            | Block::GithubAlert { children, .. }
            | Block::ShortcodeBlock { children, .. } => {
                for child in children {
                    child.for_each_inline(f);
                }
            }
            Block::Table(table) => {
                for cell in table.header.iter().chain(table.rows.iter().flatten()) {
                    visit_inlines(&cell.content, f);
                }
            }
            Block::CodeBlock { .. }
            | Block::RawBlock { .. }
            | Block::Preserved(_)
            | Block::HorizontalRule
            | Block::SummaryDelimiter { .. } => {}
        }
    }

    fn for_each_inline_mut(&mut self, f: &mut dyn FnMut(&mut Inline)) {
        match self {
            Block::Paragraph { content } | Block::Heading { content, .. } => {
                visit_inlines_mut(content, f)
            }
            Block::BulletList { items } | Block::OrderedList { items, .. } => {
                for child in items.iter_mut().flat_map(|item| item.children.iter_mut()) {
                    child.for_each_inline_mut(f);
                }
            }
            Block::Blockquote { children }
            | Block::GithubAlert { children, .. }
            | Block::ShortcodeBlock { children, .. } => {
                for child in children {
                    child.for_each_inline_mut(f);
                }
            }
            Block::Table(table) => {
                for cell in table.header.iter_mut().chain(table.rows.iter_mut().flatten()) {
                    visit_inlines_mut(&mut cell.content, f);
                }
            }
            Block::CodeBlock { .. }
            | Block::RawBlock { .. }
            | Block::Preserved(_)
            | Block::HorizontalRule
            | Block::SummaryDelimiter { .. } => {}
        }
    }

    fn collect_ids(&self, ids: &mut Vec<String>) {
        match self {
            Block::Paragraph { content } | Block::Heading { content, .. } => {
                collect_inline_ids(content, ids)
            }
            Block::BulletList { items } | Block::OrderedList { items, .. } => {
                for item in items {
                    for child in &item.children {
                        child.collect_ids(ids);
                    }
                }
            }
            Block::Blockquote { children } => {
                for child in children {
                    child.collect_ids(ids);
                }
            }
            Block::GithubAlert {
                block_id, children, ..
            } => {
                ids.extend(block_id.iter().cloned());
                for child in children {
                    child.collect_ids(ids);
                }
            }
            Block::CodeBlock { block_id, .. } | Block::RawBlock { block_id, .. } => {
                ids.extend(block_id.iter().cloned())
            }
            Block::Table(table) => {
                for cell in table.header.iter().chain(table.rows.iter().flatten()) {
                    collect_inline_ids(&cell.content, ids);
                }
            }
            Block::ShortcodeBlock {
                shortcode,
                children,
            } => {
                ids.extend(shortcode.placeholder_id.iter().cloned());
                for child in children {
                    child.collect_ids(ids);
                }
            }
            Block::Preserved(node) => ids.push(node.block_id.clone()),
            Block::HorizontalRule | Block::SummaryDelimiter { .. } => {}
        }
    }
}

fn visit_inlines(inlines: &[Inline], f: &mut dyn FnMut(&Inline)) {
    for inline in inlines {
        f(inline);
        match inline {
            Inline::Strong { content }
            | Inline::Emphasis { content }
            | Inline::Strike { content }
            | Inline::Link { content, .. } => visit_inlines(content, f),
            Inline::Shortcode(node) => visit_inlines(&node.content, f),
            _ => {}
        }
    }
}

fn visit_inlines_mut(inlines: &mut [Inline], f: &mut dyn FnMut(&mut Inline)) {
    for inline in inlines {
        f(inline);
        match inline {
            Inline::Strong { content }
            | Inline::Emphasis { content }
            | Inline::Strike { content }
            | Inline::Link { content, .. } => visit_inlines_mut(content, f),
            Inline::Shortcode(node) => visit_inlines_mut(&mut node.content, f),
            _ => {}
        }
    }
}

fn collect_inline_ids(inlines: &[Inline], ids: &mut Vec<String>) {
    for inline in inlines {
        match inline {
            Inline::Strong { content }
            | Inline::Emphasis { content }
            | Inline::Strike { content }
            | Inline::Link { content, .. } => collect_inline_ids(content, ids),
            Inline::Code { block_id, .. } => ids.extend(block_id.iter().cloned()),
            Inline::Shortcode(node) => {
                ids.extend(node.shortcode.placeholder_id.iter().cloned());
                collect_inline_ids(&node.content, ids);
            }
            Inline::Preserved(node) => ids.push(node.block_id.clone()),
            Inline::Text { .. }
            | Inline::Image { .. }
            | Inline::HardBreak
            | Inline::HtmlInline { .. } => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub alignments: Vec<Alignment>,
    pub header: Vec<TableCell>,
    pub rows: Vec<Vec<TableCell>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableCell {
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawLanguage {
    Html,
    Twig,
}

impl RawLanguage {
    pub fn as_str(self) -> &'static str {
        match self {
            RawLanguage::Html => "html",
            RawLanguage::Twig => "twig",
        }
    }

    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("twig") {
            RawLanguage::Twig
        } else {
            RawLanguage::Html
        }
    }
}

/// Attributes of a shortcode node, block or inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcodeAttrs {
    pub name: String,
    pub params: String,
    pub attributes: Attributes,
    pub content_type: ContentType,
    pub placeholder_id: Option<String>,
    pub form: TagForm,
    /// Body of a code-type shortcode, kept out of the editable tree
    pub raw_code: Option<String>,
}

impl ShortcodeAttrs {
    pub fn new(name: impl Into<String>) -> Self {
        ShortcodeAttrs {
            name: name.into(),
            params: String::new(),
            attributes: Attributes::new(),
            content_type: ContentType::Blocks,
            placeholder_id: None,
            form: TagForm::Paired,
            raw_code: None,
        }
    }

    pub fn is_code(&self) -> bool {
        self.content_type == ContentType::Code
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcodeInline {
    pub shortcode: ShortcodeAttrs,
    pub content: Vec<Inline>,
}

/// An opaque preserved region shown as a non-editable node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreservedNode {
    pub block_id: String,
    pub block_type: BlockKind,
    /// Copy of the record, used when the store no longer has it
    pub snapshot: Option<PreservedBlock>,
}

impl PreservedNode {
    pub fn from_record(record: &PreservedBlock) -> Self {
        PreservedNode {
            block_id: record.id.clone(),
            block_type: record.kind(),
            snapshot: Some(record.clone()),
        }
    }

    /// The record for this node: the store's entry, else the snapshot.
    pub fn record<'a>(&'a self, store: &'a PlaceholderStore) -> Option<&'a PreservedBlock> {
        store.get(&self.block_id).or(self.snapshot.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inline {
    Text {
        text: String,
    },
    Strong {
        content: Vec<Inline>,
    },
    Emphasis {
        content: Vec<Inline>,
    },
    Strike {
        content: Vec<Inline>,
    },
    #[serde(rename_all = "camelCase")]
    Code {
        code: String,
        block_id: Option<String>,
    },
    Link {
        href: String,
        title: Option<String>,
        content: Vec<Inline>,
    },
    Image {
        src: String,
        alt: String,
        title: Option<String>,
    },
    HardBreak,
    HtmlInline {
        html: String,
    },
    Shortcode(ShortcodeInline),
    Preserved(PreservedNode),
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text { text: text.into() }
    }

    /// Plain text of this inline and its children.
    pub fn plain_text(&self) -> String {
        match self {
            Inline::Text { text } => text.clone(),
            Inline::Strong { content }
            | Inline::Emphasis { content }
            | Inline::Strike { content }
            | Inline::Link { content, .. } => content.iter().map(Inline::plain_text).collect(),
            Inline::Code { code, .. } => code.clone(),
            Inline::Image { alt, .. } => alt.clone(),
            Inline::HardBreak => "\n".to_string(),
            Inline::HtmlInline { .. } | Inline::Preserved(_) => String::new(),
            Inline::Shortcode(node) => node.content.iter().map(Inline::plain_text).collect(),
        }
    }
}
