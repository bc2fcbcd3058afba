//! HTML serialization (rich document → rich-document HTML)
//!
//! Pipeline: rich document → RcDom → HTML string
//!
//! Custom nodes carry everything needed to rebuild their source syntax as
//! `data-*` attributes. Payloads whose whitespace must survive the editor (raw
//! code, raw HTML, record snapshots) are base64 encoded.

use super::{attr, node_type};
use crate::error::{ConvertError, FormatError};
use crate::placeholder::PlaceholderStore;
use crate::richdoc::{
    normalize_marks, Alignment, Block, Document, Inline, PreservedNode, ShortcodeAttrs, Table,
};
use crate::shortcodes::ShortcodeRegistry;
use base64::{engine::general_purpose, Engine as _};
use html5ever::{
    ns, serialize, serialize::SerializeOpts, serialize::TraversalScope, Attribute, LocalName,
    QualName,
};
use markup5ever_rcdom::{Handle, Node, NodeData, SerializableHandle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Render a rich document as rich-document HTML.
///
/// The registry supplies preview styling and renderer output for shortcode nodes;
/// neither is read back when the HTML is parsed.
pub fn serialize_html(doc: &Document, registry: &ShortcodeRegistry) -> Result<String, FormatError> {
    let builder = DomBuilder {
        registry,
        store: &doc.store,
    };
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    for block in &doc.blocks {
        let handle = builder.block(block)?;
        let serializable = SerializableHandle::from(handle);
        serialize(&mut output, &serializable, opts.clone())
            .map_err(|e| ConvertError::Html(e.to_string()))?;
        output.push(b'\n');
    }
    String::from_utf8(output)
        .map_err(|e| FormatError::SerializationError(format!("UTF-8 conversion failed: {e}")))
}

pub(super) fn encode(payload: &str) -> String {
    general_purpose::STANDARD.encode(payload.as_bytes())
}

struct DomBuilder<'a> {
    registry: &'a ShortcodeRegistry,
    store: &'a PlaceholderStore,
}

impl DomBuilder<'_> {
    fn block(&self, block: &Block) -> Result<Handle, FormatError> {
        let handle = match block {
            Block::Paragraph { content } => {
                let p = create_element("p", vec![]);
                self.append_inlines(&p, content)?;
                p
            }
            Block::Heading { level, content } => {
                let tag = format!("h{}", (*level).clamp(1, 6));
                let heading = create_element(&tag, vec![]);
                self.append_inlines(&heading, content)?;
                heading
            }
            Block::BulletList { items } | Block::OrderedList { items, .. } => {
                let list = match block {
                    Block::OrderedList { start, .. } if *start != 1 => {
                        create_element("ol", vec![("start", start.to_string())])
                    }
                    Block::OrderedList { .. } => create_element("ol", vec![]),
                    _ => create_element("ul", vec![]),
                };
                for item in items {
                    let li = create_element("li", vec![]);
                    self.append_blocks(&li, &item.children)?;
                    append(&list, li);
                }
                list
            }
            Block::Blockquote { children } => {
                let quote = create_element("blockquote", vec![]);
                self.append_blocks(&quote, children)?;
                quote
            }
            Block::GithubAlert {
                alert_type,
                block_id,
                children,
            } => {
                let mut attrs = vec![
                    (attr::TYPE, node_type::GITHUB_ALERT.to_string()),
                    (attr::ALERT_TYPE, alert_type.clone()),
                ];
                push_optional(&mut attrs, attr::BLOCK_ID, block_id.as_deref());
                let div = create_element("div", attrs);
                self.append_blocks(&div, children)?;
                div
            }
            Block::CodeBlock {
                language,
                code,
                block_id,
            } => {
                let mut attrs = Vec::new();
                push_optional(&mut attrs, attr::BLOCK_ID, block_id.as_deref());
                push_optional(&mut attrs, attr::LANGUAGE, language.as_deref());
                let pre = create_element("pre", attrs);
                let class = language.as_ref().map(|lang| format!("language-{lang}"));
                let mut code_attrs = Vec::new();
                push_optional(&mut code_attrs, "class", class.as_deref());
                let code_el = create_element("code", code_attrs);
                append(&code_el, create_text(code));
                append(&pre, code_el);
                pre
            }
            Block::Table(table) => self.table(table)?,
            Block::HorizontalRule => create_element("hr", vec![]),
            Block::ShortcodeBlock {
                shortcode,
                children,
            } => {
                let div = create_element("div", self.shortcode_attrs(node_type::SHORTCODE_BLOCK, shortcode));
                if !shortcode.is_code() {
                    self.append_blocks(&div, children)?;
                }
                div
            }
            Block::RawBlock {
                language,
                content,
                block_id,
            } => {
                let mut attrs = vec![
                    (attr::TYPE, node_type::RAW_BLOCK.to_string()),
                    (attr::LANGUAGE, language.as_str().to_string()),
                    (attr::CONTENT, encode(content)),
                ];
                push_optional(&mut attrs, attr::BLOCK_ID, block_id.as_deref());
                create_element("div", attrs)
            }
            Block::Preserved(node) => {
                create_element("div", preserved_attrs(node_type::PRESERVED_BLOCK, node)?)
            }
            Block::SummaryDelimiter { delimiter } => create_element(
                "hr",
                vec![
                    (attr::TYPE, node_type::SUMMARY_DELIMITER.to_string()),
                    (attr::DELIMITER, delimiter.clone()),
                ],
            ),
        };
        Ok(handle)
    }

    fn table(&self, table: &Table) -> Result<Handle, FormatError> {
        let table_el = create_element("table", vec![]);
        let thead = create_element("thead", vec![]);
        let header_row = create_element("tr", vec![]);
        for (column, cell) in table.header.iter().enumerate() {
            let th = create_element("th", align_attrs(table.alignments.get(column)));
            self.append_inlines(&th, &cell.content)?;
            append(&header_row, th);
        }
        append(&thead, header_row);
        append(&table_el, thead);

        let tbody = create_element("tbody", vec![]);
        for row in &table.rows {
            let tr = create_element("tr", vec![]);
            for (column, cell) in row.iter().enumerate() {
                let td = create_element("td", align_attrs(table.alignments.get(column)));
                self.append_inlines(&td, &cell.content)?;
                append(&tr, td);
            }
            append(&tbody, tr);
        }
        append(&table_el, tbody);
        Ok(table_el)
    }

    fn append_blocks(&self, parent: &Handle, blocks: &[Block]) -> Result<(), FormatError> {
        for block in blocks {
            append(parent, self.block(block)?);
        }
        Ok(())
    }

    fn append_inlines(&self, parent: &Handle, inlines: &[Inline]) -> Result<(), FormatError> {
        for inline in normalize_marks(inlines) {
            append(parent, self.inline(&inline)?);
        }
        Ok(())
    }

    fn inline(&self, inline: &Inline) -> Result<Handle, FormatError> {
        let handle = match inline {
            Inline::Text { text } => create_text(text),
            Inline::Strong { content } => self.mark("strong", content)?,
            Inline::Emphasis { content } => self.mark("em", content)?,
            Inline::Strike { content } => self.mark("s", content)?,
            Inline::Code { code, block_id } => {
                let mut attrs = Vec::new();
                push_optional(&mut attrs, attr::BLOCK_ID, block_id.as_deref());
                let el = create_element("code", attrs);
                append(&el, create_text(code));
                el
            }
            Inline::Link {
                href,
                title,
                content,
            } => {
                let mut attrs = vec![("href", href.clone())];
                push_optional(&mut attrs, "title", title.as_deref());
                let anchor = create_element("a", attrs);
                self.append_inlines(&anchor, content)?;
                anchor
            }
            Inline::Image { src, alt, title } => {
                let mut attrs = vec![("src", src.clone()), ("alt", alt.clone())];
                push_optional(&mut attrs, "title", title.as_deref());
                create_element("img", attrs)
            }
            Inline::HardBreak => create_element("br", vec![]),
            Inline::HtmlInline { html } => create_element(
                "span",
                vec![
                    (attr::TYPE, node_type::HTML_INLINE.to_string()),
                    (attr::HTML, encode(html)),
                ],
            ),
            Inline::Shortcode(node) => {
                let span = create_element(
                    "span",
                    self.shortcode_attrs(node_type::SHORTCODE_INLINE, &node.shortcode),
                );
                if !node.shortcode.is_code() {
                    self.append_inlines(&span, &node.content)?;
                }
                span
            }
            Inline::Preserved(node) => {
                create_element("span", preserved_attrs(node_type::PRESERVED_INLINE, node)?)
            }
        };
        Ok(handle)
    }

    fn mark(&self, tag: &str, content: &[Inline]) -> Result<Handle, FormatError> {
        let el = create_element(tag, vec![]);
        self.append_inlines(&el, content)?;
        Ok(el)
    }

    fn shortcode_attrs(&self, kind: &str, shortcode: &ShortcodeAttrs) -> Vec<(&'static str, String)> {
        let mut attrs = vec![
            (attr::TYPE, kind.to_string()),
            (attr::NAME, shortcode.name.clone()),
            (attr::PARAMS, shortcode.params.clone()),
            (attr::ATTRIBUTES, shortcode.attributes.to_json()),
            (attr::CONTENT_TYPE, shortcode.content_type.as_str().to_string()),
            (attr::FORM, shortcode.form.as_str().to_string()),
        ];
        push_optional(&mut attrs, attr::PLACEHOLDER_ID, shortcode.placeholder_id.as_deref());
        if let Some(code) = &shortcode.raw_code {
            attrs.push((attr::RAW_CODE, encode(code)));
        }
        let css = self.registry.generate_css(&shortcode.name, &shortcode.attributes);
        if !css.is_empty() {
            attrs.push(("style", css));
        }
        let preview = shortcode
            .placeholder_id
            .as_deref()
            .and_then(|id| self.store.get(id))
            .and_then(|record| self.registry.render_preview(record));
        if let Some(preview) = preview {
            attrs.push((attr::PREVIEW, encode(&preview)));
        }
        attrs
    }
}

fn preserved_attrs(kind: &str, node: &PreservedNode) -> Result<Vec<(&'static str, String)>, FormatError> {
    let mut attrs = vec![
        (attr::TYPE, kind.to_string()),
        (attr::BLOCK_ID, node.block_id.clone()),
        (attr::BLOCK_TYPE, node.block_type.as_str().to_string()),
    ];
    if let Some(snapshot) = &node.snapshot {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| FormatError::SerializationError(format!("record snapshot: {e}")))?;
        attrs.push((attr::BLOCK_DATA, encode(&json)));
    }
    Ok(attrs)
}

fn align_attrs(alignment: Option<&Alignment>) -> Vec<(&'static str, String)> {
    let value = match alignment {
        Some(Alignment::Left) => "left",
        Some(Alignment::Center) => "center",
        Some(Alignment::Right) => "right",
        _ => return Vec::new(),
    };
    vec![(attr::ALIGN, value.to_string())]
}

fn push_optional(attrs: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        attrs.push((name, value.to_string()));
    }
}

fn append(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Create an HTML element with attributes
fn create_element(tag: &str, attrs: Vec<(&str, String)>) -> Handle {
    let qual_name = QualName::new(None, ns!(html), LocalName::from(tag));
    let attributes = attrs
        .into_iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        })
        .collect();

    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Element {
            name: qual_name,
            attrs: RefCell::new(attributes),
            template_contents: Default::default(),
            mathml_annotation_xml_integration_point: false,
        },
    })
}

fn create_text(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text {
            contents: RefCell::new(text.to_string().into()),
        },
    })
}
