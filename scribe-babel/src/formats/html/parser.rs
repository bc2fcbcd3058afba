//! HTML parsing (rich-document HTML → rich document)
//!
//! Pipeline: HTML string → html5ever RcDom → typed rich-document tree
//!
//! Elements an editor may add that have no node of their own (`div`, plain
//! `span`, `font`, ...) are unwrapped and their children kept. Loose inline content
//! at block level is gathered into paragraphs.

use super::{attr, node_type};
use crate::error::ConvertError;
use crate::placeholder::{BlockKind, PlaceholderStore, PreservedBlock, TagForm};
use crate::richdoc::{
    Alignment, Block, Document, Inline, ListItem, PreservedNode, RawLanguage, ShortcodeAttrs,
    ShortcodeInline, Table, TableCell,
};
use crate::shortcodes::{Attributes, ContentType};
use base64::{engine::general_purpose, Engine as _};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Parse rich-document HTML into a document with an empty store.
pub fn parse_html(html: &str) -> Result<Document, ConvertError> {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    let body = find_element(&dom.document, "body")
        .ok_or_else(|| ConvertError::Html("document has no body".to_string()))?;
    let children = body.children.borrow().clone();
    let blocks = blocks_from(&children)?;
    tracing::debug!(blocks = blocks.len(), "parsed rich-document HTML");
    Ok(Document::new(blocks, PlaceholderStore::default()))
}

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    if tag_name(handle).as_deref() == Some(tag) {
        return Some(handle.clone());
    }
    handle
        .children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

fn tag_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

fn get_attr(handle: &Handle, name: &str) -> Option<String> {
    match &handle.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn require_attr(handle: &Handle, name: &str) -> Result<String, ConvertError> {
    get_attr(handle, name).ok_or_else(|| ConvertError::MissingAttribute {
        element: tag_name(handle).unwrap_or_default(),
        attribute: name.to_string(),
    })
}

fn decode(attribute: &str, value: &str) -> Result<String, ConvertError> {
    let bytes = general_purpose::STANDARD
        .decode(value.trim())
        .map_err(|e| ConvertError::Payload {
            attribute: attribute.to_string(),
            message: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|e| ConvertError::Payload {
        attribute: attribute.to_string(),
        message: e.to_string(),
    })
}

fn decoded_attr(handle: &Handle, name: &str) -> Result<Option<String>, ConvertError> {
    get_attr(handle, name)
        .map(|value| decode(name, &value))
        .transpose()
}

fn is_block_element(handle: &Handle) -> bool {
    let Some(tag) = tag_name(handle) else {
        return false;
    };
    if get_attr(handle, attr::TYPE).is_some_and(|t| {
        t == node_type::SHORTCODE_INLINE || t == node_type::PRESERVED_INLINE || t == node_type::HTML_INLINE
    }) {
        return false;
    }
    matches!(
        tag.as_str(),
        "p" | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "blockquote"
            | "pre"
            | "table"
            | "hr"
            | "div"
            | "section"
            | "article"
    )
}

fn blocks_from(children: &[Handle]) -> Result<Vec<Block>, ConvertError> {
    let mut blocks = Vec::new();
    let mut loose: Vec<Handle> = Vec::new();
    for child in children {
        if is_block_element(child) {
            flush_loose(&mut loose, &mut blocks)?;
            blocks.extend(block_from(child)?);
        } else if matches!(child.data, NodeData::Text { .. } | NodeData::Element { .. }) {
            loose.push(child.clone());
        }
    }
    flush_loose(&mut loose, &mut blocks)?;
    Ok(blocks)
}

fn flush_loose(loose: &mut Vec<Handle>, blocks: &mut Vec<Block>) -> Result<(), ConvertError> {
    if loose.is_empty() {
        return Ok(());
    }
    let content = inlines_from(loose)?;
    loose.clear();
    let blank = content
        .iter()
        .all(|inline| matches!(inline, Inline::Text { text } if text.trim().is_empty()));
    if !blank {
        blocks.push(Block::Paragraph { content });
    }
    Ok(())
}

fn children_of(handle: &Handle) -> Vec<Handle> {
    handle.children.borrow().clone()
}

fn block_from(handle: &Handle) -> Result<Vec<Block>, ConvertError> {
    let tag = tag_name(handle).unwrap_or_default();
    let kind = get_attr(handle, attr::TYPE);
    let block = match (tag.as_str(), kind.as_deref()) {
        (_, Some(node_type::SHORTCODE_BLOCK)) => {
            let shortcode = shortcode_attrs(handle)?;
            let children = if shortcode.is_code() {
                Vec::new()
            } else {
                blocks_from(&children_of(handle))?
            };
            Block::ShortcodeBlock {
                shortcode,
                children,
            }
        }
        (_, Some(node_type::RAW_BLOCK)) => Block::RawBlock {
            language: RawLanguage::parse(&get_attr(handle, attr::LANGUAGE).unwrap_or_default()),
            content: decoded_attr(handle, attr::CONTENT)?.unwrap_or_default(),
            block_id: get_attr(handle, attr::BLOCK_ID),
        },
        (_, Some(node_type::PRESERVED_BLOCK)) => Block::Preserved(preserved_node(handle)?),
        (_, Some(node_type::GITHUB_ALERT)) => Block::GithubAlert {
            alert_type: get_attr(handle, attr::ALERT_TYPE)
                .unwrap_or_else(|| "note".to_string())
                .to_lowercase(),
            block_id: get_attr(handle, attr::BLOCK_ID),
            children: blocks_from(&children_of(handle))?,
        },
        ("hr", Some(node_type::SUMMARY_DELIMITER)) => Block::SummaryDelimiter {
            delimiter: get_attr(handle, attr::DELIMITER).unwrap_or_default(),
        },
        ("hr", _) => Block::HorizontalRule,
        ("p", _) => Block::Paragraph {
            content: inlines_from(&children_of(handle))?,
        },
        (heading, _) if heading.len() == 2 && heading.starts_with('h') => Block::Heading {
            level: heading[1..].parse().unwrap_or(1),
            content: inlines_from(&children_of(handle))?,
        },
        ("ul", _) => Block::BulletList {
            items: list_items(handle)?,
        },
        ("ol", _) => Block::OrderedList {
            start: get_attr(handle, "start")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            items: list_items(handle)?,
        },
        ("blockquote", _) => Block::Blockquote {
            children: blocks_from(&children_of(handle))?,
        },
        ("pre", _) => code_block(handle),
        ("table", _) => Block::Table(table(handle)?),
        _ => return blocks_from(&children_of(handle)),
    };
    Ok(vec![block])
}

fn list_items(handle: &Handle) -> Result<Vec<ListItem>, ConvertError> {
    let mut items = Vec::new();
    for child in children_of(handle) {
        if tag_name(&child).as_deref() == Some("li") {
            items.push(ListItem {
                children: blocks_from(&children_of(&child))?,
            });
        }
    }
    Ok(items)
}

fn code_block(handle: &Handle) -> Block {
    let code_el = children_of(handle)
        .into_iter()
        .find(|child| tag_name(child).as_deref() == Some("code"));
    let class_language = code_el
        .as_ref()
        .and_then(|code| get_attr(code, "class"))
        .and_then(|class| {
            class
                .split_whitespace()
                .find_map(|c| c.strip_prefix("language-").map(str::to_string))
        });
    Block::CodeBlock {
        language: get_attr(handle, attr::LANGUAGE).or(class_language),
        code: text_content(code_el.as_ref().unwrap_or(handle)),
        block_id: get_attr(handle, attr::BLOCK_ID),
    }
}

fn table(handle: &Handle) -> Result<Table, ConvertError> {
    let mut rows: Vec<(bool, Vec<TableCell>, Vec<Alignment>)> = Vec::new();
    collect_rows(handle, &mut rows)?;
    let header_index = rows.iter().position(|(is_header, ..)| *is_header).unwrap_or(0);
    if rows.is_empty() {
        return Ok(Table {
            alignments: Vec::new(),
            header: Vec::new(),
            rows: Vec::new(),
        });
    }
    let (_, header, alignments) = rows.remove(header_index);
    Ok(Table {
        alignments,
        header,
        rows: rows.into_iter().map(|(_, cells, _)| cells).collect(),
    })
}

type Row = (bool, Vec<TableCell>, Vec<Alignment>);

fn collect_rows(handle: &Handle, rows: &mut Vec<Row>) -> Result<(), ConvertError> {
    for child in children_of(handle) {
        match tag_name(&child).as_deref() {
            Some("thead") | Some("tbody") | Some("tfoot") => collect_rows(&child, rows)?,
            Some("tr") => {
                let mut is_header = false;
                let mut cells = Vec::new();
                let mut alignments = Vec::new();
                for cell in children_of(&child) {
                    let tag = tag_name(&cell);
                    if !matches!(tag.as_deref(), Some("th") | Some("td")) {
                        continue;
                    }
                    is_header |= tag.as_deref() == Some("th");
                    alignments.push(match get_attr(&cell, attr::ALIGN).as_deref() {
                        Some("left") => Alignment::Left,
                        Some("center") => Alignment::Center,
                        Some("right") => Alignment::Right,
                        _ => Alignment::None,
                    });
                    cells.push(TableCell {
                        content: inlines_from(&children_of(&cell))?,
                    });
                }
                rows.push((is_header, cells, alignments));
            }
            _ => {}
        }
    }
    Ok(())
}

fn inlines_from(children: &[Handle]) -> Result<Vec<Inline>, ConvertError> {
    let mut out: Vec<Inline> = Vec::new();
    for child in children {
        for inline in inline_from(child)? {
            match (out.last_mut(), inline) {
                (Some(Inline::Text { text }), Inline::Text { text: more }) => text.push_str(&more),
                (_, inline) => out.push(inline),
            }
        }
    }
    Ok(out)
}

fn inline_from(handle: &Handle) -> Result<Vec<Inline>, ConvertError> {
    let tag = match &handle.data {
        NodeData::Text { contents } => return Ok(vec![Inline::text(contents.borrow().to_string())]),
        NodeData::Element { name, .. } => name.local.to_string(),
        _ => return Ok(Vec::new()),
    };
    let children = children_of(handle);
    let inline = match (tag.as_str(), get_attr(handle, attr::TYPE).as_deref()) {
        (_, Some(node_type::SHORTCODE_INLINE)) => {
            let shortcode = shortcode_attrs(handle)?;
            let content = if shortcode.is_code() {
                Vec::new()
            } else {
                inlines_from(&children)?
            };
            Inline::Shortcode(ShortcodeInline { shortcode, content })
        }
        (_, Some(node_type::PRESERVED_INLINE)) => Inline::Preserved(preserved_node(handle)?),
        (_, Some(node_type::HTML_INLINE)) => Inline::HtmlInline {
            html: decoded_attr(handle, attr::HTML)?.unwrap_or_default(),
        },
        ("strong" | "b", _) => Inline::Strong {
            content: inlines_from(&children)?,
        },
        ("em" | "i", _) => Inline::Emphasis {
            content: inlines_from(&children)?,
        },
        ("s" | "del" | "strike", _) => Inline::Strike {
            content: inlines_from(&children)?,
        },
        ("code", _) => Inline::Code {
            code: text_content(handle),
            block_id: get_attr(handle, attr::BLOCK_ID),
        },
        ("a", _) => Inline::Link {
            href: get_attr(handle, "href").unwrap_or_default(),
            title: get_attr(handle, "title"),
            content: inlines_from(&children)?,
        },
        ("img", _) => Inline::Image {
            src: get_attr(handle, "src").unwrap_or_default(),
            alt: get_attr(handle, "alt").unwrap_or_default(),
            title: get_attr(handle, "title"),
        },
        ("br", _) => Inline::HardBreak,
        _ => return inlines_from(&children),
    };
    Ok(vec![inline])
}

fn shortcode_attrs(handle: &Handle) -> Result<ShortcodeAttrs, ConvertError> {
    let name = require_attr(handle, attr::NAME)?;
    let attributes = match get_attr(handle, attr::ATTRIBUTES) {
        Some(json) if !json.trim().is_empty() => {
            serde_json::from_str::<Attributes>(&json).map_err(|e| ConvertError::Attributes {
                name: name.clone(),
                message: e.to_string(),
            })?
        }
        _ => Attributes::new(),
    };
    let mut shortcode = ShortcodeAttrs::new(name);
    shortcode.params = get_attr(handle, attr::PARAMS).unwrap_or_default();
    shortcode.attributes = attributes;
    shortcode.content_type = ContentType::parse(&get_attr(handle, attr::CONTENT_TYPE).unwrap_or_default());
    shortcode.form = TagForm::parse(&get_attr(handle, attr::FORM).unwrap_or_default());
    shortcode.placeholder_id = get_attr(handle, attr::PLACEHOLDER_ID);
    shortcode.raw_code = decoded_attr(handle, attr::RAW_CODE)?;
    Ok(shortcode)
}

fn preserved_node(handle: &Handle) -> Result<PreservedNode, ConvertError> {
    let block_id = require_attr(handle, attr::BLOCK_ID)?;
    let snapshot = match decoded_attr(handle, attr::BLOCK_DATA)? {
        Some(json) => Some(serde_json::from_str::<PreservedBlock>(&json).map_err(|e| {
            ConvertError::Payload {
                attribute: attr::BLOCK_DATA.to_string(),
                message: e.to_string(),
            }
        })?),
        None => None,
    };
    let block_type = get_attr(handle, attr::BLOCK_TYPE)
        .and_then(|kind| BlockKind::parse(&kind))
        .or_else(|| snapshot.as_ref().map(PreservedBlock::kind))
        .ok_or_else(|| ConvertError::MissingAttribute {
            element: tag_name(handle).unwrap_or_default(),
            attribute: attr::BLOCK_TYPE.to_string(),
        })?;
    Ok(PreservedNode {
        block_id,
        block_type,
        snapshot,
    })
}

fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    collect_text(handle, &mut out);
    out
}

fn collect_text(handle: &Handle, out: &mut String) {
    match &handle.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in handle.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::html::serializer::serialize_html;
    use crate::formats::markdown::parser::parse_markdown;
    use crate::options::ConvertOptions;
    use crate::resolve::NoopResolver;
    use crate::shortcodes::{ShortcodeDescriptor, ShortcodeRegistry, ShortcodeType};

    fn registry() -> ShortcodeRegistry {
        let mut registry = ShortcodeRegistry::new();
        registry
            .register(ShortcodeDescriptor::new("notice", "Notice", ShortcodeType::Block))
            .unwrap();
        registry
    }

    #[test]
    fn rendered_html_parses_back_to_the_same_tree() {
        let registry = registry();
        let source = "# Title\n\n[notice type=\"info\"]\nHello **world**\n[/notice]\n\n\
                      | a | b |\n| :--- | --- |\n| 1 | `x` |\n\n<div>raw</div>\n\n===\n\n\
                      ![img](cat.jpg?resize=10)\n\n> [!TIP]\n> Tip body\n";
        let doc = parse_markdown(source, &registry, &ConvertOptions::default(), &NoopResolver);
        let html = serialize_html(&doc, &registry).unwrap();
        let parsed = parse_html(&html).unwrap();
        assert_eq!(parsed.blocks, doc.blocks);
    }

    #[test]
    fn editor_wrappers_are_unwrapped() {
        let doc = parse_html("<div><p>a <span>b</span> <b>c</b></p></div>loose text").unwrap();
        assert_eq!(
            doc.blocks,
            vec![
                Block::Paragraph {
                    content: vec![
                        Inline::text("a b "),
                        Inline::Strong {
                            content: vec![Inline::text("c")]
                        }
                    ]
                },
                Block::paragraph("loose text"),
            ]
        );
    }

    #[test]
    fn bad_payloads_are_reported() {
        let err = parse_html(r#"<div data-type="raw-block" data-content="%%%"></div>"#).unwrap_err();
        assert!(matches!(err, ConvertError::Payload { .. }));

        let err = parse_html(r#"<div data-type="shortcode-block"></div>"#).unwrap_err();
        assert!(matches!(err, ConvertError::MissingAttribute { .. }));
    }
}
