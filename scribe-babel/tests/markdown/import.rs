//! Import tests (Markdown → rich document)

use crate::common::session;
use scribe_babel::placeholder::BlockKind;
use scribe_babel::richdoc::RawLanguage;
use scribe_babel::{Block, Inline};

fn blocks(markdown: &str) -> Vec<Block> {
    let mut session = session();
    session.load_markdown(markdown);
    session.document().blocks.clone()
}

#[test]
fn test_single_line_unregistered_nesting_is_inline() {
    let blocks = blocks("[outer][inner]text[/inner][/outer]\n");
    let Block::Paragraph { content } = &blocks[0] else {
        panic!("single-line outer should sit in a paragraph, got {blocks:?}");
    };
    let Inline::Shortcode(outer) = &content[0] else {
        panic!("outer should be inline, got {content:?}");
    };
    assert_eq!(outer.shortcode.name, "outer");
    let Inline::Shortcode(inner) = &outer.content[0] else {
        panic!("inner should be inline, got {:?}", outer.content);
    };
    assert_eq!(inner.shortcode.name, "inner");
    assert_eq!(inner.content, vec![Inline::text("text")]);
}

#[test]
fn test_multi_line_unregistered_nesting_is_a_block() {
    let blocks = blocks("[outer]\n[inner]text[/inner]\n[/outer]\n");
    let Block::ShortcodeBlock { shortcode, children } = &blocks[0] else {
        panic!("outer should be a block shortcode, got {blocks:?}");
    };
    assert_eq!(shortcode.name, "outer");
    let Block::Paragraph { content } = &children[0] else {
        panic!("expected paragraph in outer, got {children:?}");
    };
    let Inline::Shortcode(inner) = &content[0] else {
        panic!("inner should be inline, got {content:?}");
    };
    assert_eq!(inner.shortcode.name, "inner");
}

#[test]
fn test_link_is_a_link() {
    let mut session = session();
    session.load_markdown("[Link Text](https://example.com)\n");
    assert!(session.store().is_empty());
    let Block::Paragraph { content } = &session.document().blocks[0] else {
        panic!("expected paragraph");
    };
    assert!(matches!(&content[0], Inline::Link { href, .. } if href == "https://example.com"));
}

#[test]
fn test_bbcode_attribute_resolves() {
    let blocks = blocks("[icon=\"star\"]\n");
    let found = match &blocks[0] {
        Block::Paragraph { content } => content.iter().find_map(|inline| match inline {
            Inline::Shortcode(node) => Some(node.shortcode.clone()),
            _ => None,
        }),
        Block::ShortcodeBlock { shortcode, .. } => Some(shortcode.clone()),
        _ => None,
    };
    let shortcode = found.expect("icon shortcode node");
    assert_eq!(shortcode.name, "icon");
    assert_eq!(shortcode.attributes.get("icon"), Some("star"));
}

#[test]
fn test_alert_node() {
    let blocks = blocks("> [!WARNING]\n> Be careful\n");
    let Block::GithubAlert { alert_type, children, .. } = &blocks[0] else {
        panic!("expected alert, got {blocks:?}");
    };
    assert_eq!(alert_type, "warning");
    assert_eq!(children, &vec![Block::paragraph("Be careful")]);
}

#[test]
fn test_html_lookalike_is_one_raw_block() {
    let mut session = session();
    session.load_markdown("<div>[notashortcode]</div>\n");
    assert_eq!(session.store().len(), 1);
    let kinds: Vec<BlockKind> = session.store().iter().map(|record| record.kind()).collect();
    assert_eq!(kinds, vec![BlockKind::Html]);
    assert!(matches!(
        &session.document().blocks[0],
        Block::RawBlock { language: RawLanguage::Html, content, .. } if content == "<div>[notashortcode]</div>"
    ));
}

#[test]
fn test_code_shortcode_content_is_not_markdown() {
    let blocks = blocks("[prism]\n**not bold**\n[/prism]\n");
    let Block::ShortcodeBlock { shortcode, children } = &blocks[0] else {
        panic!("expected shortcode block");
    };
    assert!(children.is_empty());
    assert_eq!(shortcode.raw_code.as_deref(), Some("\n**not bold**\n"));
}

#[test]
fn test_unknown_shortcode_is_accepted() {
    let blocks = blocks("[gallery cols=3]\nimages\n[/gallery]\n");
    let Block::ShortcodeBlock { shortcode, .. } = &blocks[0] else {
        panic!("expected shortcode block, got {blocks:?}");
    };
    assert_eq!(shortcode.name, "gallery");
    assert_eq!(shortcode.attributes.get("cols"), Some("3"));
}

#[test]
fn test_summary_delimiter_node() {
    let blocks = blocks("Intro\n\n===\n\nBody\n");
    assert!(matches!(&blocks[1], Block::SummaryDelimiter { delimiter } if delimiter == "==="));
}

#[test]
fn test_unclosed_template_expression_is_plain_text() {
    let blocks = blocks("Open {{ but never closed\n\n# Heading\n\n```\ncode\n```\n\nend\n");
    let kinds: Vec<&str> = blocks.iter().map(Block::type_name).collect();
    assert_eq!(kinds, vec!["paragraph", "heading", "codeBlock", "paragraph"]);
}
