//! Edited documents: changed nodes are rebuilt, the rest stays byte for byte.

use crate::common::{registry, session};
use scribe_babel::drift;
use scribe_babel::{Block, Inline};

#[test]
fn test_text_edit_in_editor_html_leaves_other_constructs_alone() {
    let source = "Intro text\n\n<div class=\"box\">[x]</div>\n\n[notice type=\"info\"]\nKeep **me**\n[/notice]\n";
    let mut session = session();
    session.load_markdown(source);

    let html = session.html().replace("Intro text", "Changed text");
    session.load_html(&html);

    assert_eq!(
        session.save(),
        "Changed text\n\n<div class=\"box\">[x]</div>\n\n[notice type=\"info\"]\nKeep **me**\n[/notice]\n"
    );
}

#[test]
fn test_attribute_edit_rebuilds_only_that_shortcode() {
    let mut session = session();
    session.load_markdown("[notice type=\"info\"]\nHello\n[/notice]\n\n[section]\nx\n[/section]\n");
    let Block::ShortcodeBlock { shortcode, .. } = &mut session.document_mut().blocks[0] else {
        panic!("expected notice");
    };
    shortcode.attributes.insert("type", "warning");

    assert_eq!(
        session.save(),
        "[notice type=\"warning\"]\nHello\n[/notice]\n\n[section]\nx\n[/section]\n"
    );
}

#[test]
fn test_inline_shortcode_text_edit() {
    let mut session = session();
    session.load_markdown("Press [mark]here[/mark] now.\n");
    let Block::Paragraph { content } = &mut session.document_mut().blocks[0] else {
        panic!("expected paragraph");
    };
    let Some(Inline::Shortcode(mark)) = content.iter_mut().find(|i| matches!(i, Inline::Shortcode(_))) else {
        panic!("expected inline shortcode");
    };
    mark.content = vec![Inline::text("there")];

    assert_eq!(session.save(), "Press [mark]there[/mark] now.\n");
}

#[test]
fn test_deleted_nodes_release_their_records() {
    let mut session = session();
    session.load_markdown("Keep `this`.\n\n[notice]\nDrop [mark]me[/mark]\n[/notice]\n");
    let before = session.store().len();
    session.document_mut().blocks.pop();

    assert_eq!(session.save(), "Keep `this`.\n");
    assert!(session.store().len() < before);
    assert_eq!(session.store().len(), 1);
}

#[test]
fn test_saving_twice_is_stable() {
    let mut session = session();
    session.load_markdown("* a\n* b\n\nText *em*\n");
    let first = session.save();
    assert_eq!(first, "- a\n- b\n\nText _em_\n");
    assert_eq!(session.save(), first);
}

#[test]
fn test_removed_inline_shortcode_shows_as_drift() {
    let before = "A [mark]b[/mark] c\n";
    let mut session = session();
    session.load_markdown(before);
    let Block::Paragraph { content } = &mut session.document_mut().blocks[0] else {
        panic!("expected paragraph");
    };
    content.retain(|inline| !matches!(inline, Inline::Shortcode(_)));
    let after = session.save();

    let drift = drift::check(before, &after, &registry());
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].name, "mark");
    assert_eq!((drift[0].before, drift[0].after), (1, 0));
}
