//! Import tests (editor HTML → rich document)

use crate::common::session;
use scribe_babel::formats::html::parse_html;
use scribe_babel::{Block, ConvertError, Inline};

#[test]
fn test_serialized_tree_reads_back_equal() {
    let source = "# T\n\n- a [mark]b[/mark]\n    - c `d`\n\n| x | y |\n| :--- | ---: |\n| 1 | 2 |\n\n> quote\n\n```js\nlet a;\n```\n";
    let mut session = session();
    session.load_markdown(source);
    let parsed = parse_html(&session.html()).expect("editor HTML parses");
    assert_eq!(parsed.blocks, session.document().blocks);
}

#[test]
fn test_editor_wrappers_are_unwrapped() {
    let doc = parse_html("<div class=\"ProseMirror\"><p>a <span>b</span></p></div>").expect("parses");
    assert_eq!(
        doc.blocks,
        vec![Block::Paragraph {
            content: vec![Inline::text("a b")]
        }]
    );
}

#[test]
fn test_bad_payload_is_an_error() {
    let err = parse_html("<div data-type=\"raw-block\" data-language=\"html\" data-content=\"***\"></div>")
        .expect_err("payload is not base64");
    assert!(matches!(err, ConvertError::Payload { .. }));
}

#[test]
fn test_session_degrades_on_unreadable_html() {
    let bad = "<div data-type=\"raw-block\" data-language=\"html\" data-content=\"***\"></div>";
    let mut session = session();
    session.load_markdown("before\n");
    session.load_html(bad);
    assert_eq!(session.document().blocks, vec![Block::paragraph(bad)]);
}

#[test]
fn test_new_nodes_from_the_editor_are_saved() {
    let mut session = session();
    session.load_markdown("Old\n");
    session.load_html(
        "<p>Old</p><div data-type=\"shortcode-block\" data-name=\"notice\" data-attributes=\"{&quot;type&quot;:&quot;note&quot;}\"><p>New</p></div>",
    );
    assert_eq!(session.save(), "Old\n\n[notice type=\"note\"]\nNew\n[/notice]\n");
}
