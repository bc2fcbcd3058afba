//! Unedited documents must save back byte for byte.

use crate::common::{roundtrip, roundtrip_via_html};

fn assert_identity(source: &str) {
    assert_eq!(roundtrip(source), source, "direct round trip of {source:?}");
    assert_eq!(
        roundtrip_via_html(source),
        source,
        "round trip through editor HTML of {source:?}"
    );
}

#[test]
fn test_prose_round_trip() {
    assert_identity("# Title\n\nSome **bold**, _italic_ and ~~struck~~ text.\n\n## Next\n\nMore.\n");
}

#[test]
fn test_nested_shortcodes_keep_both_boundaries() {
    assert_identity("[outer][inner]text[/inner][/outer]\n");
    assert_identity("[notice type=\"warning\"]\nSee [mark]this[/mark] first.\n[/notice]\n");
}

#[test]
fn test_tabs_with_children() {
    assert_identity("[tabs]\n[tab title=\"One\"]\nFirst\n[/tab]\n[tab title=\"Two\"]\nSecond\n[/tab]\n[/tabs]\n");
}

#[test]
fn test_nested_block_shortcodes_keep_their_spacing() {
    assert_identity("[section]\n[notice]\ninner\n[/notice]\n[/section]\n");
    assert_identity("[notice]\n```js\nlet a = [b];\n```\n[/notice]\n");
    assert_identity("Intro\n\n[section]\n[notice]\ninner\n[/notice]\n[/section]\n\nOutro\n");
}

#[test]
fn test_links_are_not_shortcodes() {
    assert_identity("See [Link Text](https://example.com) here.\n");
    assert_identity("A [mark]Link Text[/mark] and later (url).\n");
    assert_identity("Go [a](https://example.com)[b](https://example.com) now.\n");
}

#[test]
fn test_fenced_code_is_opaque() {
    assert_identity("```html\n<div>[foo]</div>\n```\n");
    assert_identity("Use `[mark]` or `<b>` inline.\n");
}

#[test]
fn test_empty_table_cell() {
    assert_identity("| a | b |\n| --- | --- |\n| 1 |  |\n");
}

#[test]
fn test_three_level_list() {
    assert_identity("- one\n    - two\n        - three\n\n1. first\n    1. nested\n2. second\n");
}

#[test]
fn test_bbcode_shortcode() {
    assert_identity("Rated [icon=\"star\"] by [color=\"red\"]us[/color].\n");
}

#[test]
fn test_alert_block() {
    assert_identity("> [!WARNING]\n> Be careful\n");
}

#[test]
fn test_html_with_shortcode_lookalike() {
    assert_identity("<div>[notashortcode]</div>\n");
}

#[test]
fn test_code_shortcode_keeps_whitespace() {
    assert_identity("[prism lang=\"rust\"]\nfn main() {\n\n    println!(\"hi\");\n}\n[/prism]\n");
}

#[test]
fn test_template_fragments() {
    assert_identity("{% for item in items %}\n- {{ item }}\n{% endfor %}\n");
}

#[test]
fn test_summary_delimiter() {
    assert_identity("Summary text.\n\n===\n\nThe rest.\n");
}

#[test]
fn test_transform_image_is_preserved() {
    assert_identity("![Sunset](sunset.jpg?cropResize=300,200&quality=80)\n");
}

#[test]
fn test_missing_trailing_newline() {
    assert_eq!(roundtrip("No newline"), "No newline");
}
