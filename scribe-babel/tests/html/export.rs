//! Export tests (rich document → editor HTML)

use crate::common::{registry, session};
use base64::{engine::general_purpose, Engine as _};
use scribe_babel::format::Format;
use scribe_babel::formats::HtmlFormat;
use std::collections::HashMap;

fn html_of(markdown: &str) -> String {
    let mut session = session();
    session.load_markdown(markdown);
    session.html()
}

#[test]
fn test_raw_html_payload_survives_whitespace() {
    let raw = "<pre>\n  keep   spacing\n\n</pre>";
    let html = html_of(&format!("{raw}\n"));
    let payload = general_purpose::STANDARD.encode(raw);
    assert!(html.contains("data-type=\"raw-block\""));
    assert!(html.contains("data-language=\"html\""));
    assert!(html.contains(&format!("data-content=\"{payload}\"")));
}

#[test]
fn test_template_fragment_is_a_twig_raw_block() {
    let html = html_of("{% if page %}\nx\n{% endif %}\n");
    assert!(html.contains("data-language=\"twig\""));
}

#[test]
fn test_custom_nodes_have_data_types() {
    let html = html_of("> [!TIP]\n> Try it\n\nIntro\n\n===\n\n[notice type=\"info\"]\nBody\n[/notice]\n");
    assert!(html.contains("data-type=\"github-alert\""));
    assert!(html.contains("data-alert-type=\"tip\""));
    assert!(html.contains("data-type=\"summary-delimiter\""));
    assert!(html.contains("data-delimiter=\"===\""));
    assert!(html.contains("data-type=\"shortcode-block\""));
    assert!(html.contains("data-name=\"notice\""));
    assert!(html.contains("<p>Body</p>"));
}

#[test]
fn test_transform_image_is_preserved_inline() {
    let html = html_of("![a](a.jpg?resize=100)\n");
    assert!(html.contains("data-type=\"preserved-inline\"") || html.contains("data-type=\"preserved-block\""));
    assert!(html.contains("data-block-type=\"grav_image\""));
}

#[test]
fn test_standalone_page_embeds_styles() {
    let mut session = session();
    session.load_markdown("Hello\n");
    let format = HtmlFormat::new(registry());
    let mut options = HashMap::new();
    options.insert("standalone".to_string(), "true".to_string());
    let page = format
        .serialize_with_options(session.document(), &options)
        .expect("html serializes");
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("<style>"));
    assert!(page.contains("<p>Hello</p>"));
}
