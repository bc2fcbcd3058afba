//! Shared helpers for the integration tests

use scribe_babel::shortcodes::{AttributeSpec, AttributeType, ContentType, ShortcodeType};
use scribe_babel::{ConvertOptions, EditSession, ShortcodeDescriptor, ShortcodeRegistry};
use std::sync::Arc;

/// A registry shaped like a typical site configuration.
pub fn registry() -> Arc<ShortcodeRegistry> {
    let mut registry = ShortcodeRegistry::new();
    let descriptors = [
        ShortcodeDescriptor::new("notice", "Notice", ShortcodeType::Block).with_attribute(
            "type",
            AttributeSpec {
                kind: AttributeType::Select,
                default: Some("info".into()),
                options: vec!["info".into(), "warning".into(), "note".into()],
                ..AttributeSpec::default()
            },
        ),
        ShortcodeDescriptor::new("section", "Section", ShortcodeType::Block),
        ShortcodeDescriptor::new("tabs", "Tabs", ShortcodeType::Block).with_children(["tab"]),
        ShortcodeDescriptor::new("tab", "Tab", ShortcodeType::Block),
        ShortcodeDescriptor::new("mark", "Mark", ShortcodeType::Inline),
        ShortcodeDescriptor::new("color", "Color", ShortcodeType::Inline)
            .with_bbcode_attribute("color")
            .with_css("color: {{color}};"),
        ShortcodeDescriptor::new("prism", "Code", ShortcodeType::Block)
            .with_content_type(ContentType::Code),
        ShortcodeDescriptor::new("icon", "Icon", ShortcodeType::Inline)
            .without_content()
            .with_bbcode_attribute("icon"),
    ];
    for descriptor in descriptors {
        registry.register(descriptor).expect("descriptor is valid");
    }
    Arc::new(registry)
}

pub fn session() -> EditSession {
    EditSession::new(registry(), ConvertOptions::default())
}

/// Load and save without edits.
pub fn roundtrip(markdown: &str) -> String {
    let mut session = session();
    session.load_markdown(markdown);
    session.save()
}

/// Load, pass the tree through the editor HTML, and save.
pub fn roundtrip_via_html(markdown: &str) -> String {
    let mut session = session();
    session.load_markdown(markdown);
    let html = session.html();
    session.load_html(&html);
    session.save()
}
