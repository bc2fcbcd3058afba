//! Property tests for extraction, restoration and the full load/save round trip.

use crate::common::{registry, roundtrip};
use proptest::prelude::*;
use scribe_babel::restore::restore_verbatim;
use scribe_babel::{ConvertOptions, Extractor};

fn fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "plain words ",
        "**bold** ",
        "`code` ",
        "[mark]hi[/mark] ",
        "[icon=\"star\"] ",
        "[Link](https://example.com) ",
        "[unknown a=1]x[/unknown] ",
        "<span class=\"x\">s</span> ",
        "{{ page.title }} ",
        "{% if a %}b{% endif %} ",
        "![img](a.jpg?resize=10) ",
        "\n",
        "\n\n",
        "\n```\n[foo] <div>\n```\n",
        "\n[notice]\nbody\n[/notice]\n",
        "\n> [!NOTE]\n> note\n",
        "\n<div>\n[x]\n</div>\n",
        "\n[prism]\n  a\n\n  b\n[/prism]\n",
        "[unclosed ",
        "{{ ",
        "] [ ",
    ])
}

proptest! {
    #[test]
    fn extraction_then_restoration_is_identity(parts in prop::collection::vec(fragment(), 0..12)) {
        let source: String = parts.concat();
        let registry = registry();
        let options = ConvertOptions::default();
        let tokenized = Extractor::new(&registry, &options).extract(&source);
        let restored = restore_verbatim(&tokenized.text, &tokenized.store, options.max_restore_passes);
        prop_assert_eq!(restored, source);
    }
}

/// Blocks already in the form the writer produces, so any sequence of them
/// must load and save unchanged.
fn canonical_block() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "Plain words with **bold** and `code`.",
        "See [Link Text](https://example.com) here.",
        "Rated [icon=\"star\"] by [color=\"red\"]us[/color].",
        "[outer][inner]text[/inner][/outer]",
        "# Heading",
        "```\n[foo] <div>\n```",
        "[notice]\nbody\n[/notice]",
        "[section]\n[notice]\nx\n[/notice]\n[/section]",
        "[notice]\n```js\nlet a = [b];\n```\n[/notice]",
        "[tabs]\n[tab title=\"One\"]\nFirst\n[/tab]\n[tab title=\"Two\"]\nSecond\n[/tab]\n[/tabs]",
        "> [!NOTE]\n> note",
        "<div>[notashortcode]</div>",
        "[prism]\n  a\n\n  b\n[/prism]",
        "{% if a %}b{% endif %}",
    ])
}

proptest! {
    #[test]
    fn load_then_save_is_identity(parts in prop::collection::vec(canonical_block(), 1..8)) {
        let source = format!("{}\n", parts.join("\n\n"));
        prop_assert_eq!(roundtrip(&source), source);
    }
}
