//! CLI inspection transforms
//!
//! Each transform shows one stage of the markdown pipeline:
//!
//! 1. **Extraction** - Markdown → tokenized markdown + placeholder store
//!    - `tokens`: the tokenized text handed to the markdown parser
//!    - `store`: the placeholder records as JSON
//!
//! 2. **Bridge** - tokenized markdown → rich document
//!    - `tree`: tree visualization of the document
//!    - `tree-json`: the document as JSON
//!    - `html`: the editor HTML
//!
//! 3. **Round trip** - rich document → markdown
//!    - `drift`: inline shortcodes whose count changes on save
//!
//! ## Extra Parameters
//!
//! - `inlines`: "true" lists inline nodes under each block in `tree`
//!
//! Example: `scribe inspect page.md tree --extra-inlines`

use scribe_babel::drift;
use scribe_babel::format::Format;
use scribe_babel::formats::treeviz::to_treeviz_str_with_params;
use scribe_babel::formats::JsonFormat;
use scribe_babel::{ConvertOptions, EditSession, Extractor, ShortcodeRegistry};
use std::collections::HashMap;
use std::sync::Arc;

/// All available CLI transforms
pub const AVAILABLE_TRANSFORMS: &[&str] = &["tokens", "store", "tree", "tree-json", "html", "drift"];

pub const DEFAULT_TRANSFORM: &str = "tree";

/// Execute a named transform on markdown source with optional extra parameters
pub fn execute_transform(
    source: &str,
    transform_name: &str,
    extra_params: &HashMap<String, String>,
    registry: &Arc<ShortcodeRegistry>,
    options: &ConvertOptions,
) -> Result<String, String> {
    match transform_name {
        "tokens" => Ok(Extractor::new(registry, options).extract(source).text),
        "store" => {
            let tokenized = Extractor::new(registry, options).extract(source);
            let records: Vec<_> = tokenized.store.iter().collect();
            let mut json = serde_json::to_string_pretty(&records)
                .map_err(|e| format!("JSON serialization failed: {e}"))?;
            json.push('\n');
            Ok(json)
        }
        "tree" => {
            let session = load(source, registry, options);
            Ok(to_treeviz_str_with_params(session.document(), extra_params))
        }
        "tree-json" => {
            let session = load(source, registry, options);
            JsonFormat
                .serialize(session.document())
                .map_err(|e| format!("Transform failed: {e}"))
        }
        "html" => Ok(load(source, registry, options).html()),
        "drift" => {
            let mut session = load(source, registry, options);
            let saved = session.save();
            let report = drift::check(source, &saved, registry);
            if report.is_empty() {
                return Ok("no drift\n".to_string());
            }
            Ok(report.iter().map(|d| format!("{d}\n")).collect())
        }
        _ => Err(format!("Unknown transform: {transform_name}")),
    }
}

fn load(source: &str, registry: &Arc<ShortcodeRegistry>, options: &ConvertOptions) -> EditSession {
    let mut session = EditSession::new(Arc::clone(registry), options.clone());
    session.load_markdown(source);
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_babel::shortcodes::{ShortcodeDescriptor, ShortcodeType};

    fn registry() -> Arc<ShortcodeRegistry> {
        let mut registry = ShortcodeRegistry::new();
        registry
            .register(ShortcodeDescriptor::new("mark", "Mark", ShortcodeType::Inline))
            .unwrap();
        Arc::new(registry)
    }

    fn run(source: &str, transform: &str) -> String {
        execute_transform(source, transform, &HashMap::new(), &registry(), &ConvertOptions::default())
            .unwrap()
    }

    #[test]
    fn every_listed_transform_runs() {
        for transform in AVAILABLE_TRANSFORMS {
            assert!(!run("Hello [mark]x[/mark]\n", transform).is_empty(), "{transform}");
        }
    }

    #[test]
    fn tokens_hide_shortcodes() {
        let out = run("Hello [mark]x[/mark]\n", "tokens");
        assert!(out.contains("{{INLINE_SHORTCODE_PLACEHOLDER_"));
        assert!(!out.contains("[mark]"));
    }

    #[test]
    fn store_lists_records() {
        let out = run("`a` and `b`\n", "store");
        let records: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(records.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn unchanged_documents_report_no_drift() {
        assert_eq!(run("A [mark]b[/mark]\n", "drift"), "no drift\n");
    }

    #[test]
    fn unknown_transform_is_an_error() {
        let result =
            execute_transform("x", "ast", &HashMap::new(), &registry(), &ConvertOptions::default());
        assert!(result.is_err());
    }
}
