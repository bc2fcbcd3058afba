//! Editing session
//!
//! [`EditSession`] holds one document while it is being edited: markdown comes
//! in through [`EditSession::load_markdown`], the editor exchanges rich-document
//! HTML with [`EditSession::html`] and [`EditSession::load_html`], and
//! [`EditSession::save`] produces the markdown to write back.
//!
//! None of these calls fail. Conversion problems are logged and the session
//! degrades to plain text, so an editor never loses the user's content.
//!
//! Path resolution may arrive after the document rendered. Every load bumps the
//! session revision; [`EditSession::apply_resolution`] ignores answers for an
//! older revision.

use crate::drift;
use crate::formats::html::{parse_html, serialize_html};
use crate::formats::markdown::{parse_markdown, serialize_markdown};
use crate::options::ConvertOptions;
use crate::placeholder::PlaceholderStore;
use crate::resolve::{is_absolute, NoopResolver, PathResolver, Resolution};
use crate::richdoc::{Block, Document, Inline};
use crate::shortcodes::ShortcodeRegistry;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct EditSession {
    registry: Arc<ShortcodeRegistry>,
    options: ConvertOptions,
    resolver: Arc<dyn PathResolver>,
    document: Document,
    source: String,
    revision: u64,
}

impl EditSession {
    pub fn new(registry: Arc<ShortcodeRegistry>, options: ConvertOptions) -> Self {
        EditSession {
            registry,
            options,
            resolver: Arc::new(NoopResolver),
            document: Document::default(),
            source: String::new(),
            revision: 0,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the document with `markdown`. The store is rebuilt from scratch.
    pub fn load_markdown(&mut self, markdown: &str) {
        self.revision += 1;
        self.document = parse_markdown(markdown, &self.registry, &self.options, self.resolver.as_ref());
        self.source = markdown.to_string();
        tracing::debug!(
            revision = self.revision,
            blocks = self.document.blocks.len(),
            records = self.document.store.len(),
            "markdown loaded"
        );
    }

    /// Replace the tree with rich-document HTML from the editor.
    ///
    /// The store and path map stay, so unedited nodes still find their records.
    /// HTML that cannot be read becomes a single paragraph holding it as text.
    pub fn load_html(&mut self, html: &str) {
        let blocks = match parse_html(html) {
            Ok(parsed) => parsed.blocks,
            Err(err) => {
                tracing::warn!(error = %err, "rich-document HTML unreadable, kept as text");
                vec![Block::paragraph(html)]
            }
        };
        self.document.blocks = blocks;
    }

    /// The document as rich-document HTML.
    pub fn html(&self) -> String {
        match serialize_html(&self.document, &self.registry) {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(error = %err, "rich-document HTML failed, showing source as text");
                format!("<p>{}</p>\n", escape_html(&self.source))
            }
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Write the document back to markdown.
    ///
    /// Records nothing in the tree or the output refers to any more are dropped
    /// from the store afterwards.
    pub fn save(&mut self) -> String {
        let restored = serialize_markdown(&mut self.document, &self.registry, &self.options);
        if !restored.unresolved.is_empty() {
            tracing::warn!(tokens = ?restored.unresolved, "placeholder tokens left unresolved");
        }
        for drift in drift::check(&self.source, &restored.text, &self.registry) {
            tracing::warn!(
                shortcode = %drift.name,
                before = drift.before,
                after = drift.after,
                "inline shortcode count changed on save"
            );
        }

        let mut roots: BTreeSet<String> = self.document.referenced_ids().into_iter().collect();
        roots.extend(restored.used);
        self.document.store.retain_reachable(roots.iter().map(String::as_str));

        self.source = restored.text.clone();
        restored.text
    }

    /// Apply a path resolution that arrived after `revision` was rendered.
    ///
    /// Returns `false` when the document has been reloaded since, or when no
    /// link or image in the tree uses `path`.
    pub fn apply_resolution(&mut self, revision: u64, path: &str, resolution: &Resolution) -> bool {
        if revision != self.revision {
            tracing::debug!(revision, current = self.revision, path, "stale path resolution ignored");
            return false;
        }
        let resolved = resolution.resolved_url.as_str();
        let mut replaced = 0usize;
        self.document.for_each_inline_mut(&mut |inline| match inline {
            Inline::Image { src: url, .. } | Inline::Link { href: url, .. } if url.as_str() == path => {
                *url = resolved.to_string();
                replaced += 1;
            }
            _ => {}
        });
        if replaced > 0 {
            self.document.paths.record(resolved, path);
            tracing::trace!(path, resolved, replaced, "late path resolution applied");
        }
        replaced > 0
    }

    /// Relative link and image targets still written as in the source, for a
    /// host that resolves paths after the first render.
    pub fn pending_paths(&self) -> Vec<String> {
        let mut pending = BTreeSet::new();
        let paths = &self.document.paths;
        self.document.for_each_inline(&mut |inline| {
            if let Inline::Image { src: url, .. } | Inline::Link { href: url, .. } = inline {
                if !is_absolute(url) && paths.original(url) == url.as_str() {
                    pending.insert(url.clone());
                }
            }
        });
        pending.into_iter().collect()
    }

    pub fn store(&self) -> &PlaceholderStore {
        &self.document.store
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The markdown last loaded or saved.
    pub fn source(&self) -> &str {
        &self.source
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ResolveError;
    use crate::shortcodes::{ShortcodeDescriptor, ShortcodeType};

    fn session() -> EditSession {
        let mut registry = ShortcodeRegistry::new();
        registry
            .register(ShortcodeDescriptor::new("notice", "Notice", ShortcodeType::Block))
            .unwrap();
        registry
            .register(ShortcodeDescriptor::new("mark", "Mark", ShortcodeType::Inline))
            .unwrap();
        EditSession::new(Arc::new(registry), ConvertOptions::default())
    }

    #[test]
    fn load_then_save_is_identity() {
        let source = "# Title\n\n[notice type=\"info\"]\nHello **there**\n[/notice]\n\nA [mark]word[/mark].\n";
        let mut session = session();
        session.load_markdown(source);
        assert_eq!(session.revision(), 1);
        assert_eq!(session.save(), source);
        assert_eq!(session.source(), source);
    }

    #[test]
    fn html_round_trip_keeps_unedited_records() {
        let source = "<div class=\"x\">kept</div>\n\nText with `code`.\n";
        let mut session = session();
        session.load_markdown(source);
        let html = session.html();
        session.load_html(&html);
        assert_eq!(session.save(), source);
    }

    #[test]
    fn loading_html_keeps_the_revision() {
        let mut session = session();
        session.load_markdown("before\n");
        session.load_html("<p>after</p>");
        assert_eq!(session.revision(), 1);
        assert_eq!(session.save(), "after\n");
        session.load_markdown("x\n");
        assert_eq!(session.revision(), 2);
    }

    #[test]
    fn fresh_session_saves_editor_html_with_final_newline() {
        let mut session = session();
        session.load_html("<p>one</p><p>two</p>");
        assert_eq!(session.save(), "one\n\ntwo\n");
    }

    #[test]
    fn save_drops_records_of_deleted_nodes() {
        let mut session = session();
        session.load_markdown("<div>a</div>\n\n<div>b</div>\n");
        assert_eq!(session.store().len(), 2);
        session.document_mut().blocks.truncate(1);
        assert_eq!(session.save(), "<div>a</div>\n");
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn late_resolution_updates_images_and_saves_original() {
        let mut session = session();
        session.load_markdown("![cat](cat.png)\n");
        assert_eq!(session.pending_paths(), vec!["cat.png".to_string()]);

        let revision = session.revision();
        assert!(session.apply_resolution(revision, "cat.png", &Resolution::url("/user/pages/cat.png")));
        assert!(session.html().contains("/user/pages/cat.png"));
        assert!(session.pending_paths().is_empty());
        assert_eq!(session.save(), "![cat](cat.png)\n");
    }

    #[test]
    fn stale_resolution_is_ignored() {
        let mut session = session();
        session.load_markdown("[a](one.md)\n");
        let stale = session.revision();
        session.load_markdown("[b](one.md)\n");
        assert!(!session.apply_resolution(stale, "one.md", &Resolution::url("/one")));
        assert!(session.html().contains("one.md"));
    }

    #[test]
    fn resolver_runs_on_load() {
        let resolver = |path: &str| -> Result<Resolution, ResolveError> {
            Ok(Resolution::url(format!("/base/{path}")))
        };
        let mut session = session().with_resolver(Arc::new(resolver));
        session.load_markdown("[doc](doc.md)\n");
        assert!(session.html().contains("/base/doc.md"));
        assert!(session.pending_paths().is_empty());
        assert_eq!(session.save(), "[doc](doc.md)\n");
    }

    #[test]
    fn fallback_html_is_escaped() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
