//! Round-trip conversion between Markdown with shortcodes and a rich-text document
//!
//!     This crate loads CMS markdown into a typed document tree for a visual editor and writes
//!     the edited tree back to markdown. Anything the user did not touch comes back byte for
//!     byte: shortcodes, raw HTML, template fragments, fenced code, alerts.
//!
//!     This is a pure lib, that is, it powers the scribe cli but is shell agnostic: no code
//!     should be written that supposes a shell environment, be it to std print, env vars etc.
//!
//! Architecture
//!
//!     Generic markdown libraries do not know shortcodes and would mangle them. So before any
//!     markdown parsing, the regions that must survive are cut out and replaced by opaque
//!     tokens (`{{KIND_ID}}`), with the originals kept in a placeholder store. The tokenized
//!     text is then ordinary markdown.
//!
//!     markdown ──extract──▶ tokenized md + store ──comrak + bridge──▶ Document (tree + store)
//!     Document ──writer──▶ tokenized md ──restore──▶ markdown
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── options.rs              # ConvertOptions
//!     ├── placeholder             # tokens, records and the store
//!     ├── shortcodes              # descriptors, registry, attribute parsing, tag scanner
//!     ├── extract                 # the extractor passes
//!     ├── restore.rs              # token substitution back to text
//!     ├── resolve.rs              # link and image path resolution
//!     ├── richdoc                 # the typed document tree
//!     ├── drift.rs                # inline shortcode drift diagnostics
//!     ├── session.rs              # EditSession, the editor-facing entry point
//!     ├── format.rs               # Format trait definition
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     └── formats
//!         ├── markdown            # extract + bridge / writer + restore
//!         ├── html                # the editor's HTML, data-* attributes
//!         ├── json                # serde view of the tree and its store
//!         └── treeviz             # debugging tree dump
//!
//! Testing
//!     tests
//!     └── <format>
//!         └── <testname>.rs
//!
//!     Note that rust does not by default discover tests in subdirectories, so we need to include these
//!     in the mod.
//!
//! Core Algorithms
//!
//!     Extraction runs a fixed list of passes; their order is the precedence between overlapping
//!     constructs (see ./extract/mod.rs). Restoration substitutes tokens repeatedly until none
//!     are left, since records nest tokens of other records (see ./restore.rs).
//!
//!     The writer decides per custom node whether it is unedited. Unedited nodes write their
//!     record's token so the original bytes come back; edited nodes are rebuilt from their
//!     attributes and written into the store as new records.
//!
//! Formats
//!
//!     Format specific capabilities are implemented with the Format trait. Formats have a
//!     parse() and serialize() method, a name and file extensions. See ./format.rs.
//!     - Format trait: Uniform interface for all formats (parsing and/or serialization)
//!     - FormatRegistry: Centralized discovery and selection of formats
//!     - Format implementations: markdown, html, json, treeviz
//!
//! Library Choices
//!
//!     CommonMark parsing is left to comrak and HTML parsing/serializing to html5ever. The crate
//!     itself only owns the placeholder machinery and the mapping between the comrak AST, the
//!     document tree and the editor HTML.
//!
pub mod drift;
pub mod error;
pub mod extract;
pub mod format;
pub mod formats;
pub mod options;
pub mod placeholder;
pub mod registry;
pub mod resolve;
pub mod restore;
pub mod richdoc;
pub mod session;
pub mod shortcodes;

pub use error::{ConvertError, FormatError};
pub use extract::{Extractor, Tokenized};
pub use format::Format;
pub use formats::html::{parse_html, serialize_html};
pub use formats::markdown::{parse_markdown, serialize_markdown};
pub use options::ConvertOptions;
pub use placeholder::PlaceholderStore;
pub use registry::FormatRegistry;
pub use resolve::{NoopResolver, PathResolver, Resolution, ResolveError};
pub use restore::{restore, Restored};
pub use richdoc::{Block, Document, Inline};
pub use session::EditSession;
pub use shortcodes::{ShortcodeDescriptor, ShortcodeRegistry};
