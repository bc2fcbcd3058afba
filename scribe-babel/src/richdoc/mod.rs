//! The rich-document tree
//!
//! A closed sum type over the node kinds the visual editor works with. Custom
//! nodes carry enough data to rebuild their source syntax on their own, even when
//! the placeholder store has lost the matching record.

mod nodes;
mod normalize;

pub use nodes::{
    Alignment, Block, Document, Inline, ListItem, PreservedNode, RawLanguage, ShortcodeAttrs,
    ShortcodeInline, Table, TableCell, CELL_FILLER,
};
pub use normalize::normalize_marks;
